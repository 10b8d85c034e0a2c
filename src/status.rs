use crate::error::AppError;

/// Order lifecycle: pending -> paid -> shipped -> delivered, with cancelled
/// reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// Transaction states are terminal once they leave `initiated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Initiated,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Initiated => "initiated",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(value: &str) -> bool {
        value == "success" || value == "failed"
    }
}

/// Sellers may only move an order to shipped, delivered or cancelled.
pub fn seller_transition(requested: &str) -> Result<OrderStatus, AppError> {
    match OrderStatus::parse(requested) {
        Some(status @ (OrderStatus::Shipped | OrderStatus::Delivered | OrderStatus::Cancelled)) => {
            Ok(status)
        }
        _ => Err(AppError::InvalidStatus(requested.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_allow_list_accepts_fulfilment_states() {
        assert_eq!(seller_transition("shipped").unwrap(), OrderStatus::Shipped);
        assert_eq!(
            seller_transition("delivered").unwrap(),
            OrderStatus::Delivered
        );
        assert_eq!(
            seller_transition("cancelled").unwrap(),
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn seller_cannot_set_arbitrary_states() {
        for rejected in ["refunded", "paid", "pending", ""] {
            assert!(matches!(
                seller_transition(rejected),
                Err(AppError::InvalidStatus(_))
            ));
        }
    }

    #[test]
    fn transaction_terminal_states() {
        assert!(TransactionStatus::is_terminal("success"));
        assert!(TransactionStatus::is_terminal("failed"));
        assert!(!TransactionStatus::is_terminal("initiated"));
    }
}
