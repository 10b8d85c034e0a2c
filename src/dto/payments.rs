use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::PaymentTransaction;

#[derive(Debug, Deserialize, ToSchema)]
pub struct InitiatePaymentRequest {
    pub order_id: Uuid,
    pub gateway: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InitiatePaymentResponse {
    pub transaction_id: String,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub gateway: String,
    /// Gateway-specific initiation data (keys, callback URL, prefill) the
    /// frontend hands to the gateway SDK.
    pub gateway_data: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CallbackAck {
    pub status: String,
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentStatusResponse {
    pub order_id: Uuid,
    pub payment_status: String,
    pub order_status: String,
    pub total_amount: Decimal,
    pub transactions: Vec<PaymentTransaction>,
}
