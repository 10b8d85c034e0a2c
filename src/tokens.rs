use uuid::Uuid;

/// Source of voucher codes and payment transaction ids. Injected so tests can
/// supply a deterministic implementation.
pub trait TokenSource: Send + Sync {
    fn voucher_code(&self) -> String;
    fn transaction_id(&self, gateway: &str) -> String;
}

pub struct UuidTokens;

impl TokenSource for UuidTokens {
    fn voucher_code(&self) -> String {
        let raw = Uuid::new_v4().simple().to_string().to_uppercase();
        raw[..10].to_string()
    }

    fn transaction_id(&self, gateway: &str) -> String {
        let raw = Uuid::new_v4().simple().to_string();
        format!("{}_{}", gateway.to_uppercase(), &raw[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voucher_codes_are_ten_uppercase_chars() {
        let code = UuidTokens.voucher_code();
        assert_eq!(code.len(), 10);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn transaction_ids_embed_the_gateway() {
        let id = UuidTokens.transaction_id("razorpay");
        assert!(id.starts_with("RAZORPAY_"));
    }
}
