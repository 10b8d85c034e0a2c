use serde_json::Value;

pub const SUPPORTED_GATEWAYS: [&str; 4] = ["razorpay", "payu", "stripe", "paypal"];

pub fn is_supported(gateway: &str) -> bool {
    SUPPORTED_GATEWAYS.contains(&gateway)
}

/// Authenticity check for gateway callbacks. Each real gateway has its own
/// signature scheme (Razorpay HMAC, PayU hash, Stripe webhook signatures), so
/// the check is pluggable; the core only needs a yes/no answer.
pub trait GatewayVerifier: Send + Sync {
    fn verify(&self, gateway: &str, payload: &Value) -> bool;
}

/// Development verifier that trusts the `status` field of the payload for
/// supported gateways. Deployments swap in per-gateway signature checks.
pub struct StatusFieldVerifier;

impl GatewayVerifier for StatusFieldVerifier {
    fn verify(&self, gateway: &str, payload: &Value) -> bool {
        if !is_supported(gateway) {
            return false;
        }
        payload.get("status").and_then(Value::as_str) == Some("success")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_field_verifier_requires_known_gateway() {
        let verifier = StatusFieldVerifier;
        assert!(verifier.verify("razorpay", &json!({ "status": "success" })));
        assert!(!verifier.verify("razorpay", &json!({ "status": "failure" })));
        assert!(!verifier.verify("unknown", &json!({ "status": "success" })));
    }
}
