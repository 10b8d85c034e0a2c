use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Voucher;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseVoucherRequest {
    pub value: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoucherList {
    pub items: Vec<Voucher>,
}
