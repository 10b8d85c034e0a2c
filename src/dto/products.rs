use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub mrp: Decimal,
    pub stock: i32,
    #[serde(default)]
    pub is_preorder: bool,
    #[serde(default)]
    pub preorder_deposit: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
