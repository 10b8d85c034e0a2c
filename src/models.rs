use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub mrp: Decimal,
    pub stock: i32,
    pub is_preorder: bool,
    pub preorder_deposit: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub qty: i32,
    pub price_snapshot: Decimal,
    pub deposit_snapshot: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub address_type: String,
    pub is_default: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shipping_address_id: Option<Uuid>,
    pub shipping_address: Option<serde_json::Value>,
    pub voucher_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub payment_transaction_id: Option<String>,
    pub subtotal: Decimal,
    pub gst_amount: Decimal,
    pub discount_amount: Decimal,
    pub commission: Decimal,
    pub deposit_amount: Decimal,
    pub remaining_due: Decimal,
    pub is_preorder_order: bool,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub title_snapshot: String,
    pub price_snapshot: Decimal,
    pub gst_rate_snapshot: Decimal,
    pub deposit_snapshot: Decimal,
    pub qty: i32,
    pub is_prebook: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Voucher {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub value: Decimal,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub order_id: Uuid,
    pub transaction_id: String,
    pub gateway: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub gateway_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<entity::products::Model> for Product {
    fn from(model: entity::products::Model) -> Self {
        Self {
            id: model.id,
            seller_id: model.seller_id,
            category_id: model.category_id,
            title: model.title,
            description: model.description,
            price: model.price,
            mrp: model.mrp,
            stock: model.stock,
            is_preorder: model.is_preorder,
            preorder_deposit: model.preorder_deposit,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::cart_items::Model> for CartItem {
    fn from(model: entity::cart_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            qty: model.qty,
            price_snapshot: model.price_snapshot,
            deposit_snapshot: model.deposit_snapshot,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::addresses::Model> for Address {
    fn from(model: entity::addresses::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            line1: model.line1,
            line2: model.line2,
            city: model.city,
            state: model.state,
            pincode: model.pincode,
            address_type: model.address_type,
            is_default: model.is_default,
        }
    }
}

impl From<entity::orders::Model> for Order {
    fn from(model: entity::orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            shipping_address_id: model.shipping_address_id,
            shipping_address: model.shipping_address,
            voucher_id: model.voucher_id,
            status: model.status,
            payment_status: model.payment_status,
            payment_method: model.payment_method,
            payment_transaction_id: model.payment_transaction_id,
            subtotal: model.subtotal,
            gst_amount: model.gst_amount,
            discount_amount: model.discount_amount,
            commission: model.commission,
            deposit_amount: model.deposit_amount,
            remaining_due: model.remaining_due,
            is_preorder_order: model.is_preorder_order,
            created_at: model.created_at.with_timezone(&Utc),
            shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl From<entity::order_items::Model> for OrderItem {
    fn from(model: entity::order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            title_snapshot: model.title_snapshot,
            price_snapshot: model.price_snapshot,
            gst_rate_snapshot: model.gst_rate_snapshot,
            deposit_snapshot: model.deposit_snapshot,
            qty: model.qty,
            is_prebook: model.is_prebook,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::vouchers::Model> for Voucher {
    fn from(model: entity::vouchers::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            code: model.code,
            value: model.value,
            is_used: model.is_used,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::payment_transactions::Model> for PaymentTransaction {
    fn from(model: entity::payment_transactions::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            transaction_id: model.transaction_id,
            gateway: model.gateway,
            amount: model.amount,
            currency: model.currency,
            status: model.status,
            gateway_response: model.gateway_response,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
