use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub shipping_address_id: Option<Uuid>,
    /// Address snapshot captured at checkout so later edits to the address
    /// book do not rewrite historical orders.
    pub shipping_address: Option<Json>,
    pub voucher_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub payment_transaction_id: Option<String>,
    pub subtotal: Decimal,
    pub gst_amount: Decimal,
    pub discount_amount: Decimal,
    pub commission: Decimal,
    /// Amount charged now; equals the order total at checkout time.
    pub deposit_amount: Decimal,
    pub remaining_due: Decimal,
    pub is_preorder_order: bool,
    pub created_at: DateTimeWithTimeZone,
    pub shipped_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::payment_transactions::Entity")]
    PaymentTransactions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::payment_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
