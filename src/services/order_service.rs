use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses},
        cart_items::{Column as CartCol, Entity as CartItems},
        categories::Entity as Categories,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        vouchers::{Column as VoucherCol, Entity as Vouchers},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, Order, OrderItem},
    pricing::{self, PricedLine},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    status::{OrderStatus, PaymentStatus},
};

/// Convert the caller's cart into an immutable, fully priced order.
///
/// Runs as a single transaction: stock validation, stock decrement, order and
/// item materialization, pricing, voucher redemption and cart clearing either
/// all happen or none do. Product rows are locked and both the stock
/// decrement and the voucher flip are conditional updates, so two checkouts
/// racing for the last unit or the same code cannot both win.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let commission_rate = state.settings.commission_rate().await;
    let txn = state.orm.begin().await?;

    let cart_lines = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .all(&txn)
        .await?;
    if cart_lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let address = Addresses::find_by_id(payload.address_id)
        .filter(AddressCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or(AppError::Forbidden)?;

    let voucher = match payload.voucher_code.as_deref().filter(|c| !c.is_empty()) {
        Some(code) => {
            let voucher = Vouchers::find()
                .filter(VoucherCol::Code.eq(code))
                .filter(VoucherCol::UserId.eq(user.user_id))
                .lock(LockType::Update)
                .one(&txn)
                .await?
                .ok_or(AppError::InvalidVoucher)?;
            if voucher.is_used {
                return Err(AppError::InvalidVoucher);
            }
            Some(voucher)
        }
        None => None,
    };

    // Lock every product the cart references for the rest of the transaction.
    let product_ids: Vec<Uuid> = cart_lines.iter().map(|line| line.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let category_ids: Vec<Uuid> = products
        .values()
        .filter_map(|p| p.category_id)
        .collect();
    let gst_rates: HashMap<Uuid, Decimal> = Categories::find()
        .filter(crate::entity::categories::Column::Id.is_in(category_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| (c.id, c.gst_rate))
        .collect();

    // Stock must cover every standard line before anything is written.
    // Pre-order lines are purchasable regardless of stock.
    for line in &cart_lines {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| AppError::BadRequest("Product no longer exists".into()))?;
        if !product.is_preorder && product.stock < line.qty {
            return Err(AppError::InsufficientStock(product.title.clone()));
        }
    }

    let shipping_snapshot = serde_json::to_value(Address::from(address.clone()))
        .map_err(anyhow::Error::from)?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        shipping_address_id: Set(Some(address.id)),
        shipping_address: Set(Some(shipping_snapshot)),
        voucher_id: Set(voucher.as_ref().map(|v| v.id)),
        status: Set(OrderStatus::Pending.as_str().into()),
        payment_status: Set(PaymentStatus::Pending.as_str().into()),
        payment_method: Set(None),
        payment_transaction_id: Set(None),
        subtotal: Set(Decimal::ZERO),
        gst_amount: Set(Decimal::ZERO),
        discount_amount: Set(Decimal::ZERO),
        commission: Set(Decimal::ZERO),
        deposit_amount: Set(Decimal::ZERO),
        remaining_due: Set(Decimal::ZERO),
        is_preorder_order: Set(false),
        created_at: NotSet,
        shipped_at: Set(None),
    }
    .insert(&txn)
    .await?;

    let mut priced_lines: Vec<PricedLine> = Vec::with_capacity(cart_lines.len());
    let mut order_items: Vec<OrderItem> = Vec::with_capacity(cart_lines.len());

    for line in &cart_lines {
        let product = &products[&line.product_id];
        let gst_rate = product
            .category_id
            .and_then(|id| gst_rates.get(&id).copied())
            .unwrap_or(Decimal::ZERO);

        if !product.is_preorder {
            // Guarded decrement: loses cleanly if a concurrent checkout took
            // the remaining stock between validation and here.
            let updated = Products::update_many()
                .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.qty))
                .filter(ProdCol::Id.eq(product.id))
                .filter(ProdCol::Stock.gte(line.qty))
                .exec(&txn)
                .await?;
            if updated.rows_affected != 1 {
                return Err(AppError::InsufficientStock(product.title.clone()));
            }
        }

        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            title_snapshot: Set(product.title.clone()),
            price_snapshot: Set(line.price_snapshot),
            gst_rate_snapshot: Set(gst_rate),
            deposit_snapshot: Set(line.deposit_snapshot),
            qty: Set(line.qty),
            is_prebook: Set(product.is_preorder),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(item.into());

        priced_lines.push(PricedLine {
            qty: line.qty,
            unit_price: line.price_snapshot,
            gst_rate,
            is_preorder: product.is_preorder,
            deposit_snapshot: line.deposit_snapshot,
        });
    }

    // Redeem the voucher with a guarded flip; exactly one checkout may spend
    // a code, any concurrent attempt aborts here.
    let voucher_value = match &voucher {
        Some(v) => {
            let redeemed = Vouchers::update_many()
                .col_expr(VoucherCol::IsUsed, Expr::value(true))
                .filter(VoucherCol::Id.eq(v.id))
                .filter(VoucherCol::IsUsed.eq(false))
                .exec(&txn)
                .await?;
            if redeemed.rows_affected != 1 {
                return Err(AppError::InvalidVoucher);
            }
            Some(v.value)
        }
        None => None,
    };

    let totals = pricing::order_totals(&priced_lines, voucher_value, commission_rate);

    let mut active: OrderActive = order.into();
    active.subtotal = Set(totals.subtotal);
    active.gst_amount = Set(totals.gst_amount);
    active.discount_amount = Set(totals.discount_amount);
    active.commission = Set(totals.commission);
    active.deposit_amount = Set(totals.deposit_amount);
    active.remaining_due = Set(totals.remaining_due);
    active.is_preorder_order = Set(totals.is_preorder_order);
    let order = active.update(&txn).await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "deposit_amount": order.deposit_amount,
            "is_preorder_order": order.is_preorder_order,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order.into(),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}
