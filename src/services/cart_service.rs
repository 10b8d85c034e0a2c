use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartCol, Entity as CartItems},
        categories::{Column as CategoryCol, Entity as Categories},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    pricing,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_desc(CartCol::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let category_ids: Vec<Uuid> = rows
        .iter()
        .filter_map(|(_, product)| product.as_ref().and_then(|p| p.category_id))
        .collect();
    let gst_rates: HashMap<Uuid, Decimal> = Categories::find()
        .filter(CategoryCol::Id.is_in(category_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|c| (c.id, c.gst_rate))
        .collect();

    let mut items = Vec::with_capacity(rows.len());
    let mut total = Decimal::ZERO;
    for (line, product) in rows {
        let product = match product {
            Some(p) => p,
            None => continue,
        };
        let gst_rate = product
            .category_id
            .and_then(|id| gst_rates.get(&id).copied())
            .unwrap_or(Decimal::ZERO);
        let subtotal = pricing::line_subtotal(line.qty, line.price_snapshot);
        let gst_amount = pricing::line_gst(subtotal, gst_rate);
        total += subtotal;

        items.push(CartItemDto {
            id: line.id,
            qty: line.qty,
            price_snapshot: line.price_snapshot,
            deposit_snapshot: line.deposit_snapshot,
            subtotal,
            gst_amount,
            product: product.into(),
        });
    }

    Ok(ApiResponse::success(
        "OK",
        CartList { items, total },
        Some(Meta::empty()),
    ))
}

/// Add a product to the cart, capturing price and deposit snapshots. Adding a
/// product already in the cart bumps the quantity but keeps the original
/// snapshots; re-add after removing to pick up a new catalog price.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.qty < 1 {
        return Err(AppError::BadRequest("qty must be at least 1".into()));
    }

    let product = Products::find_by_id(payload.product_id)
        .filter(ProdCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("product not found".into()))?;

    let existing = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(payload.product_id))
        .one(&state.orm)
        .await?;

    let cart_item = if let Some(item) = existing {
        let qty = item.qty + payload.qty;
        let mut active: CartItemActive = item.into();
        active.qty = Set(qty);
        active.update(&state.orm).await?
    } else {
        let gst_rate = match product.category_id {
            Some(id) => Categories::find_by_id(id)
                .one(&state.orm)
                .await?
                .map(|c| c.gst_rate)
                .unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        };
        // Amount payable now per unit: deposit for pre-orders, tax-inclusive
        // price otherwise.
        let deposit_snapshot = if product.is_preorder {
            product.preorder_deposit
        } else {
            product.price + pricing::line_gst(product.price, gst_rate)
        };

        CartItemActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.user_id),
            product_id: Set(product.id),
            qty: Set(payload.qty),
            price_snapshot: Set(product.price),
            deposit_snapshot: Set(deposit_snapshot),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "qty": payload.qty })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("OK", cart_item.into(), None))
}

/// Set an existing line's quantity; zero or less removes the line.
pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartList>> {
    let item = CartItems::find_by_id(payload.item_id)
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if payload.qty <= 0 {
        CartItems::delete_by_id(item.id).exec(&state.orm).await?;
    } else {
        let product = Products::find_by_id(item.product_id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?;
        if !product.is_preorder && product.stock < payload.qty {
            return Err(AppError::InsufficientStock(product.title));
        }
        let mut active: CartItemActive = item.into();
        active.qty = Set(payload.qty);
        active.update(&state.orm).await?;
    }

    list_cart(state, user).await
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
