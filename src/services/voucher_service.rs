use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::vouchers::{PurchaseVoucherRequest, VoucherList},
    entity::vouchers::{ActiveModel as VoucherActive, Column as VoucherCol, Entity as Vouchers},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Voucher,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

const CODE_ATTEMPTS: usize = 8;

/// Issue a fresh single-use voucher to the caller. Codes come from the
/// injected token source; collisions are retried and the unique index on
/// `code` is the final guard.
pub async fn purchase_voucher(
    state: &AppState,
    user: &AuthUser,
    payload: PurchaseVoucherRequest,
) -> AppResult<ApiResponse<Voucher>> {
    if payload.value <= Decimal::ZERO {
        return Err(AppError::BadRequest(
            "voucher value must be positive".into(),
        ));
    }

    let code = generate_unique_code(state).await?;

    let voucher = VoucherActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        code: Set(code),
        value: Set(payload.value),
        is_used: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "voucher_purchase",
        Some("vouchers"),
        Some(serde_json::json!({ "voucher_id": voucher.id, "value": voucher.value })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Voucher created",
        voucher.into(),
        Some(Meta::empty()),
    ))
}

async fn generate_unique_code(state: &AppState) -> AppResult<String> {
    for _ in 0..CODE_ATTEMPTS {
        let code = state.tokens.voucher_code();
        let taken = Vouchers::find()
            .filter(VoucherCol::Code.eq(code.clone()))
            .count(&state.orm)
            .await?;
        if taken == 0 {
            return Ok(code);
        }
    }
    Err(AppError::Internal(anyhow::anyhow!(
        "could not generate a unique voucher code"
    )))
}

pub async fn list_vouchers(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<VoucherList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Vouchers::find()
        .filter(VoucherCol::UserId.eq(user.user_id))
        .order_by_desc(VoucherCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Voucher::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "OK",
        VoucherList { items },
        Some(meta),
    ))
}
