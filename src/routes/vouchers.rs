use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::vouchers::{PurchaseVoucherRequest, VoucherList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Voucher,
    response::ApiResponse,
    routes::params::Pagination,
    services::voucher_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vouchers))
        .route("/purchase", post(purchase_voucher))
}

#[utoipa::path(
    post,
    path = "/api/vouchers/purchase",
    request_body = PurchaseVoucherRequest,
    responses(
        (status = 200, description = "Voucher issued", body = ApiResponse<Voucher>),
        (status = 400, description = "Non-positive value"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vouchers"
)]
pub async fn purchase_voucher(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PurchaseVoucherRequest>,
) -> AppResult<Json<ApiResponse<Voucher>>> {
    let resp = voucher_service::purchase_voucher(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vouchers",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List the caller's vouchers", body = ApiResponse<VoucherList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Vouchers"
)]
pub async fn list_vouchers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<VoucherList>>> {
    let resp = voucher_service::list_vouchers(&state, &user, pagination).await?;
    Ok(Json(resp))
}
