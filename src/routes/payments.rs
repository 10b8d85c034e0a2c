use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::payments::{CallbackAck, InitiatePaymentRequest, InitiatePaymentResponse, PaymentStatusResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/initiate", post(initiate_payment))
        .route("/callback/{gateway}", post(payment_callback))
        .route("/status/{order_id}", get(payment_status))
}

#[utoipa::path(
    post,
    path = "/api/payments/initiate",
    request_body = InitiatePaymentRequest,
    responses(
        (status = 200, description = "Payment attempt opened", body = ApiResponse<InitiatePaymentResponse>),
        (status = 400, description = "Unsupported gateway or order already paid"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn initiate_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<InitiatePaymentRequest>,
) -> AppResult<Json<ApiResponse<InitiatePaymentResponse>>> {
    let resp = payment_service::initiate_payment(&state, &user, payload).await?;
    Ok(Json(resp))
}

// No auth: the request originates from the gateway's servers, authenticity is
// established by signature verification instead.
#[utoipa::path(
    post,
    path = "/api/payments/callback/{gateway}",
    params(
        ("gateway" = String, Path, description = "Gateway name")
    ),
    responses(
        (status = 200, description = "Callback acknowledged", body = ApiResponse<CallbackAck>),
        (status = 404, description = "Unknown transaction"),
    ),
    tag = "Payments"
)]
pub async fn payment_callback(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> AppResult<Json<ApiResponse<CallbackAck>>> {
    let resp = payment_service::handle_callback(&state, &gateway, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/payments/status/{order_id}",
    params(
        ("order_id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Payment status with transaction history", body = ApiResponse<PaymentStatusResponse>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn payment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentStatusResponse>>> {
    let resp = payment_service::payment_status(&state, &user, order_id).await?;
    Ok(Json(resp))
}
