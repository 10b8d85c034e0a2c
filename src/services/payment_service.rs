use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::payments::{
        CallbackAck, InitiatePaymentRequest, InitiatePaymentResponse, PaymentStatusResponse,
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        payment_transactions::{
            ActiveModel as TransactionActive, Column as TransactionCol,
            Entity as PaymentTransactions,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    gateway,
    middleware::auth::AuthUser,
    models::PaymentTransaction,
    response::{ApiResponse, Meta},
    state::AppState,
    status::{OrderStatus, PaymentStatus, TransactionStatus},
};

/// Open a payment attempt against an order. The order moves to `processing`
/// and a fresh `initiated` transaction row records the attempt; retries after
/// a failure simply create another row.
pub async fn initiate_payment(
    state: &AppState,
    user: &AuthUser,
    payload: InitiatePaymentRequest,
) -> AppResult<ApiResponse<InitiatePaymentResponse>> {
    if !gateway::is_supported(&payload.gateway) {
        return Err(AppError::BadRequest(format!(
            "Unsupported payment gateway: {}",
            payload.gateway
        )));
    }

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(OrderCol::Id.eq(payload.order_id))
        .filter(OrderCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.payment_status == PaymentStatus::Completed.as_str() {
        return Err(AppError::AlreadyPaid);
    }

    let transaction_id = state.tokens.transaction_id(&payload.gateway);

    TransactionActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        transaction_id: Set(transaction_id.clone()),
        gateway: Set(payload.gateway.clone()),
        amount: Set(order.deposit_amount),
        currency: Set("INR".into()),
        status: Set(TransactionStatus::Initiated.as_str().into()),
        gateway_response: Set(None),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let order_id = order.id;
    let amount = order.deposit_amount;
    let mut active: OrderActive = order.into();
    active.payment_status = Set(PaymentStatus::Processing.as_str().into());
    active.payment_method = Set(Some(payload.gateway.clone()));
    active.payment_transaction_id = Set(Some(transaction_id.clone()));
    active.update(&txn).await?;

    txn.commit().await?;

    let gateway_data = prepare_gateway_data(state, user.user_id, &payload.gateway, &transaction_id)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "gateway prefill lookup failed");
            serde_json::json!({})
        });

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_initiated",
        Some("payment_transactions"),
        Some(serde_json::json!({ "order_id": order_id, "transaction_id": transaction_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment initiated",
        InitiatePaymentResponse {
            transaction_id,
            order_id,
            amount,
            currency: "INR".into(),
            gateway: payload.gateway,
            gateway_data,
        },
        Some(Meta::empty()),
    ))
}

/// Initiation data the frontend hands to the gateway SDK. Real credentials
/// come from deployment configuration; this fills in the shape the gateways
/// expect.
async fn prepare_gateway_data(
    state: &AppState,
    user_id: Uuid,
    gateway: &str,
    transaction_id: &str,
) -> AppResult<Value> {
    let user = Users::find_by_id(user_id).one(&state.orm).await?;
    let prefill = match user {
        Some(u) => serde_json::json!({ "name": u.name, "email": u.email, "phone": u.phone }),
        None => serde_json::json!({}),
    };

    Ok(serde_json::json!({
        "order_id": transaction_id,
        "callback_url": format!("/api/payments/callback/{gateway}"),
        "prefill": prefill,
    }))
}

/// Apply a gateway callback. Replays are safe: once the transaction is
/// terminal the stored outcome is returned without touching anything.
/// A verification failure is recorded as a failed payment, not surfaced as an
/// error; the gateway always gets a definite acknowledgment.
pub async fn handle_callback(
    state: &AppState,
    gateway_name: &str,
    payload: Value,
) -> AppResult<ApiResponse<CallbackAck>> {
    let transaction_id = payload
        .get("transaction_id")
        .or_else(|| payload.get("txnid"))
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::BadRequest("Transaction ID is missing in callback data".into()))?;

    let txn = state.orm.begin().await?;

    let transaction = PaymentTransactions::find()
        .filter(TransactionCol::TransactionId.eq(transaction_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    // Gateways retry callbacks; a terminal transaction short-circuits to the
    // previously recorded result.
    if TransactionStatus::is_terminal(&transaction.status) {
        let ack = CallbackAck {
            status: transaction.status.clone(),
            order_id: transaction.order_id,
        };
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Callback already processed",
            ack,
            Some(Meta::empty()),
        ));
    }

    let order = Orders::find_by_id(transaction.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let verified = state.verifier.verify(gateway_name, &payload);

    let order_id = order.id;
    let mut order_active: OrderActive = order.into();
    let mut transaction_active: TransactionActive = transaction.into();
    transaction_active.gateway_response = Set(Some(payload.clone()));

    let ack_status = if verified {
        transaction_active.status = Set(TransactionStatus::Success.as_str().into());
        order_active.payment_status = Set(PaymentStatus::Completed.as_str().into());
        order_active.status = Set(OrderStatus::Paid.as_str().into());
        TransactionStatus::Success
    } else {
        transaction_active.status = Set(TransactionStatus::Failed.as_str().into());
        order_active.payment_status = Set(PaymentStatus::Failed.as_str().into());
        TransactionStatus::Failed
    };

    transaction_active.update(&txn).await?;
    order_active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "payment_callback",
        Some("payment_transactions"),
        Some(serde_json::json!({
            "order_id": order_id,
            "transaction_id": transaction_id,
            "gateway": gateway_name,
            "verified": verified,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Callback processed",
        CallbackAck {
            status: ack_status.as_str().into(),
            order_id,
        },
        Some(Meta::empty()),
    ))
}

pub async fn payment_status(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<PaymentStatusResponse>> {
    let order = Orders::find()
        .filter(OrderCol::Id.eq(order_id))
        .filter(OrderCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let transactions = PaymentTransactions::find()
        .filter(TransactionCol::OrderId.eq(order.id))
        .order_by_desc(TransactionCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PaymentTransaction::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        PaymentStatusResponse {
            order_id: order.id,
            payment_status: order.payment_status,
            order_status: order.status,
            total_amount: order.deposit_amount,
            transactions,
        },
        Some(Meta::empty()),
    ))
}
