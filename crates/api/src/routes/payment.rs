use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::post,
    Json, Router,
};
use serde_json::json;

use farmxpress_payments::{
    MultiSellerInput, MultiSellerPaymentResult, PaymentCreated, PaymentInput, ReconciliationOutcome,
};

use crate::{
    middleware::{authenticate, CallerIdentity},
    response::{AppError, AppSuccess},
    GlobalState,
};

pub fn payment_routes() -> Router<GlobalState> {
    Router::new()
        .route("/payments/gcash",
            post(create_gcash_payment)
            .route_layer(middleware::from_fn(authenticate))
        )
        .route("/payments/multi-seller",
            post(create_multi_seller_payment)
            .route_layer(middleware::from_fn(authenticate))
        )
        .route("/payments/manual/{order_code}",
            post(mark_manual_payment)
            .route_layer(middleware::from_fn(authenticate))
        )
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, anyhow!(e.body_text())))
}

async fn create_gcash_payment(
    State(state): State<GlobalState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<PaymentInput>, JsonRejection>,
) -> Result<Json<PaymentCreated>, AppError> {
    let actor = state.actor_for(&caller)?;
    let input = json_body(payload)?;

    let created = state.payments.create_payment(&input, &actor).await?;
    Ok(Json(created))
}

async fn create_multi_seller_payment(
    State(state): State<GlobalState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<MultiSellerInput>, JsonRejection>,
) -> Result<Json<MultiSellerPaymentResult>, AppError> {
    let actor = state.actor_for(&caller)?;
    let input = json_body(payload)?;

    let result = state.payments.create_multi_seller_payment(&input, &actor).await?;
    Ok(Json(result))
}

async fn mark_manual_payment(
    State(state): State<GlobalState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(order_code): Path<String>,
) -> Result<AppSuccess, AppError> {
    let actor = state.actor_for(&caller)?;

    match state.payments.mark_manual(&order_code, &actor).await? {
        ReconciliationOutcome::NoMatch => Err(AppError::new(
            StatusCode::NOT_FOUND,
            anyhow!("[mark_manual_payment] no orders found for {}", order_code),
        )),
        ReconciliationOutcome::Applied { orders, .. } => Ok(AppSuccess::new(
            StatusCode::OK,
            "Manual payment recorded",
            json!({ "orderCode": order_code, "updatedOrders": orders }),
        )),
    }
}
