use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use tracing::{info, warn};

use farmxpress_payments::{
    PaymentError, ReconciliationOutcome, WebhookAuthenticator, WebhookPayload, CALLBACK_TOKEN_HEADER,
};

use crate::{
    response::{plain, webhook_failure},
    GlobalState,
};

pub fn webhook_routes() -> Router<GlobalState> {
    Router::new()
        .route("/webhooks/xendit", any(xendit_webhook))
}

async fn xendit_webhook(
    State(state): State<GlobalState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let header_token = headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    let received = WebhookAuthenticator::received_token(header_token, &query);
    if let Err(e) = state.webhook_auth.verify(received) {
        return webhook_failure(&e);
    }

    if method != Method::POST {
        info!("[xendit_webhook] {} health check acknowledged", method);
        return plain(StatusCode::OK, "Webhook OK");
    }

    let payload: WebhookPayload = if body.is_empty() {
        WebhookPayload::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("[xendit_webhook] unreadable payload: {}", e);
                return webhook_failure(&PaymentError::validation("Invalid webhook payload"));
            }
        }
    };

    info!(
        "[xendit_webhook] external_id {:?} status {:?}",
        payload.external_id, payload.status
    );

    match state.payments.handle_webhook(payload).await {
        Ok(ReconciliationOutcome::NoMatch) => plain(StatusCode::OK, "No matching order; acknowledged"),
        Ok(ReconciliationOutcome::Applied { .. }) => plain(StatusCode::OK, "Webhook processed"),
        Err(e) => webhook_failure(&e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use farmxpress_database::MemoryStore;
    use farmxpress_payments::{ManualProvider, PaymentRequestBuilder, PaymentService};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::app_router;

    async fn router(secret: Option<&str>, allow_unsigned: bool) -> (Arc<MemoryStore>, Router) {
        let store = Arc::new(MemoryStore::new());
        store.insert("orders", "a1", json!({ "orderCode": "A123456" })).await;
        store.insert("sales", "sa1", json!({ "orderCode": "A123456" })).await;
        store
            .insert("orders", "x1", json!({ "orderCode": "X1", "groupOrderCode": "G9001" }))
            .await;
        store
            .insert("orders", "x2", json!({ "orderCode": "X2", "groupOrderCode": "G9001" }))
            .await;
        let payments = PaymentService::new(
            PaymentRequestBuilder::new("http://localhost:8080"),
            Arc::new(ManualProvider),
            store.clone(),
        );
        let state = GlobalState::new(payments, WebhookAuthenticator::new(secret, allow_unsigned), false);
        (store, app_router(state))
    }

    fn webhook(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(CALLBACK_TOKEN_HEADER, token);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn paid() -> Value {
        json!({
            "external_id": "A123456",
            "status": "PAID",
            "paid_amount": 250,
            "payment_channel": "gcash"
        })
    }

    #[tokio::test]
    async fn test_paid_webhook_updates_order_and_sale() {
        let (store, router) = router(Some("abc"), false).await;
        let response = router
            .oneshot(webhook("POST", "/webhooks/xendit", Some("  abc "), Some(paid())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "Webhook processed");

        let order = store.get("orders", "a1").await.unwrap();
        assert_eq!(order["paymentStatus"], json!("paid"));
        assert_eq!(order["payStatus"], json!("paid"));
        assert_eq!(order["paidAmount"], json!(250.0));
        assert_eq!(order["paymentMethod"], json!("gcash"));
        assert_eq!(store.get("sales", "sa1").await.unwrap()["paymentStatus"], json!("paid"));
    }

    #[tokio::test]
    async fn test_group_expiry_via_query_token() {
        let (store, router) = router(Some("abc"), false).await;
        let response = router
            .oneshot(webhook(
                "POST",
                "/webhooks/xendit?token=abc",
                None,
                Some(json!({ "external_id": "G9001", "status": "EXPIRED" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        for id in ["x1", "x2"] {
            let order = store.get("orders", id).await.unwrap();
            assert_eq!(order["paymentStatus"], json!("expired"));
            assert!(order.get("paidAmount").is_none());
        }
    }

    #[tokio::test]
    async fn test_missing_or_wrong_token_is_unauthorized() {
        let (store, router) = router(Some("abc"), false).await;

        let response = router
            .clone()
            .oneshot(webhook("POST", "/webhooks/xendit", None, Some(paid())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(text(response).await, "Unauthorized");

        let response = router
            .oneshot(webhook("POST", "/webhooks/xendit", Some("wrong"), Some(paid())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(store.get("orders", "a1").await.unwrap().get("paymentStatus").is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_secret_rejects_unless_opted_in() {
        let (_, strict) = router(None, false).await;
        let response = strict
            .oneshot(webhook("POST", "/webhooks/xendit", Some("abc"), Some(paid())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let (_, permissive) = router(None, true).await;
        let response = permissive
            .oneshot(webhook("POST", "/webhooks/xendit", None, Some(paid())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_health_check_is_acknowledged_after_auth() {
        let (_, router) = router(Some("abc"), false).await;
        let response = router
            .clone()
            .oneshot(webhook("GET", "/webhooks/xendit?x-callback-token=abc", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "Webhook OK");

        let response = router
            .oneshot(webhook("GET", "/webhooks/xendit", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_external_id_is_bad_request() {
        let (_, router) = router(Some("abc"), false).await;
        let response = router
            .oneshot(webhook(
                "POST",
                "/webhooks/xendit",
                Some("abc"),
                Some(json!({ "status": "PAID", "paid_amount": 1 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text(response).await, "Missing external_id");
    }

    #[tokio::test]
    async fn test_unmatched_external_id_is_acknowledged() {
        let (_, router) = router(Some("abc"), false).await;
        let response = router
            .oneshot(webhook(
                "POST",
                "/webhooks/xendit",
                Some("abc"),
                Some(json!({ "external_id": "invoice_123124123", "status": "PAID", "paid_amount": 1 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "No matching order; acknowledged");
    }

    #[tokio::test]
    async fn test_unmatched_ping_without_amount_or_status_is_acknowledged() {
        let (store, router) = router(Some("abc"), false).await;
        for body in [
            json!({ "external_id": "invoice_123124123", "status": "PAID" }),
            json!({ "external_id": "invoice_123124123" }),
        ] {
            let response = router
                .clone()
                .oneshot(webhook("POST", "/webhooks/xendit", Some("abc"), Some(body)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(text(response).await, "No matching order; acknowledged");
        }
        assert!(store.get("orders", "a1").await.unwrap().get("paymentStatus").is_none());
    }

    #[tokio::test]
    async fn test_matched_paid_event_without_amount_is_bad_request() {
        let (_, router) = router(Some("abc"), false).await;
        let response = router
            .oneshot(webhook(
                "POST",
                "/webhooks/xendit",
                Some("abc"),
                Some(json!({ "external_id": "A123456", "status": "PAID" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text(response).await, "Missing paid_amount");
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        let (store, router) = router(Some("abc"), false).await;
        store.fail_next_commit();
        let response = router
            .oneshot(webhook("POST", "/webhooks/xendit", Some("abc"), Some(paid())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(response).await, "Error processing webhook");
        assert!(store.get("orders", "a1").await.unwrap().get("paymentStatus").is_none());
    }
}
