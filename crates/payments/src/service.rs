use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use farmxpress_database::DocumentStore;

use crate::actor::Actor;
use crate::engine::{ReconciliationEngine, ReconciliationOutcome};
use crate::env::{PaymentEnv, PaymentMode};
use crate::error::PaymentError;
use crate::provider::{ManualProvider, PaymentProvider, PaymentSession, XenditProvider};
use crate::request::{MultiSellerInput, PaymentInput, PaymentRequest, PaymentRequestBuilder};
use crate::webhook::WebhookPayload;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreated {
    pub success: bool,
    pub payment_url: Option<String>,
    pub payment_id: Option<String>,
    pub expiry_date: Option<String>,
    pub status: String,
}

impl From<PaymentSession> for PaymentCreated {
    fn from(session: PaymentSession) -> Self {
        Self {
            success: true,
            payment_url: session.url,
            payment_id: session.id,
            expiry_date: session.expiry,
            status: session.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerPaymentResult {
    pub seller_id: Option<String>,
    pub order_code: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSellerPaymentResult {
    pub success: bool,
    pub payments: Vec<SellerPaymentResult>,
    pub total_sellers: usize,
}

/// Entry points for payment creation, manual settlement and provider callbacks.
#[derive(Clone)]
pub struct PaymentService {
    builder: PaymentRequestBuilder,
    provider: Arc<dyn PaymentProvider>,
    engine: ReconciliationEngine,
}

impl PaymentService {
    pub fn new(
        builder: PaymentRequestBuilder,
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            builder,
            provider,
            engine: ReconciliationEngine::new(store),
        }
    }

    pub fn from_env(env: &PaymentEnv, store: Arc<dyn DocumentStore>) -> Result<Self, PaymentError> {
        let provider: Arc<dyn PaymentProvider> = match env.payment_mode {
            PaymentMode::Remote => {
                let xendit = XenditProvider::new(&env.xendit_api_url, env.xendit_api_key.clone())?;
                if !xendit.is_configured() {
                    error!("[PaymentService] XENDIT_API_KEY not set; payment creation will fail");
                }
                Arc::new(xendit)
            }
            PaymentMode::Manual => Arc::new(ManualProvider),
        };
        info!("[PaymentService] running with {:?} provider", env.payment_mode);
        Ok(Self::new(PaymentRequestBuilder::new(&env.frontend_url), provider, store))
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    async fn open_session(
        &self,
        request: &PaymentRequest,
        actor: &Actor,
    ) -> Result<PaymentSession, PaymentError> {
        let session = self.provider.create_payment_session(request).await?;
        self.engine
            .record_session(&request.external_id, &session, self.provider.mode(), actor)
            .await?;
        Ok(session)
    }

    pub async fn create_payment(
        &self,
        input: &PaymentInput,
        actor: &Actor,
    ) -> Result<PaymentCreated, PaymentError> {
        let request = self.builder.build(input)?;
        info!(
            "[create_payment] order {} amount {} by {}",
            request.external_id,
            request.amount,
            actor.audit_label()
        );
        Ok(self.open_session(&request, actor).await?.into())
    }

    /// Opens one session per seller. A failing seller is reported in its own
    /// result entry; the remaining sellers are still processed.
    pub async fn create_multi_seller_payment(
        &self,
        input: &MultiSellerInput,
        actor: &Actor,
    ) -> Result<MultiSellerPaymentResult, PaymentError> {
        let sellers = input.seller_payments.as_deref().unwrap_or_default();
        if sellers.is_empty() {
            return Err(PaymentError::validation("Missing seller payments"));
        }
        let name = input.customer_name.as_deref().map(str::trim).unwrap_or_default();
        let email = input.customer_email.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() || email.is_empty() {
            return Err(PaymentError::validation("Missing required payment information"));
        }

        let mut payments = Vec::with_capacity(sellers.len());
        for seller in sellers {
            let outcome = match self.builder.build_for_seller(seller, name, email) {
                Ok(request) => self.open_session(&request, actor).await,
                Err(e) => Err(e),
            };

            payments.push(match outcome {
                Ok(session) => SellerPaymentResult {
                    seller_id: seller.seller_id.clone(),
                    order_code: seller.order_code.clone(),
                    success: true,
                    payment_url: session.url,
                    payment_id: session.id,
                    expiry_date: session.expiry,
                    error: None,
                },
                Err(e) => {
                    error!(
                        "[create_multi_seller_payment] seller {:?} failed: {}",
                        seller.seller_id, e
                    );
                    SellerPaymentResult {
                        seller_id: seller.seller_id.clone(),
                        order_code: seller.order_code.clone(),
                        success: false,
                        payment_url: None,
                        payment_id: None,
                        expiry_date: None,
                        error: Some(e.to_string()),
                    }
                }
            });
        }

        Ok(MultiSellerPaymentResult {
            success: true,
            total_sellers: sellers.len(),
            payments,
        })
    }

    pub async fn mark_manual(
        &self,
        order_code: &str,
        actor: &Actor,
    ) -> Result<ReconciliationOutcome, PaymentError> {
        let order_code = order_code.trim();
        if order_code.is_empty() {
            return Err(PaymentError::validation("Missing order code"));
        }
        self.engine.mark_manual(order_code, actor).await
    }

    /// Applies an authenticated provider callback. Callbacks always act as
    /// `Actor::System`.
    pub async fn handle_webhook(
        &self,
        payload: WebhookPayload,
    ) -> Result<ReconciliationOutcome, PaymentError> {
        self.engine.apply_payload(payload, &Actor::System).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use farmxpress_database::MemoryStore;
    use serde_json::{json, Value};

    use crate::provider::ProviderMode;
    use crate::request::SellerPaymentInput;

    #[derive(Default)]
    struct FakeProvider {
        calls: AtomicUsize,
        reject_order: Option<String>,
    }

    #[async_trait::async_trait]
    impl PaymentProvider for FakeProvider {
        fn mode(&self) -> ProviderMode {
            ProviderMode::Remote
        }

        async fn create_payment_session(
            &self,
            request: &PaymentRequest,
        ) -> Result<PaymentSession, PaymentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject_order.as_deref() == Some(request.external_id.as_str()) {
                return Err(PaymentError::Provider {
                    status: Some(400),
                    message: "amount below minimum".to_string(),
                });
            }
            Ok(PaymentSession {
                url: Some(format!("https://checkout.example/{}", request.external_id)),
                id: Some(format!("inv_{}", request.external_id)),
                expiry: Some("2026-10-18T10:00:00.000Z".to_string()),
                status: "PENDING".to_string(),
            })
        }
    }

    async fn setup(provider: Arc<FakeProvider>) -> (Arc<MemoryStore>, PaymentService) {
        let store = Arc::new(MemoryStore::new());
        store.insert("orders", "a1", json!({ "orderCode": "A123456" })).await;
        store.insert("orders", "b1", json!({ "orderCode": "B1" })).await;
        store.insert("orders", "c1", json!({ "orderCode": "C1" })).await;
        store.insert("sales", "sa1", json!({ "orderCode": "A123456" })).await;
        let service = PaymentService::new(
            PaymentRequestBuilder::new("http://localhost:8080"),
            provider,
            store.clone(),
        );
        (store, service)
    }

    fn input() -> PaymentInput {
        PaymentInput {
            amount: Some(json!(250)),
            order_code: Some("A123456".to_string()),
            customer_name: Some("Maria".to_string()),
            customer_email: Some("maria@example.ph".to_string()),
            ..Default::default()
        }
    }

    fn seller(id: &str, order_code: &str, amount: Value) -> SellerPaymentInput {
        SellerPaymentInput {
            seller_id: Some(id.to_string()),
            amount: Some(amount),
            order_code: Some(order_code.to_string()),
            items: None,
        }
    }

    #[tokio::test]
    async fn test_create_payment_records_session() {
        let provider = Arc::new(FakeProvider::default());
        let (store, service) = setup(provider.clone()).await;
        let actor = Actor::User("buyer-1".to_string());

        let created = service.create_payment(&input(), &actor).await.unwrap();
        assert!(created.success);
        assert_eq!(created.payment_url.as_deref(), Some("https://checkout.example/A123456"));
        assert_eq!(created.payment_id.as_deref(), Some("inv_A123456"));
        assert_eq!(created.status, "PENDING");

        let order = store.get("orders", "a1").await.unwrap();
        assert_eq!(order["paymentStatus"], json!("pending"));
        assert_eq!(order["paymentLink"], json!("https://checkout.example/A123456"));
        assert_eq!(order["paymentUpdatedBy"], json!("user:buyer-1"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_provider_or_store() {
        let provider = Arc::new(FakeProvider::default());
        let (store, service) = setup(provider.clone()).await;

        let mut bad = input();
        bad.amount = Some(json!(-1));
        let err = service.create_payment(&bad, &Actor::System).await.unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(store.get("orders", "a1").await.unwrap().get("paymentStatus").is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_store_untouched() {
        let provider = Arc::new(FakeProvider {
            reject_order: Some("A123456".to_string()),
            ..Default::default()
        });
        let (store, service) = setup(provider).await;

        let err = service.create_payment(&input(), &Actor::System).await.unwrap_err();
        assert!(matches!(err, PaymentError::Provider { status: Some(400), .. }));
        assert!(store.get("orders", "a1").await.unwrap().get("paymentStatus").is_none());
    }

    #[tokio::test]
    async fn test_manual_provider_marks_availing() {
        let store = Arc::new(MemoryStore::new());
        store.insert("orders", "a1", json!({ "orderCode": "A123456" })).await;
        let service = PaymentService::new(
            PaymentRequestBuilder::new("http://localhost:8080"),
            Arc::new(ManualProvider),
            store.clone(),
        );

        let created = service.create_payment(&input(), &Actor::System).await.unwrap();
        assert_eq!(created.payment_url, None);
        assert_eq!(created.status, "availing");

        let order = store.get("orders", "a1").await.unwrap();
        assert_eq!(order["paymentStatus"], json!("availing"));
        assert_eq!(order["paymentMethod"], json!("gcash_manual"));
    }

    #[tokio::test]
    async fn test_multi_seller_collects_failures() {
        let provider = Arc::new(FakeProvider {
            reject_order: Some("C1".to_string()),
            ..Default::default()
        });
        let (store, service) = setup(provider.clone()).await;

        let result = service
            .create_multi_seller_payment(
                &MultiSellerInput {
                    seller_payments: Some(vec![
                        seller("s1", "B1", json!(150)),
                        seller("s2", "C1", json!(20)),
                        seller("s3", "D1", json!(0)),
                    ]),
                    customer_name: Some("Maria".to_string()),
                    customer_email: Some("maria@example.ph".to_string()),
                },
                &Actor::System,
            )
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.total_sellers, 3);
        assert!(result.payments[0].success);
        assert_eq!(result.payments[0].payment_id.as_deref(), Some("inv_B1"));
        assert!(!result.payments[1].success);
        assert_eq!(
            result.payments[1].error.as_deref(),
            Some("Payment service error: amount below minimum")
        );
        assert_eq!(result.payments[2].error.as_deref(), Some("Invalid payment amount"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

        assert_eq!(store.get("orders", "b1").await.unwrap()["paymentStatus"], json!("pending"));
        assert!(store.get("orders", "c1").await.unwrap().get("paymentStatus").is_none());
    }

    #[test]
    fn test_from_env_selects_provider() {
        let mut env = PaymentEnv {
            xendit_api_key: None,
            xendit_api_url: XenditProvider::DEFAULT_API_URL.to_string(),
            frontend_url: "http://localhost:8080".to_string(),
            webhook_token: None,
            payment_mode: PaymentMode::Remote,
            allow_unsigned_webhooks: false,
        };
        let remote = PaymentService::from_env(&env, Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(remote.provider.mode(), ProviderMode::Remote);

        env.payment_mode = PaymentMode::Manual;
        let manual = PaymentService::from_env(&env, Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(manual.provider.mode(), ProviderMode::Manual);
    }

    #[tokio::test]
    async fn test_multi_seller_requires_sellers() {
        let (_, service) = setup(Arc::new(FakeProvider::default())).await;
        let err = service
            .create_multi_seller_payment(&MultiSellerInput::default(), &Actor::System)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));
    }

    #[tokio::test]
    async fn test_mark_manual() {
        let (store, service) = setup(Arc::new(FakeProvider::default())).await;
        let outcome = service
            .mark_manual(" A123456 ", &Actor::User("admin-1".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome, ReconciliationOutcome::Applied { orders: 1, sales: 0 });
        let order = store.get("orders", "a1").await.unwrap();
        assert_eq!(order["paymentStatus"], json!("availing"));
        assert_eq!(order["paymentUpdatedBy"], json!("user:admin-1"));

        assert!(matches!(
            service.mark_manual("  ", &Actor::System).await,
            Err(PaymentError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_webhook_after_checkout() {
        let (store, service) = setup(Arc::new(FakeProvider::default())).await;
        service.create_payment(&input(), &Actor::System).await.unwrap();

        let payload: WebhookPayload = serde_json::from_value(json!({
            "external_id": "A123456",
            "status": "PAID",
            "paid_amount": 250,
            "payment_channel": "gcash"
        }))
        .unwrap();
        let outcome = service.handle_webhook(payload).await.unwrap();
        assert_eq!(outcome, ReconciliationOutcome::Applied { orders: 1, sales: 1 });

        let order = store.get("orders", "a1").await.unwrap();
        assert_eq!(order["paymentStatus"], json!("paid"));
        assert_eq!(order["paidAmount"], json!(250.0));
        assert_eq!(order["paymentUpdatedBy"], json!("system"));
        assert_eq!(store.get("sales", "sa1").await.unwrap()["paymentStatus"], json!("paid"));
    }
}
