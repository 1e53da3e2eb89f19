use tracing::info;

use super::{PaymentProvider, PaymentSession, ProviderMode};
use crate::error::PaymentError;
use crate::request::PaymentRequest;
use crate::status::PaymentStatus;

#[derive(Debug, Clone, Default)]
pub struct ManualProvider;

#[async_trait::async_trait]
impl PaymentProvider for ManualProvider {
    fn mode(&self) -> ProviderMode {
        ProviderMode::Manual
    }

    async fn create_payment_session(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentSession, PaymentError> {
        info!("[manual_provider] offline settlement for order {}", request.external_id);
        Ok(PaymentSession {
            url: None,
            id: None,
            expiry: None,
            status: PaymentStatus::Availing.to_string(),
        })
    }
}
