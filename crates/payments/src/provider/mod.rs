mod manual;
mod xendit;

use serde::Serialize;

use crate::error::PaymentError;
use crate::request::PaymentRequest;

pub use manual::ManualProvider;
pub use xendit::XenditProvider;

/// A payment session as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub url: Option<String>,
    pub id: Option<String>,
    pub expiry: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    /// Sessions live at the invoicing API; orders wait in `pending`.
    Remote,
    /// No external call; orders wait in `availing` for a human to settle.
    Manual,
}

#[async_trait::async_trait]
pub trait PaymentProvider: Send + Sync + 'static {
    fn mode(&self) -> ProviderMode;

    /// Creates one payment session. Never retried: a retry could open a
    /// second invoice for the same order.
    async fn create_payment_session(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentSession, PaymentError>;
}
