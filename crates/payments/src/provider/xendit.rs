use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use super::{PaymentProvider, PaymentSession, ProviderMode};
use crate::error::PaymentError;
use crate::request::PaymentRequest;

#[derive(Debug, Deserialize)]
struct InvoiceResponse {
    id: String,
    invoice_url: String,
    #[serde(default)]
    expiry_date: Option<String>,
    status: String,
}

/// Invoicing API client (`POST {api_url}/invoices`, HTTP Basic with the
/// API key as username and an empty password).
#[derive(Clone)]
pub struct XenditProvider {
    http: Client,
    api_url: String,
    api_key: Option<String>,
}

impl XenditProvider {
    pub const DEFAULT_API_URL: &'static str = "https://api.xendit.co/v2";
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Result<Self, PaymentError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                error!("[xendit] failed to build HTTP client: {}", e);
                PaymentError::Provider {
                    status: None,
                    message: format!("HTTP client setup failed: {}", e),
                }
            })?;
        Ok(Self::with_client(http, api_url, api_key))
    }

    pub fn with_client(http: Client, api_url: impl Into<String>, api_key: Option<String>) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn authorization(api_key: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:", api_key)))
    }
}

#[async_trait::async_trait]
impl PaymentProvider for XenditProvider {
    fn mode(&self) -> ProviderMode {
        ProviderMode::Remote
    }

    async fn create_payment_session(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentSession, PaymentError> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("[xendit] API key not configured");
            return Err(PaymentError::NotConfigured("Payment service".to_string()));
        };

        info!(
            "[xendit] creating invoice for order {} amount {} {}",
            request.external_id, request.amount, request.currency
        );

        let response = self
            .http
            .post(format!("{}/invoices", self.api_url))
            .header(reqwest::header::AUTHORIZATION, Self::authorization(api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("[xendit] request for order {} failed: {}", request.external_id, e);
                PaymentError::Provider {
                    status: None,
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            error!(
                "[xendit] invoice for order {} rejected with {}: {}",
                request.external_id, status, message
            );
            return Err(PaymentError::Provider {
                status: Some(status.as_u16()),
                message,
            });
        }

        let invoice: InvoiceResponse = response.json().await.map_err(|e| PaymentError::Provider {
            status: Some(status.as_u16()),
            message: format!("Malformed invoice response: {}", e),
        })?;

        info!(
            "[xendit] invoice {} created for order {} status {} url REDACTED",
            invoice.id, request.external_id, invoice.status
        );

        Ok(PaymentSession {
            url: Some(invoice.invoice_url),
            id: Some(invoice.id),
            expiry: invoice.expiry_date,
            status: invoice.status,
        })
    }
}
