use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

use farmxpress_common::{blake3_hash, CryptoHash};

use crate::error::PaymentError;

pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

/// Checks the callback token sent along with provider webhooks.
///
/// The token is read from the `x-callback-token` header, falling back to the
/// `token` or `x-callback-token` query parameters. Both sides are trimmed.
#[derive(Debug, Clone)]
pub struct WebhookAuthenticator {
    expected: Option<CryptoHash>,
    allow_unsigned: bool,
}

impl WebhookAuthenticator {
    pub fn new(expected: Option<&str>, allow_unsigned: bool) -> Self {
        let expected = expected
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| blake3_hash(s.as_bytes()));
        Self {
            expected,
            allow_unsigned,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.expected.is_some()
    }

    /// Picks the received token: a non-empty header wins over the query string.
    pub fn received_token<'a>(
        header: Option<&'a str>,
        query: &'a HashMap<String, String>,
    ) -> Option<&'a str> {
        let non_empty = |s: &'a str| Some(s.trim()).filter(|s| !s.is_empty());

        header.and_then(non_empty).or_else(|| {
            ["token", CALLBACK_TOKEN_HEADER]
                .iter()
                .find_map(|key| query.get(*key).map(String::as_str).and_then(non_empty))
        })
    }

    pub fn verify(&self, received: Option<&str>) -> Result<(), PaymentError> {
        let Some(expected) = &self.expected else {
            if self.allow_unsigned {
                return Ok(());
            }
            warn!("[WebhookAuthenticator] no callback token configured; rejecting");
            return Err(PaymentError::Auth);
        };

        let received = received.map(str::trim).filter(|s| !s.is_empty());
        match received {
            Some(token) if blake3_hash(token.as_bytes()) == *expected => Ok(()),
            Some(_) => {
                warn!("[WebhookAuthenticator] callback token mismatch");
                Err(PaymentError::Auth)
            }
            None => {
                warn!("[WebhookAuthenticator] callback token missing");
                Err(PaymentError::Auth)
            }
        }
    }
}

fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Invoice callback body. Only the fields reconciliation reads are modeled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_channel: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub paid_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}
