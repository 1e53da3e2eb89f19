use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical payment status as stored on orders and sales.
///
/// Provider vocabulary grows over time, so statuses we do not model are kept
/// verbatim (lowercased) in `Other` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Availing,
    Paid,
    Failed,
    Expired,
    Other(String),
}

impl PaymentStatus {
    /// Maps a raw provider status to its canonical form: `"PAID"` is paid,
    /// anything else is lowercased.
    pub fn canonicalize(raw: &str) -> Self {
        if raw == "PAID" {
            return PaymentStatus::Paid;
        }
        Self::from_canonical(&raw.to_lowercase())
    }

    fn from_canonical(s: &str) -> Self {
        match s {
            "pending" => PaymentStatus::Pending,
            "availing" => PaymentStatus::Availing,
            "paid" => PaymentStatus::Paid,
            "failed" => PaymentStatus::Failed,
            "expired" => PaymentStatus::Expired,
            other => PaymentStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Availing => "availing",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Other(s) => s,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> Self {
        Self::from_canonical(&s)
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

pub const PREORDER_DEPOSIT: &str = "preorder_deposit";

/// Which set of order fields a payment event writes. An event writes
/// exactly one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTrack {
    Full,
    Deposit,
}

impl PaymentTrack {
    /// Reads the discriminator from caller metadata (`paymentType` or `type`).
    pub fn from_metadata(metadata: Option<&Map<String, Value>>) -> Self {
        let is_deposit = metadata
            .map(|m| {
                ["paymentType", "type"]
                    .iter()
                    .any(|key| m.get(*key).and_then(Value::as_str) == Some(PREORDER_DEPOSIT))
            })
            .unwrap_or(false);

        if is_deposit {
            PaymentTrack::Deposit
        } else {
            PaymentTrack::Full
        }
    }
}
