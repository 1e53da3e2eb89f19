use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use farmxpress_database::DbObject;

use crate::status::PaymentStatus;

/// Field names as they appear in the `orders` and `sales` collections.
pub mod fields {
    pub const ORDER_CODE: &str = "orderCode";
    pub const GROUP_ORDER_CODE: &str = "groupOrderCode";
    pub const STATUS: &str = "status";

    pub const PAYMENT_STATUS: &str = "paymentStatus";
    pub const PAY_STATUS: &str = "payStatus";
    pub const PAID_AMOUNT: &str = "paidAmount";
    pub const PAID_AT: &str = "paidAt";

    pub const DEPOSIT_STATUS: &str = "depositStatus";
    pub const DEPOSIT_PAID_AMOUNT: &str = "depositPaidAmount";
    pub const DEPOSIT_PAID_AT: &str = "depositPaidAt";

    pub const PAYMENT_LINK: &str = "paymentLink";
    pub const PAYMENT_ID: &str = "paymentId";
    pub const PAYMENT_METHOD: &str = "paymentMethod";
    pub const PAYMENT_CREATED_AT: &str = "paymentCreatedAt";
    pub const PAYMENT_UPDATED_AT: &str = "paymentUpdatedAt";
    pub const PAYMENT_UPDATED_BY: &str = "paymentUpdatedBy";
}

pub const STATUS_RESERVED: &str = "Reserved";
pub const STATUS_CANCELLED: &str = "Cancelled";

// Only a literal `true` marks a pre-order; strings and numbers do not.
fn strict_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

/// One buyer line-item purchase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(skip)]
    pub id: String,

    #[serde(default)]
    pub order_code: Option<String>,
    #[serde(default)]
    pub group_order_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "strict_true")]
    pub is_pre_order: bool,

    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub pay_status: Option<String>,
    #[serde(default)]
    pub paid_amount: Option<Value>,
    #[serde(default)]
    pub paid_at: Option<Value>,

    #[serde(default)]
    pub deposit_status: Option<PaymentStatus>,
    #[serde(default)]
    pub deposit_paid_amount: Option<Value>,
    #[serde(default)]
    pub deposit_paid_at: Option<Value>,

    #[serde(default)]
    pub payment_link: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl Order {
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some(STATUS_CANCELLED)
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status.as_ref().map(PaymentStatus::is_paid).unwrap_or(false)
            && self.paid_at.as_ref().map(|v| !v.is_null()).unwrap_or(false)
    }

    pub fn is_deposit_paid(&self) -> bool {
        self.deposit_status.as_ref().map(PaymentStatus::is_paid).unwrap_or(false)
            && self.deposit_paid_at.as_ref().map(|v| !v.is_null()).unwrap_or(false)
    }
}

impl DbObject for Order {
    const COLLECTION_NAME: &'static str = "orders";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Reporting mirror of an order's payment state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(skip)]
    pub id: String,

    #[serde(default)]
    pub order_code: Option<String>,
    #[serde(default)]
    pub group_order_code: Option<String>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub deposit_status: Option<PaymentStatus>,
}

impl DbObject for Sale {
    const COLLECTION_NAME: &'static str = "sales";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
