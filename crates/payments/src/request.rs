use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::PaymentError;

/// Payment creation input as sent by the storefront checkout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub order_code: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub items: Option<Vec<LineItemInput>>,
}

fn number_like(value: Option<Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

// Storefront carts send item numbers as numbers or strings; anything
// unusable falls back to the line-item defaults.
fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(number_like(Option::<Value>::deserialize(deserializer)?)
        .filter(|n| *n >= 1.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32))
}

fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(number_like(Option::<Value>::deserialize(deserializer)?).filter(|n| *n >= 0.0))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<u32>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerPaymentInput {
    #[serde(default)]
    pub seller_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub order_code: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<LineItemInput>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSellerInput {
    #[serde(default)]
    pub seller_payments: Option<Vec<SellerPaymentInput>>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

#[derive(Clone, PartialEq, Serialize)]
pub struct Customer {
    pub given_names: String,
    pub email: String,
}

impl fmt::Debug for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Customer")
            .field("given_names", &self.given_names)
            .field("email", &"REDACTED")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPreference {
    pub invoice_created: Vec<String>,
    pub invoice_reminder: Vec<String>,
    pub invoice_paid: Vec<String>,
    pub invoice_expired: Vec<String>,
}

impl NotificationPreference {
    fn email_only() -> Self {
        let email = || vec!["email".to_string()];
        Self {
            invoice_created: email(),
            invoice_reminder: email(),
            invoice_paid: email(),
            invoice_expired: email(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    pub category: String,
}

impl From<&LineItemInput> for LineItem {
    fn from(item: &LineItemInput) -> Self {
        Self {
            name: item
                .name
                .clone()
                .or_else(|| item.product_name.clone())
                .unwrap_or_else(|| "Product".to_string()),
            quantity: item.quantity.unwrap_or(1),
            price: item.price.unwrap_or(0.0),
            category: item.category.clone().unwrap_or_else(|| "General".to_string()),
        }
    }
}

/// Provider-agnostic invoice request, serialized in the invoicing API's wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    pub external_id: String,
    pub amount: f64,
    pub description: String,
    pub invoice_duration: u32,
    pub customer: Customer,
    pub success_redirect_url: String,
    pub failure_redirect_url: String,
    pub payment_methods: Vec<String>,
    pub currency: String,
    pub customer_notification_preference: NotificationPreference,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LineItem>,
    pub metadata: Map<String, Value>,
}

fn required(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_amount(raw: Option<&Value>) -> Result<f64, PaymentError> {
    let amount = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match amount {
        Some(a) if a.is_finite() && a > 0.0 => Ok(a),
        _ => Err(PaymentError::validation("Invalid payment amount")),
    }
}

#[derive(Debug, Clone)]
pub struct PaymentRequestBuilder {
    frontend_base: String,
}

impl PaymentRequestBuilder {
    pub const INVOICE_DURATION_SECS: u32 = 3600;
    pub const CURRENCY: &'static str = "PHP";
    pub const PAYMENT_METHOD: &'static str = "GCASH";

    pub fn new(frontend_base: impl Into<String>) -> Self {
        let frontend_base = frontend_base.into().trim_end_matches('/').to_string();
        Self { frontend_base }
    }

    pub fn build(&self, input: &PaymentInput) -> Result<PaymentRequest, PaymentError> {
        let order_code = required(input.order_code.as_ref());
        let customer_name = required(input.customer_name.as_ref());
        let customer_email = required(input.customer_email.as_ref());
        let (Some(order_code), Some(customer_name), Some(customer_email)) =
            (order_code, customer_name, customer_email)
        else {
            return Err(PaymentError::validation("Missing required payment information"));
        };
        if input.amount.is_none() {
            return Err(PaymentError::validation("Missing required payment information"));
        }
        let amount = parse_amount(input.amount.as_ref())?;

        let mut metadata = input.metadata.clone().unwrap_or_default();
        if let Some(payment_type) = input.payment_type.as_ref().filter(|t| !t.is_empty()) {
            metadata.insert("paymentType".to_string(), Value::String(payment_type.clone()));
        }

        let items = input
            .items
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(LineItem::from)
            .collect();

        Ok(self.assemble(
            order_code.clone(),
            amount,
            format!("FarmXpress Order {}", order_code),
            Customer {
                given_names: customer_name,
                email: customer_email,
            },
            items,
            metadata,
        ))
    }

    /// Builds the invoice for one seller's share of a multi-seller basket.
    pub fn build_for_seller(
        &self,
        seller: &SellerPaymentInput,
        customer_name: &str,
        customer_email: &str,
    ) -> Result<PaymentRequest, PaymentError> {
        let (Some(seller_id), Some(order_code)) = (
            required(seller.seller_id.as_ref()),
            required(seller.order_code.as_ref()),
        ) else {
            return Err(PaymentError::validation("Missing seller payment information"));
        };
        let amount = parse_amount(seller.amount.as_ref())?;
        let item_count = seller.items.as_ref().map(Vec::len).unwrap_or(0);

        let mut metadata = Map::new();
        metadata.insert("sellerId".to_string(), Value::String(seller_id.clone()));
        metadata.insert("itemCount".to_string(), Value::from(item_count));

        Ok(self.assemble(
            order_code.clone(),
            amount,
            format!("FarmXpress Order {} - Seller {}", order_code, seller_id),
            Customer {
                given_names: customer_name.to_string(),
                email: customer_email.to_string(),
            },
            vec![],
            metadata,
        ))
    }

    fn assemble(
        &self,
        order_code: String,
        amount: f64,
        description: String,
        customer: Customer,
        items: Vec<LineItem>,
        metadata: Map<String, Value>,
    ) -> PaymentRequest {
        PaymentRequest {
            success_redirect_url: format!("{}/payment/success?order={}", self.frontend_base, order_code),
            failure_redirect_url: format!("{}/payment/failed?order={}", self.frontend_base, order_code),
            external_id: order_code,
            amount,
            description,
            invoice_duration: Self::INVOICE_DURATION_SECS,
            customer,
            payment_methods: vec![Self::PAYMENT_METHOD.to_string()],
            currency: Self::CURRENCY.to_string(),
            customer_notification_preference: NotificationPreference::email_only(),
            items,
            metadata,
        }
    }
}
