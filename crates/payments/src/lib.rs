mod actor;
mod engine;
mod env;
mod error;
mod matcher;
mod provider;
mod record;
mod request;
mod service;
mod status;
mod webhook;

pub use actor::Actor;
pub use engine::{PaymentEvent, ReconciliationEngine, ReconciliationOutcome};
pub use env::{PaymentEnv, PaymentMode};
pub use error::PaymentError;
pub use matcher::{MatchResult, MatchedRecords, OrderMatcher};
pub use provider::{ManualProvider, PaymentProvider, PaymentSession, ProviderMode, XenditProvider};
pub use record::{fields, Order, Sale};
pub use request::{
    Customer, LineItem, LineItemInput, MultiSellerInput, PaymentInput, PaymentRequest,
    PaymentRequestBuilder, SellerPaymentInput,
};
pub use service::{PaymentCreated, PaymentService, SellerPaymentResult, MultiSellerPaymentResult};
pub use status::{PaymentStatus, PaymentTrack};
pub use webhook::{WebhookAuthenticator, WebhookPayload, CALLBACK_TOKEN_HEADER};
