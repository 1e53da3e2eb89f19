use farmxpress_database::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Bad caller input, rejected before any external call or write.
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Auth,

    /// The invoicing API failed or was unreachable. `status` is the upstream
    /// HTTP status when one was received.
    #[error("Payment service error: {message}")]
    Provider { status: Option<u16>, message: String },

    #[error("{0} not configured")]
    NotConfigured(String),

    #[error("store failure: {0}")]
    Internal(#[from] StoreError),
}

impl PaymentError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PaymentError::Validation(msg.into())
    }
}
