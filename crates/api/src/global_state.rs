use std::sync::Arc;

use anyhow::anyhow;
use axum::http::StatusCode;
use farmxpress_common::EnvVars;
use farmxpress_database::DocumentStore;
use farmxpress_payments::{Actor, PaymentEnv, PaymentService, WebhookAuthenticator};

use crate::env::ApiServerEnv;
use crate::middleware::CallerIdentity;
use crate::response::AppError;

#[derive(Clone)]
pub struct GlobalState {
    pub payments: PaymentService,
    pub webhook_auth: WebhookAuthenticator,
    pub allow_anonymous_payments: bool,
}

impl GlobalState {
    pub fn new(
        payments: PaymentService,
        webhook_auth: WebhookAuthenticator,
        allow_anonymous_payments: bool,
    ) -> Self {
        Self {
            payments,
            webhook_auth,
            allow_anonymous_payments,
        }
    }

    pub fn from_env(store: Arc<dyn DocumentStore>) -> anyhow::Result<Self> {
        let api_env = ApiServerEnv::load();
        let payment_env = PaymentEnv::load();

        let webhook_auth = WebhookAuthenticator::new(
            payment_env.webhook_token.as_deref(),
            payment_env.allow_unsigned_webhooks,
        );
        if !webhook_auth.is_configured() {
            if payment_env.allow_unsigned_webhooks {
                tracing::warn!("[GlobalState] WEBHOOK_TOKEN not set; accepting unsigned webhooks");
            } else {
                tracing::warn!("[GlobalState] WEBHOOK_TOKEN not set; all webhooks will be rejected");
            }
        }
        if api_env.allow_anonymous_payments {
            tracing::warn!("[GlobalState] anonymous payment requests are allowed");
        }

        Ok(Self::new(
            PaymentService::from_env(&payment_env, store)?,
            webhook_auth,
            api_env.allow_anonymous_payments,
        ))
    }

    /// Resolves who a payment request acts as.
    pub fn actor_for(&self, caller: &CallerIdentity) -> Result<Actor, AppError> {
        match &caller.0 {
            Some(uid) => Ok(Actor::User(uid.clone())),
            None if self.allow_anonymous_payments => Ok(Actor::System),
            None => Err(AppError::new(
                StatusCode::UNAUTHORIZED,
                anyhow!("User must be authenticated"),
            )),
        }
    }
}
