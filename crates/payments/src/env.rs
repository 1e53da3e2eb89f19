use std::str::FromStr;

use farmxpress_common::{env_flag, env_or, optional_env, EnvVars};

use crate::provider::XenditProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMode {
    #[default]
    Remote,
    Manual,
}

impl FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" | "xendit" => Ok(PaymentMode::Remote),
            "manual" | "offline" => Ok(PaymentMode::Manual),
            other => Err(format!("unknown payment mode: {}", other)),
        }
    }
}

pub struct PaymentEnv {
    pub xendit_api_key: Option<String>,
    pub xendit_api_url: String,
    pub frontend_url: String,
    pub webhook_token: Option<String>,
    pub payment_mode: PaymentMode,
    pub allow_unsigned_webhooks: bool,
}

impl EnvVars for PaymentEnv {
    fn load() -> Self {
        let payment_mode = optional_env("PAYMENT_MODE")
            .map(|mode| {
                mode.parse().unwrap_or_else(|e| {
                    tracing::warn!("[PaymentEnv] {}; falling back to remote", e);
                    PaymentMode::Remote
                })
            })
            .unwrap_or_default();

        Self {
            xendit_api_key: optional_env("XENDIT_API_KEY"),
            xendit_api_url: env_or("XENDIT_API_URL", XenditProvider::DEFAULT_API_URL),
            frontend_url: env_or("FRONTEND_URL", "http://localhost:8080"),
            webhook_token: optional_env("WEBHOOK_TOKEN"),
            payment_mode,
            allow_unsigned_webhooks: env_flag("ALLOW_UNSIGNED_WEBHOOKS"),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "XENDIT_API_KEY" => self.xendit_api_key.clone().unwrap_or_default(),
            "XENDIT_API_URL" => self.xendit_api_url.clone(),
            "FRONTEND_URL" => self.frontend_url.clone(),
            "WEBHOOK_TOKEN" => self.webhook_token.clone().unwrap_or_default(),
            "PAYMENT_MODE" => match self.payment_mode {
                PaymentMode::Remote => "remote".to_string(),
                PaymentMode::Manual => "manual".to_string(),
            },
            "ALLOW_UNSIGNED_WEBHOOKS" => self.allow_unsigned_webhooks.to_string(),
            _ => panic!("Invalid environment variable: {}", key),
        }
    }
}
