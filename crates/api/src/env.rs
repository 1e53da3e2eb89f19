use farmxpress_common::{env_flag, env_or, EnvVars};

pub struct ApiServerEnv {
    pub port: String,
    pub allow_anonymous_payments: bool,
}

impl ApiServerEnv {
    pub fn port(&self) -> anyhow::Result<u16> {
        self.port
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT {:?}: {}", self.port, e))
    }
}

impl EnvVars for ApiServerEnv {
    fn load() -> Self {
        Self {
            port: env_or("PORT", "3033"),
            allow_anonymous_payments: env_flag("ALLOW_ANONYMOUS_PAYMENTS"),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "PORT" => self.port.clone(),
            "ALLOW_ANONYMOUS_PAYMENTS" => self.allow_anonymous_payments.to_string(),
            _ => panic!("{} is not set", key),
        }
    }
}
