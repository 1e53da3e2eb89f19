use farmxpress_common::{env_or, optional_env, EnvVars};

pub struct MongoDbEnv {
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
}

impl EnvVars for MongoDbEnv {
    fn load() -> Self {
        Self {
            mongodb_uri: optional_env("MONGODB_URI"),
            mongodb_database: env_or("MONGODB_DATABASE", "farmxpress"),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "MONGODB_URI" => self.mongodb_uri.clone().unwrap_or_default(),
            "MONGODB_DATABASE" => self.mongodb_database.clone(),
            _ => panic!("Invalid environment variable: {}", key),
        }
    }
}
