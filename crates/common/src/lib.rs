mod client;
mod crypto_hash;
mod env;

pub use client::ModuleClient;
pub use crypto_hash::{blake3_hash, CryptoHash};
pub use env::{env_flag, env_or, optional_env, EnvVars};
