use std::sync::Arc;

use anyhow::Result;
use farmxpress_common::EnvVars;
use farmxpress_database::MongoStore;
use farmxpress_service_api::{app_router, setup_tracing, ApiServerEnv, GlobalState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing()?;

    let env = ApiServerEnv::load();
    let port = env.port()?;

    let store = MongoStore::connect().await?;
    let state = GlobalState::from_env(Arc::new(store))?;
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(format!(":::{port}")).await?;

    tracing::info!("LISTENING ON {port}");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
