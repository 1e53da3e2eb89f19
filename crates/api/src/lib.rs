mod env;
mod global_state;
mod middleware;
mod response;
mod routes;
mod utils;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use routes::{misc_routes, payment_routes, webhook_routes};

pub use env::ApiServerEnv;
pub use global_state::GlobalState;
pub use middleware::{authenticate, CallerIdentity};
pub use response::{AppError, AppSuccess};
pub use utils::setup_tracing;

pub fn app_router(state: GlobalState) -> Router {
    Router::new()
        .merge(payment_routes())
        .merge(webhook_routes())
        .merge(misc_routes())
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
