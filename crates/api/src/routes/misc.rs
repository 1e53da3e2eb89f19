use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::GlobalState;

pub fn misc_routes() -> Router<GlobalState> {
    Router::new()
        .route("/health",
            get(|| async { "OK" })
        )
        .route("/hello",
            get(hello)
        )
}

async fn hello() -> Json<Value> {
    Json(json!({
        "message": "Hello from FarmXpress payments",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "functionVersion": env!("CARGO_PKG_VERSION"),
    }))
}
