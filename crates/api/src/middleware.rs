use axum::body::Body;
use axum::middleware::Next;
use axum::{extract::Request, response::Response};

use crate::utils::extract_bearer_token;

/// The caller uid asserted by the storefront's auth layer, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity(pub Option<String>);

/// Attaches a `CallerIdentity` to the request. A missing or malformed header
/// yields an empty identity; handlers decide whether that is acceptable.
pub async fn authenticate(mut req: Request, next: Next) -> Response<Body> {
    let caller = extract_bearer_token(&req)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    req.extensions_mut().insert(CallerIdentity(caller));
    next.run(req).await
}
