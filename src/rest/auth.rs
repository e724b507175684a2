// rest/auth.rs — Optional static bearer-token check.
//
// When `api_token` is unset the API is open (trusted loopback use); when set,
// every request through this layer must carry `Authorization: Bearer <token>`.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{error::ApiError, AppContext};

pub async fn require_bearer(
    State(ctx): State<Arc<AppContext>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = ctx.config.api_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let presented = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(next.run(req).await),
        _ => Err(ApiError::Unauthorized),
    }
}
