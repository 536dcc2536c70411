//! Actor extraction. Session resolution happens in the fronting auth proxy,
//! which forwards the authenticated identity as headers; here we only turn
//! those headers into an `Actor` and enforce the role where required.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    auth::{Actor, Role},
    error::AppError,
};

const ACTOR_ID_HEADER: &str = "x-actor-id";
const ACTOR_ROLE_HEADER: &str = "x-actor-role";

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let id = headers
        .get(ACTOR_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or(AppError::Unauthorized)?;

    let role = match headers.get(ACTOR_ROLE_HEADER).and_then(|v| v.to_str().ok()) {
        Some("admin") => Role::Admin,
        Some("guardian") => Role::Guardian,
        _ => return Err(AppError::Unauthorized),
    };

    Ok(Actor { id, role })
}

pub async fn require_actor(mut request: Request, next: Next) -> Result<Response, AppError> {
    let actor = actor_from_headers(request.headers())?;
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}
