use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use mercado_core::identity::Actor;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

/// Resolve the bearer credential into an `Actor` and stash it in request
/// extensions. Ownership checks happen downstream; this layer only answers
/// "who is calling".
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 3. Map the role claim onto the actor model
    let claims = token_data.claims;
    let actor = match claims.role.as_str() {
        "ADMIN" | "SUPER_ADMIN" => Actor::admin(claims.sub.clone()),
        _ => Actor::customer(claims.sub.clone()),
    };

    // 4. Inject into request extensions
    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}
