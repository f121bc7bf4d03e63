// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin JWT authentication middleware.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Cookie holding the admin session token.
pub const ADMIN_COOKIE: &str = "investor_admin";

/// Admin session lifetime.
pub const SESSION_TTL_SECS: usize = 12 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (admin username)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated admin extracted from JWT.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub username: String,
}

/// Constant-time check of submitted credentials against the configured ones.
///
/// Both comparisons always run so the response time doesn't reveal which
/// field was wrong.
pub fn credentials_match(
    username: &str,
    password: &str,
    expected_username: &str,
    expected_password: &str,
) -> bool {
    let user_ok = username.as_bytes().ct_eq(expected_username.as_bytes());
    let pass_ok = password.as_bytes().ct_eq(expected_password.as_bytes());
    bool::from(user_ok & pass_ok)
}

/// Middleware that requires a valid admin JWT.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(ADMIN_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token.to_string(),
            None => return Err(StatusCode::UNAUTHORIZED),
        }
    };

    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data =
        decode::<Claims>(&token, &key, &validation).map_err(|_| StatusCode::UNAUTHORIZED)?;

    // A token for a since-renamed admin is no longer valid.
    if !bool::from(
        token_data
            .claims
            .sub
            .as_bytes()
            .ct_eq(state.config.admin_username.as_bytes()),
    ) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    request.extensions_mut().insert(AdminUser {
        username: token_data.claims.sub,
    });

    Ok(next.run(request).await)
}

/// Create a JWT for an admin session.
pub fn create_jwt(username: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: username.to_string(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
