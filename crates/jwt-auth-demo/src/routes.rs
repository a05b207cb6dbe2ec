//! Demo routes.
//!
//! Public:
//! - `POST /v1/tokens` - issue an access/refresh pair for a seeded user
//! - `POST /v1/tokens/refresh` - exchange a refresh token for an access token
//!
//! Bearer only:
//! - `GET /v1/me`
//! - `POST /v1/logout` - revoke this token, or every older token with `all`
//!
//! Role gated (admin):
//! - `GET /v1/admin/strict` - user entity roles
//! - `GET /v1/admin/soft` - embedded claim roles
//! - `GET /v1/admin/hard` - roles from the remote role service

use crate::store::{DemoStore, DemoUser};
use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use jwt_auth::auth::RevocationRecord;
use jwt_auth::errors::messages;
use jwt_auth::middleware::{require_access, require_bearer};
use jwt_auth::services::RoleResolver;
use jwt_auth::{
    AuthError, AuthenticatedUser, ClaimsAccessController, EntityAccessController,
    SessionAuthenticator, TokenClaims,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

const ADMIN_ROLE: &str = "admin";

pub struct AppState {
    pub store: Arc<DemoStore>,
    pub authenticator: Arc<SessionAuthenticator<DemoUser>>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub subject: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    /// Revoke every token issued up to now, not just this one.
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: &'static str,
}

/// Build the application routes.
///
/// Middleware order (outermost first): TimeoutLayer, TraceLayer, then the
/// per-route authentication layer.
pub fn build_routes(state: Arc<AppState>, resolver: Arc<dyn RoleResolver>) -> Router {
    let authenticator = state.authenticator.clone();

    let public = Router::new()
        .route("/v1/tokens", post(issue_tokens))
        .route("/v1/tokens/refresh", post(refresh_tokens));

    let session = Router::new()
        .route("/v1/me", get(me))
        .route("/v1/logout", post(logout))
        .route_layer(from_fn_with_state(
            authenticator.clone(),
            require_bearer::<DemoUser>,
        ));

    let strict = Router::new()
        .route("/v1/admin/strict", get(strict_admin))
        .route_layer(from_fn_with_state(
            Arc::new(EntityAccessController::new(authenticator.clone(), [ADMIN_ROLE])),
            require_access::<EntityAccessController<DemoUser>>,
        ));

    let soft = Router::new()
        .route("/v1/admin/soft", get(claims_admin))
        .route_layer(from_fn_with_state(
            Arc::new(ClaimsAccessController::soft(authenticator.clone(), [ADMIN_ROLE])),
            require_access::<ClaimsAccessController<DemoUser>>,
        ));

    let hard = Router::new()
        .route("/v1/admin/hard", get(claims_admin))
        .route_layer(from_fn_with_state(
            Arc::new(ClaimsAccessController::hard(authenticator, [ADMIN_ROLE], resolver)),
            require_access::<ClaimsAccessController<DemoUser>>,
        ));

    public
        .merge(session)
        .merge(strict)
        .merge(soft)
        .merge(hard)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}

fn claims_for(user: &DemoUser) -> Map<String, Value> {
    let mut extra = Map::new();
    extra.insert("sub".to_string(), Value::from(user.id.clone()));
    extra.insert("roles".to_string(), Value::from(user.roles.clone()));
    extra
}

async fn issue_tokens(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let user = state
        .store
        .user(&request.subject)
        .ok_or_else(|| AuthError::unauthorized(messages::INVALID_CREDENTIALS))?;

    let codec = state.authenticator.codec();
    let access_token = codec.create_access_token(claims_for(user))?;
    let (refresh_token, _) = codec.create_refresh_token(claims_for(user))?;

    tracing::info!(target: "jwt_auth_demo", subject = %user.id, "Issued token pair");

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: Some(refresh_token),
        token_type: "bearer",
    }))
}

async fn refresh_tokens(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let codec = state.authenticator.codec();
    let claims = codec.decode_refresh(&request.refresh_token)?;

    let user = claims
        .subject()
        .and_then(|subject| state.store.user(subject))
        .ok_or_else(|| AuthError::unauthorized(messages::INVALID_CREDENTIALS))?;

    Ok(Json(TokenResponse {
        access_token: codec.create_access_token(claims_for(user))?,
        refresh_token: None,
        token_type: "bearer",
    }))
}

async fn me(Extension(claims): Extension<TokenClaims>) -> Json<Value> {
    Json(json!({
        "sub": claims.sub,
        "roles": claims.roles,
        "exp": claims.exp,
    }))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<TokenClaims>,
    body: Option<Json<LogoutRequest>>,
) -> Result<Json<Value>, AuthError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let subject = claims
        .subject()
        .ok_or_else(|| AuthError::unauthorized(messages::SUB_NOT_DEFINED))?;

    let record = RevocationRecord {
        jti: claims.jti.clone().unwrap_or_default(),
        disabled_at: state.authenticator.codec().clock().timestamp(),
        disable_other: request.all,
    };
    state.store.revoke(subject, record).await;

    tracing::info!(target: "jwt_auth_demo", all = request.all, "Subject logged out");

    Ok(Json(json!({"revoked": true})))
}

async fn strict_admin(
    Extension(principal): Extension<AuthenticatedUser<DemoUser>>,
) -> Json<Value> {
    Json(json!({"user": principal.user.id, "roles": principal.user.roles}))
}

async fn claims_admin(Extension(claims): Extension<TokenClaims>) -> Json<Value> {
    Json(json!({"sub": claims.sub, "roles": claims.roles}))
}
