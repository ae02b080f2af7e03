// Copyright 2026 Vitis Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP REST API for Vitis.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/auth/register` | Create a user |
//! | `GET`  | `/auth/login` | Basic credentials in, bearer token out |
//! | `GET`  | `/reports/production` | Production report (`year`) |
//! | `GET`  | `/reports/processing` | Processing report (`year`, `sub_option`) |
//! | `GET`  | `/reports/commercialization` | Commercialization report (`year`) |
//! | `GET`  | `/reports/imports` | Import report (`year`, `sub_option`) |
//! | `GET`  | `/reports/exports` | Export report (`year`, `sub_option`) |
//!
//! Report endpoints require a bearer token. Fan-out reports answer with
//! an ordered array unless `sub_option` picks a single page; single-page
//! reports answer with one object. When neither a fresh fetch nor a
//! stored snapshot exists, the endpoint answers 503.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "unauthorized", "message": "missing bearer token" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401), `conflict`
//! (409), `invalid_query` (422), `unavailable` (503), `internal` (500).

use crate::auth;
use crate::report::{ReportKind, ReportQuery};
use crate::retrieve::Retriever;
use crate::store::UserStore;
use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared state for all handlers.
pub struct ApiState {
    pub retriever: Retriever,
    pub users: UserStore,
    pub signer: auth::TokenSigner,
}

/// Build the axum Router with all endpoints.
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", get(login))
        .route("/reports/production", get(production))
        .route("/reports/processing", get(processing))
        .route("/reports/commercialization", get(commercialization))
        .route("/reports/imports", get(imports))
        .route("/reports/exports", get(exports))
        .layer(cors)
        .with_state(state)
}

/// Start the API server on the given port.
pub async fn serve(port: u16, state: Arc<ApiState>) -> anyhow::Result<()> {
    let app = router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("REST API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Errors ──────────────────────────────────────────────────────

enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    InvalidQuery(String),
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m),
            ApiError::InvalidQuery(m) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_query", m),
            ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", m),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = json!({ "error": { "code": code, "message": message } });
        (status, Json(body)).into_response()
    }
}

fn internal(err: impl std::fmt::Display) -> ApiError {
    ApiError::Internal(err.to_string())
}

// ── Auth handlers ───────────────────────────────────────────────

#[derive(Deserialize)]
struct RegisterInput {
    username: String,
    password: String,
}

async fn register(
    State(state): State<Arc<ApiState>>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    if input.username.is_empty() || input.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password must not be empty".to_string(),
        ));
    }
    let hash = auth::hash_password(&input.password);
    match state.users.create(&input.username, &hash) {
        Ok(true) => Ok((StatusCode::CREATED, Json(json!({ "message": "user created" })))),
        Ok(false) => Err(ApiError::Conflict("username already exists".to_string())),
        Err(err) => Err(internal(err)),
    }
}

async fn login(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let header = authorization_header(&headers)?;
    let (username, password) = auth::parse_basic(header)
        .ok_or_else(|| ApiError::Unauthorized("expected Basic credentials".to_string()))?;

    let stored = state
        .users
        .lookup(&username)
        .map_err(internal)?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_string()))?;
    if !auth::verify_password(&password, &stored) {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    let issued = state.signer.issue(&username);
    Ok(Json(json!({
        "access_token": issued.token,
        "token_type": "bearer",
        "expires_at": issued.expires_at.to_rfc3339(),
    })))
}

/// Verify the bearer token and confirm its subject is still registered.
fn authorize(state: &ApiState, headers: &HeaderMap) -> Result<String, ApiError> {
    let header = authorization_header(headers)?;
    let token = auth::parse_bearer(header)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
    let username = state
        .signer
        .verify(token)
        .map_err(|err| ApiError::Unauthorized(err.to_string()))?;
    match state.users.lookup(&username) {
        Ok(Some(_)) => Ok(username),
        Ok(None) => Err(ApiError::Unauthorized("unknown user".to_string())),
        Err(err) => Err(internal(err)),
    }
}

fn authorization_header(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".to_string()))
}

// ── Report handlers ─────────────────────────────────────────────

#[derive(Deserialize)]
struct ReportParams {
    #[serde(default = "default_year")]
    year: i32,
    sub_option: Option<u8>,
}

fn default_year() -> i32 {
    1970
}

async fn report(
    state: Arc<ApiState>,
    headers: HeaderMap,
    kind: ReportKind,
    params: ReportParams,
) -> Result<Response, ApiError> {
    authorize(&state, &headers)?;

    let query = ReportQuery::new(kind, params.year, params.sub_option)
        .map_err(|err| ApiError::InvalidQuery(err.to_string()))?;

    let sections = state.retriever.retrieve(&query).await.map_err(|_| {
        ApiError::Unavailable("upstream unreachable and no cached snapshot".to_string())
    })?;

    if kind.fans_out() && query.sub_option.is_none() {
        Ok(Json(sections).into_response())
    } else {
        let section = sections
            .into_iter()
            .next()
            .ok_or_else(|| internal("empty result for single-page report"))?;
        Ok(Json(section).into_response())
    }
}

async fn production(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    report(state, headers, ReportKind::Production, params).await
}

async fn processing(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    report(state, headers, ReportKind::Processing, params).await
}

async fn commercialization(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    report(state, headers, ReportKind::Commercialization, params).await
}

async fn imports(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    report(state, headers, ReportKind::Import, params).await
}

async fn exports(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    report(state, headers, ReportKind::Export, params).await
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
