use crate::error::ApiError;
use anyhow::anyhow;
use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use qamus_lib::{
    parse_int_param, AppState, AuthCommand, AuthResponse, AuthService, PageResult, QamusError,
    WordDetail, WordSummary, WordsQueryParams,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

const MAX_BODY_BYTES: usize = 16 * 1024;
/// One auth request replenished every this many seconds per client IP
const AUTH_REPLENISH_SECS: u64 = 2;
const AUTH_BURST: u32 = 5;

// === Request/Response types ===

/// Query string as received; integers are parsed by hand so a malformed
/// `page` is reported alongside every other bad field.
#[derive(Deserialize, Default)]
struct WordsQuery {
    english: Option<String>,
    arabic: Option<String>,
    part_of_speech: Option<String>,
    frequency: Option<String>,
    page: Option<String>,
    limit: Option<String>,
    sort_by: Option<String>,
}

#[derive(Deserialize)]
struct LookupQuery {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    backend: String,
}

// === Handlers ===

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: state.words.backend_name().to_string(),
    })
}

async fn search_words(
    State(state): State<AppState>,
    Query(raw): Query<WordsQuery>,
) -> Result<Json<PageResult<WordSummary>>, ApiError> {
    let mut violations = Vec::new();
    let page = parse_int_param("page", raw.page.as_deref(), &mut violations);
    let limit = parse_int_param("limit", raw.limit.as_deref(), &mut violations);

    let params = WordsQueryParams {
        english: raw.english,
        arabic: raw.arabic,
        part_of_speech: raw.part_of_speech,
        frequency: raw.frequency,
        page,
        limit,
        sort_by: raw.sort_by,
    };

    if !violations.is_empty() {
        if let Err(e) = params.validate() {
            violations.extend(e.violations().iter().cloned());
        }
        return Err(QamusError::InvalidParameters(violations).into());
    }

    Ok(Json(state.words.search(&params).await?))
}

async fn lookup_words(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<PageResult<WordSummary>>, ApiError> {
    match state.words.search_text(&query.q).await? {
        Some(page) => Ok(Json(page)),
        None => Err(QamusError::invalid("q", "must be at least 2 characters").into()),
    }
}

async fn word_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WordDetail>, ApiError> {
    Ok(Json(state.words.get_details(&id).await?))
}

fn auth_service(state: &AppState) -> Result<&AuthService, ApiError> {
    state
        .auth
        .as_ref()
        .ok_or_else(|| ApiError::AuthUnavailable(state.words.backend_name()))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| QamusError::Auth("Missing bearer token".to_string()).into())
}

async fn register(
    State(state): State<AppState>,
    Json(command): Json<AuthCommand>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let response = auth_service(&state)?.register(&command).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    Json(command): Json<AuthCommand>,
) -> Result<Json<AuthResponse>, ApiError> {
    Ok(Json(auth_service(&state)?.login(&command).await?))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let auth = auth_service(&state)?;
    auth.logout(bearer_token(&headers)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_account(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let auth = auth_service(&state)?;
    auth.delete_account(bearer_token(&headers)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn auth_routes(rate_limited: bool) -> anyhow::Result<Router<AppState>> {
    let routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/account", delete(delete_account));

    if !rate_limited {
        return Ok(routes);
    }

    // Keyed by peer address; the server must be started with connect info.
    let config = GovernorConfigBuilder::default()
        .per_second(AUTH_REPLENISH_SECS)
        .burst_size(AUTH_BURST)
        .finish()
        .ok_or_else(|| anyhow!("Invalid auth rate limit"))?;

    Ok(routes.layer(GovernorLayer {
        config: Arc::new(config),
    }))
}

pub fn router(state: AppState, rate_limit_auth: bool) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/words", get(search_words))
        .route("/words/lookup", get(lookup_words))
        .route("/words/:id", get(word_details))
        .merge(auth_routes(rate_limit_auth)?)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state);

    Ok(app)
}
