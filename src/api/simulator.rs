//! Simulator REST API
//!
//! Endpoints driven by the external load-testing simulator:
//! `/msgs`, `/msgs/:username`, `/register`, `/latest`, `/fllws/:username`.
//!
//! Privileged endpoints require the simulator's fixed Basic-auth header.
//! Every endpoint accepts a `latest` query parameter that updates the
//! shared bookkeeping counter returned by `GET /latest`.

use std::sync::atomic::Ordering;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::CheepDto;
use crate::error::AppError;
use crate::metrics::{DB_QUERIES_TOTAL, HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::AppState;

/// Message shape expected by the simulator
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub content: String,
    pub pub_date: DateTime<Utc>,
    pub user: String,
}

impl From<CheepDto> for MessageResponse {
    fn from(cheep: CheepDto) -> Self {
        Self {
            content: cheep.text,
            pub_date: cheep.timestamp,
            user: cheep.author.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SimulatorParams {
    /// Number of items to return (default 100)
    pub no: Option<i64>,
    /// Simulator bookkeeping sequence number
    pub latest: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub pwd: String,
}

/// Follow/unfollow action: exactly one of the fields is expected
#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    pub follow: Option<String>,
    pub unfollow: Option<String>,
}

/// Reject requests without the simulator's Authorization header
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let expected = state.config.simulator.expected_auth_header();
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if provided != Some(expected.as_str()) {
        return Err(AppError::Forbidden);
    }

    Ok(())
}

/// Update the shared `latest` counter when the simulator sends one
fn record_latest(state: &AppState, latest: Option<i64>) {
    if let Some(latest) = latest {
        state.latest.store(latest, Ordering::Relaxed);
    }
}

/// GET /msgs
async fn get_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SimulatorParams>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/msgs"])
        .start_timer();

    authorize(&state, &headers)?;
    record_latest(&state, params.latest);

    let amount = params.no.unwrap_or(100);
    let cheeps = state.cheep_service().get_n_latest_cheeps(None, amount).await?;
    DB_QUERIES_TOTAL.with_label_values(&["SELECT", "cheeps"]).inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/msgs", "200"])
        .inc();

    Ok(Json(cheeps.into_iter().map(MessageResponse::from).collect()))
}

/// GET /msgs/:username
async fn get_user_messages(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Query(params): Query<SimulatorParams>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/msgs/:username"])
        .start_timer();

    authorize(&state, &headers)?;
    record_latest(&state, params.latest);

    // Unknown users are a 404, not an empty list
    if state
        .author_service()
        .get_author_by_name(&username)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let amount = params.no.unwrap_or(100);
    let cheeps = state
        .cheep_service()
        .get_n_latest_cheeps(Some(&username), amount)
        .await?;
    DB_QUERIES_TOTAL.with_label_values(&["SELECT", "cheeps"]).inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/msgs/:username", "200"])
        .inc();

    Ok(Json(cheeps.into_iter().map(MessageResponse::from).collect()))
}

/// POST /msgs/:username
async fn post_user_message(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Query(params): Query<SimulatorParams>,
    Json(request): Json<PostMessageRequest>,
) -> Result<StatusCode, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/msgs/:username"])
        .start_timer();

    authorize(&state, &headers)?;
    record_latest(&state, params.latest);

    if state
        .author_service()
        .get_author_by_name(&username)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    state
        .cheep_service()
        .create_cheep_for_user(&username, &request.content)
        .await?;
    DB_QUERIES_TOTAL.with_label_values(&["INSERT", "cheeps"]).inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/msgs/:username", "204"])
        .inc();

    Ok(StatusCode::NO_CONTENT)
}

/// POST /register
async fn register(
    State(state): State<AppState>,
    Query(params): Query<SimulatorParams>,
    Json(request): Json<RegisterRequest>,
) -> Result<StatusCode, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/register"])
        .start_timer();

    record_latest(&state, params.latest);

    if request.username.is_empty() {
        return Err(AppError::Validation("You have to enter a username".to_string()));
    }
    if request.email.is_empty() || !request.email.contains('@') {
        return Err(AppError::Validation(
            "You have to enter a valid email address".to_string(),
        ));
    }
    // Credential handling belongs to the external identity subsystem;
    // the field must still be present for the simulator contract.
    if request.pwd.is_empty() {
        return Err(AppError::Validation("You have to enter a password".to_string()));
    }

    let created = state
        .author_service()
        .create_author(&request.username, &request.email)
        .await;
    DB_QUERIES_TOTAL.with_label_values(&["INSERT", "authors"]).inc();

    match created {
        Ok(()) => {
            HTTP_REQUESTS_TOTAL
                .with_label_values(&["POST", "/register", "204"])
                .inc();
            Ok(StatusCode::NO_CONTENT)
        }
        Err(error) if error.is_constraint_violation() => Err(AppError::Validation(
            "The username is already taken".to_string(),
        )),
        Err(error) => Err(error),
    }
}

/// GET /latest
async fn get_latest(State(state): State<AppState>) -> Json<serde_json::Value> {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/latest", "200"])
        .inc();

    let latest = state.latest.load(Ordering::Relaxed);
    Json(serde_json::json!({ "latest": latest }))
}

/// GET /fllws/:username
async fn get_follows(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Query(params): Query<SimulatorParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/fllws/:username"])
        .start_timer();

    authorize(&state, &headers)?;
    record_latest(&state, params.latest);

    let amount = params.no.unwrap_or(100).max(0) as usize;
    let following = state.author_service().get_following(&username).await?;
    DB_QUERIES_TOTAL.with_label_values(&["SELECT", "follows"]).inc();

    let follow_names: Vec<String> = following
        .into_iter()
        .take(amount)
        .map(|author| author.name)
        .collect();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/fllws/:username", "200"])
        .inc();

    Ok(Json(serde_json::json!({ "follows": follow_names })))
}

/// POST /fllws/:username
async fn post_follows(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Query(params): Query<SimulatorParams>,
    Json(request): Json<FollowRequest>,
) -> Result<StatusCode, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/fllws/:username"])
        .start_timer();

    authorize(&state, &headers)?;
    record_latest(&state, params.latest);

    let authors = state.author_service();
    match (&request.follow, &request.unfollow) {
        (Some(target), None) => {
            authors.follow_user(&username, target).await?;
            DB_QUERIES_TOTAL.with_label_values(&["INSERT", "follows"]).inc();
        }
        (None, Some(target)) => {
            authors.unfollow_user(&username, target).await?;
            DB_QUERIES_TOTAL.with_label_values(&["DELETE", "follows"]).inc();
        }
        _ => {
            return Err(AppError::Validation(
                "exactly one of 'follow' or 'unfollow' must be given".to_string(),
            ));
        }
    }

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/fllws/:username", "204"])
        .inc();

    Ok(StatusCode::NO_CONTENT)
}

/// Create simulator API router
pub fn simulator_router() -> Router<AppState> {
    Router::new()
        .route("/msgs", get(get_messages))
        .route("/msgs/:username", get(get_user_messages).post(post_user_message))
        .route("/register", post(register))
        .route("/latest", get(get_latest))
        .route("/fllws/:username", get(get_follows).post(post_follows))
}
