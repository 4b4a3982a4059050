//! Page endpoints
//!
//! JSON view models for the timeline pages and their form actions.
//! Rendering is handled by an external front end; these handlers only
//! call services and shape the output.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::data::CheepDto;
use crate::error::AppError;
use crate::metrics::{DB_QUERIES_TOTAL, HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TimelineParams {
    #[serde(rename = "pageIndex")]
    pub page_index: Option<i64>,
    pub search: Option<String>,
    /// Username of the logged-in viewer, supplied by the front end
    pub viewer: Option<String>,
}

/// Timeline page view model
#[derive(Debug, Serialize)]
pub struct TimelinePage {
    pub page: i64,
    pub cheeps: Vec<CheepDto>,
}

#[derive(Debug, Serialize)]
pub struct FollowingPage {
    pub username: String,
    pub following: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostCheepRequest {
    pub username: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FollowActionRequest {
    pub username: String,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveActionRequest {
    pub username: String,
    pub cheep_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SavedStateParams {
    pub username: String,
    pub cheep_id: i64,
}

/// GET /public
///
/// Public timeline with optional substring search.
async fn public_timeline(
    State(state): State<AppState>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<TimelinePage>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/public"])
        .start_timer();

    let page = params.page_index.unwrap_or(1);
    let cheeps = state
        .cheep_service()
        .get_public_cheeps(page, params.search.as_deref())
        .await?;
    DB_QUERIES_TOTAL.with_label_values(&["SELECT", "cheeps"]).inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/public", "200"])
        .inc();

    Ok(Json(TimelinePage { page, cheeps }))
}

/// GET /user/:username
///
/// A user's timeline. When the viewer is the profile owner the feed also
/// includes cheeps from everyone they follow.
async fn user_timeline(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<TimelinePage>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/user/:username"])
        .start_timer();

    if state
        .author_service()
        .get_author_by_name(&username)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let page = params.page_index.unwrap_or(1);
    let viewer = params.viewer.as_deref().unwrap_or_default();
    let cheeps = state
        .cheep_service()
        .get_user_timeline_cheeps(viewer, &username, page)
        .await?;
    DB_QUERIES_TOTAL.with_label_values(&["SELECT", "cheeps"]).inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/user/:username", "200"])
        .inc();

    Ok(Json(TimelinePage { page, cheeps }))
}

/// GET /user/:username/saved
async fn saved_timeline(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<TimelinePage>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/user/:username/saved"])
        .start_timer();

    let page = params.page_index.unwrap_or(1);
    let cheeps = state.cheep_service().get_saved_cheeps(&username, page).await?;
    DB_QUERIES_TOTAL
        .with_label_values(&["SELECT", "saved_cheeps"])
        .inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/user/:username/saved", "200"])
        .inc();

    Ok(Json(TimelinePage { page, cheeps }))
}

/// GET /user/:username/following
async fn following_page(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<FollowingPage>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/user/:username/following"])
        .start_timer();

    let following = state
        .author_service()
        .get_following(&username)
        .await?
        .into_iter()
        .map(|author| author.name)
        .collect();
    DB_QUERIES_TOTAL.with_label_values(&["SELECT", "follows"]).inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/user/:username/following", "200"])
        .inc();

    Ok(Json(FollowingPage { username, following }))
}

/// POST /cheep
async fn post_cheep(
    State(state): State<AppState>,
    Json(request): Json<PostCheepRequest>,
) -> Result<StatusCode, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/cheep"])
        .start_timer();

    state
        .cheep_service()
        .create_cheep_for_user(&request.username, &request.text)
        .await?;
    DB_QUERIES_TOTAL.with_label_values(&["INSERT", "cheeps"]).inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/cheep", "204"])
        .inc();

    Ok(StatusCode::NO_CONTENT)
}

/// POST /follow
async fn follow_action(
    State(state): State<AppState>,
    Json(request): Json<FollowActionRequest>,
) -> Result<StatusCode, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/follow"])
        .start_timer();

    state
        .author_service()
        .follow_user(&request.username, &request.target)
        .await?;
    DB_QUERIES_TOTAL.with_label_values(&["INSERT", "follows"]).inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/follow", "204"])
        .inc();

    Ok(StatusCode::NO_CONTENT)
}

/// POST /unfollow
async fn unfollow_action(
    State(state): State<AppState>,
    Json(request): Json<FollowActionRequest>,
) -> Result<StatusCode, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/unfollow"])
        .start_timer();

    state
        .author_service()
        .unfollow_user(&request.username, &request.target)
        .await?;
    DB_QUERIES_TOTAL.with_label_values(&["DELETE", "follows"]).inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/unfollow", "204"])
        .inc();

    Ok(StatusCode::NO_CONTENT)
}

/// POST /save
async fn save_action(
    State(state): State<AppState>,
    Json(request): Json<SaveActionRequest>,
) -> Result<StatusCode, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/save"])
        .start_timer();

    state
        .cheep_service()
        .save_cheep_for_user(&request.username, request.cheep_id)
        .await?;
    DB_QUERIES_TOTAL
        .with_label_values(&["INSERT", "saved_cheeps"])
        .inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/save", "204"])
        .inc();

    Ok(StatusCode::NO_CONTENT)
}

/// POST /unsave
async fn unsave_action(
    State(state): State<AppState>,
    Json(request): Json<SaveActionRequest>,
) -> Result<StatusCode, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/unsave"])
        .start_timer();

    state
        .cheep_service()
        .remove_saved_cheep_for_user(&request.username, request.cheep_id)
        .await?;
    DB_QUERIES_TOTAL
        .with_label_values(&["DELETE", "saved_cheeps"])
        .inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/unsave", "204"])
        .inc();

    Ok(StatusCode::NO_CONTENT)
}

/// GET /saved-state
async fn saved_state(
    State(state): State<AppState>,
    Query(params): Query<SavedStateParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/saved-state"])
        .start_timer();

    let saved = state
        .cheep_service()
        .is_cheep_saved_by_user(&params.username, params.cheep_id)
        .await?;
    DB_QUERIES_TOTAL
        .with_label_values(&["SELECT", "saved_cheeps"])
        .inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/saved-state", "200"])
        .inc();

    Ok(Json(serde_json::json!({ "saved": saved })))
}

/// DELETE /user/:username
///
/// Account deletion ("forget me"): removes the author and everything that
/// references them.
async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<StatusCode, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["DELETE", "/user/:username"])
        .start_timer();

    state.author_service().delete_author(&username).await?;
    DB_QUERIES_TOTAL.with_label_values(&["DELETE", "authors"]).inc();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["DELETE", "/user/:username", "204"])
        .inc();

    Ok(StatusCode::NO_CONTENT)
}

/// Create page router
pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/public", get(public_timeline))
        .route("/user/:username", get(user_timeline).delete(delete_user))
        .route("/user/:username/saved", get(saved_timeline))
        .route("/user/:username/following", get(following_page))
        .route("/cheep", post(post_cheep))
        .route("/follow", post(follow_action))
        .route("/unfollow", post(unfollow_action))
        .route("/save", post(save_action))
        .route("/unsave", post(unsave_action))
        .route("/saved-state", get(saved_state))
}
