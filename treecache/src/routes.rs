use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use treecache_core::model::{ActivityPeriodRequest, CategoryCreate, Event};

use crate::error::HttpError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/categories", post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).delete(delete_category),
        )
        .route("/categories/{id}/move", post(move_category))
        .route("/categories/{id}/file-stats", get(get_file_stats))
        .route("/categories/{id}/activity", get(get_activity))
        .route("/posts", post(create_post))
        .route("/posts/delete", post(delete_post))
        .route("/files", post(add_file))
        .route("/files/delete", delete(delete_file))
        .fallback(handle_404)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "no route found" })),
    )
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct CreateCategoryRequest {
    id: i64,
    name: String,
    parent_id: Option<i64>,
    #[serde(default)]
    description: String,
}

async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    let category = CategoryCreate {
        id: body.id,
        name: body.name,
        parent_id: body.parent_id,
        created: chrono::Utc::now().timestamp_millis(),
        description: body.description,
    };
    state.coordinator.submit(Event::CategoryCreated { category });
    StatusCode::ACCEPTED
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<treecache_core::model::CategoryWithCount>, HttpError> {
    state
        .coordinator
        .metadata()
        .get_with_count(id, state.coordinator.post_counts())
        .map(Json)
        .ok_or_else(|| HttpError(treecache_core::CoreError::InvalidArgument(format!("unknown category {id}"))))
}

async fn delete_category(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    state.coordinator.submit(Event::CategoryDeleted { category_id: id });
    StatusCode::ACCEPTED
}

#[derive(Debug, Deserialize)]
struct MoveCategoryRequest {
    new_parent_id: Option<i64>,
}

async fn move_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<MoveCategoryRequest>,
) -> impl IntoResponse {
    let old_parent_id = state.coordinator.hierarchy().read().unwrap().parent_of(id);
    state.coordinator.submit(Event::CategoryMoved {
        category_id: id,
        old_parent_id,
        new_parent_id: body.new_parent_id,
    });
    StatusCode::ACCEPTED
}

#[derive(Debug, Deserialize)]
struct RecursiveQuery {
    #[serde(default)]
    recursive: bool,
}

async fn get_file_stats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<RecursiveQuery>,
) -> Json<treecache_core::model::FileStatsResponse> {
    let tuple = if query.recursive {
        state.coordinator.file_stats().get_recursive(id)
    } else {
        state.coordinator.file_stats().get_direct(id)
    };
    Json(treecache_core::model::FileStatsResponse {
        count: tuple.count,
        size: tuple.size,
    })
}

#[derive(Debug, Deserialize)]
struct ActivityQuery {
    #[serde(default)]
    recursive: bool,
    #[serde(default)]
    period: i32,
    #[serde(default = "default_period_months")]
    period_months: u32,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

fn default_period_months() -> u32 {
    6
}

async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<treecache_core::model::ActivityPeriodResponse>, HttpError> {
    let mut req = ActivityPeriodRequest::new(id);
    req.recursive = query.recursive;
    req.period = query.period;
    req.period_months = query.period_months;
    req.start_date = query.start;
    req.end_date = query.end;

    let response = state.coordinator.activity().query_period(&req)?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct PostRequest {
    category_id: i64,
    post_id: i64,
    timestamp_ms: i64,
}

async fn create_post(State(state): State<AppState>, Json(body): Json<PostRequest>) -> impl IntoResponse {
    state.coordinator.submit(Event::PostCreated {
        category_id: body.category_id,
        post_id: body.post_id,
        timestamp_ms: body.timestamp_ms,
    });
    StatusCode::ACCEPTED
}

async fn delete_post(State(state): State<AppState>, Json(body): Json<PostRequest>) -> impl IntoResponse {
    state.coordinator.submit(Event::PostDeleted {
        category_id: body.category_id,
        post_id: body.post_id,
        timestamp_ms: body.timestamp_ms,
    });
    StatusCode::ACCEPTED
}

#[derive(Debug, Deserialize)]
struct FileRequest {
    category_id: i64,
    file_size: i64,
}

async fn add_file(State(state): State<AppState>, Json(body): Json<FileRequest>) -> impl IntoResponse {
    state.coordinator.submit(Event::FileAdded {
        category_id: body.category_id,
        file_size: body.file_size,
    });
    StatusCode::ACCEPTED
}

async fn delete_file(State(state): State<AppState>, Json(body): Json<FileRequest>) -> impl IntoResponse {
    state.coordinator.submit(Event::FileDeleted {
        category_id: body.category_id,
        file_size: body.file_size,
    });
    StatusCode::ACCEPTED
}
