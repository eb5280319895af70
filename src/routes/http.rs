//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use chrono::Utc;
use tracing::{error, info, instrument};

use crate::error::StoreError;
use crate::insights::RECENT_DEFAULT;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

/// Store failures mapped onto HTTP statuses with a JSON body.
pub struct ApiError(StatusCode, String);

impl ApiError {
  fn not_found(what: &str) -> Self {
    ApiError(StatusCode::NOT_FOUND, format!("{} not found", what))
  }
}

impl From<StoreError> for ApiError {
  fn from(e: StoreError) -> Self {
    match e {
      StoreError::Validation(_) => ApiError(StatusCode::BAD_REQUEST, e.to_string()),
      StoreError::Corrupt(_) => {
        error!(target: "topic_store", error = %e, "Persisted topics unreadable");
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, format!("{}: POST /api/v1/store/reset", e))
      }
      _ => {
        error!(target: "topic_store", error = %e, "Store failure");
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.0, Json(ErrorOut { error: self.1 })).into_response()
  }
}

type ApiResult<T> = Result<T, ApiError>;

fn topics_out(topics: Vec<crate::domain::Topic>) -> Vec<TopicOut> {
  let now = Utc::now();
  topics.into_iter().map(|t| topic_out(t, now)).collect()
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_topics(
  State(state): State<Arc<AppState>>,
  Query(q): Query<TopicsQuery>,
) -> ApiResult<Json<Vec<TopicOut>>> {
  let topics = logic::list_topics(&state, q.search.as_deref()).await?;
  Ok(Json(topics_out(topics)))
}

#[instrument(level = "info", skip(state, body), fields(name = %body.name))]
pub async fn http_create_topic(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CreateTopicIn>,
) -> ApiResult<(StatusCode, Json<TopicOut>)> {
  let topic = logic::create_topic(&state, &body.name).await?;
  info!(target: "topic_store", id = %topic.id, "HTTP topic created");
  Ok((StatusCode::CREATED, Json(topic_out(topic, Utc::now()))))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_topic(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<Json<TopicOut>> {
  let topic = logic::get_topic(&state, &id).await?.ok_or_else(|| ApiError::not_found("topic"))?;
  Ok(Json(topic_out(topic, Utc::now())))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_topic(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<StatusCode> {
  let removed = logic::delete_topic(&state, &id).await?;
  info!(target: "topic_store", %id, removed, "HTTP delete_topic");
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, body), fields(score = body.score))]
pub async fn http_post_result(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<QuizResultIn>,
) -> ApiResult<StatusCode> {
  if body.score > 100 {
    return Err(ApiError(StatusCode::BAD_REQUEST, "score must be within 0..=100".into()));
  }
  if body.total_count == 0 {
    return Err(ApiError(StatusCode::BAD_REQUEST, "totalCount must be at least 1".into()));
  }
  if body.correct_count > body.total_count {
    return Err(ApiError(StatusCode::BAD_REQUEST, "correctCount must not exceed totalCount".into()));
  }
  let updated = logic::record_result(&state, &id, &body.into_result(id.clone())).await?;
  info!(target: "topic_store", %id, applied = updated.is_some(), "HTTP quiz result recorded");
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state))]
pub async fn http_due_topics(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<TopicOut>>> {
  Ok(Json(topics_out(logic::due(&state).await?)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_recent_topics(
  State(state): State<Arc<AppState>>,
  Query(q): Query<RecentQuery>,
) -> ApiResult<Json<Vec<TopicOut>>> {
  let limit = q.limit.unwrap_or(RECENT_DEFAULT);
  Ok(Json(topics_out(logic::recent(&state, limit).await?)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_stats(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
  Ok(Json(logic::stats(&state).await?))
}

#[instrument(level = "info", skip(state), fields(topic_id = %q.topic_id))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuizQuery>,
) -> ApiResult<impl IntoResponse> {
  let questions = logic::quiz_for_topic(&state, &q.topic_id, q.focus_concept_id.as_deref())
    .await?
    .ok_or_else(|| ApiError::not_found("topic"))?;
  info!(target: "quiz", topic_id = %q.topic_id, count = questions.len(), "HTTP quiz served");
  Ok(Json(questions))
}

#[instrument(level = "info", skip(state))]
pub async fn http_quiz_topics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(QuizTopicsOut { topics: state.bank.display_names() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_reset_store(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<TopicOut>>> {
  Ok(Json(topics_out(logic::reset_store(&state).await?)))
}
