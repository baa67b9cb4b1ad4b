//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs its parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, State},
  http::{header, HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument, warn};

use crate::auth::AuthError;
use crate::board::BoardError;
use crate::domain::User;
use crate::logic::{self, ActionError};
use crate::protocol::*;
use crate::pubmed::LiteratureSearch;
use crate::state::AppState;
use crate::store::CaseStore;

type Shared<S, P> = State<Arc<AppState<S, P>>>;

/// Failure of a request, rendered as `{"message": ...}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub ActionError);

impl From<ActionError> for ApiError {
  fn from(e: ActionError) -> Self { Self(e) }
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match &self.0 {
      ActionError::NotSignedIn => StatusCode::UNAUTHORIZED,
      ActionError::Auth(AuthError::InvalidCredentials | AuthError::UnknownSession) => StatusCode::UNAUTHORIZED,
      ActionError::Auth(AuthError::InvalidEmail | AuthError::WeakPassword) => StatusCode::BAD_REQUEST,
      ActionError::Auth(AuthError::EmailInUse) => StatusCode::CONFLICT,
      ActionError::Field(_) => StatusCode::BAD_REQUEST,
      ActionError::Board(BoardError::UnknownCase(_)) => StatusCode::NOT_FOUND,
      ActionError::Board(BoardError::Busy) => StatusCode::CONFLICT,
      ActionError::Board(_) => StatusCode::BAD_REQUEST,
      ActionError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(target: "medsky_backend", %status, error = ?self.0, "Request failed");
    } else {
      warn!(target: "medsky_backend", %status, error = %self.0, "Request rejected");
    }
    (status, Json(ErrorOut { message: self.0.to_string() })).into_response()
  }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

async fn signed_in<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, headers: &HeaderMap) -> Result<User, ApiError> {
  let token = bearer(headers).ok_or(ActionError::NotSignedIn)?;
  Ok(logic::current_user(state, token).await?)
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

pub async fn http_get_fields<S: LiteratureSearch, P: CaseStore>(State(state): Shared<S, P>) -> impl IntoResponse {
  Json(fields_out(state.generator.registry()))
}

// -------- Auth --------

#[instrument(level = "info", skip(state, body), fields(email = %body.email))]
pub async fn http_sign_up<S: LiteratureSearch, P: CaseStore>(
  State(state): Shared<S, P>,
  Json(body): Json<CredentialsIn>,
) -> Result<impl IntoResponse, ApiError> {
  let session = logic::sign_up(&state, &body.email, &body.password).await?;
  info!(target: "medsky_backend", uid = %session.user.uid, "HTTP sign-up succeeded");
  Ok((StatusCode::CREATED, Json(SessionOut { token: session.token, user: session.user })))
}

#[instrument(level = "info", skip(state, body), fields(email = %body.email))]
pub async fn http_sign_in<S: LiteratureSearch, P: CaseStore>(
  State(state): Shared<S, P>,
  Json(body): Json<CredentialsIn>,
) -> Result<Json<SessionOut>, ApiError> {
  let session = logic::sign_in(&state, &body.email, &body.password).await?;
  info!(target: "medsky_backend", uid = %session.user.uid, "HTTP sign-in succeeded");
  Ok(Json(SessionOut { token: session.token, user: session.user }))
}

#[instrument(level = "info", skip_all)]
pub async fn http_sign_out<S: LiteratureSearch, P: CaseStore>(
  State(state): Shared<S, P>,
  headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
  let token = bearer(&headers).ok_or(ActionError::NotSignedIn)?;
  logic::sign_out(&state, token).await?;
  Ok(StatusCode::NO_CONTENT)
}

// -------- Board --------

#[instrument(level = "info", skip_all)]
pub async fn http_get_board<S: LiteratureSearch, P: CaseStore>(
  State(state): Shared<S, P>,
  headers: HeaderMap,
) -> Result<Json<BoardOut>, ApiError> {
  let user = signed_in(&state, &headers).await?;
  Ok(Json(logic::board_snapshot(&state, &user).await.into()))
}

#[instrument(level = "info", skip(state, headers, body), fields(field = %body.field))]
pub async fn http_put_filter<S: LiteratureSearch, P: CaseStore>(
  State(state): Shared<S, P>,
  headers: HeaderMap,
  Json(body): Json<FilterIn>,
) -> Result<Json<BoardOut>, ApiError> {
  let user = signed_in(&state, &headers).await?;
  Ok(Json(logic::set_filter(&state, &user, &body.field).await?.into()))
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_sort<S: LiteratureSearch, P: CaseStore>(
  State(state): Shared<S, P>,
  headers: HeaderMap,
) -> Result<Json<BoardOut>, ApiError> {
  let user = signed_in(&state, &headers).await?;
  Ok(Json(logic::toggle_sort(&state, &user).await.into()))
}

#[instrument(level = "info", skip_all)]
pub async fn http_clear_selection<S: LiteratureSearch, P: CaseStore>(
  State(state): Shared<S, P>,
  headers: HeaderMap,
) -> Result<Json<BoardOut>, ApiError> {
  let user = signed_in(&state, &headers).await?;
  Ok(Json(logic::back_to_list(&state, &user).await.into()))
}

// -------- Cases --------

#[instrument(level = "info", skip(state, headers, body), fields(field = %body.field))]
pub async fn http_post_case<S: LiteratureSearch, P: CaseStore>(
  State(state): Shared<S, P>,
  headers: HeaderMap,
  Json(body): Json<GenerateIn>,
) -> Result<impl IntoResponse, ApiError> {
  let user = signed_in(&state, &headers).await?;
  let case = logic::generate_case(&state, &user, &body.field).await?;
  info!(target: "case_study", uid = %user.uid, id = ?case.id, "HTTP case study generated");
  Ok((StatusCode::CREATED, Json(to_summary(&case))))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_case<S: LiteratureSearch, P: CaseStore>(
  State(state): Shared<S, P>,
  headers: HeaderMap,
  Path(id): Path<String>,
) -> Result<Json<CaseQuestionOut>, ApiError> {
  let user = signed_in(&state, &headers).await?;
  let case = logic::select_case(&state, &user, &id).await?;
  Ok(Json(to_question(&case)))
}

#[instrument(level = "info", skip(state, headers, body), fields(answer_len = body.answer.len()))]
pub async fn http_post_answer<S: LiteratureSearch, P: CaseStore>(
  State(state): Shared<S, P>,
  headers: HeaderMap,
  Path(id): Path<String>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  let user = signed_in(&state, &headers).await?;
  let outcome = logic::answer_case(&state, &user, &id, &body.answer).await?;
  Ok(Json(outcome.into()))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_delete_case<S: LiteratureSearch, P: CaseStore>(
  State(state): Shared<S, P>,
  headers: HeaderMap,
  Path(id): Path<String>,
) -> Result<Json<DeleteOut>, ApiError> {
  let user = signed_in(&state, &headers).await?;
  let step = logic::delete_case(&state, &user, &id).await?;
  Ok(Json(step.into()))
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request, Router};
  use http_body_util::BodyExt;
  use serde_json::{json, Value};
  use tower::ServiceExt;

  use crate::config::GenerationSettings;
  use crate::generator::CaseGenerator;
  use crate::registry::CategoryRegistry;
  use crate::routes::build_router;
  use crate::state::AppState;
  use crate::store::InMemoryCaseStore;
  use crate::testing::FakeSearch;

  use super::*;

  fn app() -> Router {
    let search = FakeSearch::default().with_hit("pediatric diagnosis", "10", "Asthma in children");
    let gen = CaseGenerator::new(Arc::new(CategoryRegistry::builtin()), search, &GenerationSettings::default());
    build_router(Arc::new(AppState::with_parts(gen, InMemoryCaseStore::new())))
  }

  async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      req = req.header("authorization", format!("Bearer {t}"));
    }
    let req = match body {
      Some(b) => req.header("content-type", "application/json").body(Body::from(b.to_string())).unwrap(),
      None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
  }

  async fn token(app: &Router) -> String {
    let (status, body) = call(app, "POST", "/api/v1/auth/sign_up", None, Some(json!({"email": "doc@example.org", "password": "secret1"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
  }

  #[tokio::test]
  async fn health_and_fields_are_public() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (status, body) = call(&app, "GET", "/api/v1/fields", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 13);
    assert_eq!(body[2]["key"], "endocrinology");
    assert_eq!(body[6]["label"], "Obstetrics Gynecology");
  }

  #[tokio::test]
  async fn user_routes_need_a_session() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/v1/board", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Please sign in first.");

    let (status, _) = call(&app, "GET", "/api/v1/board", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn auth_errors_map_to_statuses() {
    let app = app();
    let t = token(&app).await;
    assert!(!t.is_empty());

    let dup = json!({"email": "doc@example.org", "password": "secret1"});
    let (status, _) = call(&app, "POST", "/api/v1/auth/sign_up", None, Some(dup)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let weak = json!({"email": "other@example.org", "password": "123"});
    let (status, body) = call(&app, "POST", "/api/v1/auth/sign_up", None, Some(weak)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Password should be at least 6 characters.");

    let wrong = json!({"email": "doc@example.org", "password": "nope123"});
    let (status, _) = call(&app, "POST", "/api/v1/auth/sign_in", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn generate_answer_and_delete_flow() {
    let app = app();
    let t = token(&app).await;

    let (status, body) = call(&app, "POST", "/api/v1/cases", Some(&t), Some(json!({"field": "pediatrics"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["title"].as_str().unwrap().starts_with("Pediatric Case in a "));
    let id = body["id"].as_str().unwrap().to_string();

    let (status, q) = call(&app, "GET", &format!("/api/v1/cases/{id}"), Some(&t), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(q["options"][0], "A. Asthma");
    assert!(q.get("correctAnswer").is_none());

    let (status, a) = call(&app, "POST", &format!("/api/v1/cases/{id}/answer"), Some(&t), Some(json!({"answer": "A. Asthma"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(a["correct"], true);
    assert_eq!(a["correctAnswer"], "A. Asthma");

    let (status, _) = call(&app, "POST", &format!("/api/v1/cases/{id}/answer"), Some(&t), Some(json!({"answer": "E. Nothing"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, board) = call(&app, "DELETE", "/api/v1/board/selection", Some(&t), None).await;
    assert_eq!(board["selected"], Value::Null);

    let (_, d) = call(&app, "DELETE", &format!("/api/v1/cases/{id}"), Some(&t), None).await;
    assert_eq!(d, json!({"deleted": false, "awaitingConfirmation": true}));
    let (_, d) = call(&app, "DELETE", &format!("/api/v1/cases/{id}"), Some(&t), None).await;
    assert_eq!(d, json!({"deleted": true, "awaitingConfirmation": false}));

    let (status, _) = call(&app, "GET", &format!("/api/v1/cases/{id}"), Some(&t), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn unknown_field_is_bad_request() {
    let app = app();
    let t = token(&app).await;
    let (status, body) = call(&app, "POST", "/api/v1/cases", Some(&t), Some(json!({"field": "cardio"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("cardio"));
  }

  #[tokio::test]
  async fn board_filter_sort_and_sign_out() {
    let app = app();
    let t = token(&app).await;
    call(&app, "POST", "/api/v1/cases", Some(&t), Some(json!({"field": "oncology"}))).await;
    call(&app, "POST", "/api/v1/cases", Some(&t), Some(json!({"field": "cardiology"}))).await;

    let (status, board) = call(&app, "PUT", "/api/v1/board/filter", Some(&t), Some(json!({"field": "oncology"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["total"], 2);
    assert_eq!(board["filter"], "oncology");
    assert_eq!(board["cases"].as_array().unwrap().len(), 1);

    let (_, board) = call(&app, "POST", "/api/v1/board/sort", Some(&t), None).await;
    assert_eq!(board["sort"], "descending");

    let (status, _) = call(&app, "POST", "/api/v1/auth/sign_out", Some(&t), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", "/api/v1/board", Some(&t), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }
}
