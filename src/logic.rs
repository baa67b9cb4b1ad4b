//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Signing users up/in/out and loading their saved cases into a board
//!   - Generating a case study, persisting it and adding it to the board (single-flight per user)
//!   - Two-step deletion against store and board together
//!   - Selecting and answering a case, filtering and sorting the list

use tracing::{error, info, instrument, warn};

use crate::auth::{AuthError, Authenticator, Session};
use crate::board::{AnswerOutcome, BoardError, CaseBoard, DeleteStep, FieldFilter, SortOrder};
use crate::domain::{CaseStudy, DiseaseField, UnknownField, User};
use crate::pubmed::LiteratureSearch;
use crate::state::AppState;
use crate::store::{CaseStore, StoreError};

pub const LOAD_FAILED: &str = "Failed to load case studies.";
pub const GENERATE_FAILED: &str = "Failed to generate case study. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete case study.";

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
  #[error("Please sign in first.")]
  NotSignedIn,
  #[error(transparent)]
  Auth(#[from] AuthError),
  #[error(transparent)]
  Field(#[from] UnknownField),
  #[error(transparent)]
  Board(#[from] BoardError),
  #[error("{message}")]
  Store { message: &'static str, #[source] source: StoreError },
}

/// Snapshot handed to the protocol layer.
pub struct BoardSnapshot {
  pub cases: Vec<CaseStudy>,
  pub total: usize,
  pub filter: FieldFilter,
  pub sort: SortOrder,
  pub selected: Option<String>,
  pub chosen_answer: Option<String>,
  pub show_result: bool,
  pub delete_confirm: Option<String>,
  pub generating: bool,
  pub error: Option<String>,
}

impl BoardSnapshot {
  fn of(board: &CaseBoard, generating: bool) -> Self {
    Self {
      cases: board.visible().into_iter().cloned().collect(),
      total: board.len(),
      filter: board.filter(),
      sort: board.sort(),
      selected: board.selected().and_then(|c| c.id.clone()),
      chosen_answer: board.chosen_answer().map(str::to_string),
      show_result: board.show_result(),
      delete_confirm: board.delete_confirm().map(str::to_string),
      generating,
      error: board.error().map(str::to_string),
    }
  }
}

// -------- Sessions --------

#[instrument(level = "info", skip(state, password))]
pub async fn sign_up<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, email: &str, password: &str) -> Result<Session, ActionError> {
  let session = state.auth.sign_up(email, password).await?;
  open_board(state, &session.user).await;
  Ok(session)
}

#[instrument(level = "info", skip(state, password))]
pub async fn sign_in<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, email: &str, password: &str) -> Result<Session, ActionError> {
  let session = state.auth.sign_in(email, password).await?;
  open_board(state, &session.user).await;
  Ok(session)
}

/// Revoke the token and drop the user's board (list, selection, filters).
#[instrument(level = "info", skip_all)]
pub async fn sign_out<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, token: &str) -> Result<(), ActionError> {
  let user = current_user(state, token).await?;
  state.auth.sign_out(token).await?;
  state.boards.write().await.remove(&user.uid);
  info!(target: "medsky_backend", uid = %user.uid, "Signed out; board cleared");
  Ok(())
}

pub async fn current_user<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, token: &str) -> Result<User, ActionError> {
  state.auth.resolve(token).await.ok_or(ActionError::NotSignedIn)
}

/// Fill the user's board from the store. An existing board (another live session) keeps
/// its view state and in-flight guard; only the list is replaced. A failed load leaves
/// the board carrying the error.
async fn open_board<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, user: &User) {
  let loaded = state.store.list(&user.uid).await;
  let mut boards = state.boards.write().await;
  let board = boards.entry(user.uid.clone()).or_default();
  match loaded {
    Ok(cases) => {
      info!(target: "medsky_backend", uid = %user.uid, count = cases.len(), "Loaded saved case studies");
      board.replace_cases(cases);
      board.clear_error();
    }
    Err(e) => {
      error!(target: "medsky_backend", uid = %user.uid, error = %e, "Loading case studies failed");
      board.set_error(LOAD_FAILED);
    }
  }
}

/// Make sure a board exists for `user` (e.g. a session opened before the board was dropped).
async fn ensure_board<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, user: &User) {
  let present = { state.boards.read().await.contains_key(&user.uid) };
  if !present {
    open_board(state, user).await;
  }
}

async fn with_board<S, P, T>(state: &AppState<S, P>, user: &User, f: impl FnOnce(&mut CaseBoard) -> T) -> T
where
  S: LiteratureSearch,
  P: CaseStore,
{
  ensure_board(state, user).await;
  let mut boards = state.boards.write().await;
  let board = boards.entry(user.uid.clone()).or_default();
  f(board)
}

/// Apply `f` only if the user's board is still open. Used after long awaits, where a
/// sign-out in between must not bring the board back.
async fn with_open_board<S, P, T>(state: &AppState<S, P>, user: &User, f: impl FnOnce(&mut CaseBoard) -> T) -> Option<T>
where
  S: LiteratureSearch,
  P: CaseStore,
{
  state.boards.write().await.get_mut(&user.uid).map(f)
}

async fn snapshot_after<S, P>(state: &AppState<S, P>, user: &User, f: impl FnOnce(&mut CaseBoard)) -> BoardSnapshot
where
  S: LiteratureSearch,
  P: CaseStore,
{
  let generating = state.in_flight.is_busy(&user.uid).await;
  with_board(state, user, |b| {
    f(b);
    BoardSnapshot::of(b, generating)
  })
  .await
}

// -------- Board actions --------

pub async fn board_snapshot<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, user: &User) -> BoardSnapshot {
  snapshot_after(state, user, |_| {}).await
}

pub async fn set_filter<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, user: &User, filter: &str) -> Result<BoardSnapshot, ActionError> {
  let filter = FieldFilter::parse(filter)?;
  Ok(snapshot_after(state, user, |b| b.set_filter(filter)).await)
}

pub async fn toggle_sort<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, user: &User) -> BoardSnapshot {
  snapshot_after(state, user, |b| {
    b.toggle_sort();
  })
  .await
}

/// Generate a case for `field`, persist it, then add it to the board.
/// Rejected with `Busy` while another generation for the same user is in flight.
#[instrument(level = "info", skip(state, user), fields(uid = %user.uid, %field))]
pub async fn generate_case<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, user: &User, field: &str) -> Result<CaseStudy, ActionError> {
  let field: DiseaseField = field.parse()?;

  let _in_flight = state
    .in_flight
    .try_begin(&user.uid)
    .await
    .inspect_err(|_| warn!(target: "case_study", uid = %user.uid, %field, "Generation already in flight"))?;
  with_board(state, user, CaseBoard::clear_error).await;

  let case = state.generator.generate(field).await;

  match state.store.append(&user.uid, case.clone()).await {
    Ok(id) => {
      let saved = case.with_id(id);
      with_open_board(state, user, |b| b.push_case(saved.clone())).await;
      info!(target: "case_study", uid = %user.uid, id = ?saved.id, title = %saved.title, "Case study saved");
      Ok(saved)
    }
    Err(e) => {
      error!(target: "case_study", uid = %user.uid, error = %e, "Saving case study failed");
      with_open_board(state, user, |b| b.set_error(GENERATE_FAILED)).await;
      Err(ActionError::Store { message: GENERATE_FAILED, source: e })
    }
  }
}

/// First call arms confirmation; a second call on the same id deletes from store and board.
#[instrument(level = "info", skip(state, user), fields(uid = %user.uid, %id))]
pub async fn delete_case<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, user: &User, id: &str) -> Result<DeleteStep, ActionError> {
  let step = with_board(state, user, |b| b.request_delete(id)).await?;
  if step == DeleteStep::AwaitingConfirmation {
    return Ok(step);
  }

  match state.store.delete(&user.uid, id).await {
    Ok(()) => {
      with_open_board(state, user, |b| b.remove_case(id)).await;
      info!(target: "medsky_backend", uid = %user.uid, %id, "Case study deleted");
      Ok(step)
    }
    Err(e) => {
      error!(target: "medsky_backend", uid = %user.uid, %id, error = %e, "Deleting case study failed");
      with_open_board(state, user, |b| b.set_error(DELETE_FAILED)).await;
      Err(ActionError::Store { message: DELETE_FAILED, source: e })
    }
  }
}

pub async fn back_to_list<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, user: &User) -> BoardSnapshot {
  snapshot_after(state, user, CaseBoard::back_to_list).await
}

pub async fn select_case<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, user: &User, id: &str) -> Result<CaseStudy, ActionError> {
  Ok(with_board(state, user, |b| b.select(id).cloned()).await?)
}

/// Select (if needed), choose and submit in one step.
#[instrument(level = "info", skip(state, user, answer), fields(uid = %user.uid, %id))]
pub async fn answer_case<S: LiteratureSearch, P: CaseStore>(state: &AppState<S, P>, user: &User, id: &str, answer: &str) -> Result<AnswerOutcome, ActionError> {
  let outcome = with_board(state, user, |b| {
    if b.selected().and_then(|c| c.id.as_deref()) != Some(id) {
      b.select(id)?;
    }
    b.choose_answer(answer)?;
    b.submit_answer()
  })
  .await?;
  info!(target: "case_study", uid = %user.uid, %id, correct = outcome.correct, "Answer evaluated");
  Ok(outcome)
}
