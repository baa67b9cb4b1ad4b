//! Per-user board: the list of saved cases plus the quiz interaction state around it
//! (selection, chosen answer, filter, sort, pending delete, last error), and the per-user
//! single-flight guard for generation.
//!
//! Pure state; the async orchestration that talks to the generator and the store lives in `logic`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::{CaseStudy, DiseaseField};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// "all" or one field key on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldFilter {
    #[default]
    All,
    Only(DiseaseField),
}

impl FieldFilter {
    pub fn parse(s: &str) -> Result<Self, crate::domain::UnknownField> {
        match s.trim() {
            "all" => Ok(FieldFilter::All),
            other => other.parse().map(FieldFilter::Only),
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            FieldFilter::All => "all",
            FieldFilter::Only(f) => f.key(),
        }
    }

    fn admits(self, case: &CaseStudy) -> bool {
        match self {
            FieldFilter::All => true,
            FieldFilter::Only(f) => case.disease_field == f,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("case study {0} not found")]
    UnknownCase(String),
    #[error("no case study selected")]
    NothingSelected,
    #[error("{0:?} is not an option of the selected case")]
    NotAnOption(String),
    #[error("choose an answer first")]
    NoAnswerChosen,
    #[error("a case study is already being generated")]
    Busy,
}

/// Result of submitting the chosen answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub chosen: String,
    pub correct_answer: String,
    pub explanation: String,
}

/// What a delete request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteStep {
    /// First request: the case is now awaiting confirmation.
    AwaitingConfirmation,
    /// Second request on the same id: go ahead and delete.
    Confirmed,
}

#[derive(Debug, Default)]
pub struct CaseBoard {
    cases: Vec<CaseStudy>,
    selected: Option<String>,
    chosen_answer: Option<String>,
    show_result: bool,
    filter: FieldFilter,
    sort: SortOrder,
    delete_confirm: Option<String>,
    error: Option<String>,
}

impl CaseBoard {
    pub fn replace_cases(&mut self, cases: Vec<CaseStudy>) {
        self.cases = cases;
        if let Some(id) = &self.selected {
            if self.find(id).is_none() {
                self.back_to_list();
            }
        }
    }

    /// Appends unless a case with the same id is already listed.
    pub fn push_case(&mut self, case: CaseStudy) {
        if let Some(id) = &case.id {
            if self.find(id).is_some() {
                return;
            }
        }
        self.cases.push(case);
    }

    pub fn remove_case(&mut self, id: &str) -> bool {
        let before = self.cases.len();
        self.cases.retain(|c| c.id.as_deref() != Some(id));
        if self.selected.as_deref() == Some(id) {
            self.back_to_list();
        }
        if self.delete_confirm.as_deref() == Some(id) {
            self.delete_confirm = None;
        }
        self.cases.len() != before
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn find(&self, id: &str) -> Option<&CaseStudy> {
        self.cases.iter().find(|c| c.id.as_deref() == Some(id))
    }

    /// Open a case for answering; clears any previous answer and result.
    pub fn select(&mut self, id: &str) -> Result<&CaseStudy, BoardError> {
        if self.find(id).is_none() {
            return Err(BoardError::UnknownCase(id.to_string()));
        }
        self.selected = Some(id.to_string());
        self.chosen_answer = None;
        self.show_result = false;
        self.find(id).ok_or_else(|| BoardError::UnknownCase(id.to_string()))
    }

    pub fn selected(&self) -> Option<&CaseStudy> {
        self.selected.as_deref().and_then(|id| self.find(id))
    }

    pub fn back_to_list(&mut self) {
        self.selected = None;
        self.chosen_answer = None;
        self.show_result = false;
    }

    pub fn choose_answer(&mut self, option: &str) -> Result<(), BoardError> {
        let case = self.selected().ok_or(BoardError::NothingSelected)?;
        if !case.options.iter().any(|o| o == option) {
            return Err(BoardError::NotAnOption(option.to_string()));
        }
        self.chosen_answer = Some(option.to_string());
        self.show_result = false;
        Ok(())
    }

    pub fn submit_answer(&mut self) -> Result<AnswerOutcome, BoardError> {
        let case = self.selected().ok_or(BoardError::NothingSelected)?;
        let chosen = self.chosen_answer.clone().ok_or(BoardError::NoAnswerChosen)?;
        let outcome = AnswerOutcome {
            correct: case.is_correct(&chosen),
            correct_answer: case.correct_answer.clone(),
            explanation: case.explanation.clone(),
            chosen,
        };
        self.show_result = true;
        Ok(outcome)
    }

    pub fn show_result(&self) -> bool {
        self.show_result
    }

    pub fn chosen_answer(&self) -> Option<&str> {
        self.chosen_answer.as_deref()
    }

    /// Two-step delete: the first request arms confirmation, a second one on the same id confirms.
    pub fn request_delete(&mut self, id: &str) -> Result<DeleteStep, BoardError> {
        if self.find(id).is_none() {
            return Err(BoardError::UnknownCase(id.to_string()));
        }
        if self.delete_confirm.as_deref() == Some(id) {
            Ok(DeleteStep::Confirmed)
        } else {
            self.delete_confirm = Some(id.to_string());
            Ok(DeleteStep::AwaitingConfirmation)
        }
    }

    pub fn delete_confirm(&self) -> Option<&str> {
        self.delete_confirm.as_deref()
    }

    pub fn set_filter(&mut self, filter: FieldFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> FieldFilter {
        self.filter
    }

    pub fn toggle_sort(&mut self) -> SortOrder {
        self.sort = self.sort.toggled();
        self.sort
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Cases passing the filter, ordered by title.
    pub fn visible(&self) -> Vec<&CaseStudy> {
        let mut out: Vec<&CaseStudy> = self.cases.iter().filter(|c| self.filter.admits(c)).collect();
        out.sort_by(|a, b| {
            let ord = compare_titles(&a.title, &b.title);
            match self.sort {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        out
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// One generation lock per uid. Lives beside the boards, not inside them, so dropping
/// a board on sign-out does not release a generation that is still running.
#[derive(Clone, Default)]
pub struct InFlight {
    by_uid: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
}

impl InFlight {
    async fn lock_for(&self, uid: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.by_uid.read().await.get(uid) {
            return lock.clone();
        }
        self.by_uid.write().await.entry(uid.to_string()).or_default().clone()
    }

    /// Held for the whole generate-and-save action.
    pub async fn try_begin(&self, uid: &str) -> Result<OwnedMutexGuard<()>, BoardError> {
        self.lock_for(uid).await.try_lock_owned().map_err(|_| BoardError::Busy)
    }

    pub async fn is_busy(&self, uid: &str) -> bool {
        match self.by_uid.read().await.get(uid) {
            Some(lock) => lock.try_lock().is_err(),
            None => false,
        }
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}
