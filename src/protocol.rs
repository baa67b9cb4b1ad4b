//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::board::{AnswerOutcome, DeleteStep, SortOrder};
use crate::domain::{CaseStudy, DiseaseField, User};
use crate::logic::BoardSnapshot;
use crate::registry::CategoryRegistry;

const PREVIEW_CHARS: usize = 100;

//
// Auth
//

#[derive(Deserialize)]
pub struct CredentialsIn {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionOut {
    pub token: String,
    pub user: User,
}

//
// Fields
//

#[derive(Serialize)]
pub struct FieldOut {
    pub key: DiseaseField,
    pub label: String,
    #[serde(rename = "titlePrefix")]
    pub title_prefix: String,
}

pub fn fields_out(registry: &CategoryRegistry) -> Vec<FieldOut> {
    registry
        .iter()
        .map(|(field, def)| FieldOut {
            key: field,
            label: field.label(),
            title_prefix: def.title_prefix.clone(),
        })
        .collect()
}

//
// Cases
//

#[derive(Debug, Deserialize)]
pub struct GenerateIn {
    pub field: String,
}

/// List entry: title plus a short preview of the vignette.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSummaryOut {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub disease_field: DiseaseField,
    pub field_label: String,
}

/// What the quiz screen shows before the answer is submitted (no answer, no explanation).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseQuestionOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub question: String,
    pub options: Vec<String>,
    pub disease_field: DiseaseField,
}

pub fn to_summary(c: &CaseStudy) -> CaseSummaryOut {
    let mut preview: String = c.description.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    CaseSummaryOut {
        id: c.id.clone().unwrap_or_default(),
        title: c.title.clone(),
        preview,
        disease_field: c.disease_field,
        field_label: c.disease_field.label(),
    }
}

pub fn to_question(c: &CaseStudy) -> CaseQuestionOut {
    CaseQuestionOut {
        id: c.id.clone().unwrap_or_default(),
        title: c.title.clone(),
        description: c.description.clone(),
        question: c.question.clone(),
        options: c.options.clone(),
        disease_field: c.disease_field,
    }
}

#[derive(Deserialize)]
pub struct AnswerIn {
    pub answer: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
    pub correct: bool,
    pub chosen: String,
    pub correct_answer: String,
    pub explanation: String,
}

impl From<AnswerOutcome> for AnswerOut {
    fn from(o: AnswerOutcome) -> Self {
        Self {
            correct: o.correct,
            chosen: o.chosen,
            correct_answer: o.correct_answer,
            explanation: o.explanation,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOut {
    pub deleted: bool,
    pub awaiting_confirmation: bool,
}

impl From<DeleteStep> for DeleteOut {
    fn from(step: DeleteStep) -> Self {
        match step {
            DeleteStep::AwaitingConfirmation => Self { deleted: false, awaiting_confirmation: true },
            DeleteStep::Confirmed => Self { deleted: true, awaiting_confirmation: false },
        }
    }
}

//
// Board
//

#[derive(Deserialize)]
pub struct FilterIn {
    /// "all" or a field key.
    pub field: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardOut {
    pub cases: Vec<CaseSummaryOut>,
    pub total: usize,
    pub filter: String,
    pub sort: SortOrder,
    pub selected: Option<String>,
    pub chosen_answer: Option<String>,
    pub show_result: bool,
    pub delete_confirm: Option<String>,
    pub generating: bool,
    pub error: Option<String>,
}

impl From<BoardSnapshot> for BoardOut {
    fn from(s: BoardSnapshot) -> Self {
        Self {
            cases: s.cases.iter().map(to_summary).collect(),
            total: s.total,
            filter: s.filter.as_key().to_string(),
            sort: s.sort,
            selected: s.selected,
            chosen_answer: s.chosen_answer,
            show_result: s.show_result,
            delete_confirm: s.delete_confirm,
            generating: s.generating,
            error: s.error,
        }
    }
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub message: String,
}
