//! Case-study generation: template fill over the category tables plus two best-effort
//! literature lookups.
//!
//! Flow for one case:
//! 1) Resolve the condition (search the field's seed term, first hit's title, first word).
//! 2) Sample patient, symptoms, history, vitals, labs and question template.
//! 3) Build the four options (A = condition, B = another example, C/D fixed decoys).
//! 4) Resolve an explanation fragment for the condition.
//!
//! Both lookups are bounded by a timeout and fall back to static text. Assembly problems
//! (an empty pool) yield the fixed fallback record, so `generate` never fails.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, instrument, warn};

use crate::config::GenerationSettings;
use crate::domain::{CaseStudy, DiseaseField, PatientProfile};
use crate::pubmed::LiteratureSearch;
use crate::registry::{CategoryDef, CategoryRegistry};
use crate::seeds::{fallback_case_study, PATIENTS, QUESTION_TEMPLATES};
use crate::util::{fill_template, sample_distinct};

pub const EXPLANATION_UNAVAILABLE: &str = "Unable to fetch PubMed explanation.";
const ALTERNATIVE_CONDITION: &str = "Alternative Condition";
const DECOY_C: &str = "C. Unrelated Condition";
const DECOY_D: &str = "D. Normal Finding";
const SYMPTOM_COUNT: usize = 3;

const DESCRIPTION_TEMPLATE: &str = "A {age}-year-old {gender} presents with {symptoms}. Patient has a {history}. Vital signs: {vitals}. Laboratory findings: {labs}.";

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
  #[error("no {pool} available for {field}")]
  EmptyPool { pool: &'static str, field: DiseaseField },
  #[error("no condition could be resolved for {0}")]
  NoCondition(DiseaseField),
}

pub struct CaseGenerator<S> {
  registry: Arc<CategoryRegistry>,
  search: S,
  lookup_timeout: Duration,
  condition_retmax: u32,
  explanation_retmax: u32,
}

impl<S: LiteratureSearch> CaseGenerator<S> {
  pub fn new(registry: Arc<CategoryRegistry>, search: S, settings: &GenerationSettings) -> Self {
    Self {
      registry,
      search,
      lookup_timeout: settings.lookup_timeout(),
      condition_retmax: settings.condition_retmax,
      explanation_retmax: settings.explanation_retmax,
    }
  }

  pub fn registry(&self) -> &CategoryRegistry {
    &self.registry
  }

  /// Always returns a case study for `field`; never fails.
  pub async fn generate(&self, field: DiseaseField) -> CaseStudy {
    let mut rng = StdRng::from_entropy();
    self.generate_with_rng(field, &mut rng).await
  }

  /// Same as `generate`, with the caller's random source.
  #[instrument(level = "info", skip(self, rng), fields(%field))]
  pub async fn generate_with_rng<R: Rng + Send + ?Sized>(&self, field: DiseaseField, rng: &mut R) -> CaseStudy {
    match self.assemble(field, rng).await {
      Ok(case) => {
        info!(target: "case_study", %field, title = %case.title, answer = %case.correct_answer, "Case study generated");
        case
      }
      Err(e) => {
        error!(target: "case_study", %field, error = %e, "Case assembly failed; returning fallback case");
        fallback_case_study(field)
      }
    }
  }

  async fn assemble<R: Rng + Send + ?Sized>(&self, field: DiseaseField, rng: &mut R) -> Result<CaseStudy, AssemblyError> {
    let def = self.registry.get(field);
    let condition = self
      .resolve_condition(field)
      .await
      .ok_or(AssemblyError::NoCondition(field))?;
    let draft = Draft::sample(field, def, &condition, rng)?;
    let fragment = self.resolve_explanation(&condition).await;
    Ok(draft.finish(&condition, &fragment))
  }

  /// Condition name for `field`: first word of the top search hit's title, else the
  /// field's first built-in example. `None` only when both are unavailable.
  #[instrument(level = "debug", skip(self), fields(%field))]
  pub async fn resolve_condition(&self, field: DiseaseField) -> Option<String> {
    let def = self.registry.get(field);
    let fallback = def.condition_examples.first().cloned();
    match self.bounded(self.lookup_condition(&def.query_base)).await {
      Some(condition) => {
        debug!(target: "case_study", %field, %condition, "Condition resolved from PubMed");
        Some(condition)
      }
      None => {
        warn!(target: "case_study", %field, fallback = ?fallback, "No PubMed condition; using built-in example");
        fallback
      }
    }
  }

  /// Literature-backed explanation fragment for `condition`, or the fixed placeholder.
  #[instrument(level = "debug", skip(self), fields(%condition))]
  pub async fn resolve_explanation(&self, condition: &str) -> String {
    match self.bounded(self.lookup_explanation(condition)).await {
      Some(title) => format!("Based on PubMed: {title}"),
      None => {
        warn!(target: "case_study", %condition, "No PubMed explanation available");
        EXPLANATION_UNAVAILABLE.to_string()
      }
    }
  }

  async fn lookup_condition(&self, query_base: &str) -> Option<String> {
    let ids = self.search.search_ids(query_base, self.condition_retmax).await;
    let first = ids.first()?;
    let title = self.search.summary_title(first).await?;
    title.split_whitespace().next().map(str::to_string)
  }

  async fn lookup_explanation(&self, condition: &str) -> Option<String> {
    let term = format!("{condition} diagnosis");
    let ids = self.search.search_ids(&term, self.explanation_retmax).await;
    let first = ids.first()?;
    self.search.summary_title(first).await
  }

  /// Expiry counts as "not found".
  async fn bounded<F: Future<Output = Option<String>>>(&self, lookup: F) -> Option<String> {
    match tokio::time::timeout(self.lookup_timeout, lookup).await {
      Ok(found) => found,
      Err(_) => {
        warn!(target: "case_study", timeout = ?self.lookup_timeout, "PubMed lookup timed out");
        None
      }
    }
  }
}

/// Everything sampled before the explanation lookup.
struct Draft {
  field: DiseaseField,
  title: String,
  description: String,
  question: String,
  options: Vec<String>,
}

impl Draft {
  fn sample<R: Rng + ?Sized>(field: DiseaseField, def: &CategoryDef, condition: &str, rng: &mut R) -> Result<Self, AssemblyError> {
    let empty = |pool: &'static str| AssemblyError::EmptyPool { pool, field };

    let patient: PatientProfile = *PATIENTS.choose(rng).ok_or_else(|| empty("patient profiles"))?;
    let symptoms = sample_distinct(&def.symptoms_pool, SYMPTOM_COUNT, rng);
    if symptoms.is_empty() {
      return Err(empty("symptoms"));
    }
    let history = one_of(&def.history_pool, rng).ok_or_else(|| empty("history facts"))?;
    let vitals = one_of(&def.vitals_pool, rng).ok_or_else(|| empty("vital signs"))?;
    let labs = one_of(&def.labs_pool, rng).ok_or_else(|| empty("lab findings"))?;
    let question = one_of(&QUESTION_TEMPLATES, rng).ok_or_else(|| empty("question templates"))?;

    let title = format!("{} in a {}-Year-Old {}", def.title_prefix, patient.age, patient.gender.title_case());
    let age = patient.age.to_string();
    let symptoms = symptoms.join(", ");
    let description = fill_template(
      DESCRIPTION_TEMPLATE,
      &[
        ("age", age.as_str()),
        ("gender", patient.gender.as_str()),
        ("symptoms", symptoms.as_str()),
        ("history", history.as_str()),
        ("vitals", vitals.as_str()),
        ("labs", labs.as_str()),
      ],
    );

    let alternative = def
      .condition_examples
      .choose(rng)
      .map(String::as_str)
      .unwrap_or(ALTERNATIVE_CONDITION);
    let options = vec![
      format!("A. {condition}"),
      format!("B. {alternative}"),
      DECOY_C.to_string(),
      DECOY_D.to_string(),
    ];

    Ok(Self { field, title, description, question, options })
  }

  fn finish(self, condition: &str, fragment: &str) -> CaseStudy {
    let correct_answer = self.options[0].clone();
    CaseStudy {
      id: None,
      title: self.title,
      description: self.description,
      question: self.question,
      options: self.options,
      correct_answer,
      explanation: format!("This case is consistent with {condition}. {fragment}"),
      disease_field: self.field,
    }
  }
}

fn one_of<T: Clone + ToString, R: Rng + ?Sized>(pool: &[T], rng: &mut R) -> Option<String> {
  sample_distinct(pool, 1, rng).first().map(ToString::to_string)
}
