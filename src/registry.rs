//! Category registry: the immutable per-field template table the generator samples from.
//!
//! Built once at startup (built-ins merged with TOML overrides) and shared behind an `Arc`.

use std::collections::HashMap;

use tracing::{error, info};

use crate::config::CategoryOverride;
use crate::domain::DiseaseField;
use crate::seeds::builtin_category;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryDef {
    pub title_prefix: String,
    /// Seed term for the condition literature search.
    pub query_base: String,
    /// First entry doubles as the fallback condition.
    pub condition_examples: Vec<String>,
    pub symptoms_pool: Vec<String>,
    pub history_pool: Vec<String>,
    pub vitals_pool: Vec<String>,
    pub labs_pool: Vec<String>,
}

impl CategoryDef {
    fn apply(&mut self, o: &CategoryOverride) {
        if let Some(v) = &o.title_prefix {
            self.title_prefix = v.clone();
        }
        if let Some(v) = &o.query_base {
            self.query_base = v.clone();
        }
        if let Some(v) = &o.condition_examples {
            self.condition_examples = v.clone();
        }
        if let Some(v) = &o.symptoms_pool {
            self.symptoms_pool = v.clone();
        }
        if let Some(v) = &o.history_pool {
            self.history_pool = v.clone();
        }
        if let Some(v) = &o.vitals_pool {
            self.vitals_pool = v.clone();
        }
        if let Some(v) = &o.labs_pool {
            self.labs_pool = v.clone();
        }
    }
}

#[derive(Clone, Debug)]
pub struct CategoryRegistry {
    // Indexed by `DiseaseField::index()`; always holds one entry per field.
    defs: Vec<CategoryDef>,
}

impl CategoryRegistry {
    pub fn builtin() -> Self {
        Self {
            defs: DiseaseField::ALL.into_iter().map(builtin_category).collect(),
        }
    }

    /// Built-ins with config overrides applied. Unknown keys are reported and skipped.
    pub fn with_overrides(overrides: &HashMap<String, CategoryOverride>) -> Self {
        let mut reg = Self::builtin();
        for (key, o) in overrides {
            match key.parse::<DiseaseField>() {
                Ok(field) => {
                    reg.defs[field.index()].apply(o);
                    info!(target: "medsky_backend", field = %field, "Applied category override");
                }
                Err(e) => {
                    error!(target: "medsky_backend", %key, error = %e, "Skipping category override for unknown field");
                }
            }
        }
        reg
    }

    pub fn get(&self, field: DiseaseField) -> &CategoryDef {
        &self.defs[field.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (DiseaseField, &CategoryDef)> {
        DiseaseField::ALL.into_iter().map(move |f| (f, self.get(f)))
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
