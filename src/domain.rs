//! Domain models used by the backend: disease fields, patients, users and the case study itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Medical field a case study is generated for.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseField {
  Cardiology,
  Neurology,
  Endocrinology,
  Pharmacology,
  Biochemistry,
  Gastroenterology,
  ObstetricsGynecology,
  Oncology,
  Nephrology,
  Hematology,
  Pediatrics,
  Dermatology,
  Immunology,
}

impl DiseaseField {
  /// Every field, in the order the front-end lists them.
  pub const ALL: [DiseaseField; 13] = [
    DiseaseField::Cardiology,
    DiseaseField::Neurology,
    DiseaseField::Endocrinology,
    DiseaseField::Pharmacology,
    DiseaseField::Biochemistry,
    DiseaseField::Gastroenterology,
    DiseaseField::ObstetricsGynecology,
    DiseaseField::Oncology,
    DiseaseField::Nephrology,
    DiseaseField::Hematology,
    DiseaseField::Pediatrics,
    DiseaseField::Dermatology,
    DiseaseField::Immunology,
  ];

  pub fn key(self) -> &'static str {
    match self {
      DiseaseField::Cardiology => "cardiology",
      DiseaseField::Neurology => "neurology",
      DiseaseField::Endocrinology => "endocrinology",
      DiseaseField::Pharmacology => "pharmacology",
      DiseaseField::Biochemistry => "biochemistry",
      DiseaseField::Gastroenterology => "gastroenterology",
      DiseaseField::ObstetricsGynecology => "obstetrics_gynecology",
      DiseaseField::Oncology => "oncology",
      DiseaseField::Nephrology => "nephrology",
      DiseaseField::Hematology => "hematology",
      DiseaseField::Pediatrics => "pediatrics",
      DiseaseField::Dermatology => "dermatology",
      DiseaseField::Immunology => "immunology",
    }
  }

  /// Position inside `ALL`; used to index per-field tables.
  pub fn index(self) -> usize {
    self as usize
  }

  /// Human label: "obstetrics_gynecology" -> "Obstetrics Gynecology".
  pub fn label(self) -> String {
    self
      .key()
      .split('_')
      .map(|word| {
        let mut chars = word.chars();
        match chars.next() {
          Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
          None => String::new(),
        }
      })
      .collect::<Vec<_>>()
      .join(" ")
  }
}

impl fmt::Display for DiseaseField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}

/// Raised when a caller names a field that is not one of the known keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown disease field: {0:?}")]
pub struct UnknownField(pub String);

impl FromStr for DiseaseField {
  type Err = UnknownField;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim();
    DiseaseField::ALL
      .into_iter()
      .find(|f| f.key() == wanted)
      .ok_or_else(|| UnknownField(s.to_string()))
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
  Male,
  Female,
}

impl Gender {
  /// Lowercase form used inside the vignette text.
  pub fn as_str(self) -> &'static str {
    match self {
      Gender::Male => "male",
      Gender::Female => "female",
    }
  }

  /// Capitalised form used in titles.
  pub fn title_case(self) -> &'static str {
    match self {
      Gender::Male => "Male",
      Gender::Female => "Female",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatientProfile {
  pub age: u8,
  pub gender: Gender,
}

/// Generated quiz item. Immutable once returned by the generator; the store assigns `id`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudy {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub title: String,
  pub description: String,
  pub question: String,
  /// Always four entries lettered "A. " to "D. ".
  pub options: Vec<String>,
  /// Equal to `options[0]`.
  pub correct_answer: String,
  pub explanation: String,
  pub disease_field: DiseaseField,
}

impl CaseStudy {
  pub fn with_id(mut self, id: String) -> Self {
    self.id = Some(id);
    self
  }

  pub fn is_correct(&self, answer: &str) -> bool {
    self.correct_answer == answer
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct User {
  pub uid: String,
  pub email: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_every_known_key() {
    for field in DiseaseField::ALL {
      assert_eq!(field.key().parse::<DiseaseField>(), Ok(field));
    }
  }

  #[test]
  fn unknown_key_is_rejected() {
    let err = "astrology".parse::<DiseaseField>().unwrap_err();
    assert_eq!(err, UnknownField("astrology".into()));
  }

  #[test]
  fn index_matches_position_in_all() {
    for (i, field) in DiseaseField::ALL.into_iter().enumerate() {
      assert_eq!(field.index(), i);
    }
  }

  #[test]
  fn label_capitalises_each_word() {
    assert_eq!(DiseaseField::ObstetricsGynecology.label(), "Obstetrics Gynecology");
    assert_eq!(DiseaseField::Cardiology.label(), "Cardiology");
  }

  #[test]
  fn case_study_uses_camel_case_on_the_wire() {
    let cs = CaseStudy {
      id: None,
      title: "t".into(),
      description: "d".into(),
      question: "q".into(),
      options: vec!["A. x".into(), "B. y".into(), "C. Unrelated Condition".into(), "D. Normal Finding".into()],
      correct_answer: "A. x".into(),
      explanation: "e".into(),
      disease_field: DiseaseField::ObstetricsGynecology,
    };
    let v = serde_json::to_value(&cs).unwrap();
    assert_eq!(v["correctAnswer"], "A. x");
    assert_eq!(v["diseaseField"], "obstetrics_gynecology");
    assert!(v.get("id").is_none());
  }
}
