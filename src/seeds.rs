//! Built-in content: category tables, patient profiles, question templates and the fallback case.

use crate::domain::{CaseStudy, DiseaseField, Gender, PatientProfile};
use crate::registry::CategoryDef;

pub const PATIENTS: [PatientProfile; 7] = [
  PatientProfile { age: 60, gender: Gender::Male },
  PatientProfile { age: 45, gender: Gender::Female },
  PatientProfile { age: 30, gender: Gender::Male },
  PatientProfile { age: 50, gender: Gender::Female },
  PatientProfile { age: 25, gender: Gender::Female },
  PatientProfile { age: 15, gender: Gender::Male },
  PatientProfile { age: 8, gender: Gender::Female },
];

pub const QUESTION_TEMPLATES: [&str; 3] = [
  "What is the most likely diagnosis?",
  "What is the most appropriate treatment?",
  "What is the next diagnostic step?",
];

fn def(
  title_prefix: &str,
  query_base: &str,
  conditions: &[&str],
  symptoms: &[&str],
  history: &[&str],
  vitals: &[&str],
  labs: &[&str],
) -> CategoryDef {
  let own = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
  CategoryDef {
    title_prefix: title_prefix.into(),
    query_base: query_base.into(),
    condition_examples: own(conditions),
    symptoms_pool: own(symptoms),
    history_pool: own(history),
    vitals_pool: own(vitals),
    labs_pool: own(labs),
  }
}

/// Built-in definition for one field.
pub fn builtin_category(field: DiseaseField) -> CategoryDef {
  match field {
    DiseaseField::Cardiology => def(
      "Acute Cardiac Case",
      "cardiology diagnosis",
      &["Myocardial Infarction", "Atrial Fibrillation", "Heart Failure"],
      &["chest pain", "dyspnea", "palpitations", "fatigue", "sweating", "nausea"],
      &["hypertension", "smoking", "diabetes", "family history of heart disease"],
      &["BP 140/90, HR 100 bpm", "BP 130/80, HR 120 bpm (irregular)", "BP 150/95, HR 90 bpm"],
      &["Elevated troponin", "Normal electrolytes", "ECG: ST elevation", "BNP elevated"],
    ),
    DiseaseField::Neurology => def(
      "Acute Neurological Case",
      "neurology diagnosis",
      &["Ischemic Stroke", "Epilepsy", "Parkinson’s Disease"],
      &["sudden weakness", "slurred speech", "seizures", "tremors", "headache", "dizziness"],
      &["hypertension", "previous stroke", "family history of seizures"],
      &["BP 170/100, HR 85 bpm", "BP 120/80, HR 80 bpm"],
      &["Normal glucose", "CT: no hemorrhage", "EEG: abnormal"],
    ),
    DiseaseField::Endocrinology => def(
      "Metabolic Emergency Case",
      "endocrinology diagnosis",
      &["Diabetic Ketoacidosis", "Hyperthyroidism", "Adrenal Insufficiency"],
      &["polyuria", "polydipsia", "fatigue", "weight loss", "tremors", "palpitations"],
      &["Type 1 diabetes", "family history of thyroid disease", "steroid use"],
      &["BP 110/70, HR 110 bpm", "BP 130/85, HR 100 bpm"],
      &["Glucose 450 mg/dL", "Elevated TSH", "Low cortisol"],
    ),
    DiseaseField::Pharmacology => def(
      "Infectious Disease Case",
      "infectious disease treatment",
      &["Antibiotic Resistance", "Sepsis", "Tuberculosis"],
      &["fever", "chills", "purulent discharge", "cough", "swelling"],
      &["recent hospitalization", "antibiotic use", "travel history"],
      &["BP 125/80, HR 90 bpm, Temp 38.5°C", "BP 100/60, HR 110 bpm"],
      &["Culture: MRSA positive", "CRP elevated", "Sputum: AFB positive"],
    ),
    DiseaseField::Biochemistry => def(
      "Electrolyte Imbalance Case",
      "electrolyte imbalance diagnosis",
      &["Hyperkalemia", "Hyponatremia", "Metabolic Acidosis"],
      &["muscle weakness", "confusion", "palpitations", "nausea"],
      &["chronic kidney disease", "diuretic use", "dehydration"],
      &["BP 135/85, HR 70 bpm", "BP 110/70, HR 95 bpm"],
      &["Potassium 6.8 mEq/L", "Sodium 125 mEq/L", "pH 7.2"],
    ),
    DiseaseField::Gastroenterology => def(
      "Gastrointestinal Case",
      "gastroenterology diagnosis",
      &["Peptic Ulcer Disease", "Crohn’s Disease", "Hepatitis"],
      &["epigastric pain", "nausea", "diarrhea", "jaundice", "heartburn"],
      &["NSAID use", "family history of IBD", "alcohol use"],
      &["BP 120/80, HR 80 bpm", "BP 130/85, HR 90 bpm"],
      &["H. pylori positive", "Elevated LFTs", "CRP elevated"],
    ),
    DiseaseField::ObstetricsGynecology => def(
      "Obstetric Case",
      "obstetrics diagnosis",
      &["Preeclampsia", "Gestational Diabetes", "Ectopic Pregnancy"],
      &["hypertension", "edema", "abdominal pain", "weight gain"],
      &["first pregnancy", "family history of diabetes", "previous miscarriage"],
      &["BP 160/110, HR 90 bpm", "BP 130/80, HR 85 bpm"],
      &["Proteinuria", "Glucose 180 mg/dL", "hCG elevated"],
    ),
    DiseaseField::Oncology => def(
      "Oncologic Case",
      "oncology diagnosis",
      &["Lung Cancer", "Breast Cancer", "Leukemia"],
      &["chronic cough", "weight loss", "fatigue", "night sweats"],
      &["smoking history", "family history of cancer", "chemotherapy"],
      &["BP 130/85, HR 88 bpm", "BP 120/80, HR 90 bpm"],
      &["Chest CT: lung mass", "CBC: anemia", "Biopsy: malignant"],
    ),
    DiseaseField::Nephrology => def(
      "Renal Case",
      "nephrology diagnosis",
      &["Acute Kidney Injury", "Chronic Kidney Disease", "Nephrotic Syndrome"],
      &["oliguria", "edema", "fatigue", "hypertension"],
      &["dehydration", "diabetes", "NSAID use"],
      &["BP 145/90, HR 95 bpm", "BP 150/100, HR 80 bpm"],
      &["Creatinine 2.5 mg/dL", "Proteinuria", "BUN elevated"],
    ),
    DiseaseField::Hematology => def(
      "Hematologic Case",
      "hematology diagnosis",
      &["Iron Deficiency Anemia", "Sickle Cell Disease", "Thrombocytopenia"],
      &["fatigue", "pallor", "bruising", "dyspnea"],
      &["heavy menstrual bleeding", "family history of anemia", "recent infection"],
      &["BP 110/70, HR 100 bpm", "BP 120/80, HR 90 bpm"],
      &["Hemoglobin 8 g/dL", "Sickle cells on smear", "Platelets 50,000"],
    ),
    DiseaseField::Pediatrics => def(
      "Pediatric Case",
      "pediatric diagnosis",
      &["Asthma Exacerbation", "Croup", "Type 1 Diabetes"],
      &["wheezing", "cough", "polyuria", "fever"],
      &["history of asthma", "recent viral infection", "family history of diabetes"],
      &["BP 100/60, HR 120 bpm, RR 30", "BP 90/60, HR 110 bpm"],
      &["SpO2 92%", "Glucose 300 mg/dL", "Normal CBC"],
    ),
    DiseaseField::Dermatology => def(
      "Dermatologic Case",
      "dermatology diagnosis",
      &["Psoriasis", "Eczema", "Melanoma"],
      &["scaly plaques", "itching", "pigmented lesion", "rash"],
      &["family history of psoriasis", "sun exposure", "atopic dermatitis"],
      &["BP 125/80, HR 75 bpm", "BP 120/80, HR 80 bpm"],
      &["Normal ESR", "Biopsy: atypical cells", "Skin swab: negative"],
    ),
    DiseaseField::Immunology => def(
      "Immunologic Case",
      "immunology diagnosis",
      &["Systemic Lupus Erythematosus", "Rheumatoid Arthritis", "Allergic Reaction"],
      &["rash", "joint pain", "fatigue", "swelling"],
      &["family history of autoimmune disease", "recent allergen exposure"],
      &["BP 130/80, HR 85 bpm", "BP 125/80, HR 90 bpm"],
      &["Positive ANA", "Elevated RF", "IgE elevated"],
    ),
  }
}

/// Absolute last resort: returned when assembling a case fails. Keeps the requested field.
pub fn fallback_case_study(field: DiseaseField) -> CaseStudy {
  CaseStudy {
    id: None,
    title: "Fallback Case".into(),
    description: "A patient presents with unspecified symptoms. Vital signs: normal.".into(),
    question: "What is the diagnosis?".into(),
    options: vec![
      "A. Unknown".into(),
      "B. Unknown".into(),
      "C. Unknown".into(),
      "D. Unknown".into(),
    ],
    correct_answer: "A. Unknown".into(),
    explanation: "Error generating case study. Please check logs.".into(),
    disease_field: field,
  }
}
