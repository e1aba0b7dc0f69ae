use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::repository;
use crate::db::DatabaseError;

/// Confidence reported with every suggestion set.
pub const DIAGNOSIS_CONFIDENCE: f32 = 0.85;

/// Suggested drugs that trigger a look at the patient's antibiotic history.
const WATCHED_ANTIBIOTICS: &[&str] = &["Amoxicillin", "Ciprofloxacin", "Azithromycin"];
const HISTORY_WINDOW: usize = 10;
const REPEAT_COURSE_THRESHOLD: usize = 3;
const REPEAT_COURSE_WARNING: &str =
    "Patient has received multiple antibiotic courses recently. Consider culture test.";

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisRequest {
    pub symptoms: String,
    pub patient_id: String,
    /// Accepted for clients that send it; the rules do not read it.
    #[serde(default)]
    pub medical_history: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSuggestion {
    pub condition: String,
    pub icd_code: String,
    pub probability: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationSuggestion {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisResponse {
    pub suggestions: Vec<ConditionSuggestion>,
    pub medications: Vec<MedicationSuggestion>,
    pub confidence: f32,
    pub warnings: Vec<String>,
}

struct DiagnosisRule {
    matches: fn(&str) -> bool,
    conditions: &'static [(&'static str, &'static str, f32)],
    medications: &'static [(&'static str, &'static str, &'static str, &'static str)],
}

fn respiratory(s: &str) -> bool {
    s.contains("fever") && s.contains("cough")
}

fn headache(s: &str) -> bool {
    s.contains("headache")
}

fn gastrointestinal(s: &str) -> bool {
    s.contains("stomach") || s.contains("abdominal")
}

fn any_symptoms(_: &str) -> bool {
    true
}

/// First match wins; the last rule always matches.
static RULES: &[DiagnosisRule] = &[
    DiagnosisRule {
        matches: respiratory,
        conditions: &[
            ("Upper Respiratory Infection", "J06.9", 0.85),
            ("Bacterial Pneumonia", "J15.9", 0.10),
            ("Influenza", "J11.1", 0.05),
        ],
        medications: &[
            ("Amoxicillin", "500mg", "3 times daily", "7 days"),
            ("Paracetamol", "500mg", "as needed", "for fever"),
        ],
    },
    DiagnosisRule {
        matches: headache,
        conditions: &[
            ("Tension Headache", "G44.2", 0.70),
            ("Migraine", "G43.9", 0.20),
            ("Sinus Headache", "G44.82", 0.10),
        ],
        medications: &[
            ("Ibuprofen", "400mg", "every 6 hours", "as needed"),
            ("Paracetamol", "1000mg", "every 6 hours", "as needed"),
        ],
    },
    DiagnosisRule {
        matches: gastrointestinal,
        conditions: &[
            ("Gastritis", "K29.7", 0.60),
            ("Peptic Ulcer", "K27.9", 0.25),
            ("Gastroenteritis", "K52.9", 0.15),
        ],
        medications: &[
            ("Omeprazole", "20mg", "once daily", "14 days"),
            ("Antacid", "10ml", "as needed", "for symptoms"),
        ],
    },
    DiagnosisRule {
        matches: any_symptoms,
        conditions: &[("General Symptoms", "R68.89", 0.50)],
        medications: &[("Symptomatic Treatment", "as appropriate", "as needed", "as needed")],
    },
];

fn is_watched(name: &str) -> bool {
    WATCHED_ANTIBIOTICS.contains(&name)
}

/// Suggestions and medications for a symptom description, without warnings.
pub fn match_symptoms(symptoms: &str) -> (Vec<ConditionSuggestion>, Vec<MedicationSuggestion>) {
    let lowered = symptoms.to_lowercase();
    let Some(rule) = RULES.iter().find(|r| (r.matches)(&lowered)) else {
        return (Vec::new(), Vec::new());
    };

    let suggestions = rule
        .conditions
        .iter()
        .map(|&(condition, icd_code, probability)| ConditionSuggestion {
            condition: condition.into(),
            icd_code: icd_code.into(),
            probability,
        })
        .collect();
    let medications = rule
        .medications
        .iter()
        .map(|&(name, dosage, frequency, duration)| MedicationSuggestion {
            name: name.into(),
            dosage: dosage.into(),
            frequency: frequency.into(),
            duration: duration.into(),
        })
        .collect();
    (suggestions, medications)
}

/// Rule-based suggestions plus an antibiotic-history warning when a watched
/// antibiotic is suggested to a patient with repeated recent courses.
pub fn suggest_diagnosis(
    conn: &Connection,
    request: &DiagnosisRequest,
) -> Result<DiagnosisResponse, DatabaseError> {
    let (suggestions, medications) = match_symptoms(&request.symptoms);

    let mut warnings = Vec::new();
    if medications.iter().any(|m| is_watched(&m.name)) {
        let recent =
            repository::get_recent_consultations(conn, &request.patient_id, HISTORY_WINDOW)?;
        let courses = recent
            .iter()
            .flat_map(|c| c.medications.iter())
            .filter(|m| is_watched(&m.name))
            .count();
        if courses >= REPEAT_COURSE_THRESHOLD {
            tracing::info!(patient_id = %request.patient_id, courses, "Repeated antibiotic courses");
            warnings.push(REPEAT_COURSE_WARNING.to_string());
        }
    }

    Ok(DiagnosisResponse {
        suggestions,
        medications,
        confidence: DIAGNOSIS_CONFIDENCE,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::models::{Consultation, PrescribedMedication};

    fn request(symptoms: &str) -> DiagnosisRequest {
        DiagnosisRequest {
            symptoms: symptoms.into(),
            patient_id: "p1".into(),
            medical_history: Vec::new(),
        }
    }

    fn seed_antibiotic_courses(conn: &Connection, n: usize) {
        for i in 0..n {
            repository::insert_consultation(
                conn,
                &Consultation {
                    id: format!("c{i}"),
                    patient_id: "p1".into(),
                    created_at: format!("2026-04-{:02}T10:00:00.000000Z", i + 1),
                    medications: vec![PrescribedMedication {
                        name: "Azithromycin".into(),
                        dosage: None,
                        frequency: None,
                        duration: None,
                    }],
                },
            )
            .unwrap();
        }
    }

    #[test]
    fn fever_with_cough_is_respiratory() {
        let (conditions, meds) = match_symptoms("Fever and dry COUGH for 3 days");
        assert_eq!(conditions[0].icd_code, "J06.9");
        assert_eq!(meds[0].name, "Amoxicillin");
    }

    #[test]
    fn rule_order_decides_overlaps() {
        // fever+cough outranks headache, headache outranks stomach.
        assert_eq!(match_symptoms("fever, cough, headache").0[0].icd_code, "J06.9");
        assert_eq!(match_symptoms("headache and stomach cramps").0[0].icd_code, "G44.2");
        assert_eq!(match_symptoms("abdominal discomfort").0[0].icd_code, "K29.7");
    }

    #[test]
    fn unmatched_symptoms_get_general_set() {
        let (conditions, meds) = match_symptoms("itchy elbow");
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].icd_code, "R68.89");
        assert_eq!(meds[0].name, "Symptomatic Treatment");
    }

    #[test]
    fn repeated_courses_add_warning() {
        let conn = open_memory_database().unwrap();
        seed_antibiotic_courses(&conn, 3);
        let response = suggest_diagnosis(&conn, &request("fever and cough")).unwrap();
        assert_eq!(response.warnings, vec![REPEAT_COURSE_WARNING]);
        assert_eq!(response.confidence, DIAGNOSIS_CONFIDENCE);
    }

    #[test]
    fn two_courses_do_not_warn() {
        let conn = open_memory_database().unwrap();
        seed_antibiotic_courses(&conn, 2);
        let response = suggest_diagnosis(&conn, &request("fever and cough")).unwrap();
        assert!(response.warnings.is_empty());
    }

    #[test]
    fn non_antibiotic_suggestions_skip_history_check() {
        let conn = open_memory_database().unwrap();
        seed_antibiotic_courses(&conn, 5);
        let response = suggest_diagnosis(&conn, &request("headache")).unwrap();
        assert!(response.warnings.is_empty());
    }
}
