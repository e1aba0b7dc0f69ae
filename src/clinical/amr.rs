use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::Consultation;

/// Antibiotics counted toward a patient's AMR exposure.
pub const TRACKED_ANTIBIOTICS: &[&str] = &[
    "Amoxicillin",
    "Ciprofloxacin",
    "Azithromycin",
    "Ceftriaxone",
    "Doxycycline",
];

/// Consultations considered per assessment.
pub const CONSULTATION_WINDOW: usize = 50;

const POINTS_PER_COURSE: u32 = 15;
const MAX_SCORE: u32 = 100;
const HIGH_THRESHOLD: u32 = 50;
const MEDIUM_THRESHOLD: u32 = 30;

const ELEVATED_RECOMMENDATIONS: &[&str] = &[
    "Consider culture and sensitivity testing before prescribing antibiotics",
    "Use narrow-spectrum antibiotics when possible",
    "Ensure appropriate duration of treatment",
    "Monitor for resistance patterns",
];
const STANDARD_RECOMMENDATION: &str = "Continue standard antibiotic stewardship practices";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmrRiskLevel {
    Low,
    Medium,
    High,
}

impl AmrRiskLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntibioticCourse {
    pub antibiotic: String,
    pub date: String,
    pub duration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmrRiskAssessment {
    pub patient_id: String,
    pub risk_score: u32,
    pub risk_level: AmrRiskLevel,
    pub antibiotic_courses: Vec<AntibioticCourse>,
    pub recommendations: Vec<String>,
}

pub fn is_tracked_antibiotic(name: &str) -> bool {
    TRACKED_ANTIBIOTICS.contains(&name)
}

/// Score a patient's stored consultation history.
pub fn assess_amr_risk(
    conn: &Connection,
    patient_id: &str,
) -> Result<AmrRiskAssessment, DatabaseError> {
    let consultations =
        repository::get_consultations_by_patient(conn, patient_id, CONSULTATION_WINDOW)?;
    let assessment = assess_consultations(patient_id, &consultations);
    tracing::debug!(
        patient_id,
        courses = assessment.antibiotic_courses.len(),
        score = assessment.risk_score,
        "AMR risk assessed"
    );
    Ok(assessment)
}

/// Pure scoring over an already-loaded history.
pub fn assess_consultations(patient_id: &str, consultations: &[Consultation]) -> AmrRiskAssessment {
    let antibiotic_courses: Vec<AntibioticCourse> = consultations
        .iter()
        .flat_map(|c| {
            c.medications
                .iter()
                .filter(|m| is_tracked_antibiotic(&m.name))
                .map(|m| AntibioticCourse {
                    antibiotic: m.name.clone(),
                    date: c.created_at.clone(),
                    duration: m.duration.clone().unwrap_or_else(|| "unknown".to_string()),
                })
        })
        .collect();

    let courses = u32::try_from(antibiotic_courses.len()).unwrap_or(u32::MAX);
    let risk_score = courses.saturating_mul(POINTS_PER_COURSE).min(MAX_SCORE);

    let recommendations = if risk_score >= MEDIUM_THRESHOLD {
        ELEVATED_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect()
    } else {
        vec![STANDARD_RECOMMENDATION.to_string()]
    };

    AmrRiskAssessment {
        patient_id: patient_id.to_string(),
        risk_score,
        risk_level: AmrRiskLevel::from_score(risk_score),
        antibiotic_courses,
        recommendations,
    }
}
