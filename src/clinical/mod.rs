//! Rule-based clinical decision support next to the chat gateway:
//! antimicrobial-resistance risk scoring, symptom-driven diagnosis hints
//! and skin-image analysis.

pub mod amr;
pub mod diagnosis;
pub mod skin;

pub use amr::{assess_amr_risk, AmrRiskAssessment, AmrRiskLevel, AntibioticCourse};
pub use diagnosis::{suggest_diagnosis, DiagnosisRequest, DiagnosisResponse};
pub use skin::{normalize_image, record_analysis, SkinAnalysisError, SkinAnalysisResponse};
