use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub full_name: String,
    pub national_id: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

/// Summary of one clinical visit, as shown to the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientVisit {
    pub id: String,
    pub patient_id: String,
    pub visit_date: String,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub prescribed_medications: Vec<String>,
    pub doctor_notes: Option<String>,
}

/// A prescribed medication line inside a consultation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescribedMedication {
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: String,
    pub patient_id: String,
    pub created_at: String,
    pub medications: Vec<PrescribedMedication>,
}
