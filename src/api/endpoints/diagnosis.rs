//! Diagnosis suggestion endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::clinical::{suggest_diagnosis, DiagnosisRequest, DiagnosisResponse};

/// `POST /api/ai/diagnosis`: rule-based conditions and medications.
pub async fn suggest(
    State(ctx): State<ApiContext>,
    Json(req): Json<DiagnosisRequest>,
) -> Result<Json<DiagnosisResponse>, ApiError> {
    if req.patient_id.trim().is_empty() {
        return Err(ApiError::BadRequest("patient_id cannot be empty".into()));
    }

    let conn = ctx.core.lock_db()?;
    let response = suggest_diagnosis(&conn, &req)?;
    Ok(Json(response))
}
