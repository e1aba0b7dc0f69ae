//! AMR risk endpoint.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::clinical::{assess_amr_risk, AmrRiskAssessment};

/// `GET /api/ai/amr/risk/:patient_id`: antibiotic exposure score.
pub async fn risk(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<AmrRiskAssessment>, ApiError> {
    let conn = ctx.core.lock_db()?;
    let assessment = assess_amr_risk(&conn, &patient_id)?;
    Ok(Json(assessment))
}
