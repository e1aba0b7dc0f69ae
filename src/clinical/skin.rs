//! Skin-image analysis.
//!
//! Uploaded images are decoded and normalised to JPEG before storage. The
//! classification itself is a fixed reference result until a trained model
//! is wired in; every successful upload is recorded per user.

use std::io::Cursor;

use base64::Engine;
use chrono::Utc;
use image::{DynamicImage, ImageOutputFormat};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{repository, DatabaseError};
use crate::models::{SkinAnalysis, SkinPrediction};

pub const SKIN_CONFIDENCE: f32 = 0.85;
const JPEG_QUALITY: u8 = 90;

const PREDICTIONS: &[(&str, f32, &str)] = &[
    ("Eczema", 0.85, "mild"),
    ("Dermatitis", 0.12, "mild"),
    ("Normal skin", 0.03, "none"),
];

const RECOMMENDATION: &str = "Based on the analysis, this appears to be eczema with mild severity.

**Recommendations:**
• Apply moisturizer regularly
• Use mild, fragrance-free soap
• Avoid known triggers
• Consider topical corticosteroid if symptoms persist

**When to see a doctor:**
• Symptoms worsen or don't improve in 1-2 weeks
• Signs of infection (pus, increased redness, warmth)
• Severe itching affecting sleep";

#[derive(Debug, thiserror::Error)]
pub enum SkinAnalysisError {
    #[error("Unreadable image: {0}")]
    Decode(String),
    #[error("Image re-encoding failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinAnalysisResponse {
    pub predictions: Vec<SkinPrediction>,
    pub confidence: f32,
    pub recommendation: String,
}

/// Decode any supported upload and re-encode it as base64 JPEG.
/// CPU-bound; callers on the async runtime should run it on a blocking thread.
pub fn normalize_image(bytes: &[u8]) -> Result<String, SkinAnalysisError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| SkinAnalysisError::Decode(e.to_string()))?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut buf = Cursor::new(Vec::new());
    rgb.write_to(&mut buf, ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| SkinAnalysisError::Encode(e.to_string()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(buf.into_inner()))
}

/// Classify a normalised image and store the analysis for `user_id`.
pub fn record_analysis(
    conn: &Connection,
    user_id: &str,
    image_base64: String,
) -> Result<SkinAnalysisResponse, SkinAnalysisError> {
    let predictions: Vec<SkinPrediction> = PREDICTIONS
        .iter()
        .map(|(condition, probability, severity)| SkinPrediction {
            condition: condition.to_string(),
            probability: *probability,
            severity: severity.to_string(),
        })
        .collect();

    let analysis = SkinAnalysis {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        image_base64,
        predictions,
        confidence: SKIN_CONFIDENCE,
        recommendation: RECOMMENDATION.to_string(),
        timestamp: Utc::now(),
    };
    repository::insert_skin_analysis(conn, &analysis)?;
    tracing::info!(analysis_id = %analysis.id, %user_id, "Skin analysis recorded");

    Ok(SkinAnalysisResponse {
        predictions: analysis.predictions,
        confidence: analysis.confidence,
        recommendation: analysis.recommendation,
    })
}

#[cfg(test)]
pub(crate) fn sample_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 16, image::Rgb([210u8, 150, 140]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}
