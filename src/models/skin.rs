use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinPrediction {
    pub condition: String,
    pub probability: f32,
    pub severity: String,
}

/// A stored skin-image analysis. The image is kept as base64 JPEG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinAnalysis {
    pub id: String,
    pub user_id: String,
    pub image_base64: String,
    pub predictions: Vec<SkinPrediction>,
    pub confidence: f32,
    pub recommendation: String,
    pub timestamp: DateTime<Utc>,
}
