use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Language, MessageRole};

/// Sentinel `model_used` for replies served from the canned clinical library.
pub const MODEL_FALLBACK: &str = "fallback";

/// Sentinel `model_used` for the apology returned when the request path fails.
pub const MODEL_ERROR_FALLBACK: &str = "error_fallback";

/// One turn of a chat session. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: Option<String>,
    pub patient_id: Option<String>,
    pub role: MessageRole,
    pub content: String,
    pub language: Language,
    pub timestamp: DateTime<Utc>,
    /// Set on assistant turns only.
    pub model_used: Option<String>,
    pub is_ai_live: Option<bool>,
}

/// True when `model_used` names a real backend rather than a sentinel.
pub fn is_live_model(model_used: &str) -> bool {
    model_used != MODEL_FALLBACK && model_used != MODEL_ERROR_FALLBACK
}

/// Fixed-width UTC encoding so that stored timestamps sort lexically.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sentinels_are_not_live() {
        assert!(!is_live_model(MODEL_FALLBACK));
        assert!(!is_live_model(MODEL_ERROR_FALLBACK));
        assert!(is_live_model("z-ai/glm-4.5-air:free"));
    }

    #[test]
    fn timestamp_format_is_fixed_width_and_ordered() {
        let a = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 0).unwrap();
        let b = a + chrono::Duration::microseconds(1);
        let fa = format_timestamp(&a);
        let fb = format_timestamp(&b);
        assert_eq!(fa, "2026-03-01T09:05:00.000000Z");
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
    }
}
