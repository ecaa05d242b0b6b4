use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::feedback;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackReceipt {
    pub id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<feedback::Model> for FeedbackReceipt {
    fn from(saved: feedback::Model) -> Self {
        Self {
            id: saved.id,
            message: saved.message,
            created_at: saved.created_at,
        }
    }
}
