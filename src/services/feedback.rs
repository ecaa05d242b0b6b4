//! Free-form site feedback from senders.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};

use crate::application::database::DbConn;
use crate::application::error::{AppError, Result};
use crate::models::{feedback, user};

/// Longer messages are cut to this many characters rather than refused.
pub const MAX_FEEDBACK_CHARS: usize = 2000;

#[derive(Clone)]
pub struct FeedbackService {
    db: DbConn,
}

impl FeedbackService {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn submit(&self, sender: &user::Model, message: &str) -> Result<feedback::Model> {
        let message = normalize(message).ok_or_else(|| {
            AppError::Validation("Please write something before submitting.".to_string())
        })?;

        let saved = feedback::ActiveModel {
            user_id: Set(sender.id),
            message: Set(message),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(feedback_id = saved.id, user_id = sender.id, "Feedback received");
        Ok(saved)
    }
}

/// Trim, cap at [`MAX_FEEDBACK_CHARS`], and drop empty messages.
fn normalize(message: &str) -> Option<String> {
    let capped: String = message.trim().chars().take(MAX_FEEDBACK_CHARS).collect();
    // Capping can leave whitespace at the cut.
    let capped = capped.trim_end();
    (!capped.is_empty()).then(|| capped.to_string())
}
