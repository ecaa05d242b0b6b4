//! Throttling of repeated invites between the same sender/recipient pair.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::application::config::invites::InviteConfig;
use crate::application::error::{AppError, Result};
use crate::models::invite::{self, InviteStatus};
use crate::models::prelude::Invite;

/// Cooldown durations keyed by the status of the pair's latest invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    pub pending: Duration,
    pub maybe: Duration,
    pub rejected: Duration,
    pub accepted: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self::from(&InviteConfig::default())
    }
}

impl From<&InviteConfig> for CooldownPolicy {
    fn from(config: &InviteConfig) -> Self {
        Self {
            pending: config.cooldown_pending,
            maybe: config.cooldown_maybe,
            rejected: config.cooldown_rejected,
            accepted: config.cooldown_accepted,
        }
    }
}

impl CooldownPolicy {
    pub fn cooldown_for(&self, status: InviteStatus) -> Duration {
        match status {
            InviteStatus::Pending => self.pending,
            InviteStatus::Maybe => self.maybe,
            InviteStatus::Rejected => self.rejected,
            InviteStatus::Accepted => self.accepted,
        }
    }

    /// Decide whether a new invite is allowed at `now`, given the pair's most
    /// recent invite. Returns the remaining wait on denial.
    pub fn evaluate(
        &self,
        last: Option<(InviteStatus, DateTime<Utc>)>,
        now: DateTime<Utc>,
    ) -> std::result::Result<(), Duration> {
        let Some((status, created_at)) = last else {
            return Ok(());
        };

        let cooldown = self.cooldown_for(status);
        if cooldown.is_zero() {
            return Ok(());
        }

        // A clock that went backwards counts as no time elapsed.
        let elapsed = (now - created_at).to_std().unwrap_or(Duration::ZERO);
        if elapsed < cooldown {
            Err(cooldown - elapsed)
        } else {
            Ok(())
        }
    }

    /// Check the stored history of a pair. Not atomic with the insert that
    /// follows: two concurrent creates may both pass.
    pub async fn check<C: ConnectionTrait>(
        &self,
        db: &C,
        sender_id: i64,
        recipient_id: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let latest = Invite::find()
            .filter(invite::Column::SenderId.eq(sender_id))
            .filter(invite::Column::RecipientId.eq(recipient_id))
            .order_by_desc(invite::Column::CreatedAt)
            .order_by_desc(invite::Column::Id)
            .one(db)
            .await?;

        match self.evaluate(latest.map(|i| (i.status, i.created_at)), now) {
            Ok(()) => Ok(()),
            Err(remaining) => {
                tracing::info!(
                    sender_id,
                    recipient_id,
                    remaining_secs = remaining.as_secs(),
                    "Invite blocked by cooldown"
                );
                Err(AppError::RateLimited {
                    message: format!(
                        "You recently invited this person. Try again in {}.",
                        format_wait(remaining)
                    ),
                    retry_after: Some(remaining),
                })
            }
        }
    }
}

/// Human-readable remaining wait, rounded up to the minute: `3h 59m`, `12m`.
pub fn format_wait(remaining: Duration) -> String {
    let minutes = remaining.as_secs().div_ceil(60).max(1);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}
