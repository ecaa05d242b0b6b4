use std::time::Duration;

use super::{parsed_or, ConfigResult};

/// Tunables of the invite lifecycle: cooldowns, follow-up quota and
/// notification retry policy.
#[derive(Debug, Clone)]
pub struct InviteConfig {
    pub cooldown_pending: Duration,
    pub cooldown_maybe: Duration,
    pub cooldown_rejected: Duration,
    pub cooldown_accepted: Duration,
    pub followup_limit: usize,
    pub notify_max_retries: u32,
    pub notify_retry_base: Duration,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            cooldown_pending: Duration::ZERO,
            cooldown_maybe: hours(4),
            cooldown_rejected: hours(24),
            cooldown_accepted: Duration::ZERO,
            followup_limit: 3,
            notify_max_retries: 2,
            notify_retry_base: Duration::from_secs(1),
        }
    }
}

impl InviteConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            cooldown_pending: hours(parsed_or("COOLDOWN_PENDING_HOURS", 0)?),
            cooldown_maybe: hours(parsed_or("COOLDOWN_MAYBE_HOURS", 4)?),
            cooldown_rejected: hours(parsed_or("COOLDOWN_REJECTED_HOURS", 24)?),
            cooldown_accepted: hours(parsed_or("COOLDOWN_ACCEPTED_HOURS", 0)?),
            followup_limit: parsed_or("FOLLOWUP_LIMIT", defaults.followup_limit)?,
            notify_max_retries: parsed_or("NOTIFY_MAX_RETRIES", defaults.notify_max_retries)?,
            notify_retry_base: Duration::from_millis(parsed_or("NOTIFY_RETRY_BASE_MS", 1000)?),
        })
    }
}

fn hours(h: u64) -> Duration {
    Duration::from_secs(h * 3600)
}
