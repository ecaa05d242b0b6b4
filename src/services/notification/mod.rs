//! Best-effort notification delivery.
//!
//! State changes are committed before [`NotificationDispatcher::dispatch`] is
//! called. Delivery then runs on a tracked background task with bounded
//! retry; its outcome never reaches the caller.

mod email;
mod recording;
pub mod templates;

pub use email::SmtpTransport;
pub use recording::RecordingTransport;
pub use templates::{MailEvent, RenderedMail, SubjectPicker, TemplateKind};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::task::TaskTracker;

use crate::application::config::invites::InviteConfig;
use crate::services::contact::mask_address;

/// Delivery failure, classified for the retry loop.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("transient delivery failure: {0}")]
    Transient(String),

    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

impl DispatchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, DispatchError::Transient(_))
    }
}

/// A rendered mail addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Trait for mail transports
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DispatchError>;
}

/// Linear backoff: the n-th retry waits `base * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&InviteConfig::default())
    }
}

impl From<&InviteConfig> for RetryPolicy {
    fn from(config: &InviteConfig) -> Self {
        Self {
            max_retries: config.notify_max_retries,
            base_delay: config.notify_retry_base,
        }
    }
}

/// Outcome of a delivery run, for callers that await it (tooling, tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent { attempts: u32 },
    Failed { attempts: u32 },
    /// No transport configured.
    Skipped,
}

/// Renders templates and hands delivery off to background tasks.
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Option<Arc<dyn MailTransport>>,
    subjects: Arc<SubjectPicker>,
    base_url: Arc<str>,
    retry: RetryPolicy,
    tracker: TaskTracker,
}

impl NotificationDispatcher {
    pub fn new(
        transport: Option<Arc<dyn MailTransport>>,
        subjects: SubjectPicker,
        base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        if transport.is_none() {
            tracing::warn!("SMTP not configured; notifications will be logged and skipped");
        }
        Self {
            transport,
            subjects: Arc::new(subjects),
            base_url: Arc::from(base_url.into()),
            retry,
            tracker: TaskTracker::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Render `event` for `to`. Pure apart from the subject choice.
    pub fn render(&self, to: &str, event: &MailEvent) -> OutgoingMail {
        let subject = self.subjects.pick(event.kind());
        let RenderedMail {
            subject,
            text,
            html,
        } = templates::render(event, &self.base_url, subject);
        OutgoingMail {
            to: to.to_string(),
            subject,
            text,
            html,
        }
    }

    /// Fire-and-forget: render now, deliver on a tracked task.
    pub fn dispatch(&self, to: &str, event: MailEvent) {
        let kind = event.kind();
        let mail = self.render(to, &event);
        let this = self.clone();
        self.tracker.spawn(async move {
            let outcome = this.deliver(&mail).await;
            tracing::debug!(kind = %kind, ?outcome, "Notification task finished");
        });
    }

    /// Deliver with retry and wait for the result.
    pub async fn deliver(&self, mail: &OutgoingMail) -> Delivery {
        let masked = mask_address(&mail.to);
        let Some(transport) = &self.transport else {
            tracing::info!(to = %masked, subject = %mail.subject, "SMTP not configured, skipping email");
            return Delivery::Skipped;
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match transport.send(mail).await {
                Ok(()) => {
                    tracing::info!(to = %masked, attempt, "Notification sent");
                    return Delivery::Sent { attempts: attempt };
                }
                Err(e) if e.is_transient() && attempt <= self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        to = %masked,
                        attempt,
                        error = %e,
                        "Notification failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(to = %masked, attempt, error = %e, "Notification dropped");
                    return Delivery::Failed { attempts: attempt };
                }
            }
        }
    }

    /// Wait for every in-flight delivery.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }
}
