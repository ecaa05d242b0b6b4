//! Follow-up thread: bounded, append-only exchanges after the main response.
//!
//! The thread lives inside the invite row. Writes are compare-and-swap on the
//! row's `revision`, so two concurrent requests can never both append.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{FollowupAnswerContent, FollowupAnswerDraft, FollowupDraft, FollowupMessage};
use super::{InviteService, Submission};
use crate::application::error::{AppError, Result};
use crate::models::invite::{self, Followup, FollowupThread};
use crate::models::prelude::*;
use crate::models::user;
use crate::services::gateway::find_followup;
use crate::services::notification::MailEvent;

/// Compare-and-swap attempts before giving up on a contended invite.
const CAS_ATTEMPTS: usize = 3;

const CONTENDED: &str = "This invite changed while saving. Please try again.";

/// What a sender's follow-up request would do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowupGate {
    /// A new follow-up may be appended.
    Append,
    /// An unanswered follow-up exists; a request rewrites its message.
    EditPending(Uuid),
    LimitReached,
    /// The latest answer did not grant another follow-up.
    NotGranted,
}

impl FollowupGate {
    pub fn allows_request(&self) -> bool {
        matches!(self, FollowupGate::Append | FollowupGate::EditPending(_))
    }

    /// Why a request would be refused, if it would.
    pub fn refusal(&self, limit: usize) -> Option<String> {
        match self {
            FollowupGate::Append | FollowupGate::EditPending(_) => None,
            FollowupGate::LimitReached => {
                Some(format!("Follow-up limit reached ({} of {}).", limit, limit))
            }
            FollowupGate::NotGranted => {
                Some("The recipient hasn't allowed a follow-up.".to_string())
            }
        }
    }
}

impl InviteService {
    /// Limit is checked before the grant so an exhausted thread always
    /// reports the limit.
    pub fn followup_gate(&self, invite: &invite::Model) -> FollowupGate {
        if let Some(pending) = invite.followups.pending() {
            return FollowupGate::EditPending(pending.id);
        }
        if invite.followups.len() >= self.followup_limit {
            return FollowupGate::LimitReached;
        }
        if !invite.latest_answer_allows_followup() {
            return FollowupGate::NotGranted;
        }
        FollowupGate::Append
    }

    /// Append a follow-up, or rewrite the one still awaiting an answer.
    /// The recipient is notified either way.
    pub async fn request_followup(
        &self,
        sender: &user::Model,
        invite_id: i64,
        draft: &FollowupDraft,
    ) -> Result<Followup> {
        let message = FollowupMessage::parse(draft, self.profanity.as_ref())?.message;

        for attempt in 1..=CAS_ATTEMPTS {
            let invite = self.find_owned(sender, invite_id).await?;
            let now = Utc::now();
            let mut thread = invite.followups.clone();

            let followup = match self.followup_gate(&invite) {
                gate @ (FollowupGate::LimitReached | FollowupGate::NotGranted) => {
                    let reason = gate
                        .refusal(self.followup_limit)
                        .unwrap_or_else(|| "Follow-up not allowed.".to_string());
                    return Err(AppError::StateConflict(reason));
                }
                FollowupGate::EditPending(id) => {
                    let Some(entry) = thread.0.iter_mut().find(|f| f.id == id) else {
                        return Err(AppError::Internal("Pending follow-up vanished".to_string()));
                    };
                    entry.message = message.clone();
                    entry.updated_at = now;
                    entry.clone()
                }
                FollowupGate::Append => {
                    let followup = Followup {
                        id: Uuid::new_v4(),
                        message: message.clone(),
                        response: None,
                        created_at: now,
                        updated_at: now,
                    };
                    thread.0.push(followup.clone());
                    followup
                }
            };

            if self.save_thread(&invite, thread, now).await? {
                tracing::info!(
                    invite_id = invite.id,
                    followup_id = %followup.id,
                    "Follow-up saved"
                );
                let token = invite.secret_token.clone();
                let followup_id = followup.id;
                self.notify_recipient(&invite, |recipient_name| MailEvent::FollowupCreated {
                    token,
                    followup_id,
                    recipient_name,
                })
                .await;
                return Ok(followup);
            }

            tracing::debug!(invite_id, attempt, "Follow-up write lost a race, retrying");
        }

        Err(AppError::StateConflict(CONTENDED.to_string()))
    }

    /// Record the recipient's reply to one follow-up. Replies are final;
    /// resubmissions get the current state back.
    pub async fn respond_to_followup(
        &self,
        token: &str,
        followup_id: &str,
        draft: &FollowupAnswerDraft,
    ) -> Result<Submission> {
        let mut content: Option<FollowupAnswerContent> = None;

        for attempt in 1..=CAS_ATTEMPTS {
            let invite = self.gateway.resolve(token).await?;
            let (id, answered) = {
                let followup = find_followup(&invite, followup_id)?;
                (followup.id, followup.is_answered())
            };
            if answered {
                return Ok(Submission::unchanged(invite));
            }

            let answer = match &content {
                Some(parsed) => parsed.clone(),
                None => {
                    let parsed = FollowupAnswerContent::parse(draft, self.profanity.as_ref())?;
                    content = Some(parsed.clone());
                    parsed
                }
            };
            if answer.contact.allows_followup() {
                self.ensure_followup_quota(&invite)?;
            }

            let now = Utc::now();
            let mut thread = invite.followups.clone();
            if let Some(entry) = thread.0.iter_mut().find(|f| f.id == id) {
                entry.response = Some(answer.into_answer());
                entry.updated_at = now;
            }

            if self.save_thread(&invite, thread, now).await? {
                let current = self.reload(invite.id).await?;
                tracing::info!(invite_id = current.id, followup_id = %id, "Follow-up answered");
                let invite_id = current.id;
                self.notify_sender(&current, |recipient_name| MailEvent::FollowupResponded {
                    invite_id,
                    recipient_name,
                })
                .await;
                return Ok(Submission::applied(current));
            }

            tracing::debug!(invite_id = invite.id, attempt, "Follow-up reply lost a race, retrying");
        }

        Err(AppError::StateConflict(CONTENDED.to_string()))
    }

    /// Write `thread` only if nobody else wrote the row since `invite` was read.
    async fn save_thread(
        &self,
        invite: &invite::Model,
        thread: FollowupThread,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = Invite::update_many()
            .set(invite::ActiveModel {
                followups: Set(thread),
                revision: Set(invite.revision + 1),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(invite::Column::Id.eq(invite.id))
            .filter(invite::Column::Revision.eq(invite.revision))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
