//! Invite lifecycle engine.
//!
//! Owns the `pending -> accepted | maybe | rejected` transition and the
//! follow-up thread layered on top. Every state change is persisted with a
//! conditional update before any notification is handed to the dispatcher.

mod content;
mod followups;

pub use content::{
    AnswerContent, AnswerDraft, ContactChoice, FollowupAnswerContent, FollowupAnswerDraft,
    FollowupDraft, FollowupMessage, InviteContent, InviteDraft,
};
pub use followups::FollowupGate;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};

use crate::application::config::invites::InviteConfig;
use crate::application::database::DbConn;
use crate::application::error::{AppError, Result};
use crate::models::invite::{self, FollowupThread, InviteStatus};
use crate::models::prelude::*;
use crate::models::{student, user};
use crate::services::contact::{ContactDirectory, ContactResolvable};
use crate::services::cooldown::CooldownPolicy;
use crate::services::gateway::TokenGateway;
use crate::services::notification::{MailEvent, NotificationDispatcher};
use crate::services::profanity::ProfanityFilter;
use crate::services::security::{RandomTokenGenerator, TokenGenerator};

/// Attempts at drawing a token that does not collide with an existing one.
const TOKEN_ATTEMPTS: usize = 5;

const ALREADY_ANSWERED: &str = "This invite has already been answered and can no longer be edited.";

/// Result of a write through a public link. `applied == false` means the
/// target was no longer open and `invite` is the unchanged current state.
#[derive(Debug, Clone)]
pub struct Submission {
    pub applied: bool,
    pub invite: invite::Model,
}

impl Submission {
    fn applied(invite: invite::Model) -> Self {
        Self {
            applied: true,
            invite,
        }
    }

    fn unchanged(invite: invite::Model) -> Self {
        Self {
            applied: false,
            invite,
        }
    }
}

#[derive(Clone)]
pub struct InviteService {
    db: DbConn,
    gateway: TokenGateway,
    tokens: Arc<dyn TokenGenerator>,
    profanity: Arc<dyn ProfanityFilter>,
    cooldown: CooldownPolicy,
    contacts: ContactDirectory,
    notifier: NotificationDispatcher,
    followup_limit: usize,
}

impl InviteService {
    pub fn new(
        db: DbConn,
        config: &InviteConfig,
        contacts: ContactDirectory,
        profanity: Arc<dyn ProfanityFilter>,
        notifier: NotificationDispatcher,
    ) -> Self {
        let tokens: Arc<dyn TokenGenerator> = Arc::new(RandomTokenGenerator);
        Self {
            gateway: TokenGateway::new(db.clone(), tokens.clone()),
            db,
            tokens,
            profanity,
            cooldown: CooldownPolicy::from(config),
            contacts,
            notifier,
            followup_limit: config.followup_limit,
        }
    }

    /// Swap the token source. Links are then resolved against its shape.
    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.gateway = TokenGateway::new(self.db.clone(), tokens.clone());
        self.tokens = tokens;
        self
    }

    pub fn gateway(&self) -> &TokenGateway {
        &self.gateway
    }

    pub fn followup_limit(&self) -> usize {
        self.followup_limit
    }

    /// Create a pending invite and notify the recipient.
    pub async fn create(
        &self,
        sender: &user::Model,
        recipient_id: i64,
        draft: &InviteDraft,
    ) -> Result<invite::Model> {
        let content = InviteContent::parse(draft, self.profanity.as_ref())?;

        let recipient = Student::find_by_id(recipient_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;

        let address = recipient.contact_address(&self.contacts).ok_or_else(|| {
            AppError::Resolution(format!(
                "We have no way to reach {}. Add an email address first.",
                recipient.name
            ))
        })?;

        let now = Utc::now();
        self.cooldown
            .check(&self.db, sender.id, recipient.id, now)
            .await?;

        let invite = self
            .insert_with_fresh_token(sender.id, recipient.id, &content, now)
            .await?;

        tracing::info!(
            invite_id = invite.id,
            sender_id = sender.id,
            recipient_id = recipient.id,
            "Invite created"
        );

        self.notifier.dispatch(
            &address,
            MailEvent::InviteCreated {
                token: invite.secret_token.clone(),
                recipient_name: recipient.name.clone(),
            },
        );

        Ok(invite)
    }

    async fn insert_with_fresh_token(
        &self,
        sender_id: i64,
        recipient_id: i64,
        content: &InviteContent,
        now: DateTime<Utc>,
    ) -> Result<invite::Model> {
        for attempt in 1..=TOKEN_ATTEMPTS {
            let model = invite::ActiveModel {
                secret_token: Set(self.tokens.generate()),
                sender_id: Set(sender_id),
                recipient_id: Set(recipient_id),
                message: Set(content.message.clone()),
                why_you: Set(content.why_you.clone()),
                green_flag: Set(content.green_flag.clone()),
                passion: Set(content.passion.clone()),
                about_trait: Set(content.about_trait.clone()),
                status: Set(InviteStatus::Pending),
                response: Set(None),
                followups: Set(FollowupThread::default()),
                revision: Set(0),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            match model.insert(&self.db).await {
                Ok(invite) => return Ok(invite),
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(attempt, "Secret token collision, drawing a new one");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Internal(
            "Could not allocate a unique invite token".to_string(),
        ))
    }

    /// Apply the recipient's answer. Exactly one caller wins the transition;
    /// every other (and every later) submission gets the current state back.
    pub async fn respond(&self, token: &str, draft: &AnswerDraft) -> Result<Submission> {
        let invite = self.gateway.resolve(token).await?;
        if !invite.is_pending() {
            return Ok(Submission::unchanged(invite));
        }

        let content = AnswerContent::parse(draft, self.profanity.as_ref())?;
        if content.contact.allows_followup() {
            self.ensure_followup_quota(&invite)?;
        }

        let status = content.openness.resulting_status();
        let now = Utc::now();
        let result = Invite::update_many()
            .set(invite::ActiveModel {
                status: Set(status),
                response: Set(Some(content.into_answer())),
                revision: Set(invite.revision + 1),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(invite::Column::Id.eq(invite.id))
            .filter(invite::Column::Status.eq(InviteStatus::Pending))
            .exec(&self.db)
            .await?;

        let current = self.reload(invite.id).await?;
        if result.rows_affected == 0 {
            tracing::info!(invite_id = invite.id, "Invite already answered, keeping first response");
            return Ok(Submission::unchanged(current));
        }

        tracing::info!(invite_id = current.id, status = %status, "Invite answered");
        let invite_id = current.id;
        self.notify_sender(&current, |recipient_name| MailEvent::InviteResponded {
            invite_id,
            recipient_name,
            status,
        })
        .await;

        Ok(Submission::applied(current))
    }

    /// Replace the content of a still-pending invite. Keeps the token and
    /// does not notify.
    pub async fn edit(
        &self,
        sender: &user::Model,
        invite_id: i64,
        draft: &InviteDraft,
    ) -> Result<invite::Model> {
        let invite = self.find_owned(sender, invite_id).await?;
        if !invite.is_pending() {
            return Err(AppError::StateConflict(ALREADY_ANSWERED.to_string()));
        }

        let content = InviteContent::parse(draft, self.profanity.as_ref())?;
        let result = Invite::update_many()
            .set(invite::ActiveModel {
                message: Set(content.message),
                why_you: Set(content.why_you),
                green_flag: Set(content.green_flag),
                passion: Set(content.passion),
                about_trait: Set(content.about_trait),
                revision: Set(invite.revision + 1),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(invite::Column::Id.eq(invite.id))
            .filter(invite::Column::Status.eq(InviteStatus::Pending))
            .exec(&self.db)
            .await?;

        // Answered between our read and write.
        if result.rows_affected == 0 {
            return Err(AppError::StateConflict(ALREADY_ANSWERED.to_string()));
        }

        tracing::info!(invite_id = invite.id, "Invite edited");
        self.reload(invite.id).await
    }

    /// An invite owned by `sender`, with its recipient.
    pub async fn details(
        &self,
        sender: &user::Model,
        invite_id: i64,
    ) -> Result<(invite::Model, student::Model)> {
        let invite = self.find_owned(sender, invite_id).await?;
        let recipient = Student::find_by_id(invite.recipient_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))?;
        Ok((invite, recipient))
    }

    /// The sender's invites, newest first. Invites whose recipient is gone
    /// are left out.
    pub async fn list_for_sender(
        &self,
        sender: &user::Model,
    ) -> Result<Vec<(invite::Model, student::Model)>> {
        let rows = Invite::find()
            .filter(invite::Column::SenderId.eq(sender.id))
            .order_by_desc(invite::Column::CreatedAt)
            .order_by_desc(invite::Column::Id)
            .find_also_related(Student)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(invite, recipient)| recipient.map(|r| (invite, r)))
            .collect())
    }

    /// Ownership mismatches look exactly like missing invites.
    async fn find_owned(&self, sender: &user::Model, invite_id: i64) -> Result<invite::Model> {
        Invite::find_by_id(invite_id)
            .filter(invite::Column::SenderId.eq(sender.id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))
    }

    async fn reload(&self, invite_id: i64) -> Result<invite::Model> {
        Invite::find_by_id(invite_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Invite {} disappeared", invite_id)))
    }

    fn ensure_followup_quota(&self, invite: &invite::Model) -> Result<()> {
        if invite.followups.len() >= self.followup_limit {
            return Err(AppError::RateLimited {
                message: format!(
                    "The follow-up limit ({}) has been reached. Choose another way to stay in touch.",
                    self.followup_limit
                ),
                retry_after: None,
            });
        }
        Ok(())
    }

    /// Best effort: a failure to look up the sender is logged, not returned.
    async fn notify_sender(
        &self,
        invite: &invite::Model,
        event_for: impl FnOnce(String) -> MailEvent,
    ) {
        let parties = async {
            let sender = User::find_by_id(invite.sender_id).one(&self.db).await?;
            let recipient = Student::find_by_id(invite.recipient_id).one(&self.db).await?;
            Ok::<_, DbErr>((sender, recipient))
        }
        .await;

        match parties {
            Ok((Some(sender), recipient)) => {
                let name = recipient.map(|r| r.name).unwrap_or_default();
                self.notifier.dispatch(&sender.email, event_for(name));
            }
            Ok((None, _)) => {
                tracing::warn!(invite_id = invite.id, "Sender account missing, notification skipped");
            }
            Err(e) => {
                tracing::warn!(invite_id = invite.id, error = %e, "Could not load sender, notification skipped");
            }
        }
    }

    async fn notify_recipient(
        &self,
        invite: &invite::Model,
        event_for: impl FnOnce(String) -> MailEvent,
    ) {
        match Student::find_by_id(invite.recipient_id).one(&self.db).await {
            Ok(Some(recipient)) => match recipient.contact_address(&self.contacts) {
                Some(address) => self.notifier.dispatch(&address, event_for(recipient.name)),
                None => {
                    tracing::warn!(invite_id = invite.id, "Recipient has no contact address, notification skipped");
                }
            },
            Ok(None) => {
                tracing::warn!(invite_id = invite.id, "Recipient missing, notification skipped");
            }
            Err(e) => {
                tracing::warn!(invite_id = invite.id, error = %e, "Could not load recipient, notification skipped");
            }
        }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
