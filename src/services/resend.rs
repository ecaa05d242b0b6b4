//! Re-delivery of recent notifications, for recovering from a mail outage.

use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::application::database::DbConn;
use crate::application::error::Result;
use crate::models::invite::{self, InviteStatus};
use crate::models::prelude::*;
use crate::services::contact::{mask_address, ContactDirectory, ContactResolvable};
use crate::services::notification::{Delivery, MailEvent, NotificationDispatcher};

#[derive(Debug, Clone)]
pub struct ResendOptions {
    pub since: DateTime<Utc>,
    pub dry_run: bool,
    pub include_followups: bool,
    pub include_followup_responses: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResendSummary {
    pub invites_sent: u32,
    pub followups_sent: u32,
    pub followup_responses_sent: u32,
    pub skipped: u32,
    pub failures: u32,
}

impl fmt::Display for ResendSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resend summary:")?;
        writeln!(f, "- Invites sent: {}", self.invites_sent)?;
        writeln!(f, "- Follow-ups sent: {}", self.followups_sent)?;
        writeln!(f, "- Follow-up responses sent: {}", self.followup_responses_sent)?;
        writeln!(f, "- Skipped: {}", self.skipped)?;
        write!(f, "- Failures: {}", self.failures)
    }
}

enum Sent {
    Invite,
    Followup,
    FollowupResponse,
}

pub struct Resender {
    db: DbConn,
    notifier: NotificationDispatcher,
    contacts: ContactDirectory,
}

impl Resender {
    pub fn new(db: DbConn, notifier: NotificationDispatcher, contacts: ContactDirectory) -> Self {
        Self {
            db,
            notifier,
            contacts,
        }
    }

    pub async fn run(&self, options: &ResendOptions) -> Result<ResendSummary> {
        let mut summary = ResendSummary::default();
        self.resend_invites(options, &mut summary).await?;
        if options.include_followups {
            self.resend_followups(options, &mut summary).await?;
        }
        if options.include_followup_responses {
            self.resend_followup_responses(options, &mut summary).await?;
        }
        Ok(summary)
    }

    /// Invite mails for invites created in the window that are still pending.
    async fn resend_invites(&self, options: &ResendOptions, summary: &mut ResendSummary) -> Result<()> {
        let invites = Invite::find()
            .filter(invite::Column::CreatedAt.gte(options.since))
            .filter(invite::Column::Status.eq(InviteStatus::Pending))
            .order_by_asc(invite::Column::Id)
            .find_also_related(Student)
            .all(&self.db)
            .await?;

        for (invite, recipient) in invites {
            let Some((recipient, address)) = recipient
                .and_then(|r| r.contact_address(&self.contacts).map(|a| (r, a)))
            else {
                summary.skipped += 1;
                continue;
            };
            let event = MailEvent::InviteCreated {
                token: invite.secret_token.clone(),
                recipient_name: recipient.name.clone(),
            };
            self.send(&address, event, options, summary, Sent::Invite).await;
        }
        Ok(())
    }

    /// Follow-up mails for unanswered follow-ups written in the window.
    async fn resend_followups(&self, options: &ResendOptions, summary: &mut ResendSummary) -> Result<()> {
        let invites = self.touched_since(options.since).await?;

        for (invite, recipient) in invites {
            let recent: Vec<_> = invite
                .followups
                .iter()
                .filter(|f| f.created_at >= options.since)
                .collect();
            if recent.is_empty() {
                continue;
            }

            let Some((recipient, address)) = recipient
                .and_then(|r| r.contact_address(&self.contacts).map(|a| (r, a)))
            else {
                summary.skipped += 1;
                continue;
            };

            for followup in recent {
                if followup.is_answered() {
                    summary.skipped += 1;
                    continue;
                }
                let event = MailEvent::FollowupCreated {
                    token: invite.secret_token.clone(),
                    followup_id: followup.id,
                    recipient_name: recipient.name.clone(),
                };
                self.send(&address, event, options, summary, Sent::Followup).await;
            }
        }
        Ok(())
    }

    /// Reply notices to senders for follow-ups answered in the window.
    async fn resend_followup_responses(
        &self,
        options: &ResendOptions,
        summary: &mut ResendSummary,
    ) -> Result<()> {
        let invites = self.touched_since(options.since).await?;

        for (invite, recipient) in invites {
            let answered = invite
                .followups
                .iter()
                .filter(|f| {
                    f.response
                        .as_ref()
                        .is_some_and(|r| r.created_at >= options.since)
                })
                .count();
            if answered == 0 {
                continue;
            }

            let Some(sender) = User::find_by_id(invite.sender_id).one(&self.db).await? else {
                summary.skipped += 1;
                continue;
            };
            let recipient_name = recipient.map(|r| r.name).unwrap_or_default();

            for _ in 0..answered {
                let event = MailEvent::FollowupResponded {
                    invite_id: invite.id,
                    recipient_name: recipient_name.clone(),
                };
                self.send(&sender.email, event, options, summary, Sent::FollowupResponse)
                    .await;
            }
        }
        Ok(())
    }

    /// Follow-up writes bump `updated_at`, so this bounds the scan.
    async fn touched_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<(invite::Model, Option<crate::models::student::Model>)>> {
        Ok(Invite::find()
            .filter(invite::Column::UpdatedAt.gte(since))
            .order_by_asc(invite::Column::Id)
            .find_also_related(Student)
            .all(&self.db)
            .await?)
    }

    async fn send(
        &self,
        to: &str,
        event: MailEvent,
        options: &ResendOptions,
        summary: &mut ResendSummary,
        kind: Sent,
    ) {
        let delivered = if options.dry_run {
            let mail = self.notifier.render(to, &event);
            tracing::info!(to = %mask_address(to), subject = %mail.subject, "[dry-run] would send");
            true
        } else {
            let mail = self.notifier.render(to, &event);
            match self.notifier.deliver(&mail).await {
                Delivery::Sent { .. } => true,
                Delivery::Failed { .. } => {
                    summary.failures += 1;
                    false
                }
                Delivery::Skipped => {
                    summary.skipped += 1;
                    false
                }
            }
        };

        if delivered {
            match kind {
                Sent::Invite => summary.invites_sent += 1,
                Sent::Followup => summary.followups_sent += 1,
                Sent::FollowupResponse => summary.followup_responses_sent += 1,
            }
        }
    }
}
