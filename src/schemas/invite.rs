use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::invite::{self, Followup, InviteAnswer, InviteStatus};
use crate::models::student;
use crate::services::invites::{FollowupGate, InviteDraft};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInviteRequest {
    pub student_id: i64,
    #[serde(flatten)]
    pub content: InviteDraft,
}

#[derive(Debug, Clone, Serialize)]
pub struct InviteContentView {
    pub message: String,
    pub why_you: String,
    pub green_flag: String,
    pub passion: String,
    #[serde(rename = "trait")]
    pub about_trait: String,
}

impl From<&invite::Model> for InviteContentView {
    fn from(invite: &invite::Model) -> Self {
        Self {
            message: invite.message.clone(),
            why_you: invite.why_you.clone(),
            green_flag: invite.green_flag.clone(),
            passion: invite.passion.clone(),
            about_trait: invite.about_trait.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipientView {
    pub id: i64,
    pub name: String,
}

/// What the sender sees of one of their invites. Never carries the token.
#[derive(Debug, Clone, Serialize)]
pub struct SenderInviteView {
    pub id: i64,
    pub recipient: RecipientView,
    pub content: InviteContentView,
    pub status: InviteStatus,
    pub editable: bool,
    pub response: Option<InviteAnswer>,
    pub followups: Vec<Followup>,
    pub followup_limit: usize,
    pub can_request_followup: bool,
    /// Set when a follow-up request would edit this one instead of appending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_followup_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_blocked_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SenderInviteView {
    pub fn new(
        invite: &invite::Model,
        recipient: &student::Model,
        gate: FollowupGate,
        followup_limit: usize,
    ) -> Self {
        let pending_followup_id = match gate {
            FollowupGate::EditPending(id) => Some(id),
            _ => None,
        };
        Self {
            id: invite.id,
            recipient: RecipientView {
                id: recipient.id,
                name: recipient.name.clone(),
            },
            content: InviteContentView::from(invite),
            status: invite.status,
            editable: invite.is_pending(),
            response: invite.response.clone(),
            followups: invite.followups.0.clone(),
            followup_limit,
            can_request_followup: gate.allows_request(),
            pending_followup_id,
            followup_blocked_reason: gate.refusal(followup_limit),
            created_at: invite.created_at,
            updated_at: invite.updated_at,
        }
    }
}

/// What a token holder sees. No sender identity, no internal ids.
#[derive(Debug, Clone, Serialize)]
pub struct PublicInviteView {
    pub recipient_name: String,
    pub content: InviteContentView,
    pub status: InviteStatus,
    pub response: Option<InviteAnswer>,
    pub followups: Vec<Followup>,
    pub created_at: DateTime<Utc>,
}

impl PublicInviteView {
    pub fn new(invite: &invite::Model, recipient: &student::Model) -> Self {
        Self {
            recipient_name: recipient.name.clone(),
            content: InviteContentView::from(invite),
            status: invite.status,
            response: invite.response.clone(),
            followups: invite.followups.0.clone(),
            created_at: invite.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicFollowupView {
    pub invite: PublicInviteView,
    pub followup: Followup,
}

/// Reply to a write through a public link. `applied` is false when the
/// target was already answered and `invite` is the current state.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResponse<T> {
    pub applied: bool,
    pub invite: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowupRequestResponse {
    pub followup: Followup,
    pub invite: SenderInviteView,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_sent: usize,
    pub accepted: usize,
    pub maybe: usize,
    pub rejected: usize,
    pub pending: usize,
}

impl DashboardStats {
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a InviteStatus>) -> Self {
        statuses
            .into_iter()
            .fold(Self::default(), |mut stats, status| {
                stats.total_sent += 1;
                match status {
                    InviteStatus::Accepted => stats.accepted += 1,
                    InviteStatus::Maybe => stats.maybe += 1,
                    InviteStatus::Rejected => stats.rejected += 1,
                    InviteStatus::Pending => stats.pending += 1,
                }
                stats
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub invites: Vec<SenderInviteView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_each_status() {
        let statuses = [
            InviteStatus::Pending,
            InviteStatus::Accepted,
            InviteStatus::Accepted,
            InviteStatus::Rejected,
        ];
        let stats = DashboardStats::tally(statuses.iter());
        assert_eq!(stats.total_sent, 4);
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.maybe, 0);
    }

    #[test]
    fn test_create_request_flattens_content() {
        let request: CreateInviteRequest = serde_json::from_value(serde_json::json!({
            "student_id": 7,
            "message": "Prom?",
            "why_you": "You laugh at my jokes",
            "trait": "kind"
        }))
        .unwrap();
        assert_eq!(request.student_id, 7);
        assert_eq!(request.content.message.as_deref(), Some("Prom?"));
        assert_eq!(request.content.about_trait.as_deref(), Some("kind"));
        assert!(request.content.passion.is_none());
    }
}
