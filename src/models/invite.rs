use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub secret_token: String,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub message: String,
    pub why_you: String,
    pub green_flag: String,
    pub passion: String,
    #[sea_orm(column_name = "trait")]
    pub about_trait: String,
    pub status: InviteStatus,
    #[sea_orm(column_type = "Json", nullable)]
    pub response: Option<InviteAnswer>,
    #[sea_orm(column_type = "Json")]
    pub followups: FollowupThread,
    /// Bumped on every write; guards compare-and-swap updates.
    pub revision: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::RecipientId",
        to = "super::student::Column::Id"
    )]
    Recipient,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sender.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "maybe")]
    Maybe,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Maybe => "maybe",
            InviteStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The recipient's three-way disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Openness {
    Yes,
    Maybe,
    No,
}

impl Openness {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "yes" => Some(Openness::Yes),
            "maybe" => Some(Openness::Maybe),
            "no" => Some(Openness::No),
            _ => None,
        }
    }

    /// Status the invite moves to when answered with this disposition.
    pub fn resulting_status(&self) -> InviteStatus {
        match self {
            Openness::Yes => InviteStatus::Accepted,
            Openness::Maybe => InviteStatus::Maybe,
            Openness::No => InviteStatus::Rejected,
        }
    }
}

/// Channel the recipient exposes, or permission for another follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    Phone,
    Insta,
    Followup,
    #[default]
    #[serde(rename = "")]
    Withheld,
}

impl ContactMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "phone" => Some(ContactMethod::Phone),
            "insta" => Some(ContactMethod::Insta),
            "followup" => Some(ContactMethod::Followup),
            "" => Some(ContactMethod::Withheld),
            _ => None,
        }
    }
}

/// Main response to an invite. Written once, together with the status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct InviteAnswer {
    pub feeling: String,
    pub standout: String,
    pub openness: Openness,
    pub contact_method: ContactMethod,
    pub phone: String,
    pub insta: String,
    pub allow_followup: bool,
    pub created_at: DateTimeUtc,
}

/// Recipient's answer to a follow-up. Its presence makes the follow-up final.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupAnswer {
    pub message: String,
    pub contact_method: ContactMethod,
    pub phone: String,
    pub insta: String,
    pub allow_followup: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followup {
    pub id: Uuid,
    pub message: String,
    pub response: Option<FollowupAnswer>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Followup {
    pub fn is_answered(&self) -> bool {
        self.response.is_some()
    }
}

/// Ordered, append-only follow-up exchanges embedded in the invite row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct FollowupThread(pub Vec<Followup>);

impl FollowupThread {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Followup> {
        self.0.iter()
    }

    pub fn get(&self, id: Uuid) -> Option<&Followup> {
        self.0.iter().find(|f| f.id == id)
    }

    /// The unanswered follow-up, if any. Only the last entry can be unanswered.
    pub fn pending(&self) -> Option<&Followup> {
        self.0.last().filter(|f| !f.is_answered())
    }
}

impl Model {
    pub fn is_pending(&self) -> bool {
        self.status == InviteStatus::Pending
    }

    /// Whether the most recent answer (last answered follow-up, else the main
    /// response) granted another follow-up.
    pub fn latest_answer_allows_followup(&self) -> bool {
        match self.followups.0.last() {
            Some(last) => last
                .response
                .as_ref()
                .map(|r| r.allow_followup)
                .unwrap_or(false),
            None => self
                .response
                .as_ref()
                .map(|r| r.allow_followup)
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn followup(answered: bool, allow: bool) -> Followup {
        let now = Utc::now();
        Followup {
            id: Uuid::new_v4(),
            message: "still thinking about you".to_string(),
            response: answered.then(|| FollowupAnswer {
                message: "ok".to_string(),
                contact_method: if allow {
                    ContactMethod::Followup
                } else {
                    ContactMethod::Withheld
                },
                phone: String::new(),
                insta: String::new(),
                allow_followup: allow,
                created_at: now,
            }),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_openness_maps_to_status() {
        assert_eq!(Openness::Yes.resulting_status(), InviteStatus::Accepted);
        assert_eq!(Openness::Maybe.resulting_status(), InviteStatus::Maybe);
        assert_eq!(Openness::No.resulting_status(), InviteStatus::Rejected);
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        assert_eq!(Openness::parse(" YES "), Some(Openness::Yes));
        assert_eq!(Openness::parse("perhaps"), None);
        assert_eq!(ContactMethod::parse(""), Some(ContactMethod::Withheld));
        assert_eq!(ContactMethod::parse("email"), None);
    }

    #[test]
    fn test_contact_method_serializes_withheld_as_empty() {
        let json = serde_json::to_string(&ContactMethod::Withheld).unwrap();
        assert_eq!(json, "\"\"");
        let parsed: ContactMethod = serde_json::from_str("\"insta\"").unwrap();
        assert_eq!(parsed, ContactMethod::Insta);
    }

    #[test]
    fn test_pending_followup_is_last_unanswered() {
        let thread = FollowupThread(vec![followup(true, true), followup(false, false)]);
        assert!(thread.pending().is_some());

        let thread = FollowupThread(vec![followup(true, true)]);
        assert!(thread.pending().is_none());
    }
}
