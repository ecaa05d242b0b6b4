//! Normalization and validation of everything a sender or recipient types.
//!
//! Fields are trimmed first. An empty field is "missing", an over-long one is
//! rejected (never truncated). Length and format rules run through
//! `validator` on the normalized types; profanity runs last.

use chrono::Utc;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::application::error::{AppError, Result};
use crate::models::invite::{ContactMethod, FollowupAnswer, InviteAnswer, Openness};
use crate::services::profanity::ProfanityFilter;

pub const PHONE_MAX: usize = 20;
pub const INSTA_MAX: usize = 30;

/// Raw invite content as submitted by the sender.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InviteDraft {
    pub message: Option<String>,
    pub why_you: Option<String>,
    pub green_flag: Option<String>,
    pub passion: Option<String>,
    #[serde(rename = "trait")]
    pub about_trait: Option<String>,
}

/// Raw main response as submitted by the recipient.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerDraft {
    pub feeling: Option<String>,
    pub standout: Option<String>,
    pub openness: Option<String>,
    pub contact_method: Option<String>,
    pub phone: Option<String>,
    pub insta: Option<String>,
}

/// Raw follow-up request or follow-up reply message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowupDraft {
    pub message: Option<String>,
}

/// Raw reply to a follow-up.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowupAnswerDraft {
    pub message: Option<String>,
    pub contact_method: Option<String>,
    pub phone: Option<String>,
    pub insta: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct InviteContent {
    #[validate(length(max = 1000, message = "Message must be at most 1000 characters"))]
    pub message: String,
    #[validate(length(max = 300, message = "\"Why you\" must be at most 300 characters"))]
    pub why_you: String,
    #[validate(length(max = 300, message = "Green flag must be at most 300 characters"))]
    pub green_flag: String,
    #[validate(length(max = 300, message = "Passion must be at most 300 characters"))]
    pub passion: String,
    #[validate(length(max = 300, message = "Trait must be at most 300 characters"))]
    pub about_trait: String,
}

impl InviteContent {
    pub fn parse(draft: &InviteDraft, filter: &dyn ProfanityFilter) -> Result<Self> {
        let mut missing = Missing::default();
        let content = Self {
            message: missing.take("message", &draft.message),
            why_you: missing.take("why you", &draft.why_you),
            green_flag: missing.take("green flag", &draft.green_flag),
            passion: missing.take("passion", &draft.passion),
            about_trait: missing.take("trait", &draft.about_trait),
        };
        missing.check()?;
        content.validate()?;

        check_clean(
            filter,
            &[
                ("message", content.message.as_str()),
                ("why you", content.why_you.as_str()),
                ("green flag", content.green_flag.as_str()),
                ("passion", content.passion.as_str()),
                ("trait", content.about_trait.as_str()),
            ],
        )?;
        Ok(content)
    }
}

/// Contact channel after applying the choice: only the chosen field survives.
#[derive(Debug, Clone, PartialEq, Eq, Default, Validate)]
pub struct ContactChoice {
    pub method: ContactMethod,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(custom(function = "validate_insta"))]
    pub insta: String,
}

impl ContactChoice {
    pub fn parse(
        method: &Option<String>,
        phone: &Option<String>,
        insta: &Option<String>,
    ) -> Result<Self> {
        let method = ContactMethod::parse(method.as_deref().unwrap_or(""))
            .ok_or_else(|| AppError::Validation("Unknown contact method".to_string()))?;

        let phone = trimmed(phone);
        let insta = trimmed(insta);
        let insta = insta.strip_prefix('@').unwrap_or(&insta).to_string();

        let choice = match method {
            ContactMethod::Phone if phone.is_empty() => {
                return Err(AppError::Validation(
                    "Phone number is required when sharing your phone".to_string(),
                ))
            }
            ContactMethod::Insta if insta.is_empty() => {
                return Err(AppError::Validation(
                    "Instagram handle is required when sharing your Instagram".to_string(),
                ))
            }
            ContactMethod::Phone => Self {
                method,
                phone,
                insta: String::new(),
            },
            ContactMethod::Insta => Self {
                method,
                phone: String::new(),
                insta,
            },
            ContactMethod::Followup | ContactMethod::Withheld => Self {
                method,
                ..Self::default()
            },
        };
        choice.validate()?;
        Ok(choice)
    }

    pub fn allows_followup(&self) -> bool {
        self.method == ContactMethod::Followup
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct AnswerContent {
    #[validate(length(max = 500, message = "Feeling must be at most 500 characters"))]
    pub feeling: String,
    #[validate(length(max = 500, message = "Standout must be at most 500 characters"))]
    pub standout: String,
    pub openness: Openness,
    /// Validated on its own in [`ContactChoice::parse`].
    pub contact: ContactChoice,
}

impl AnswerContent {
    pub fn parse(draft: &AnswerDraft, filter: &dyn ProfanityFilter) -> Result<Self> {
        let mut missing = Missing::default();
        let feeling = missing.take("feeling", &draft.feeling);
        let standout = missing.take("standout", &draft.standout);
        let openness_raw = missing.take("openness", &draft.openness);
        missing.check()?;

        let openness = Openness::parse(&openness_raw).ok_or_else(|| {
            AppError::Validation("Openness must be one of yes, maybe or no".to_string())
        })?;

        // Contact details are only recorded for a yes.
        let contact = if openness == Openness::Yes {
            ContactChoice::parse(&draft.contact_method, &draft.phone, &draft.insta)?
        } else {
            ContactChoice::default()
        };

        let content = Self {
            feeling,
            standout,
            openness,
            contact,
        };
        content.validate()?;
        check_clean(
            filter,
            &[("feeling", content.feeling.as_str()), ("standout", content.standout.as_str())],
        )?;
        Ok(content)
    }

    pub fn into_answer(self) -> InviteAnswer {
        InviteAnswer {
            allow_followup: self.contact.allows_followup(),
            feeling: self.feeling,
            standout: self.standout,
            openness: self.openness,
            contact_method: self.contact.method,
            phone: self.contact.phone,
            insta: self.contact.insta,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct FollowupMessage {
    #[validate(length(max = 1000, message = "Follow-up message must be at most 1000 characters"))]
    pub message: String,
}

impl FollowupMessage {
    pub fn parse(draft: &FollowupDraft, filter: &dyn ProfanityFilter) -> Result<Self> {
        let mut missing = Missing::default();
        let content = Self {
            message: missing.take("message", &draft.message),
        };
        missing.check()?;
        content.validate()?;
        check_clean(filter, &[("message", content.message.as_str())])?;
        Ok(content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct FollowupAnswerContent {
    #[validate(length(max = 1000, message = "Reply must be at most 1000 characters"))]
    pub message: String,
    /// Validated on its own in [`ContactChoice::parse`].
    pub contact: ContactChoice,
}

impl FollowupAnswerContent {
    pub fn parse(draft: &FollowupAnswerDraft, filter: &dyn ProfanityFilter) -> Result<Self> {
        let mut missing = Missing::default();
        let message = missing.take("message", &draft.message);
        missing.check()?;

        let content = Self {
            message,
            contact: ContactChoice::parse(&draft.contact_method, &draft.phone, &draft.insta)?,
        };
        content.validate()?;
        check_clean(filter, &[("message", content.message.as_str())])?;
        Ok(content)
    }

    pub fn into_answer(self) -> FollowupAnswer {
        FollowupAnswer {
            allow_followup: self.contact.allows_followup(),
            message: self.message,
            contact_method: self.contact.method,
            phone: self.contact.phone,
            insta: self.contact.insta,
            created_at: Utc::now(),
        }
    }
}

/// Collects the labels of required fields that came in blank.
#[derive(Default)]
struct Missing(Vec<&'static str>);

impl Missing {
    fn take(&mut self, label: &'static str, value: &Option<String>) -> String {
        let value = trimmed(value);
        if value.is_empty() {
            self.0.push(label);
        }
        value
    }

    fn check(self) -> Result<()> {
        if self.0.is_empty() {
            return Ok(());
        }
        Err(AppError::Validation(format!(
            "Please fill in: {}",
            self.0.join(", ")
        )))
    }
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or("").to_string()
}

fn check_clean(filter: &dyn ProfanityFilter, fields: &[(&str, &str)]) -> Result<()> {
    let flagged: Vec<&str> = fields
        .iter()
        .filter(|(_, text)| filter.is_profane(text))
        .map(|(label, _)| *label)
        .collect();
    if flagged.is_empty() {
        return Ok(());
    }
    Err(AppError::Validation(format!(
        "Please keep it kind. Inappropriate language in: {}",
        flagged.join(", ")
    )))
}

fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    if phone.is_empty() {
        return Ok(());
    }
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '+' || c == '-');
    if phone.chars().count() > PHONE_MAX || !allowed || !phone.chars().any(|c| c.is_ascii_digit())
    {
        let mut err = ValidationError::new("phone");
        err.message = Some("Phone number may only contain digits, spaces, + and - (max 20)".into());
        return Err(err);
    }
    Ok(())
}

fn validate_insta(handle: &str) -> std::result::Result<(), ValidationError> {
    if handle.is_empty() {
        return Ok(());
    }
    let allowed = handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
    if handle.chars().count() > INSTA_MAX || !allowed {
        let mut err = ValidationError::new("insta");
        err.message = Some(
            "Instagram handle may only contain letters, digits, . and _ (max 30)".into(),
        );
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::profanity::WordListFilter;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn draft() -> InviteDraft {
        InviteDraft {
            message: s("  Will you go to prom with me?  "),
            why_you: s("You laugh at my jokes"),
            green_flag: s("Kind to strangers"),
            passion: s("Music"),
            about_trait: s("Curious"),
        }
    }

    fn unwrap_validation(result: Result<impl std::fmt::Debug>) -> String {
        match result {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invite_content_is_trimmed() {
        let content = InviteContent::parse(&draft(), &WordListFilter::default()).unwrap();
        assert_eq!(content.message, "Will you go to prom with me?");
    }

    #[test]
    fn test_blank_fields_are_missing() {
        let mut d = draft();
        d.message = s("   ");
        d.passion = None;
        let msg = unwrap_validation(InviteContent::parse(&d, &WordListFilter::default()));
        assert!(msg.contains("message"));
        assert!(msg.contains("passion"));
    }

    #[test]
    fn test_over_length_is_rejected_not_truncated() {
        let mut d = draft();
        d.why_you = Some("x".repeat(301));
        let msg = unwrap_validation(InviteContent::parse(&d, &WordListFilter::default()));
        assert!(msg.contains("at most 300"));

        d.why_you = Some("x".repeat(300));
        assert!(InviteContent::parse(&d, &WordListFilter::default()).is_ok());
    }

    #[test]
    fn test_profanity_is_rejected() {
        let mut d = draft();
        d.green_flag = s("doesn't give a shit");
        let msg = unwrap_validation(InviteContent::parse(&d, &WordListFilter::default()));
        assert!(msg.contains("green flag"));
    }

    #[test]
    fn test_answer_no_clears_contact() {
        let answer = AnswerContent::parse(
            &AnswerDraft {
                feeling: s("flattered"),
                standout: s("the handwriting"),
                openness: s("no"),
                contact_method: s("phone"),
                phone: s("+91 98765 43210"),
                insta: None,
            },
            &WordListFilter::default(),
        )
        .unwrap()
        .into_answer();

        assert_eq!(answer.openness, Openness::No);
        assert_eq!(answer.contact_method, ContactMethod::Withheld);
        assert!(answer.phone.is_empty());
        assert!(!answer.allow_followup);
    }

    #[test]
    fn test_answer_keeps_only_chosen_channel() {
        let answer = AnswerContent::parse(
            &AnswerDraft {
                feeling: s("happy"),
                standout: s("everything"),
                openness: s("yes"),
                contact_method: s("insta"),
                phone: s("12345"),
                insta: s("@asha.k_"),
            },
            &WordListFilter::default(),
        )
        .unwrap()
        .into_answer();

        assert_eq!(answer.contact_method, ContactMethod::Insta);
        assert_eq!(answer.insta, "asha.k_");
        assert!(answer.phone.is_empty());
    }

    #[test]
    fn test_followup_choice_grants_followup() {
        let answer = AnswerContent::parse(
            &AnswerDraft {
                feeling: s("curious"),
                standout: s("the poem"),
                openness: s("yes"),
                contact_method: s("followup"),
                ..Default::default()
            },
            &WordListFilter::default(),
        )
        .unwrap()
        .into_answer();

        assert!(answer.allow_followup);
        assert_eq!(answer.contact_method, ContactMethod::Followup);
    }

    #[test]
    fn test_chosen_channel_must_be_present_and_valid() {
        let base = AnswerDraft {
            feeling: s("a"),
            standout: s("b"),
            openness: s("yes"),
            contact_method: s("phone"),
            ..Default::default()
        };
        let filter = WordListFilter::default();
        assert!(unwrap_validation(AnswerContent::parse(&base, &filter)).contains("Phone"));

        let bad_phone = AnswerDraft {
            phone: s("call me maybe"),
            ..base.clone()
        };
        assert!(AnswerContent::parse(&bad_phone, &filter).is_err());

        let bad_insta = AnswerDraft {
            contact_method: s("insta"),
            insta: s("no spaces allowed"),
            ..base.clone()
        };
        assert!(AnswerContent::parse(&bad_insta, &filter).is_err());

        let bad_method = AnswerDraft {
            contact_method: s("carrier pigeon"),
            ..base
        };
        assert!(AnswerContent::parse(&bad_method, &filter).is_err());
    }

    #[test]
    fn test_invalid_openness_rejected() {
        let d = AnswerDraft {
            feeling: s("a"),
            standout: s("b"),
            openness: s("perhaps"),
            ..Default::default()
        };
        let msg = unwrap_validation(AnswerContent::parse(&d, &WordListFilter::default()));
        assert!(msg.contains("Openness"));
    }

    #[test]
    fn test_followup_answer_parse() {
        let filter = WordListFilter::default();
        let answer = FollowupAnswerContent::parse(
            &FollowupAnswerDraft {
                message: s(" sure, text me "),
                contact_method: s("phone"),
                phone: s("98765-43210"),
                insta: s("ignored"),
            },
            &filter,
        )
        .unwrap()
        .into_answer();

        assert_eq!(answer.message, "sure, text me");
        assert_eq!(answer.phone, "98765-43210");
        assert!(answer.insta.is_empty());
        assert!(!answer.allow_followup);

        assert!(FollowupAnswerContent::parse(&FollowupAnswerDraft::default(), &filter).is_err());
    }
}
