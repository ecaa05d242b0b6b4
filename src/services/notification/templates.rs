//! Email templates for invite lifecycle events.
//!
//! Rendering is pure: the same event, base URL and subject choice always
//! produce the same mail. Subject selection is delegated to [`SubjectPicker`]
//! so tests can seed it.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use uuid::Uuid;

use crate::models::invite::InviteStatus;

/// Event kinds that produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    InviteCreated,
    InviteResponded,
    FollowupCreated,
    FollowupResponded,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::InviteCreated => "invite-created",
            TemplateKind::InviteResponded => "invite-responded",
            TemplateKind::FollowupCreated => "followup-created",
            TemplateKind::FollowupResponded => "followup-responded",
        }
    }

    /// Static subject pool for this kind.
    pub fn subjects(&self) -> &'static [&'static str] {
        match self {
            TemplateKind::InviteCreated => INVITE_CREATED_SUBJECTS,
            TemplateKind::InviteResponded => INVITE_RESPONDED_SUBJECTS,
            TemplateKind::FollowupCreated => FOLLOWUP_CREATED_SUBJECTS,
            TemplateKind::FollowupResponded => FOLLOWUP_RESPONDED_SUBJECTS,
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const INVITE_CREATED_SUBJECTS: &[&str] = &[
    "You have a new anonymous prom invite!",
    "Someone has a secret for you",
    "A confession just landed in your inbox",
    "Psst... someone is thinking about you",
    "Your secret invite is waiting",
    "Someone worked up the courage to write to you",
    "An anonymous note has your name on it",
    "Open me: a secret prom invite",
];

const INVITE_RESPONDED_SUBJECTS: &[&str] = &[
    "Your prom invite has a response!",
    "They answered your confession",
    "The wait is over: your invite got a reply",
    "News about your secret invite",
    "Your anonymous invite was answered",
];

const FOLLOWUP_CREATED_SUBJECTS: &[&str] = &[
    "Your secret admirer wrote again",
    "A follow-up to your secret invite",
    "There is more to the story",
    "One more note from your anonymous sender",
];

const FOLLOWUP_RESPONDED_SUBJECTS: &[&str] = &[
    "Your follow-up has a reply",
    "They wrote back to your follow-up",
    "New reply on your secret invite",
    "Your follow-up was answered",
];

/// Everything a template needs; owned so it can cross into a spawned task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailEvent {
    InviteCreated {
        token: String,
        recipient_name: String,
    },
    InviteResponded {
        invite_id: i64,
        recipient_name: String,
        status: InviteStatus,
    },
    FollowupCreated {
        token: String,
        followup_id: Uuid,
        recipient_name: String,
    },
    FollowupResponded {
        invite_id: i64,
        recipient_name: String,
    },
}

impl MailEvent {
    pub fn kind(&self) -> TemplateKind {
        match self {
            MailEvent::InviteCreated { .. } => TemplateKind::InviteCreated,
            MailEvent::InviteResponded { .. } => TemplateKind::InviteResponded,
            MailEvent::FollowupCreated { .. } => TemplateKind::FollowupCreated,
            MailEvent::FollowupResponded { .. } => TemplateKind::FollowupResponded,
        }
    }
}

/// A fully rendered mail, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Chooses subject lines from the static pools.
pub struct SubjectPicker {
    rng: Mutex<StdRng>,
}

impl SubjectPicker {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic picker for tests and reproducible tooling runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn pick(&self, kind: TemplateKind) -> &'static str {
        let pool = kind.subjects();
        let mut rng = self.rng.lock();
        pool.choose(&mut *rng).copied().unwrap_or(pool[0])
    }
}

impl Default for SubjectPicker {
    fn default() -> Self {
        Self::from_entropy()
    }
}

pub fn invite_link(base_url: &str, token: &str) -> String {
    format!("{}/i/{}", base_url, token)
}

pub fn followup_link(base_url: &str, token: &str, followup_id: Uuid) -> String {
    format!("{}/i/{}/followup/{}", base_url, token, followup_id)
}

pub fn dashboard_link(base_url: &str, invite_id: i64) -> String {
    format!("{}/invites/{}", base_url, invite_id)
}

/// Escape text for interpolation into HTML element bodies and attributes.
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `event` with a given subject line.
pub fn render(event: &MailEvent, base_url: &str, subject: &str) -> RenderedMail {
    let (title, subtitle, body_html, text) = match event {
        MailEvent::InviteCreated {
            token,
            recipient_name,
        } => {
            let link = invite_link(base_url, token);
            (
                "You've got a secret invite".to_string(),
                non_empty(recipient_name).map(|n| format!("For {}", n)),
                button_block(
                    "Someone has sent you an anonymous confession. Your secret invite is waiting.",
                    "Open your invite",
                    &link,
                ),
                format!(
                    "Someone sent you an anonymous confession. Open it here: {}",
                    link
                ),
            )
        }
        MailEvent::InviteResponded {
            invite_id,
            recipient_name,
            status,
        } => {
            let link = dashboard_link(base_url, *invite_id);
            let who = non_empty(recipient_name).unwrap_or("your match");
            let subtitle = match status {
                InviteStatus::Maybe => format!("{} is open to talking.", who),
                InviteStatus::Accepted => format!("{} has accepted your invite.", who),
                _ => format!("{} has responded to your invite.", who),
            };
            let color = match status {
                InviteStatus::Accepted => "#34d399",
                InviteStatus::Maybe => "#f2c94c",
                _ => "#ff5a6e",
            };
            (
                "Your invite has a response".to_string(),
                Some(subtitle),
                format!(
                    "<p>Your anonymous confession received a response.</p>\
                     <p style=\"margin-top:12px;\">Status: <strong style=\"color:{};\">{}</strong></p>\
                     <p style=\"margin-top:16px;\"><a href=\"{}\" style=\"color:#ff0055;\">See the details</a></p>",
                    color,
                    status,
                    html_escape(&link)
                ),
                format!(
                    "Your invite to {} has been {}. Details: {}",
                    who, status, link
                ),
            )
        }
        MailEvent::FollowupCreated {
            token,
            followup_id,
            recipient_name,
        } => {
            let link = followup_link(base_url, token, *followup_id);
            (
                "A follow-up is waiting".to_string(),
                non_empty(recipient_name).map(|n| format!("For {}", n)),
                button_block(
                    "Your anonymous sender has written a follow-up to their invite.",
                    "Read the follow-up",
                    &link,
                ),
                format!(
                    "Your anonymous sender wrote a follow-up. Read it here: {}",
                    link
                ),
            )
        }
        MailEvent::FollowupResponded {
            invite_id,
            recipient_name,
        } => {
            let link = dashboard_link(base_url, *invite_id);
            let who = non_empty(recipient_name).unwrap_or("your match");
            (
                "Your follow-up has a reply".to_string(),
                Some(format!("{} wrote back.", who)),
                format!(
                    "<p>Your follow-up received a reply.</p>\
                     <p style=\"margin-top:16px;\"><a href=\"{}\" style=\"color:#ff0055;\">Read it</a></p>",
                    html_escape(&link)
                ),
                format!("{} replied to your follow-up. Read it here: {}", who, link),
            )
        }
    };

    RenderedMail {
        subject: subject.to_string(),
        html: wrap_email(base_url, &title, subtitle.as_deref(), &body_html),
        text,
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

fn button_block(intro: &str, label: &str, link: &str) -> String {
    let link = html_escape(link);
    format!(
        "<p>{intro}</p>\
         <p style=\"margin:20px 0;\"><a href=\"{link}\" style=\"display:inline-block;padding:12px 22px;border-radius:999px;background:linear-gradient(135deg,#ff0055,#7000ff);color:#fff;text-decoration:none;font-weight:600;\">{label}</a></p>\
         <p style=\"color:#c7cad1;font-size:13px;\">If the button doesn't work, copy this link:</p>\
         <p style=\"word-break:break-all;font-size:13px;color:#f5c2d6;\">{link}</p>",
        intro = html_escape(intro),
        label = html_escape(label),
        link = link,
    )
}

// `title` and `subtitle` are escaped here; `body_html` must already be safe.
fn wrap_email(base_url: &str, title: &str, subtitle: Option<&str>, body_html: &str) -> String {
    let subtitle = subtitle
        .map(|s| {
            format!(
                "<div style=\"margin-top:6px;color:#c7cad1;font-size:14px;\">{}</div>",
                html_escape(s)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div style="background:#050505;padding:32px 16px;font-family:Inter,Segoe UI,Tahoma,Arial,sans-serif;color:#f7f3f6;">
  <div style="max-width:560px;margin:0 auto;background:rgba(255,255,255,0.04);border:1px solid rgba(255,255,255,0.1);border-radius:20px;overflow:hidden;">
    <div style="padding:24px 28px;background:linear-gradient(135deg,rgba(255,0,85,0.25),rgba(112,0,255,0.25));">
      <div style="font-size:12px;letter-spacing:0.35em;text-transform:uppercase;color:#cdd1d8;">Valentine Prom</div>
      <div style="margin-top:10px;font-size:22px;font-weight:700;">{title}</div>
      {subtitle}
    </div>
    <div style="padding:24px 28px;font-size:15px;line-height:1.6;color:#f0e9ee;">
      {body}
      <div style="margin-top:24px;color:#c7cad1;font-size:12px;">Sent with love from the Valentine Prom team.</div>
    </div>
    <div style="padding:16px 28px;background:rgba(0,0,0,0.4);text-align:center;">
      <a href="{home}" style="color:#ff0055;text-decoration:none;font-weight:600;">Visit your dashboard</a>
    </div>
  </div>
</div>"#,
        title = html_escape(title),
        subtitle = subtitle,
        body = body_html,
        home = html_escape(base_url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://prom.example";

    #[test]
    fn test_invite_created_links_to_token() {
        let event = MailEvent::InviteCreated {
            token: "abc123".to_string(),
            recipient_name: "Asha".to_string(),
        };
        let mail = render(&event, BASE, "subject");

        assert!(mail.text.contains("https://prom.example/i/abc123"));
        assert!(mail.html.contains("https://prom.example/i/abc123"));
        assert!(mail.html.contains("For Asha"));
        assert_eq!(mail.subject, "subject");
    }

    #[test]
    fn test_followup_link_is_scoped_to_followup() {
        let id = Uuid::new_v4();
        let event = MailEvent::FollowupCreated {
            token: "tok".to_string(),
            followup_id: id,
            recipient_name: String::new(),
        };
        let mail = render(&event, BASE, "s");

        let expected = format!("https://prom.example/i/tok/followup/{}", id);
        assert!(mail.text.contains(&expected));
        assert!(!mail.html.contains("For "));
    }

    #[test]
    fn test_interpolated_values_are_escaped() {
        let event = MailEvent::InviteResponded {
            invite_id: 7,
            recipient_name: "<script>alert('x')</script>".to_string(),
            status: InviteStatus::Maybe,
        };
        let mail = render(&event, BASE, "s");

        assert!(!mail.html.contains("<script>"));
        assert!(mail.html.contains("&lt;script&gt;"));
        assert!(mail.html.contains("is open to talking."));
    }

    #[test]
    fn test_seeded_picker_is_deterministic() {
        let a = SubjectPicker::seeded(7);
        let b = SubjectPicker::seeded(7);
        for kind in [
            TemplateKind::InviteCreated,
            TemplateKind::InviteResponded,
            TemplateKind::FollowupCreated,
            TemplateKind::FollowupResponded,
        ] {
            let picked = a.pick(kind);
            assert_eq!(picked, b.pick(kind));
            assert!(kind.subjects().contains(&picked));
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape(r#"a&b<c>"d"'e"#), "a&amp;b&lt;c&gt;&quot;d&quot;&#39;e");
    }
}
