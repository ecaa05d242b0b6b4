pub mod contact;
pub mod cooldown;
pub mod feedback;
pub mod gateway;
pub mod invites;
pub mod notification;
pub mod profanity;
pub mod resend;
pub mod roster;
pub mod security;
pub mod students;

pub use contact::{ContactDirectory, ContactResolvable};
pub use feedback::FeedbackService;
pub use gateway::TokenGateway;
pub use invites::InviteService;
pub use notification::NotificationDispatcher;
pub use profanity::{ProfanityFilter, WordListFilter};
pub use resend::{ResendOptions, ResendSummary, Resender};
pub use roster::{ImportSummary, Roster, RosterImporter};
pub use security::SessionKeys;
pub use students::StudentService;
