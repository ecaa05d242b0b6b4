pub mod auth;

pub use auth::require_sender;
pub use auth::AuthenticatedSender;
