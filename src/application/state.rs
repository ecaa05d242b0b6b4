use std::sync::Arc;

use crate::application::config::Config;
use crate::services::contact::ContactDirectory;
use crate::services::feedback::FeedbackService;
use crate::services::invites::InviteService;
use crate::services::notification::NotificationDispatcher;
use crate::services::profanity::{ProfanityFilter, WordListFilter};
use crate::services::security::SessionKeys;
use crate::services::students::StudentService;

pub use crate::application::database::DbConn;

/// Shared application state. Built once at startup; every handler gets a
/// cheap clone.
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub config: Arc<Config>,
    pub session_keys: SessionKeys,
    pub invites: InviteService,
    pub students: StudentService,
    pub feedback: FeedbackService,
    pub notifier: NotificationDispatcher,
}

impl AppState {
    pub fn new(db: DbConn, config: Config, notifier: NotificationDispatcher) -> Self {
        let contacts = ContactDirectory::new(config.app.roll_number_domain.clone());
        let profanity: Arc<dyn ProfanityFilter> =
            Arc::new(WordListFilter::new(&config.app.profanity_extra_words));

        let invites = InviteService::new(
            db.clone(),
            &config.invites,
            contacts,
            profanity,
            notifier.clone(),
        );

        Self {
            session_keys: SessionKeys::new(&config.auth),
            students: StudentService::new(db.clone()),
            feedback: FeedbackService::new(db.clone()),
            invites,
            notifier,
            config: Arc::new(config),
            db,
        }
    }

    /// Replace the invite service, e.g. to inject a fixed token generator.
    pub fn with_invites(mut self, invites: InviteService) -> Self {
        self.invites = invites;
        self
    }
}
