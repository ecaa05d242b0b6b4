//! Test helpers shared by the integration suites.
//!
//! Every harness gets its own in-memory SQLite database, a recording mail
//! transport and a seeded subject picker.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use tower::util::ServiceExt;

use valentine::config::{
    app::AppConfig, auth::AuthConfig, database::DatabaseConfig, invites::InviteConfig,
    logging::LoggingConfig, server::ServerConfig, Config,
};
use valentine::endpoints::create_router;
use valentine::migrations::Migrator;
use valentine::models::prelude::*;
use valentine::models::{invite, student, user};
use valentine::services::invites::{AnswerDraft, InviteDraft};
use valentine::services::notification::{
    MailTransport, NotificationDispatcher, RecordingTransport, RetryPolicy, SubjectPicker,
};
use valentine::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-do-not-use-in-production";
pub const BASE_URL: &str = "https://prom.test";
pub const ROLL_DOMAIN: &str = "smail.test";

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Configuration with a fast retry policy and no SMTP.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            allowed_origins: Vec::new(),
        },
        database: DatabaseConfig {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            jwt_issuer: None,
        },
        invites: InviteConfig {
            notify_retry_base: Duration::from_millis(1),
            ..InviteConfig::default()
        },
        mail: None,
        app: AppConfig {
            base_url: BASE_URL.to_string(),
            roll_number_domain: ROLL_DOMAIN.to_string(),
            profanity_extra_words: vec!["grumpus".to_string()],
        },
        logging: LoggingConfig::default(),
    }
}

pub fn recording_notifier(config: &Config, transport: Arc<RecordingTransport>) -> NotificationDispatcher {
    NotificationDispatcher::new(
        Some(transport as Arc<dyn MailTransport>),
        SubjectPicker::seeded(7),
        config.app.base_url.clone(),
        RetryPolicy::from(&config.invites),
    )
}

/// Everything a test needs: the state, its database and the mail log.
pub struct TestHarness {
    pub db: DatabaseConnection,
    pub state: AppState,
    pub mail: Arc<RecordingTransport>,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let db = create_test_db().await;
        let mail = Arc::new(RecordingTransport::new());
        let notifier = recording_notifier(&config, mail.clone());
        let state = AppState::new(db.clone(), config, notifier);
        Self { db, state, mail }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Wait for background notification tasks.
    pub async fn settle(&self) {
        self.state.notifier.flush().await;
    }

    pub fn bearer_for(&self, sender: &user::Model) -> String {
        let token = self
            .state
            .session_keys
            .create_token(sender.id, Some(&sender.email))
            .expect("Failed to create session token");
        format!("Bearer {}", token)
    }

    pub async fn reload(&self, invite_id: i64) -> invite::Model {
        Invite::find_by_id(invite_id)
            .one(&self.db)
            .await
            .unwrap()
            .expect("invite exists")
    }
}

pub async fn create_test_user(db: &DatabaseConnection, email: &str, name: &str) -> user::Model {
    user::ActiveModel {
        email: Set(email.to_string()),
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test user")
}

pub async fn create_test_student(
    db: &DatabaseConnection,
    name: &str,
    email: Option<&str>,
    roll_number: Option<&str>,
) -> student::Model {
    student::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.map(String::from)),
        roll_number: Set(roll_number.map(String::from)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test student")
}

pub fn invite_draft() -> InviteDraft {
    InviteDraft {
        message: Some("Will you go to prom with me?".to_string()),
        why_you: Some("You always share your notes".to_string()),
        green_flag: Some("Kind to everyone".to_string()),
        passion: Some("Astronomy".to_string()),
        about_trait: Some("Patient".to_string()),
    }
}

pub fn answer_draft(openness: &str, contact_method: &str) -> AnswerDraft {
    AnswerDraft {
        feeling: Some("Surprised and happy".to_string()),
        standout: Some("The part about astronomy".to_string()),
        openness: Some(openness.to_string()),
        contact_method: Some(contact_method.to_string()),
        phone: None,
        insta: None,
    }
}

/// Move an invite's creation time into the past.
pub async fn backdate(db: &DatabaseConnection, invite: &invite::Model, by: chrono::Duration) {
    invite::ActiveModel {
        id: Set(invite.id),
        created_at: Set(invite.created_at - by),
        ..Default::default()
    }
    .update(db)
    .await
    .expect("Failed to backdate invite");
}

pub async fn send_request(
    app: Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body_bytes).to_string())
}

pub fn body_json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("invalid JSON body {:?}: {}", body, e))
}
