//! Application bootstrapper
//!
//! Handles all initialization and setup for the valentine server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::Router;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::config::{
    app::AppConfig, invites::InviteConfig, logging::LoggingConfig, mail::MailConfig,
    server::ServerConfig, Config,
};
use crate::application::database;
use crate::application::state::AppState;
use crate::endpoints;
use crate::services::notification::{
    MailTransport, NotificationDispatcher, RetryPolicy, SmtpTransport, SubjectPicker,
};

/// How long shutdown waits for queued notifications.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(15);

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    let config = Config::load().context("Invalid configuration")?;
    init_tracing(&config.logging);

    tracing::info!("Starting valentine v{}", env!("CARGO_PKG_VERSION"));

    let state = init_services(config).await?;
    let notifier = state.notifier.clone();
    let server = state.config.server.clone();

    let app = create_app(state);
    serve(app, &server).await?;

    tracing::info!("Waiting for queued notifications...");
    if tokio::time::timeout(FLUSH_TIMEOUT, notifier.flush()).await.is_err() {
        tracing::warn!(
            in_flight = notifier.in_flight(),
            "Gave up waiting for notifications"
        );
    }

    Ok(())
}

/// Initialize tracing/logging
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("valentine={},tower_http=info", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false))
            .init();
    }
}

/// Initialize all application services
async fn init_services(config: Config) -> anyhow::Result<AppState> {
    let db = database::connect(&config.database)
        .await
        .context("Database unavailable")?;
    tracing::info!("Database connection established");

    let notifier = build_notifier(
        config.mail.as_ref(),
        &config.app,
        &config.invites,
        SubjectPicker::from_entropy(),
    );

    Ok(AppState::new(db, config, notifier))
}

/// Build the dispatcher, with SMTP when mail is configured.
pub fn build_notifier(
    mail: Option<&MailConfig>,
    app: &AppConfig,
    invites: &InviteConfig,
    subjects: SubjectPicker,
) -> NotificationDispatcher {
    let transport = mail.and_then(|mail| {
        match SmtpTransport::from_config(mail) {
            Ok(smtp) => {
                tracing::info!(host = %mail.smtp_host, port = mail.smtp_port, "SMTP transport ready");
                Some(Arc::new(smtp) as Arc<dyn MailTransport>)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to configure SMTP transport");
                None
            }
        }
    });

    NotificationDispatcher::new(
        transport,
        subjects,
        app.base_url.clone(),
        RetryPolicy::from(invites),
    )
}

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);

    endpoints::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Start the HTTP server and run until a shutdown signal arrives
async fn serve(app: Router, server: &ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", server.host, server.port))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
