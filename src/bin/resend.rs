//! Re-send recent notifications after a mail outage.

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;

use valentine::bootstrapper::{build_notifier, init_tracing};
use valentine::config::{
    app::AppConfig, database::DatabaseConfig, invites::InviteConfig, logging::LoggingConfig,
    mail::MailConfig, server::ServerConfig,
};
use valentine::db;
use valentine::services::contact::ContactDirectory;
use valentine::services::notification::SubjectPicker;
use valentine::services::resend::{ResendOptions, Resender};

#[derive(Parser)]
#[command(name = "valentine-resend")]
#[command(about = "Re-send invite and follow-up emails from a recent window")]
struct Args {
    /// How far back to look, in minutes
    #[arg(long, default_value_t = 90)]
    minutes: i64,

    /// Log what would be sent without sending anything
    #[arg(long)]
    dry_run: bool,

    /// Skip follow-up emails to recipients
    #[arg(long)]
    no_followups: bool,

    /// Skip follow-up reply emails to senders
    #[arg(long)]
    no_followup_responses: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();
    init_tracing(&LoggingConfig::from_env());

    let database = DatabaseConfig::from_env().context("Invalid database configuration")?;
    let invites = InviteConfig::from_env().context("Invalid invite configuration")?;
    let mail = MailConfig::from_env().context("Invalid mail configuration")?;
    let server = ServerConfig::from_env().context("Invalid server configuration")?;
    let app = AppConfig::from_env(server.port);

    if mail.is_none() && !args.dry_run {
        anyhow::bail!("SMTP is not configured; set SMTP_HOST, SMTP_PORT, SMTP_USER and SMTP_PASS");
    }

    let conn = db::connect(&database)
        .await
        .context("Database unavailable")?;
    let notifier = build_notifier(mail.as_ref(), &app, &invites, SubjectPicker::from_entropy());
    let resender = Resender::new(
        conn,
        notifier,
        ContactDirectory::new(app.roll_number_domain.clone()),
    );

    let since = Utc::now() - Duration::minutes(args.minutes.max(0));
    tracing::info!(%since, dry_run = args.dry_run, "Resending notifications");

    let summary = resender
        .run(&ResendOptions {
            since,
            dry_run: args.dry_run,
            include_followups: !args.no_followups,
            include_followup_responses: !args.no_followup_responses,
        })
        .await?;

    println!("{}", summary);
    Ok(())
}
