use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{DispatchError, MailTransport, OutgoingMail};
use crate::application::config::mail::MailConfig;

const FROM_NAME: &str = "Valentine Prom";

/// SMTP delivery through lettre.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    pub fn from_config(config: &MailConfig) -> Result<Self, DispatchError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        // Port 465 uses implicit TLS (SMTPS), other ports use STARTTLS
        let builder = if config.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| DispatchError::Permanent(format!("Failed to create SMTP transport: {}", e)))?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        let from: Mailbox = format!("{} <{}>", FROM_NAME, config.from_address)
            .parse::<Mailbox>()
            .or_else(|_| config.from_address.parse::<Mailbox>())
            .map_err(|e| DispatchError::Permanent(format!("Invalid from address: {}", e)))?;

        Ok(Self { transport, from })
    }

    fn build_message(&self, mail: &OutgoingMail) -> Result<Message, DispatchError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| DispatchError::Permanent(format!("Invalid recipient address: {}", e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(mail.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(mail.html.clone()),
                    ),
            )
            .map_err(|e| DispatchError::Permanent(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DispatchError> {
        let message = self.build_message(mail)?;

        match self.transport.send(message).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_permanent() => Err(DispatchError::Permanent(e.to_string())),
            Err(e) => Err(DispatchError::Transient(e.to_string())),
        }
    }
}
