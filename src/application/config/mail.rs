use super::{optional, parsed_or, ConfigResult};

/// SMTP settings. Only present when host, port, user and password are all set.
#[derive(Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl MailConfig {
    pub fn from_env() -> ConfigResult<Option<Self>> {
        let (Some(host), Some(_), Some(user), Some(pass)) = (
            optional("SMTP_HOST"),
            optional("SMTP_PORT"),
            optional("SMTP_USER"),
            optional("SMTP_PASS"),
        ) else {
            return Ok(None);
        };

        Ok(Some(Self {
            smtp_host: host,
            smtp_port: parsed_or("SMTP_PORT", 587)?,
            from_address: optional("SMTP_FROM").unwrap_or_else(|| user.clone()),
            username: user,
            password: pass,
        }))
    }

    /// Port 465 speaks TLS from the first byte; everything else upgrades via STARTTLS.
    pub fn implicit_tls(&self) -> bool {
        self.smtp_port == 465
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("from_address", &self.from_address)
            .finish()
    }
}
