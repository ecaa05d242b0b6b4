use super::optional;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level for this crate's targets when `RUST_LOG` is unset.
    pub level: String,
    /// `LOG_FORMAT=json` switches to one JSON object per line.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            level: optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            json: optional("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}
