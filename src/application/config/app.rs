use super::optional;

/// Public-facing settings used when building links and contact addresses.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL for links in notifications, without trailing slash.
    pub base_url: String,
    /// Domain appended to roll numbers when a recipient has no email.
    pub roll_number_domain: String,
    /// Extra words for the profanity filter, on top of the built-in list.
    pub profanity_extra_words: Vec<String>,
}

impl AppConfig {
    pub fn from_env(port: u16) -> Self {
        let base_url = optional("APP_BASE_URL")
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Self {
            base_url,
            roll_number_domain: optional("ROLL_NUMBER_EMAIL_DOMAIN")
                .unwrap_or_else(|| "smail.iitm.ac.in".to_string()),
            profanity_extra_words: optional("PROFANITY_EXTRA_WORDS")
                .unwrap_or_default()
                .split(',')
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }
}

pub fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_trailing_slashes() {
        assert_eq!(normalize_base_url("https://prom.example///"), "https://prom.example");
        assert_eq!(normalize_base_url("https://prom.example"), "https://prom.example");
    }
}
