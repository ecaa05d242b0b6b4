use super::{parsed_or, required, ConfigResult};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    /// Pool ceiling. SQLite in-memory databases are forced to one connection.
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 10)?,
        })
    }

    /// `sqlite::memory:` is private per connection, so it cannot be pooled.
    pub fn is_in_memory(&self) -> bool {
        self.database_url.starts_with("sqlite::memory:") || self.database_url.contains("mode=memory")
    }

    /// Backend name for logs, without credentials.
    pub fn backend(&self) -> &str {
        self.database_url.split(':').next().unwrap_or("unknown")
    }
}
