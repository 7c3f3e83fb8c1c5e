use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub session: SessionConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Access tokens are short-lived (minutes).
    pub access_ttl_secs: i64,
    /// Refresh tokens are long-lived (days).
    pub refresh_ttl_secs: i64,
    pub access_secret: String,
    pub refresh_secret: String,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Bounded retries for the optimistic activation-aggregate recomputation
    /// before surfacing `Conflict` to the caller.
    pub max_retries: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Session overrides
        if let Ok(v) = env::var("SESSION_ACCESS_TTL_SECS") {
            self.session.access_ttl_secs = v.parse().unwrap_or(self.session.access_ttl_secs);
        }
        if let Ok(v) = env::var("SESSION_REFRESH_TTL_SECS") {
            self.session.refresh_ttl_secs = v.parse().unwrap_or(self.session.refresh_ttl_secs);
        }
        if let Ok(v) = env::var("SESSION_ACCESS_SECRET") {
            self.session.access_secret = v;
        }
        if let Ok(v) = env::var("SESSION_REFRESH_SECRET") {
            self.session.refresh_secret = v;
        }
        if let Ok(v) = env::var("SESSION_BCRYPT_COST") {
            self.session.bcrypt_cost = v.parse().unwrap_or(self.session.bcrypt_cost);
        }

        // Review overrides
        if let Ok(v) = env::var("REVIEW_MAX_RETRIES") {
            self.review.max_retries = v.parse().unwrap_or(self.review.max_retries);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            session: SessionConfig {
                access_ttl_secs: 60 * 60, // 1 hour
                refresh_ttl_secs: 60 * 60 * 24 * 30, // 30 days
                access_secret: "dev-access-secret".to_string(),
                refresh_secret: "dev-refresh-secret".to_string(),
                bcrypt_cost: 4, // fast hashes for local iteration
            },
            review: ReviewConfig { max_retries: 8 },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            session: SessionConfig {
                access_ttl_secs: 60 * 15,
                refresh_ttl_secs: 60 * 60 * 24 * 7,
                access_secret: String::new(),
                refresh_secret: String::new(),
                bcrypt_cost: 12,
            },
            review: ReviewConfig { max_retries: 5 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            session: SessionConfig {
                access_ttl_secs: 60 * 15, // 15 minutes
                refresh_ttl_secs: 60 * 60 * 24 * 7, // 7 days
                access_secret: String::new(), // must come from env
                refresh_secret: String::new(),
                bcrypt_cost: 12,
            },
            review: ReviewConfig { max_retries: 5 },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
