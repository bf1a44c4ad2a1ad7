//! Application configuration.
//!
//! Layered, later sources win:
//! 1. `config/default.toml`
//! 2. `config/{RUN_MODE}.toml` (`RUN_MODE` defaults to `development`)
//! 3. `EASYERP__SECTION__KEY` environment variables, e.g.
//!    `EASYERP__POSTING__REQUIRE_BALANCED=true`
//!
//! A `.env` file is read first if present. Every field has a default, so an
//! empty environment yields a working in-memory setup.

use serde::Deserialize;

use easyerp_accounting::PostingPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub posting: PostingConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Postgres settings. Without a `url` the ledger lives in memory.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostingConfig {
    /// Reject unbalanced entries and two-sided lines at post time.
    #[serde(default)]
    pub require_balanced: bool,
}

impl PostingConfig {
    pub fn policy(&self) -> PostingPolicy {
        PostingPolicy::from_require_balanced(self.require_balanced)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Post the sample journal entries, or leave them as drafts.
    #[serde(default = "default_true")]
    pub post_sample_entries: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            post_sample_entries: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// JSON lines when true, human-readable output otherwise.
    #[serde(default = "default_true")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { json: true }
    }
}

impl AppConfig {
    /// Load from `.env`, config files and the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("EASYERP").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Parse a TOML document, e.g. an inline config in tests.
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert!(cfg.database.url.is_none());
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.posting.policy(), PostingPolicy::Permissive);
        assert!(cfg.seed.post_sample_entries);
        assert!(cfg.logging.json);
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://ledger@localhost/easyerp"

            [posting]
            require_balanced = true

            [seed]
            post_sample_entries = false

            [logging]
            json = false
            "#,
        )
        .unwrap();

        assert_eq!(
            cfg.database.url.as_deref(),
            Some("postgres://ledger@localhost/easyerp")
        );
        assert_eq!(cfg.posting.policy(), PostingPolicy::Strict);
        assert!(!cfg.seed.post_sample_entries);
        assert!(!cfg.logging.json);
    }
}
