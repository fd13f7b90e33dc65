//! Application configuration management.

use serde::Deserialize;

/// Upper bound for day-valued settings (100 years).
pub const MAX_CONFIG_DAYS: i64 = 36_500;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Visitor session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Session claim retention configuration.
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Visitor session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the visitor session id.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Lifetime of the session cookie in days.
    #[serde(default = "default_cookie_max_age_days")]
    pub cookie_max_age_days: i64,
    /// `SameSite` attribute of the session cookie.
    #[serde(default)]
    pub cookie_same_site: CookieSameSite,
    /// Send the session cookie over HTTPS only. Always on with `SameSite=None`.
    #[serde(default)]
    pub cookie_secure: bool,
    /// Maximum number of entries in the known-session cache (0 disables it).
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// Time-to-live of known-session cache entries in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_max_age_days: default_cookie_max_age_days(),
            cookie_same_site: CookieSameSite::default(),
            cookie_secure: false,
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

/// `SameSite` policy for the session cookie.
///
/// `none` lets a landing page on another site send the cookie along with
/// its API calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieSameSite {
    Strict,
    #[default]
    Lax,
    None,
}

fn default_cookie_name() -> String {
    "qr_session".to_string()
}

fn default_cookie_max_age_days() -> i64 {
    365
}

fn default_cache_capacity() -> u64 {
    100_000
}

fn default_cache_ttl() -> u64 {
    3600 // 1 hour
}

/// Session claim retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Whether the background sweep runs at all.
    #[serde(default = "default_retention_enabled")]
    pub enabled: bool,
    /// Claims older than this many days are purged.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
    /// Interval between sweeps in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_retention_enabled(),
            max_age_days: default_max_age_days(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_retention_enabled() -> bool {
    true
}

fn default_max_age_days() -> i64 {
    90
}

fn default_sweep_interval() -> u64 {
    86400 // 24 hours
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("QRPULSE").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects day counts that cannot be turned into durations or timestamps.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::Message` naming the offending key.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !(1..=MAX_CONFIG_DAYS).contains(&self.session.cookie_max_age_days) {
            return Err(config::ConfigError::Message(format!(
                "session.cookie_max_age_days must be between 1 and {MAX_CONFIG_DAYS}, got {}",
                self.session.cookie_max_age_days
            )));
        }
        if !(0..=MAX_CONFIG_DAYS).contains(&self.retention.max_age_days) {
            return Err(config::ConfigError::Message(format!(
                "retention.max_age_days must be between 0 and {MAX_CONFIG_DAYS}, got {}",
                self.retention.max_age_days
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("QRPULSE__DATABASE__URL", Some("postgres://localhost/qrpulse")),
                ("QRPULSE__SESSION__COOKIE_NAME", Some("visitor")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.database.url, "postgres://localhost/qrpulse");
                assert_eq!(config.session.cookie_name, "visitor");
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.retention.max_age_days, 90);
                assert!(config.retention.enabled);
            },
        );
    }

    #[test]
    fn test_load_cross_site_cookie_policy() {
        temp_env::with_vars(
            [
                ("QRPULSE__DATABASE__URL", Some("postgres://localhost/qrpulse")),
                ("QRPULSE__SESSION__COOKIE_SAME_SITE", Some("none")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.session.cookie_same_site, CookieSameSite::None);
                assert!(!config.session.cookie_secure);
            },
        );
    }

    #[test]
    fn test_load_fails_without_database_url() {
        temp_env::with_vars(
            [
                ("QRPULSE__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_load_rejects_out_of_range_days() {
        temp_env::with_vars(
            [
                ("QRPULSE__DATABASE__URL", Some("postgres://localhost/qrpulse")),
                ("QRPULSE__RETENTION__MAX_AGE_DAYS", Some("200000000")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let err = AppConfig::load().expect_err("huge retention age should fail");
                assert!(err.to_string().contains("retention.max_age_days"));
            },
        );

        temp_env::with_vars(
            [
                ("QRPULSE__DATABASE__URL", Some("postgres://localhost/qrpulse")),
                ("QRPULSE__SESSION__COOKIE_MAX_AGE_DAYS", Some("9223372036854775807")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let err = AppConfig::load().expect_err("huge cookie age should fail");
                assert!(err.to_string().contains("session.cookie_max_age_days"));
            },
        );
    }

    #[test]
    fn test_section_defaults() {
        let session = SessionConfig::default();
        assert_eq!(session.cookie_name, "qr_session");
        assert_eq!(session.cookie_max_age_days, 365);
        assert_eq!(session.cookie_same_site, CookieSameSite::Lax);
        assert_eq!(session.cache_ttl_secs, 3600);

        let retention = RetentionConfig::default();
        assert_eq!(retention.max_age_days, 90);
        assert_eq!(retention.sweep_interval_secs, 86400);

        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
    }
}
