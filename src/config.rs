//! Process configuration, read once from the environment at startup.
//!
//! Every backend is optional. Without a database the records live in
//! process memory, without Redis the cache is in-process, and without an
//! SMTP relay registrations complete without email verification.
//!
//! | Variable | Default |
//! |---|---|
//! | `DATABASE_URL`, or `DB_USER` + `DB_PASSWORD` + `DB_NAME` (+ `DB_HOST`, `DB_PORT`) | in-memory store |
//! | `REDIS_URL`, or `REDIS_HOST` (+ `REDIS_PORT`, `REDIS_PASSWORD`, `REDIS_DB`) | in-memory cache |
//! | `JWT_KEY` | required |
//! | `LISTEN` | `0.0.0.0:8080` |
//! | `BASE_URL` | `http://url-shortener.com:8080` |
//! | `RUST_LOG` / `LOG_FORMAT` | `info` / `text` |
//! | `CACHE_TTL_SECONDS` | 3600 |
//! | `CACHE_HEALTH_INTERVAL_SECONDS` | 5 |
//! | `RESOLUTION_QUEUE_CAPACITY` | 10000 |
//! | `EMAIL_SERVER_ADDR` (`host:port`), `EMAIL_USERNAME`, `EMAIL_PASSWORD`, `EMAIL_FROM` | verification bypass |
//! | `EMAIL_TIMEOUT_SECONDS` | 30 |
//! | `BEHIND_PROXY` | false |
//! | `DB_MAX_CONNECTIONS` / `DB_CONNECT_TIMEOUT` | 10 / 30 |

use anyhow::{Context, Result, ensure};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const QUEUE_CAPACITY_RANGE: std::ops::RangeInclusive<usize> = 100..=1_000_000;

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub send_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// `None` selects the in-memory cache.
    pub redis_url: Option<String>,
    pub listen_addr: String,
    /// Public prefix of every short URL. Its host is the service's own domain.
    pub base_url: String,
    pub log_level: String,
    pub log_format: String,
    pub jwt_key: String,
    /// Rate limiting keys on `X-Forwarded-For` / `X-Real-IP` instead of the peer address.
    pub behind_proxy: bool,
    pub cache_ttl_seconds: u64,
    pub cache_health_interval_seconds: u64,
    pub resolution_queue_capacity: usize,
    /// `None` enables verification bypass.
    pub email: Option<EmailConfig>,
    pub db_max_connections: u32,
    /// Seconds to wait for a pooled connection.
    pub db_connect_timeout: u64,
}

/// Non-empty value of `name`.
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|| default.to_string())
}

fn parsed_or<T: FromStr>(name: &str, default: T) -> T {
    var(name).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn flag(name: &str) -> bool {
    var(name).is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl Config {
    /// Reads every setting from the environment without validating it.
    ///
    /// # Errors
    ///
    /// Fails when `JWT_KEY` is absent, when database components are only
    /// partially given, or when the SMTP address cannot be split.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: Self::load_database_url().context("Invalid database settings")?,
            redis_url: Self::load_redis_url(),
            listen_addr: var_or("LISTEN", "0.0.0.0:8080"),
            base_url: var_or("BASE_URL", "http://url-shortener.com:8080"),
            log_level: var_or("RUST_LOG", "info"),
            log_format: var_or("LOG_FORMAT", "text"),
            jwt_key: var("JWT_KEY").context("JWT_KEY is required")?,
            behind_proxy: flag("BEHIND_PROXY"),
            cache_ttl_seconds: parsed_or("CACHE_TTL_SECONDS", 3600),
            cache_health_interval_seconds: parsed_or("CACHE_HEALTH_INTERVAL_SECONDS", 5),
            resolution_queue_capacity: parsed_or("RESOLUTION_QUEUE_CAPACITY", 10_000),
            email: Self::load_email().context("Invalid SMTP settings")?,
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", 10),
            db_connect_timeout: parsed_or("DB_CONNECT_TIMEOUT", 30),
        })
    }

    /// `DATABASE_URL` wins; otherwise the URL is assembled from `DB_*`
    /// components, which are only consulted when `DB_USER` is present.
    fn load_database_url() -> Result<Option<String>> {
        if let Some(url) = var("DATABASE_URL") {
            return Ok(Some(url));
        }
        let Some(user) = var("DB_USER") else {
            return Ok(None);
        };

        let password = var("DB_PASSWORD").context("DB_USER is set but DB_PASSWORD is not")?;
        let name = var("DB_NAME").context("DB_USER is set but DB_NAME is not")?;
        let host = var_or("DB_HOST", "localhost");
        let port = var_or("DB_PORT", "5432");

        Ok(Some(format!("postgres://{user}:{password}@{host}:{port}/{name}")))
    }

    /// `REDIS_URL` wins; otherwise `REDIS_HOST` and friends. An empty
    /// `REDIS_PASSWORD` connects without authentication.
    fn load_redis_url() -> Option<String> {
        if let Some(url) = var("REDIS_URL") {
            return Some(url);
        }

        let host = var("REDIS_HOST")?;
        let port = var_or("REDIS_PORT", "6379");
        let db = var_or("REDIS_DB", "0");
        let auth = var("REDIS_PASSWORD")
            .map(|password| format!(":{password}@"))
            .unwrap_or_default();

        Some(format!("redis://{auth}{host}:{port}/{db}"))
    }

    fn load_email() -> Result<Option<EmailConfig>> {
        let Some(addr) = var("EMAIL_SERVER_ADDR") else {
            return Ok(None);
        };

        let (host, port) = addr
            .rsplit_once(':')
            .with_context(|| format!("EMAIL_SERVER_ADDR '{addr}' is not host:port"))?;
        let port = port
            .parse::<u16>()
            .with_context(|| format!("EMAIL_SERVER_ADDR port '{port}' is not a number"))?;

        let username = var("EMAIL_USERNAME");
        let from = var("EMAIL_FROM")
            .or_else(|| username.clone())
            .context("EMAIL_SERVER_ADDR needs EMAIL_FROM or EMAIL_USERNAME")?;

        Ok(Some(EmailConfig {
            host: host.to_string(),
            port,
            username,
            password: var("EMAIL_PASSWORD"),
            from,
            send_timeout_seconds: parsed_or("EMAIL_TIMEOUT_SECONDS", 30),
        }))
    }

    /// Rejects settings the server could not start with.
    ///
    /// # Errors
    ///
    /// Names the first offending variable.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.jwt_key.is_empty(), "JWT_KEY must not be empty");
        ensure!(
            matches!(self.log_format.as_str(), "text" | "json"),
            "LOG_FORMAT is '{}', expected 'text' or 'json'",
            self.log_format
        );
        ensure!(
            self.listen_addr.contains(':'),
            "LISTEN is '{}', expected host:port",
            self.listen_addr
        );
        self.own_domain()?;

        if let Some(url) = &self.database_url {
            ensure!(
                url.starts_with("postgres://") || url.starts_with("postgresql://"),
                "DATABASE_URL '{}' is not a PostgreSQL URL",
                mask_connection_string(url)
            );
        }
        if let Some(url) = &self.redis_url {
            ensure!(
                url.starts_with("redis://") || url.starts_with("rediss://"),
                "REDIS_URL '{}' is not a Redis URL",
                mask_connection_string(url)
            );
        }

        ensure!(
            QUEUE_CAPACITY_RANGE.contains(&self.resolution_queue_capacity),
            "RESOLUTION_QUEUE_CAPACITY is {}, expected {}..={}",
            self.resolution_queue_capacity,
            QUEUE_CAPACITY_RANGE.start(),
            QUEUE_CAPACITY_RANGE.end()
        );

        for (name, value) in [
            ("CACHE_TTL_SECONDS", self.cache_ttl_seconds),
            ("CACHE_HEALTH_INTERVAL_SECONDS", self.cache_health_interval_seconds),
            ("DB_CONNECT_TIMEOUT", self.db_connect_timeout),
            ("DB_MAX_CONNECTIONS", u64::from(self.db_max_connections)),
        ] {
            ensure!(value > 0, "{name} must be positive");
        }

        if let Some(email) = &self.email {
            ensure!(!email.host.is_empty(), "EMAIL_SERVER_ADDR has an empty host");
            ensure!(
                email.send_timeout_seconds > 0,
                "EMAIL_TIMEOUT_SECONDS must be positive"
            );
        }

        Ok(())
    }

    /// Host of `BASE_URL`. The shortener refuses URLs pointing here.
    pub fn own_domain(&self) -> Result<String> {
        let base = Url::parse(&self.base_url)
            .with_context(|| format!("BASE_URL '{}' is not an absolute URL", self.base_url))?;

        base.host_str()
            .map(str::to_string)
            .with_context(|| format!("BASE_URL '{}' has no host", self.base_url))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn cache_health_interval(&self) -> Duration {
        Duration::from_secs(self.cache_health_interval_seconds)
    }

    /// Logs the effective settings with credentials masked.
    pub fn print_summary(&self) {
        let store = self
            .database_url
            .as_deref()
            .map_or_else(|| "in-memory".to_string(), mask_connection_string);
        let cache = self
            .redis_url
            .as_deref()
            .map_or_else(|| "in-memory".to_string(), mask_connection_string);
        let mail = self.email.as_ref().map_or_else(
            || "disabled (verification bypassed)".to_string(),
            |email| format!("{}:{}", email.host, email.port),
        );

        tracing::info!(
            listen = %self.listen_addr,
            base_url = %self.base_url,
            %store,
            %cache,
            %mail,
            cache_ttl_seconds = self.cache_ttl_seconds,
            resolution_queue_capacity = self.resolution_queue_capacity,
            behind_proxy = self.behind_proxy,
            log_level = %self.log_level,
            log_format = %self.log_format,
            "Configuration loaded"
        );
    }
}

/// Replaces the password of a connection URL with `***`.
///
/// Strings that do not parse, or carry no password, come back unchanged.
pub fn mask_connection_string(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("***")).is_ok() {
                url.to_string()
            } else {
                raw.to_string()
            }
        }
        _ => raw.to_string(),
    }
}

/// Reads and validates the configuration. `.env` must already be loaded.
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: &[&str] = &[
        "DATABASE_URL",
        "DB_HOST",
        "DB_PORT",
        "DB_USER",
        "DB_PASSWORD",
        "DB_NAME",
        "REDIS_URL",
        "REDIS_HOST",
        "REDIS_PORT",
        "REDIS_PASSWORD",
        "REDIS_DB",
        "EMAIL_SERVER_ADDR",
        "EMAIL_USERNAME",
        "EMAIL_PASSWORD",
        "EMAIL_FROM",
    ];

    /// Runs `f` with exactly `vars` set among [`ALL_VARS`].
    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        // SAFETY: every caller is #[serial], nothing else touches the environment concurrently.
        unsafe {
            for name in ALL_VARS {
                env::remove_var(name);
            }
            for (name, value) in vars {
                env::set_var(name, value);
            }
        }
        let result = f();
        unsafe {
            for name in ALL_VARS {
                env::remove_var(name);
            }
        }
        result
    }

    fn valid_config() -> Config {
        Config {
            database_url: None,
            redis_url: None,
            listen_addr: "0.0.0.0:8080".to_string(),
            base_url: "http://sho.rt:8080".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            jwt_key: "test-key".to_string(),
            behind_proxy: false,
            cache_ttl_seconds: 3600,
            cache_health_interval_seconds: 5,
            resolution_queue_capacity: 10_000,
            email: None,
            db_max_connections: 10,
            db_connect_timeout: 30,
        }
    }

    #[test]
    fn test_masks_passwords_only() {
        assert_eq!(
            mask_connection_string("postgres://app:hunter2@db:5432/links"),
            "postgres://app:***@db:5432/links"
        );
        assert_eq!(
            mask_connection_string("redis://:hunter2@cache:6379/0"),
            "redis://:***@cache:6379/0"
        );
        assert_eq!(
            mask_connection_string("postgres://db:5432/links"),
            "postgres://db:5432/links"
        );
        assert_eq!(mask_connection_string("not a url"), "not a url");
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_each_bad_setting() {
        let cases: [(&str, fn(&mut Config)); 10] = [
            ("queue too small", |c| c.resolution_queue_capacity = 50),
            ("queue too large", |c| c.resolution_queue_capacity = 2_000_000),
            ("log format", |c| c.log_format = "xml".to_string()),
            ("listen", |c| c.listen_addr = "8080".to_string()),
            ("database scheme", |c| {
                c.database_url = Some("mysql://localhost/test".to_string())
            }),
            ("redis scheme", |c| c.redis_url = Some("http://localhost".to_string())),
            ("empty jwt key", |c| c.jwt_key.clear()),
            ("base url", |c| c.base_url = "not a url".to_string()),
            ("zero ttl", |c| c.cache_ttl_seconds = 0),
            ("zero pool", |c| c.db_max_connections = 0),
        ];

        for (name, break_it) in cases {
            let mut config = valid_config();
            break_it(&mut config);
            assert!(config.validate().is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn test_own_domain_is_base_url_host() {
        assert_eq!(valid_config().own_domain().unwrap(), "sho.rt");
    }

    #[test]
    #[serial]
    fn test_database_url_sources() {
        with_env(&[], || {
            assert_eq!(Config::load_database_url().unwrap(), None);
        });

        with_env(
            &[
                ("DB_HOST", "pg"),
                ("DB_PORT", "5433"),
                ("DB_USER", "app"),
                ("DB_PASSWORD", "pw"),
                ("DB_NAME", "links"),
            ],
            || {
                assert_eq!(
                    Config::load_database_url().unwrap().as_deref(),
                    Some("postgres://app:pw@pg:5433/links")
                );
            },
        );

        with_env(&[("DB_USER", "app")], || {
            assert!(Config::load_database_url().is_err());
        });

        with_env(
            &[
                ("DATABASE_URL", "postgres://direct@pg/links"),
                ("DB_USER", "ignored"),
            ],
            || {
                assert_eq!(
                    Config::load_database_url().unwrap().as_deref(),
                    Some("postgres://direct@pg/links")
                );
            },
        );
    }

    #[test]
    #[serial]
    fn test_redis_url_sources() {
        with_env(&[], || assert_eq!(Config::load_redis_url(), None));

        with_env(&[("REDIS_HOST", "cache"), ("REDIS_DB", "2")], || {
            assert_eq!(
                Config::load_redis_url().as_deref(),
                Some("redis://cache:6379/2")
            );
        });

        with_env(
            &[("REDIS_HOST", "cache"), ("REDIS_PASSWORD", "pw")],
            || {
                assert_eq!(
                    Config::load_redis_url().as_deref(),
                    Some("redis://:pw@cache:6379/0")
                );
            },
        );

        with_env(&[("REDIS_HOST", "cache"), ("REDIS_PASSWORD", "")], || {
            assert_eq!(
                Config::load_redis_url().as_deref(),
                Some("redis://cache:6379/0")
            );
        });
    }

    #[test]
    #[serial]
    fn test_email_settings() {
        with_env(&[], || assert!(Config::load_email().unwrap().is_none()));

        with_env(
            &[
                ("EMAIL_SERVER_ADDR", "smtp.example.com:2525"),
                ("EMAIL_USERNAME", "bot@example.com"),
            ],
            || {
                let email = Config::load_email().unwrap().unwrap();
                assert_eq!(email.host, "smtp.example.com");
                assert_eq!(email.port, 2525);
                assert_eq!(email.from, "bot@example.com");
                assert_eq!(email.password, None);
            },
        );

        with_env(&[("EMAIL_SERVER_ADDR", "smtp.example.com")], || {
            assert!(Config::load_email().is_err());
        });

        with_env(&[("EMAIL_SERVER_ADDR", "smtp.example.com:25")], || {
            assert!(Config::load_email().is_err());
        });
    }
}
