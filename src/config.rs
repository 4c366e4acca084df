use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_review_per_min: u32,

    pub api_prefix: String,

    pub holiday_cache_ttl_secs: u64,
    pub log_dir: String,
    pub log_level: tracing::Level,
    pub run_migrations: bool,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_value(key, env::var(key).ok(), default)
}

fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,
            rate_review_per_min: parsed_or("RATE_REVIEW_PER_MIN", 120)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            holiday_cache_ttl_secs: parsed_or("HOLIDAY_CACHE_TTL_SECS", 3600)?, // default 1 hour
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parsed_or("LOG_LEVEL", tracing::Level::DEBUG)?,
            run_migrations: parsed_or("RUN_MIGRATIONS", true)?,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: "mysql://localhost/leave".to_string(),
            jwt_secret: jwt_secret.to_string(),
            server_addr: "127.0.0.1:8080".to_string(),
            rate_protected_per_min: 1000,
            rate_review_per_min: 120,
            api_prefix: "/api".to_string(),
            holiday_cache_ttl_secs: 60,
            log_dir: "logs".to_string(),
            log_level: tracing::Level::INFO,
            run_migrations: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_fall_back_to_defaults() {
        assert_eq!(parse_value("RATE_REVIEW_PER_MIN", None, 120u32).unwrap(), 120);
        assert_eq!(parsed_or("LEAVE_LEDGER_TEST_UNSET_KEY", 42u32).unwrap(), 42);
    }

    #[test]
    fn values_are_trimmed_and_parsed() {
        assert_eq!(
            parse_value("LOG_LEVEL", Some(" warn ".to_string()), tracing::Level::DEBUG).unwrap(),
            tracing::Level::WARN
        );
        assert!(!parse_value("RUN_MIGRATIONS", Some("false".to_string()), true).unwrap());
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = parse_value::<u32>("RATE_PROTECTED_PER_MIN", Some("lots".to_string()), 1)
            .unwrap_err();
        assert!(err.to_string().contains("RATE_PROTECTED_PER_MIN"));
        assert!(err.to_string().contains("lots"));
    }
}
