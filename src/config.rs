use std::env;

use crate::error::AppError;

const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub event_buffer_size: usize,
    pub allow_admin_registration: bool,
    pub static_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 5000,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            jwt_secret: String::new(),
            token_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            event_buffer_size: 1024,
            allow_admin_registration: true,
            static_dir: "static".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| AppError::Internal("JWT_SECRET must be set".to_string()))?;

        let log_format = match env::var("LOG_FORMAT") {
            Ok(raw) => parse_log_format(&raw)?,
            Err(_) => defaults.log_format,
        };

        let config = Self {
            http_port: parse_or_default("PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
            jwt_secret,
            token_ttl_hours: parse_or_default("TOKEN_TTL_HOURS", defaults.token_ttl_hours)?,
            bcrypt_cost: parse_or_default("BCRYPT_COST", defaults.bcrypt_cost)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            allow_admin_registration: parse_or_default(
                "ALLOW_ADMIN_REGISTRATION",
                defaults.allow_admin_registration,
            )?,
            static_dir: env::var("STATIC_DIR").unwrap_or(defaults.static_dir),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(AppError::Internal(format!(
                "invalid TOKEN_TTL_HOURS: {}, expected 1..={MAX_TOKEN_TTL_HOURS}",
                self.token_ttl_hours
            )));
        }

        if !BCRYPT_COST_RANGE.contains(&self.bcrypt_cost) {
            return Err(AppError::Internal(format!(
                "invalid BCRYPT_COST: {}, expected {}..={}",
                self.bcrypt_cost,
                BCRYPT_COST_RANGE.start(),
                BCRYPT_COST_RANGE.end()
            )));
        }

        Ok(())
    }
}

fn parse_log_format(raw: &str) -> Result<LogFormat, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "compact" => Ok(LogFormat::Compact),
        "json" => Ok(LogFormat::Json),
        other => Err(AppError::Internal(format!(
            "invalid LOG_FORMAT: {other}, expected compact/json"
        ))),
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
