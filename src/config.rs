use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Payment gateway settings.
///
/// Booking creation holds the cast's profile row lock across the card
/// authorization, so `timeout` and `max_retries` also bound how long a
/// competing booking for the same cast waits. With the defaults (10s, 2
/// retries) that is about 30.6s; see `payments::worst_case_call_time`.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub secret_key: String,
    pub webhook_secret: Option<String>,
    pub currency: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

/// Outbound email settings. Without an API key mail is only logged.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub resend_api_key: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub base_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub admin_password: String,
    pub payments: PaymentConfig,
    pub email: EmailConfig,
}

impl AppConfig {
    /// Load configuration from environment variables (after `dotenv`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            port: parse_or("PORT", get("PORT"), 8080)?,
            base_url: get("BASE_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
            jwt_secret: require("JWT_SECRET")?,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", get("JWT_TTL_HOURS"), 24)?,
            admin_password: require("ADMIN_PASSWORD")?,
            payments: PaymentConfig {
                secret_key: require("STRIPE_SECRET_KEY")?,
                webhook_secret: get("STRIPE_WEBHOOK_SECRET"),
                currency: get("CURRENCY")
                    .map(|c| c.to_lowercase())
                    .unwrap_or_else(|| "usd".to_string()),
                timeout: parse_duration_secs(
                    "PAYMENT_TIMEOUT_SECS",
                    get("PAYMENT_TIMEOUT_SECS"),
                    10,
                )?,
                max_retries: parse_or("PAYMENT_MAX_RETRIES", get("PAYMENT_MAX_RETRIES"), 2)?,
            },
            email: EmailConfig {
                resend_api_key: get("RESEND_API_KEY"),
                from: get("EMAIL_FROM").unwrap_or_else(|| "uso <noreply@uso.app>".to_string()),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_duration_secs(
    key: &'static str,
    raw: Option<String>,
    default_secs: u64,
) -> Result<Duration, ConfigError> {
    let secs = parse_or(key, raw, default_secs)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
