use std::env::var;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;

use crate::infrastructure::mail::{SmtpSettings, SmtpTls};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("An error occured while getting {0} env param")]
    Missing(&'static str),
    #[error("An error occured while parsing {key} env param: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Smtp,
    Memory,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub scheme: String,
    pub cors_origins: Vec<String>,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

impl HttpConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn server_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub transport: TransportKind,
    pub smtp: Option<SmtpSettings>,
    pub sender_name: String,
    pub sender_email: String,
    pub reply_to: Option<String>,
    pub business_name: String,
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub request_timeout: Duration,
    pub retry_on_authentication: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub mail: MailConfig,
    pub delivery: DeliveryConfig,
    pub log_level: Option<String>,
}

impl Config {
    pub fn try_parse() -> Result<Config, ConfigError> {
        let _ = dotenv();

        Self::from_lookup(|key| var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values
    /// are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let transport = match env.get("MAIL_TRANSPORT").as_deref() {
            None | Some("smtp") => TransportKind::Smtp,
            Some("memory") => TransportKind::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "MAIL_TRANSPORT",
                    value: other.to_string(),
                });
            }
        };

        let smtp = match transport {
            TransportKind::Smtp => Some(SmtpSettings {
                host: env.require("SMTP_HOST")?,
                port: env.parse_or("SMTP_PORT", 587)?,
                username: env.get("SMTP_USER"),
                password: env.get("SMTP_PASSWORD"),
                tls: match env.get("SMTP_TLS") {
                    None => SmtpTls::StartTls,
                    Some(value) => SmtpTls::from_str(&value).ok_or(ConfigError::Invalid {
                        key: "SMTP_TLS",
                        value,
                    })?,
                },
                timeout: Duration::from_secs(env.parse_or("SMTP_TIMEOUT_SECS", 10)?),
            }),
            TransportKind::Memory => None,
        };

        let sender_name = env.get("SENDER_NAME").unwrap_or_else(|| "Bookings".to_string());

        Ok(Config {
            http: HttpConfig {
                host: env.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: env.parse_or("PORT", 3000)?,
                scheme: env.get("SCHEME").unwrap_or_else(|| "http".to_string()),
                cors_origins: env
                    .get("CORS_ORIGINS")
                    .map(|origins| {
                        origins
                            .split(',')
                            .map(str::trim)
                            .filter(|origin| !origin.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
                rate_limit_max: env.parse_or("RATE_LIMIT_MAX", 100)?,
                rate_limit_window: Duration::from_secs(env.parse_or("RATE_LIMIT_WINDOW_SECS", 900)?),
            },
            mail: MailConfig {
                transport,
                smtp,
                business_name: env.get("BUSINESS_NAME").unwrap_or_else(|| sender_name.clone()),
                sender_name,
                sender_email: env.require("SENDER_EMAIL")?,
                reply_to: env.get("REPLY_TO"),
            },
            delivery: DeliveryConfig {
                max_attempts: env.parse_or("MAX_ATTEMPTS", 3)?.max(1),
                backoff_base: Duration::from_millis(env.parse_or("BACKOFF_BASE_MS", 1000)?),
                request_timeout: Duration::from_secs(env.parse_or("REQUEST_TIMEOUT_SECS", 30)?),
                retry_on_authentication: env.parse_or("RETRY_ON_AUTH_FAILURE", true)?,
            },
            log_level: env.get("LOG_LEVEL"),
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse_or<T: std::str::FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .parse::<T>()
                .map_err(|_| ConfigError::Invalid { key, value }),
        }
    }
}
