use std::{net::IpAddr, time::Duration};

use anyhow::Context;
use config::Environment;
use serde::Deserialize;

/// Loads the configuration from the process environment. Read once at
/// startup; every optional knob has a default.
pub fn load() -> anyhow::Result<Config> {
    from_source(Environment::default().try_parsing(true))
}

fn from_source(source: Environment) -> anyhow::Result<Config> {
    let raw: RawConfig = config::Config::builder()
        .set_default("http_host", "0.0.0.0")?
        .set_default("http_port", 8000)?
        .set_default("rate_limit_max", 6)?
        .set_default("rate_limit_window_min", 60)?
        .set_default("smtp_port", 465)?
        .set_default("smtp_secure", true)?
        .set_default("app_env", "development")?
        .set_default("health_cache_ttl_secs", 10)?
        .add_source(source)
        .build()?
        .try_deserialize()
        .context("Failed to load configuration from the environment")?;

    Ok(raw.into())
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub smtp: SmtpConfig,
    pub contact: ContactConfig,
    pub rate_limit: RateLimitConfig,
    pub health: HealthConfig,
    /// True outside production; enables diagnostic detail in error
    /// responses.
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub secure: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContactConfig {
    /// Destination inbox; falls back to the SMTP account when unset.
    pub to_email: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct HealthConfig {
    pub cache_ttl: Duration,
}

/// The SMTP connection settings, present only when host, user and password
/// are all configured.
#[derive(Debug, Clone, Copy)]
pub struct SmtpCredentials<'a> {
    pub host: &'a str,
    pub port: u16,
    pub secure: bool,
    pub user: &'a str,
    pub pass: &'a str,
}

impl SmtpConfig {
    pub fn credentials(&self) -> Option<SmtpCredentials<'_>> {
        Some(SmtpCredentials {
            host: self.host.as_deref()?,
            port: self.port,
            secure: self.secure,
            user: self.user.as_deref()?,
            pass: self.pass.as_deref()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    http_host: IpAddr,
    http_port: u16,
    rate_limit_max: usize,
    rate_limit_window_min: u64,
    smtp_host: Option<String>,
    smtp_port: u16,
    smtp_secure: bool,
    smtp_user: Option<String>,
    smtp_pass: Option<String>,
    to_email: Option<String>,
    app_env: String,
    health_cache_ttl_secs: u64,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        Self {
            http: HttpConfig {
                host: raw.http_host,
                port: raw.http_port,
            },
            smtp: SmtpConfig {
                host: raw.smtp_host,
                port: raw.smtp_port,
                secure: raw.smtp_secure,
                user: raw.smtp_user,
                pass: raw.smtp_pass,
            },
            contact: ContactConfig {
                to_email: raw.to_email,
            },
            rate_limit: RateLimitConfig {
                max_requests: raw.rate_limit_max,
                window: Duration::from_secs(raw.rate_limit_window_min * 60),
            },
            health: HealthConfig {
                cache_ttl: Duration::from_secs(raw.health_cache_ttl_secs),
            },
            debug: raw.app_env != "production",
        }
    }
}
