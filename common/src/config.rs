use std::env::var;

use anyhow::Context;
use chrono::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaypalMode {
    Sandbox,
    Live,
}

impl PaypalMode {
    pub fn base_url(&self) -> &'static str {
        match self {
            PaypalMode::Sandbox => "https://api-m.sandbox.paypal.com",
            PaypalMode::Live => "https://api-m.paypal.com",
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in: Duration,
}

#[derive(Debug, Clone)]
pub struct PcmConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct PaypalConfig {
    pub client_id: String,
    pub client_secret: String,
    pub mode: PaypalMode,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mongo_uri: String,
    pub database: String,
    pub jwt: JwtConfig,
    pub pcm: PcmConfig,
    pub paypal: PaypalConfig,
    pub frontend_url: Option<String>,
    pub port: u16,
    pub upload_dir: String,
    pub public_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match var("PORT") {
            Ok(port) => port.parse().context("PORT must be a number")?,
            Err(_) => 5000,
        };

        let expires_in = match var("JWT_EXPIRES_IN") {
            Ok(value) => parse_duration(&value)?,
            Err(_) => Duration::days(7),
        };

        let mode = match var("PAYPAL_MODE").as_deref() {
            Ok("live") => PaypalMode::Live,
            _ => PaypalMode::Sandbox,
        };

        Ok(Self {
            mongo_uri: var("MONGOURI").context("MONGOURI must be set")?,
            database: var("MONGO_DATABASE").unwrap_or_else(|_| "directmail".to_string()),
            jwt: JwtConfig {
                secret: var("JWT_SECRET").context("JWT_SECRET must be set")?,
                expires_in,
            },
            pcm: PcmConfig {
                base_url: var("PCM_API_URL")
                    .unwrap_or_else(|_| "https://v3.pcmintegrations.com".to_string()),
                username: var("PCM_USERNAME").unwrap_or_default(),
                password: var("PCM_PASSWORD").unwrap_or_default(),
            },
            paypal: PaypalConfig {
                client_id: var("PAYPAL_CLIENT_ID").unwrap_or_default(),
                client_secret: var("PAYPAL_CLIENT_SECRET").unwrap_or_default(),
                mode,
            },
            frontend_url: var("FRONTEND_URL").ok(),
            port,
            upload_dir: var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            public_url: var("PUBLIC_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
        })
    }

    pub fn test() -> Self {
        Self {
            mongo_uri: String::new(),
            database: "directmail_test".to_string(),
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                expires_in: Duration::days(7),
            },
            pcm: PcmConfig {
                base_url: "http://pcm.invalid".to_string(),
                username: String::new(),
                password: String::new(),
            },
            paypal: PaypalConfig {
                client_id: String::new(),
                client_secret: String::new(),
                mode: PaypalMode::Sandbox,
            },
            frontend_url: None,
            port: 5000,
            upload_dir: std::env::temp_dir()
                .join("directmail-uploads")
                .to_string_lossy()
                .into_owned(),
            public_url: "http://localhost:5000".to_string(),
        }
    }
}

/// Parses `7d`, `12h`, `30m`, `45s` or a bare number of seconds.
pub fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    let value = value.trim();
    let (number, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], Some(c)),
        _ => (value, None),
    };

    let number: i64 = number
        .parse()
        .with_context(|| format!("Invalid duration: {}", value))?;

    match unit {
        None | Some('s') => Ok(Duration::seconds(number)),
        Some('m') => Ok(Duration::minutes(number)),
        Some('h') => Ok(Duration::hours(number)),
        Some('d') => Ok(Duration::days(number)),
        Some(unit) => anyhow::bail!("Unknown duration unit '{}' in {}", unit, value),
    }
}
