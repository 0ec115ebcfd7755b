use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Without a key, outgoing mail is only logged.
    pub sendgrid_api_key: Option<String>,
    pub from_address: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "accounts".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "accounts-users".into()),
        };
        let mail = MailConfig {
            sendgrid_api_key: std::env::var("SENDGRID_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            from_address: std::env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".into()),
            api_base: std::env::var("SENDGRID_API_BASE")
                .unwrap_or_else(|_| "https://api.sendgrid.com".into()),
        };
        Ok(Self {
            database_url,
            jwt,
            mail,
        })
    }
}
