use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{Mailer, Message};

/// SendGrid v3 `mail/send` client.
#[derive(Clone)]
pub struct SendGridMailer {
    client: Client,
    api_base: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

impl SendGridMailer {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("build mail http client")?;

        let api_base: String = api_base.into();
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }

    fn request_body<'a>(&'a self, message: &'a Message) -> SendRequest<'a> {
        SendRequest {
            personalizations: [Personalization {
                to: [Address { email: &message.to }],
            }],
            from: Address { email: &self.from },
            subject: &message.subject,
            content: [Content {
                kind: "text/plain",
                value: &message.text,
            }],
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, message: &Message) -> anyhow::Result<()> {
        let url = format!("{}/v3/mail/send", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(message))
            .send()
            .await
            .context("sendgrid request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("sendgrid rejected message: {status} {body}");
        }
        debug!(%status, "sendgrid accepted message");
        Ok(())
    }
}
