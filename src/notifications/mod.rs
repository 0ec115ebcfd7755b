use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

pub mod sendgrid;

pub use sendgrid::SendGridMailer;

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &Message) -> anyhow::Result<()>;
}

/// Transport used when no provider is configured: logs and drops.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &Message) -> anyhow::Result<()> {
        info!(subject = %message.subject, "mail transport not configured; message dropped");
        Ok(())
    }
}

pub fn welcome_message(email: &str, name: &str) -> Message {
    Message {
        to: email.to_string(),
        subject: "Welcome message".to_string(),
        text: format!("Welcome to the app, {name}. Let me know how you get along with it."),
    }
}

pub fn cancellation_message(email: &str, name: &str) -> Message {
    Message {
        to: email.to_string(),
        subject: "Cancellation message".to_string(),
        text: format!(
            "{name}, we are sorry that you leave. What could we do better for you to continue with us?"
        ),
    }
}

/// Best-effort account lifecycle mail. Never fails, never retries.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub async fn notify_welcome(&self, email: &str, name: &str) {
        self.deliver(welcome_message(email, name)).await
    }

    pub async fn notify_cancellation(&self, email: &str, name: &str) {
        self.deliver(cancellation_message(email, name)).await
    }

    /// Sends the welcome mail on a detached task.
    pub fn dispatch_welcome(&self, email: &str, name: &str) {
        let (this, email, name) = (self.clone(), email.to_string(), name.to_string());
        tokio::spawn(async move { this.notify_welcome(&email, &name).await });
    }

    /// Sends the cancellation mail on a detached task.
    pub fn dispatch_cancellation(&self, email: &str, name: &str) {
        let (this, email, name) = (self.clone(), email.to_string(), name.to_string());
        tokio::spawn(async move { this.notify_cancellation(&email, &name).await });
    }

    async fn deliver(&self, message: Message) {
        match self.mailer.send(&message).await {
            Ok(()) => info!(subject = %message.subject, "email sent"),
            Err(e) => error!(error = %e, subject = %message.subject, "email delivery failed"),
        }
    }
}
