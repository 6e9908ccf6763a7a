use crate::domain::models::NotifySettings;
use crate::services::message::Message;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The webhook answered with something other than HTTP 200.
    Rejected { status: u16, body: String },
    /// The request never got an answer (connect error, timeout, ...).
    Failed { reason: String },
}

impl SendOutcome {
    pub fn describe(&self) -> Option<String> {
        match self {
            SendOutcome::Delivered => None,
            SendOutcome::Rejected { status, body } => {
                Some(format!("webhook returned {}: {}", status, body.trim()))
            }
            SendOutcome::Failed { reason } => Some(reason.clone()),
        }
    }
}

pub trait Notifier {
    fn send(&self, message: &Message) -> SendOutcome;
}

/// Posts messages to a chat-robot webhook. One attempt per message.
pub struct WebhookClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, settings: &NotifySettings) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Notifier for WebhookClient {
    fn send(&self, message: &Message) -> SendOutcome {
        match self.client.post(&self.url).json(message).send() {
            Ok(resp) if resp.status() == StatusCode::OK => {
                let body = resp.text().unwrap_or_default();
                debug!(%body, "webhook response");
                info!("message delivered");
                SendOutcome::Delivered
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.text().unwrap_or_default();
                warn!(status, %body, "message rejected");
                SendOutcome::Rejected { status, body }
            }
            Err(e) => {
                warn!(error = %e, "message send failed");
                SendOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
