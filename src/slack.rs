use async_trait::async_trait;
use chrono::FixedOffset;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, instrument};

use crate::alerts::{AlertChannel, AlertError, AlertPayload};
use crate::config::Slack;

const ALERT_TITLE: &str = "🚨 Endpoint health check failed";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Fallback for notifications that cannot render blocks
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: Text,
    },
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<Text>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<Text>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    #[serde(rename = "type")]
    pub kind: TextKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    PlainText,
    Mrkdwn,
}

impl Text {
    pub fn plain(text: impl ToString) -> Self {
        Self {
            kind: TextKind::PlainText,
            text: text.to_string(),
            emoji: Some(true),
        }
    }

    pub fn mrkdwn(text: impl ToString) -> Self {
        Self {
            kind: TextKind::Mrkdwn,
            text: text.to_string(),
            emoji: None,
        }
    }

    /// A bold label on its own line followed by the value
    pub fn labelled(label: &str, value: impl std::fmt::Display) -> Self {
        Self::mrkdwn(format!("*{label}:*\n{value}"))
    }
}

pub struct MessageBuilder {
    text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(text: impl ToString) -> Self {
        Self {
            text: text.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn header(mut self, text: impl ToString) -> Self {
        self.blocks.push(Block::Header {
            text: Text::plain(text),
        });
        self
    }

    pub fn fields(mut self, fields: Vec<Text>) -> Self {
        self.blocks.push(Block::Section { text: None, fields });
        self
    }

    pub fn section(mut self, text: Text) -> Self {
        self.blocks.push(Block::Section {
            text: Some(text),
            fields: Vec::new(),
        });
        self
    }

    pub fn build(self) -> Message {
        Message {
            text: self.text,
            blocks: self.blocks,
        }
    }
}

/// Slack incoming-webhook alert channel
#[derive(Debug, Clone)]
pub struct SlackChannel {
    client: Client,
    url: String,
    offset: FixedOffset,
}

impl SlackChannel {
    pub fn new(client: Client, config: &Slack) -> Self {
        Self {
            client,
            url: config.url.clone(),
            offset: crate::alerts::offset_or_utc(config.utc_offset_minutes),
        }
    }

    pub fn build_message(&self, alert: &AlertPayload) -> Message {
        let mut fields = vec![
            Text::labelled("Endpoint", &alert.endpoint),
            Text::labelled("Status code", alert.status_code_display()),
            Text::labelled("Error message", &alert.message),
            Text::labelled("Occurred at", alert.formatted_time(self.offset)),
        ];
        if let Some(duration) = alert.ongoing_display() {
            fields.push(Text::labelled("Unhealthy for", duration));
        }

        let mut builder = MessageBuilder::new(ALERT_TITLE)
            .header(ALERT_TITLE)
            .fields(fields);

        if let Some(detail) = &alert.error {
            builder = builder.section(Text::mrkdwn(format!("*Error detail:*\n```{detail}```")));
        }

        builder.build()
    }
}

#[async_trait]
impl AlertChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    #[instrument(skip(self, alert), fields(endpoint = %alert.endpoint))]
    async fn deliver(&self, alert: &AlertPayload) -> Result<(), AlertError> {
        let message = self.build_message(alert);
        let response = self.client.post(&self.url).json(&message).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Successfully sent Slack alert");
        Ok(())
    }
}
