//! WhatsApp Business Cloud API client.
//!
//! Sends pre-approved template messages with
//! `POST {api_base}/{phone_number_id}/messages` and a Bearer token.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::WhatsAppConfig;
use super::{MessagingError, NotificationContent, TemplateSender};
use shared::{MessageKind, MessageResult, Platform};

pub struct WhatsAppClient {
    config: WhatsAppConfig,
    timeout_secs: u64,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl WhatsAppClient {
    pub fn new(config: WhatsAppConfig, timeout_secs: u64) -> Result<Self, MessagingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MessagingError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            timeout_secs,
            client,
        })
    }

    /// Reduce a phone number to the digits-only international form.
    ///
    /// `+27 82 123-4567` and `082 123 4567` both become `27821234567`
    /// with the default country code `27`.
    pub fn normalize_phone(&self, raw: &str) -> Result<String, MessagingError> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        let international = if raw.trim_start().starts_with('+') {
            digits
        } else if let Some(local) = digits.strip_prefix("00") {
            local.to_string()
        } else if let Some(local) = digits.strip_prefix('0') {
            format!("{}{}", self.config.default_country_code, local)
        } else {
            digits
        };

        if !(8..=15).contains(&international.len()) {
            return Err(MessagingError::InvalidRecipient(raw.to_string()));
        }
        Ok(international)
    }

    fn template_name(&self, kind: MessageKind) -> &str {
        match kind {
            MessageKind::Invoice => &self.config.invoice_template,
            MessageKind::Reminder => &self.config.reminder_template,
        }
    }

    fn payload(&self, to: &str, content: &NotificationContent) -> Value {
        let parameters: Vec<Value> = content
            .parameters()
            .into_iter()
            .map(|text| json!({ "type": "text", "text": text }))
            .collect();

        json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": {
                "name": self.template_name(content.kind),
                "language": { "code": self.config.language_code },
                "components": [
                    { "type": "body", "parameters": parameters }
                ]
            }
        })
    }

    async fn try_send(&self, phone: &str, content: &NotificationContent) -> Result<String, MessagingError> {
        if !self.config.is_configured() {
            return Err(MessagingError::NotConfigured("WhatsApp"));
        }
        let to = self.normalize_phone(phone)?;
        let url = format!(
            "{}/{}/messages",
            self.config.api_base.trim_end_matches('/'),
            self.config.phone_number_id
        );
        debug!("POST {} ({:?} to {})", url, content.kind, to);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(&self.payload(&to, content))
            .send()
            .await
            .map_err(|e| MessagingError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| MessagingError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            return Err(MessagingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SendResponse =
            serde_json::from_str(&text).map_err(|e| MessagingError::Parse(e.to_string()))?;
        parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| MessagingError::Parse("response contained no message id".to_string()))
    }
}

#[async_trait]
impl TemplateSender for WhatsAppClient {
    fn platform(&self) -> Platform {
        Platform::WhatsApp
    }

    async fn send(&self, recipient: &str, content: &NotificationContent) -> MessageResult {
        match self.try_send(recipient, content).await {
            Ok(message_id) => {
                info!("WhatsApp {:?} sent: {}", content.kind, message_id);
                MessageResult::sent(Platform::WhatsApp, message_id)
            }
            Err(e) => {
                warn!("WhatsApp {:?} failed: {}", content.kind, e);
                MessageResult::failed(Some(Platform::WhatsApp), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(country_code: &str) -> WhatsAppClient {
        WhatsAppClient::new(
            WhatsAppConfig {
                phone_number_id: "1234".to_string(),
                access_token: "token".to_string(),
                default_country_code: country_code.to_string(),
                ..Default::default()
            },
            5,
        )
        .unwrap()
    }

    fn content() -> NotificationContent {
        NotificationContent {
            kind: MessageKind::Reminder,
            parent_name: "Mrs Dlamini".to_string(),
            student_name: "Sipho Dlamini".to_string(),
            amount: "R 500.00".to_string(),
            due_date: "2024-09-15".to_string(),
            invoice_id: "invoice::1".to_string(),
        }
    }

    #[test]
    fn test_normalize_phone() {
        let c = client("27");
        assert_eq!(c.normalize_phone("+27 82 123-4567").unwrap(), "27821234567");
        assert_eq!(c.normalize_phone("082 123 4567").unwrap(), "27821234567");
        assert_eq!(c.normalize_phone("0044 7700 900123").unwrap(), "447700900123");
        assert!(c.normalize_phone("12").is_err());
        assert!(c.normalize_phone("not a number").is_err());
    }

    #[test]
    fn test_payload_uses_reminder_template() {
        let payload = client("27").payload("27821234567", &content());
        assert_eq!(payload["type"], "template");
        assert_eq!(payload["template"]["name"], "payment_reminder");
        assert_eq!(payload["template"]["language"]["code"], "en");
        let params = payload["template"]["components"][0]["parameters"].as_array().unwrap();
        assert_eq!(params.len(), 5);
        assert_eq!(params[2]["text"], "R 500.00");
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_without_request() {
        let c = WhatsAppClient::new(WhatsAppConfig::default(), 5).unwrap();
        let result = c.send("+27821234567", &content()).await;
        assert!(!result.success);
        assert_eq!(result.platform, Some(Platform::WhatsApp));
        assert!(result.error.unwrap().contains("not configured"));
    }
}
