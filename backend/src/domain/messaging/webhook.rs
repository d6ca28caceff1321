//! WhatsApp webhook payloads.
//!
//! Only the delivery-status part of the notification is modelled; inbound
//! messages and other change fields are ignored by serde.

use serde::{Deserialize, Serialize};

/// Query string of the subscription handshake (`GET` on the webhook)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Echo the challenge when the handshake carries the expected token
pub fn verify_subscription(query: &VerificationQuery, expected_token: &str) -> Option<String> {
    if expected_token.is_empty() {
        return None;
    }
    match (&query.mode, &query.verify_token) {
        (Some(mode), Some(token)) if mode == "subscribe" && token == expected_token => {
            query.challenge.clone()
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: WebhookValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub statuses: Vec<StatusUpdate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusUpdate {
    /// Provider message id, as returned when the message was sent
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub recipient_id: Option<String>,
}

impl WebhookPayload {
    pub fn statuses(&self) -> impl Iterator<Item = &StatusUpdate> {
        self.entry
            .iter()
            .flat_map(|e| e.changes.iter())
            .flat_map(|c| c.value.statuses.iter())
    }
}

/// What a webhook delivery changed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookOutcome {
    pub applied: usize,
    pub skipped: usize,
}
