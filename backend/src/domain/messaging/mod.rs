//! # Messaging
//!
//! Delivers invoice and payment-reminder notifications to parents through
//! template-message APIs. Each provider client issues exactly one HTTP call
//! per send (plus a token fetch for WeChat) and folds every outcome into a
//! [`MessageResult`]; nothing is retried or queued.
//!
//! Which provider is used is decided by [`select_platform`] from the parent
//! contact alone: a phone number means WhatsApp, otherwise a WeChat OpenID
//! means WeChat.

pub mod config;
pub mod errors;
pub mod service;
pub mod webhook;
pub mod wechat;
pub mod whatsapp;

use async_trait::async_trait;
use shared::{MessageKind, MessageResult, ParentContact, Platform};

pub use config::{MessagingConfig, WeChatConfig, WhatsAppConfig};
pub use errors::MessagingError;
pub use service::MessagingService;
pub use wechat::WeChatClient;
pub use whatsapp::WhatsAppClient;

/// Values substituted into a provider template
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContent {
    pub kind: MessageKind,
    pub parent_name: String,
    pub student_name: String,
    /// Already formatted with currency symbol
    pub amount: String,
    pub due_date: String,
    pub invoice_id: String,
}

impl NotificationContent {
    /// Positional template parameters, in the order the templates expect
    pub fn parameters(&self) -> Vec<String> {
        vec![
            self.parent_name.clone(),
            self.student_name.clone(),
            self.amount.clone(),
            self.due_date.clone(),
            self.invoice_id.clone(),
        ]
    }
}

/// A provider able to deliver a template message to one recipient
#[async_trait]
pub trait TemplateSender: Send + Sync {
    fn platform(&self) -> Platform;

    /// Send once; failures come back as an unsuccessful result
    async fn send(&self, recipient: &str, content: &NotificationContent) -> MessageResult;
}

/// Pick the platform and recipient address for a parent
pub fn select_platform(contact: &ParentContact) -> Option<(Platform, &str)> {
    fn non_empty(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    if let Some(phone) = non_empty(&contact.phone) {
        return Some((Platform::WhatsApp, phone));
    }
    non_empty(&contact.wechat_open_id).map(|open_id| (Platform::WeChat, open_id))
}
