use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use super::webhook::{verify_subscription, VerificationQuery, WebhookOutcome, WebhookPayload};
use super::{
    select_platform, MessagingConfig, NotificationContent, TemplateSender, WeChatClient,
    WhatsAppClient,
};
use crate::domain::billing_service::BillingService;
use crate::domain::currency::format_currency;
use crate::domain::errors::DomainError;
use crate::storage::{DataStore, StoreError};
use shared::{
    Invoice, InvoiceStatus, MessageKind, MessageRecord, MessageResult, MessageStatus,
    NewMessageRecord, Platform,
};

/// Sends invoice notifications and tracks their delivery
#[derive(Clone)]
pub struct MessagingService {
    store: Arc<dyn DataStore>,
    billing: BillingService,
    senders: Vec<Arc<dyn TemplateSender>>,
    verify_token: String,
}

impl MessagingService {
    /// Build the WhatsApp and WeChat clients from configuration
    pub fn new(store: Arc<dyn DataStore>, config: &MessagingConfig) -> Result<Self> {
        let whatsapp = WhatsAppClient::new(config.whatsapp.clone(), config.timeout_secs)?;
        let wechat = WeChatClient::new(config.wechat.clone(), config.timeout_secs)?;
        info!(
            "Messaging: WhatsApp {}, WeChat {}",
            if config.whatsapp.is_configured() { "configured" } else { "disabled" },
            if config.wechat.is_configured() { "configured" } else { "disabled" }
        );

        let senders: Vec<Arc<dyn TemplateSender>> = vec![Arc::new(whatsapp), Arc::new(wechat)];
        Ok(Self::with_senders(
            store,
            senders,
            config.whatsapp.verify_token.clone(),
        ))
    }

    pub fn with_senders(
        store: Arc<dyn DataStore>,
        senders: Vec<Arc<dyn TemplateSender>>,
        verify_token: String,
    ) -> Self {
        Self {
            billing: BillingService::new(store.clone()),
            store,
            senders,
            verify_token,
        }
    }

    /// Notify the parent of an invoice; a draft invoice becomes `sent` on success
    pub async fn send_invoice(&self, invoice_id: &str) -> Result<MessageResult> {
        let invoice = self.billing.require_invoice(invoice_id).await?;
        if invoice.status == InvoiceStatus::Paid {
            return Err(DomainError::validation(format!("Invoice {} is already paid", invoice_id)).into());
        }

        let result = self.deliver(&invoice, MessageKind::Invoice).await?;
        if result.success && invoice.status == InvoiceStatus::Draft {
            self.billing
                .update_invoice_status(&invoice.id, InvoiceStatus::Sent)
                .await?;
        }
        Ok(result)
    }

    /// Remind the parent of an unpaid invoice that was already sent
    pub async fn send_payment_reminder(&self, invoice_id: &str) -> Result<MessageResult> {
        let invoice = self.billing.require_invoice(invoice_id).await?;
        if !invoice.status.is_outstanding() {
            return Err(DomainError::validation(format!(
                "Cannot remind about a {} invoice",
                invoice.status
            ))
            .into());
        }
        self.deliver(&invoice, MessageKind::Reminder).await
    }

    async fn deliver(&self, invoice: &Invoice, kind: MessageKind) -> Result<MessageResult> {
        let student = self
            .store
            .get_student(&invoice.student_id)
            .await?
            .ok_or_else(|| StoreError::not_found("students", &invoice.student_id))?;

        let Some((platform, recipient)) = select_platform(&student.parent_contact) else {
            warn!("No messaging contact for parent of {}", student.name);
            return Ok(MessageResult::failed(
                None,
                "Parent has no phone number or WeChat OpenID",
            ));
        };
        let Some(sender) = self.sender(platform) else {
            return Ok(MessageResult::failed(
                Some(platform),
                format!("No {} sender available", platform),
            ));
        };

        let content = NotificationContent {
            kind,
            parent_name: student.parent_contact.name.clone(),
            student_name: student.name.clone(),
            amount: format_currency(invoice.amount, invoice.currency),
            due_date: invoice.due_date.to_string(),
            invoice_id: invoice.id.clone(),
        };

        let result = sender.send(recipient, &content).await;
        if let (true, Some(message_id)) = (result.success, result.message_id.as_ref()) {
            self.store
                .add_message(&NewMessageRecord {
                    student_id: student.id.clone(),
                    invoice_id: Some(invoice.id.clone()),
                    platform,
                    kind,
                    provider_message_id: message_id.clone(),
                })
                .await?;
        }
        Ok(result)
    }

    fn sender(&self, platform: Platform) -> Option<&Arc<dyn TemplateSender>> {
        self.senders.iter().find(|s| s.platform() == platform)
    }

    /// Messages sent about a student, newest first
    pub async fn message_history(&self, student_id: &str) -> Result<Vec<MessageRecord>> {
        let mut messages = self.store.get_messages(student_id).await?;
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    pub fn verify_webhook(&self, query: &VerificationQuery) -> Option<String> {
        let challenge = verify_subscription(query, &self.verify_token);
        if challenge.is_none() {
            warn!("Webhook verification rejected (mode {:?})", query.mode);
        }
        challenge
    }

    /// Apply delivery statuses from a webhook delivery to the message log
    pub async fn handle_webhook(&self, payload: &WebhookPayload) -> Result<WebhookOutcome> {
        let mut outcome = WebhookOutcome::default();

        for update in payload.statuses() {
            let status = match update.status.parse::<MessageStatus>() {
                Ok(status) => status,
                Err(e) => {
                    warn!("Skipping status for {}: {}", update.id, e);
                    outcome.skipped += 1;
                    continue;
                }
            };

            match self.store.update_message_status(&update.id, status).await {
                Ok(()) => outcome.applied += 1,
                Err(e) if matches!(e.downcast_ref::<StoreError>(), Some(StoreError::NotFound { .. })) => {
                    warn!("Webhook status for unknown message {}", update.id);
                    outcome.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Webhook processed: {} applied, {} skipped",
            outcome.applied, outcome.skipped
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::messaging::webhook::{StatusUpdate, WebhookChange, WebhookEntry, WebhookValue};
    use crate::storage::{InvoiceStorage, MemoryStore, StudentStorage};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use shared::{Currency, NewInvoice, NewStudent, ParentContact, SessionRates};
    use std::sync::Mutex;

    /// Records every send and answers with a fixed outcome
    struct FakeSender {
        platform: Platform,
        succeed: bool,
        sent: Mutex<Vec<(String, MessageKind)>>,
    }

    impl FakeSender {
        fn new(platform: Platform, succeed: bool) -> Arc<Self> {
            Arc::new(Self {
                platform,
                succeed,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TemplateSender for FakeSender {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn send(&self, recipient: &str, content: &NotificationContent) -> MessageResult {
            let mut sent = self.sent.lock().unwrap();
            sent.push((recipient.to_string(), content.kind));
            if self.succeed {
                MessageResult::sent(self.platform, format!("msg-{}", sent.len()))
            } else {
                MessageResult::failed(Some(self.platform), "HTTP 500: boom")
            }
        }
    }

    async fn setup_test(
        contact: ParentContact,
        status: InvoiceStatus,
        senders: Vec<Arc<dyn TemplateSender>>,
    ) -> (Arc<MemoryStore>, MessagingService, String) {
        let store = Arc::new(MemoryStore::init_test());
        let student_id = store
            .add_student(&NewStudent {
                first_name: "Sipho".to_string(),
                last_name: "Dlamini".to_string(),
                email: None,
                phone: None,
                grade: "8".to_string(),
                subjects: vec![],
                parent_contact: contact,
                preferred_currency: Some(Currency::Zar),
                rates: SessionRates::new(),
            })
            .await
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let invoice_id = store
            .add_invoice(&NewInvoice {
                student_id,
                amount: dec!(500),
                currency: Currency::Zar,
                status,
                line_items: vec![],
                extra_charges: vec![],
                period_start: None,
                period_end: None,
                issue_date: day,
                due_date: day,
            })
            .await
            .unwrap();
        let service = MessagingService::with_senders(store.clone(), senders, "verify-me".to_string());
        (store, service, invoice_id)
    }

    fn phone_contact() -> ParentContact {
        ParentContact {
            name: "Mrs Dlamini".to_string(),
            phone: Some("+27821234567".to_string()),
            wechat_open_id: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn test_send_invoice_marks_draft_as_sent_and_logs() {
        let whatsapp = FakeSender::new(Platform::WhatsApp, true);
        let (store, service, invoice_id) =
            setup_test(phone_contact(), InvoiceStatus::Draft, vec![whatsapp.clone() as Arc<dyn TemplateSender>]).await;

        let result = service.send_invoice(&invoice_id).await.unwrap();
        assert!(result.success);
        assert_eq!(result.platform, Some(Platform::WhatsApp));

        let invoice = store.get_invoice(&invoice_id).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Sent);

        let history = service.message_history(&invoice.student_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].provider_message_id, "msg-1");
        assert_eq!(history[0].status, MessageStatus::Sent);
        assert_eq!(whatsapp.sent.lock().unwrap()[0].0, "+27821234567");
    }

    #[tokio::test]
    async fn test_failed_send_leaves_invoice_draft() {
        let whatsapp = FakeSender::new(Platform::WhatsApp, false);
        let (store, service, invoice_id) =
            setup_test(phone_contact(), InvoiceStatus::Draft, vec![whatsapp as Arc<dyn TemplateSender>]).await;

        let result = service.send_invoice(&invoice_id).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("HTTP 500: boom"));

        let invoice = store.get_invoice(&invoice_id).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert!(service.message_history(&invoice.student_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wechat_used_without_phone() {
        let whatsapp = FakeSender::new(Platform::WhatsApp, true);
        let wechat = FakeSender::new(Platform::WeChat, true);
        let contact = ParentContact {
            name: "Mr Chen".to_string(),
            phone: None,
            wechat_open_id: Some("oOpenId123".to_string()),
            email: None,
        };
        let (_, service, invoice_id) = setup_test(
            contact,
            InvoiceStatus::Sent,
            vec![whatsapp.clone() as Arc<dyn TemplateSender>, wechat.clone()],
        )
        .await;

        let result = service.send_payment_reminder(&invoice_id).await.unwrap();
        assert_eq!(result.platform, Some(Platform::WeChat));
        assert!(whatsapp.sent.lock().unwrap().is_empty());
        assert_eq!(
            wechat.sent.lock().unwrap()[0],
            ("oOpenId123".to_string(), MessageKind::Reminder)
        );
    }

    #[tokio::test]
    async fn test_no_contact_is_failure_result() {
        let (_, service, invoice_id) =
            setup_test(ParentContact::default(), InvoiceStatus::Draft, vec![]).await;

        let result = service.send_invoice(&invoice_id).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.platform, None);
    }

    #[tokio::test]
    async fn test_reminder_requires_outstanding_invoice() {
        let (_, service, invoice_id) = setup_test(
            phone_contact(),
            InvoiceStatus::Draft,
            vec![FakeSender::new(Platform::WhatsApp, true) as Arc<dyn TemplateSender>],
        )
        .await;

        let err = service.send_payment_reminder(&invoice_id).await.unwrap_err();
        assert!(err.downcast_ref::<DomainError>().is_some());

        let err = service.send_invoice("invoice::missing").await.unwrap_err();
        assert!(err.downcast_ref::<StoreError>().is_some());
    }

    #[tokio::test]
    async fn test_webhook_updates_known_and_skips_unknown() {
        let (_, service, invoice_id) = setup_test(
            phone_contact(),
            InvoiceStatus::Draft,
            vec![FakeSender::new(Platform::WhatsApp, true) as Arc<dyn TemplateSender>],
        )
        .await;
        service.send_invoice(&invoice_id).await.unwrap();

        let status = |id: &str, status: &str| StatusUpdate {
            id: id.to_string(),
            status: status.to_string(),
            recipient_id: None,
        };
        let payload = WebhookPayload {
            entry: vec![WebhookEntry {
                changes: vec![WebhookChange {
                    value: WebhookValue {
                        statuses: vec![
                            status("msg-1", "delivered"),
                            status("msg-unknown", "read"),
                            status("msg-1", "exploded"),
                        ],
                    },
                }],
            }],
        };

        let outcome = service.handle_webhook(&payload).await.unwrap();
        assert_eq!(outcome, WebhookOutcome { applied: 1, skipped: 2 });
    }

    #[test]
    fn test_verify_webhook_uses_configured_token() {
        let store = Arc::new(MemoryStore::init_test());
        let service = MessagingService::with_senders(store, vec![], "verify-me".to_string());
        let query = VerificationQuery {
            mode: Some("subscribe".to_string()),
            verify_token: Some("verify-me".to_string()),
            challenge: Some("42".to_string()),
        };
        assert_eq!(service.verify_webhook(&query), Some("42".to_string()));
    }
}
