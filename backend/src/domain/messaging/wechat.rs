//! WeChat Official Account template-message client.
//!
//! An access token is fetched with the client-credential grant and cached
//! until shortly before it expires. Both endpoints answer HTTP 200 on
//! failure, so the `errcode` field decides the outcome.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::config::WeChatConfig;
use super::{MessagingError, NotificationContent, TemplateSender};
use shared::{MessageKind, MessageResult, Platform};

/// Refresh this long before the provider's stated expiry
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// errcodes meaning the cached token is no longer accepted
const INVALID_TOKEN_CODES: [i64; 3] = [40001, 40014, 42001];

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    msgid: Option<Value>,
}

pub struct WeChatClient {
    config: WeChatConfig,
    timeout_secs: u64,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl WeChatClient {
    pub fn new(config: WeChatConfig, timeout_secs: u64) -> Result<Self, MessagingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MessagingError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            timeout_secs,
            client,
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn template_id(&self, kind: MessageKind) -> &str {
        match kind {
            MessageKind::Invoice => &self.config.invoice_template_id,
            MessageKind::Reminder => &self.config.reminder_template_id,
        }
    }

    /// Template `data` object: `first`, `keyword1..n` and `remark`
    fn template_data(content: &NotificationContent) -> Value {
        let mut data = Map::new();
        let heading = match content.kind {
            MessageKind::Invoice => format!("Dear {}, a new invoice is ready", content.parent_name),
            MessageKind::Reminder => format!("Dear {}, a payment is due", content.parent_name),
        };
        data.insert("first".to_string(), json!({ "value": heading }));

        let keywords = [
            &content.student_name,
            &content.amount,
            &content.due_date,
            &content.invoice_id,
        ];
        for (i, value) in keywords.iter().enumerate() {
            data.insert(format!("keyword{}", i + 1), json!({ "value": value }));
        }
        data.insert("remark".to_string(), json!({ "value": "Thank you" }));
        Value::Object(data)
    }

    /// Cached access token, fetching a new one when absent or near expiry
    async fn access_token(&self) -> Result<String, MessagingError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Fetching WeChat access token");
        let response = self
            .client
            .get(self.url("cgi-bin/token"))
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", self.config.app_id.as_str()),
                ("secret", self.config.app_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MessagingError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MessagingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| MessagingError::Parse(e.to_string()))?;
        if body.errcode != 0 {
            return Err(MessagingError::Provider {
                code: body.errcode,
                message: body.errmsg,
            });
        }
        let value = body
            .access_token
            .ok_or_else(|| MessagingError::Parse("token response without access_token".to_string()))?;

        let token = CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + Duration::from_secs(body.expires_in.unwrap_or(7200)),
        };
        *cached = Some(token);
        Ok(value)
    }

    async fn try_send(&self, open_id: &str, content: &NotificationContent) -> Result<String, MessagingError> {
        if !self.config.is_configured() {
            return Err(MessagingError::NotConfigured("WeChat"));
        }
        let template_id = self.template_id(content.kind);
        if template_id.is_empty() {
            return Err(MessagingError::NotConfigured("WeChat template"));
        }

        let token = self.access_token().await?;
        let body = json!({
            "touser": open_id,
            "template_id": template_id,
            "data": Self::template_data(content),
        });

        let response = self
            .client
            .post(self.url("cgi-bin/message/template/send"))
            .query(&[("access_token", token.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| MessagingError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MessagingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| MessagingError::Parse(e.to_string()))?;

        if parsed.errcode != 0 {
            if INVALID_TOKEN_CODES.contains(&parsed.errcode) {
                *self.token.lock().await = None;
            }
            return Err(MessagingError::Provider {
                code: parsed.errcode,
                message: parsed.errmsg,
            });
        }

        match parsed.msgid {
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::String(s)) => Ok(s),
            _ => Err(MessagingError::Parse("response contained no msgid".to_string())),
        }
    }
}

#[async_trait]
impl TemplateSender for WeChatClient {
    fn platform(&self) -> Platform {
        Platform::WeChat
    }

    async fn send(&self, recipient: &str, content: &NotificationContent) -> MessageResult {
        match self.try_send(recipient, content).await {
            Ok(message_id) => {
                info!("WeChat {:?} sent: {}", content.kind, message_id);
                MessageResult::sent(Platform::WeChat, message_id)
            }
            Err(e) => {
                warn!("WeChat {:?} failed: {}", content.kind, e);
                MessageResult::failed(Some(Platform::WeChat), e.to_string())
            }
        }
    }
}
