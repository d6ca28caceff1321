//! Provider credentials and endpoints for outbound messaging.

use serde::{Deserialize, Serialize};

/// WhatsApp Business Cloud API settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// Graph API root including the version segment
    pub api_base: String,
    pub phone_number_id: String,
    pub access_token: String,
    /// Shared secret echoed back during webhook verification
    pub verify_token: String,
    /// Dialling code applied to numbers written in local `0...` form
    pub default_country_code: String,
    pub invoice_template: String,
    pub reminder_template: String,
    pub language_code: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base: "https://graph.facebook.com/v18.0".to_string(),
            phone_number_id: String::new(),
            access_token: String::new(),
            verify_token: String::new(),
            default_country_code: "27".to_string(),
            invoice_template: "invoice_notification".to_string(),
            reminder_template: "payment_reminder".to_string(),
            language_code: "en".to_string(),
        }
    }
}

impl WhatsAppConfig {
    pub fn is_configured(&self) -> bool {
        !self.phone_number_id.is_empty() && !self.access_token.is_empty()
    }
}

/// WeChat Official Account template-message settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeChatConfig {
    pub api_base: String,
    pub app_id: String,
    pub app_secret: String,
    pub invoice_template_id: String,
    pub reminder_template_id: String,
}

impl Default for WeChatConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.weixin.qq.com".to_string(),
            app_id: String::new(),
            app_secret: String::new(),
            invoice_template_id: String::new(),
            reminder_template_id: String::new(),
        }
    }
}

impl WeChatConfig {
    pub fn is_configured(&self) -> bool {
        !self.app_id.is_empty() && !self.app_secret.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    pub whatsapp: WhatsAppConfig,
    pub wechat: WeChatConfig,
    /// Per-request timeout for provider calls
    pub timeout_secs: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            whatsapp: WhatsAppConfig::default(),
            wechat: WeChatConfig::default(),
            timeout_secs: 30,
        }
    }
}
