use super::{ExclusiveRule, Record, RecordMeta};
use crate::common::error::ValidationErrors;
use crate::common::text::is_valid_email;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailProvider {
    #[default]
    Gmail,
    Outlook,
    Yahoo,
    Custom,
}

impl EmailProvider {
    /// Host and port presets for the well-known providers.
    pub fn preset(&self) -> Option<(&'static str, u16)> {
        match self {
            EmailProvider::Gmail => Some(("smtp.gmail.com", 587)),
            EmailProvider::Outlook => Some(("smtp-mail.outlook.com", 587)),
            EmailProvider::Yahoo => Some(("smtp.mail.yahoo.com", 587)),
            EmailProvider::Custom => None,
        }
    }
}

/// SMTP settings editable from the admin surface. At most one row is the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfiguration {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub provider: EmailProvider,
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub is_default: bool,
}

impl Default for EmailConfiguration {
    fn default() -> Self {
        Self {
            meta: RecordMeta::default(),
            name: String::new(),
            provider: EmailProvider::default(),
            host: String::new(),
            port: 587,
            use_tls: true,
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
            is_default: false,
        }
    }
}

impl EmailConfiguration {
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty()
            && self.port != 0
            && !self.username.trim().is_empty()
            && !self.password.is_empty()
            && !self.from_email.trim().is_empty()
    }

    /// Gmail rejects a From that differs from the authenticated account.
    pub fn sender_address(&self) -> &str {
        match self.provider {
            EmailProvider::Gmail => &self.username,
            _ => &self.from_email,
        }
    }
}

impl Record for EmailConfiguration {
    const KIND: &'static str = "core.email_configuration";
    const EXCLUSIVE: Option<ExclusiveRule> = Some(ExclusiveRule {
        flag: "is_default",
        scope: None,
    });

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn before_save(&mut self) {
        if self.host.trim().is_empty() {
            if let Some((host, port)) = self.provider.preset() {
                self.host = host.to_string();
                self.port = port;
            }
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, Some(100));
        if !self.from_email.is_empty() && !is_valid_email(&self.from_email) {
            errors.add("from_email", "Introduzca una dirección de correo electrónico válida.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    ClaimConfirmation,
    FraudConfirmation,
    SuggestionConfirmation,
    Test,
    System,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Sent,
    Failed,
    #[default]
    Pending,
}

/// One row per attempted email. Never edited from the admin surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailLog {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub email_type: EmailType,
    pub status: EmailStatus,
    pub subject: String,
    pub from_email: String,
    pub to_email: String,
    pub message: String,
    pub html_message: Option<String>,
    pub error_message: Option<String>,
    pub claim_request_id: Option<i64>,
    pub fraud_report_id: Option<i64>,
    pub email_config_id: Option<i64>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Record for EmailLog {
    const KIND: &'static str = "core.email_log";
    const SOFT_DELETE: bool = false;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl EmailLog {
    pub fn is_successful(&self) -> bool {
        self.status == EmailStatus::Sent
    }

    pub fn delivery_time(&self) -> Option<Duration> {
        match (self.meta.created_at, self.sent_at) {
            (Some(created), Some(sent)) => Some(sent - created),
            _ => None,
        }
    }

    pub fn mark_sent(&mut self) {
        self.status = EmailStatus::Sent;
        self.sent_at = Some(Utc::now());
        self.error_message = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = EmailStatus::Failed;
        self.error_message = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> EmailConfiguration {
        EmailConfiguration {
            name: "Principal".to_string(),
            host: "smtp.asomap.com.do".to_string(),
            username: "notificaciones".to_string(),
            password: "secreto".to_string(),
            from_email: "notificaciones@asomap.com.do".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn configuration_needs_every_smtp_field() {
        assert!(configured().is_configured());
        let mut missing_password = configured();
        missing_password.password.clear();
        assert!(!missing_password.is_configured());
        let mut missing_from = configured();
        missing_from.from_email = "  ".to_string();
        assert!(!missing_from.is_configured());
    }

    #[test]
    fn provider_preset_fills_blank_host() {
        let mut config = EmailConfiguration {
            provider: EmailProvider::Outlook,
            ..configured()
        };
        config.host.clear();
        config.before_save();
        assert_eq!(config.host, "smtp-mail.outlook.com");
        assert_eq!(config.port, 587);
    }

    #[test]
    fn delivery_time_spans_creation_to_send() {
        let created = Utc::now() - Duration::seconds(3);
        let mut log = EmailLog::default();
        log.meta.created_at = Some(created);
        assert!(log.delivery_time().is_none());
        log.mark_sent();
        assert!(log.is_successful());
        assert!(log.delivery_time().is_some_and(|d| d >= Duration::seconds(3)));
    }
}
