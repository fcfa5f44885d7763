use super::templates::{self, RenderedEmail};
use super::{EmailBackend, OutgoingEmail};
use crate::error::Result;
use cms_core::storage::{self, Storage};
use cms_core::{ClaimRequest, EmailConfiguration, EmailLog, EmailStatus, EmailType, FraudReport, SuggestionBox};
use tracing::{error, info, warn};

const NO_VALID_CONFIG: &str = "No hay configuración de email válida";

/// What to send and how to file it in the email log.
#[derive(Debug, Clone)]
pub struct EmailRequest {
    pub email_type: EmailType,
    pub subject: String,
    pub to: String,
    pub text: String,
    pub html: Option<String>,
    pub claim_request_id: Option<i64>,
    pub fraud_report_id: Option<i64>,
}

impl EmailRequest {
    fn from_rendered(email_type: EmailType, to: &str, rendered: RenderedEmail) -> Self {
        Self {
            email_type,
            subject: rendered.subject,
            to: to.to_string(),
            text: rendered.text,
            html: Some(rendered.html),
            claim_request_id: None,
            fraud_report_id: None,
        }
    }
}

/// The active default configuration, else the first active one.
pub async fn active_configuration(storage: &dyn Storage) -> Result<Option<EmailConfiguration>> {
    let active = storage::list_active::<EmailConfiguration>(storage).await?;
    let default = active.iter().find(|c| c.is_default).cloned();
    Ok(default.or_else(|| active.into_iter().next()))
}

/// Logs the attempt as pending, sends with `config` (or the active
/// configuration), and records the outcome. Returns whether it was sent.
pub async fn send_email_with_config(
    storage: &dyn Storage,
    backend: &dyn EmailBackend,
    request: EmailRequest,
    config: Option<EmailConfiguration>,
) -> Result<bool> {
    let config = match config {
        Some(config) => Some(config),
        None => active_configuration(storage).await?,
    };

    let mut log = EmailLog {
        email_type: request.email_type,
        status: EmailStatus::Pending,
        subject: request.subject.clone(),
        from_email: config
            .as_ref()
            .map(|c| c.sender_address().to_string())
            .unwrap_or_default(),
        to_email: request.to.clone(),
        message: request.text.clone(),
        html_message: request.html.clone(),
        claim_request_id: request.claim_request_id,
        fraud_report_id: request.fraud_report_id,
        email_config_id: config.as_ref().map(|c| c.meta.id).filter(|id| *id != 0),
        ..Default::default()
    };
    storage::save(storage, &mut log).await?;

    let config = match config {
        Some(config) if config.is_configured() => config,
        _ => {
            warn!("Email '{}' to {} not sent: {}", request.subject, request.to, NO_VALID_CONFIG);
            log.mark_failed(NO_VALID_CONFIG);
            storage::save(storage, &mut log).await?;
            return Ok(false);
        }
    };

    let outgoing = OutgoingEmail {
        from: config.sender_address().to_string(),
        to: request.to.clone(),
        subject: request.subject.clone(),
        text: request.text,
        html: request.html,
    };

    let sent = match backend.send(&config, &outgoing).await {
        Ok(()) => {
            info!("Email '{}' sent to {}", outgoing.subject, outgoing.to);
            log.mark_sent();
            true
        }
        Err(e) => {
            error!("Email '{}' to {} failed: {}", outgoing.subject, outgoing.to, e);
            log.mark_failed(e.to_string());
            false
        }
    };
    storage::save(storage, &mut log).await?;
    Ok(sent)
}

async fn best_effort(storage: &dyn Storage, backend: &dyn EmailBackend, request: EmailRequest) -> bool {
    let to = request.to.clone();
    match send_email_with_config(storage, backend, request, None).await {
        Ok(sent) => sent,
        Err(e) => {
            error!("Could not record confirmation email to {}: {}", to, e);
            false
        }
    }
}

pub async fn send_claim_confirmation(
    storage: &dyn Storage,
    backend: &dyn EmailBackend,
    claim: &ClaimRequest,
) -> bool {
    let mut request = EmailRequest::from_rendered(
        EmailType::ClaimConfirmation,
        &claim.email,
        templates::claim_confirmation(claim),
    );
    request.claim_request_id = Some(claim.meta.id);
    best_effort(storage, backend, request).await
}

pub async fn send_fraud_confirmation(
    storage: &dyn Storage,
    backend: &dyn EmailBackend,
    report: &FraudReport,
) -> bool {
    let mut request = EmailRequest::from_rendered(
        EmailType::FraudConfirmation,
        &report.email,
        templates::fraud_confirmation(report),
    );
    request.fraud_report_id = Some(report.meta.id);
    best_effort(storage, backend, request).await
}

pub async fn send_suggestion_confirmation(
    storage: &dyn Storage,
    backend: &dyn EmailBackend,
    suggestion: &SuggestionBox,
) -> bool {
    let request = EmailRequest::from_rendered(
        EmailType::SuggestionConfirmation,
        &suggestion.email,
        templates::suggestion_confirmation(suggestion),
    );
    best_effort(storage, backend, request).await
}

/// Sends a short test message with `config`. Returns the outcome and a
/// message for the operator.
pub async fn send_test_email(
    storage: &dyn Storage,
    backend: &dyn EmailBackend,
    config: EmailConfiguration,
    to: &str,
) -> Result<(bool, String)> {
    if !config.is_configured() {
        return Ok((false, "La configuración no está completa".to_string()));
    }

    let request = EmailRequest {
        email_type: EmailType::Test,
        subject: "Prueba de Configuración - ASOMAP".to_string(),
        to: to.to_string(),
        text: "Esta es una prueba de la configuración de email.".to_string(),
        html: None,
        claim_request_id: None,
        fraud_report_id: None,
    };

    let sent = send_email_with_config(storage, backend, request, Some(config)).await?;
    let message = if sent {
        "Email de prueba enviado exitosamente"
    } else {
        "Error al enviar email de prueba"
    };
    Ok((sent, message.to_string()))
}
