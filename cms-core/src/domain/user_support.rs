use super::{ExclusiveRule, Record, RecordMeta, SubmissionStatus};
use crate::common::error::ValidationErrors;
use crate::common::text::is_valid_email;
use crate::record;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountType {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub label: String,
    pub description: String,
}
record!(AccountType, "user_support.account_type");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AbandonedAccountsSection {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub account_type_ids: Vec<i64>,
}
record!(
    AbandonedAccountsSection,
    "user_support.abandoned_accounts_section",
    singleton
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearlyDocumentType {
    #[default]
    Abandoned,
    Inactive,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct YearlyDocument {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub year: String,
    pub account_type_id: Option<i64>,
    #[serde(rename = "type")]
    pub document_type: YearlyDocumentType,
    pub title: String,
    pub document: String,
    pub date: Option<NaiveDate>,
}

impl Record for YearlyDocument {
    const KIND: &'static str = "user_support.yearly_document";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("year", &self.year, Some(4));
        errors.require("title", &self.title, Some(200));
        if self.account_type_id.is_none() {
            errors.add("account_type_id", "Este campo es requerido.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractCategory {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
}
record!(ContractCategory, "user_support.contract_category");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountContractsSection {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(
    AccountContractsSection,
    "user_support.account_contracts_section",
    singleton
);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Contract {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub category_id: Option<i64>,
    pub document: String,
    pub order: u32,
}
record!(Contract, "user_support.contract");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRatesPage {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(ServiceRatesPage, "user_support.service_rates_page", singleton);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceCategory {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub order: u32,
}
record!(ServiceCategory, "user_support.service_category");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRate {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub category_id: Option<i64>,
    pub service: String,
    pub description: String,
    pub rate: String,
    /// Rich text.
    pub details: String,
    pub order: u32,
}
record!(ServiceRate, "user_support.service_rate");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RightsAndDutiesPage {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub page_title: String,
    pub page_description: String,
}
record!(
    RightsAndDutiesPage,
    "user_support.rights_and_duties_page",
    singleton
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RightsSectionId {
    #[default]
    #[serde(rename = "rightsAndDuties")]
    RightsAndDuties,
    #[serde(rename = "otherRights")]
    OtherRights,
}

impl RightsSectionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RightsSectionId::RightsAndDuties => "rightsAndDuties",
            RightsSectionId::OtherRights => "otherRights",
        }
    }
}

/// One active row per `section_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RightsAndDutiesSection {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub section_id: RightsSectionId,
    pub title: String,
    pub description: String,
    pub button_text: String,
    pub additional_info: String,
    pub order: u32,
}

impl Record for RightsAndDutiesSection {
    const KIND: &'static str = "user_support.rights_and_duties_section";
    const EXCLUSIVE: Option<ExclusiveRule> = Some(ExclusiveRule::scoped("is_active", "section_id"));

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RightsAndDutiesImage {
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Row id of the owning [`RightsAndDutiesSection`].
    pub section_record_id: Option<i64>,
    pub image: String,
    pub alt_text: String,
    pub description: String,
    pub order: u32,
}
record!(RightsAndDutiesImage, "user_support.rights_and_duties_image");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Province {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
}
record!(Province, "user_support.province");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionBoxPage {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(SuggestionBoxPage, "user_support.suggestion_box_page", singleton);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudReportPage {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(FraudReportPage, "user_support.fraud_report_page", singleton);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimRequestPage {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(ClaimRequestPage, "user_support.claim_request_page", singleton);

/// Anything but a string path means "no file".
fn lenient_path<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// Foreign keys arrive from HTML forms as numbers or numeric strings.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn stamp_resolution(status: SubmissionStatus, resolved_at: &mut Option<DateTime<Utc>>) {
    if status.is_terminal_resolution() && resolved_at.is_none() {
        *resolved_at = Some(Utc::now());
    }
}

fn require_email(errors: &mut ValidationErrors, email: &str) {
    errors.require("email", email, Some(254));
    if !email.trim().is_empty() && !is_valid_email(email) {
        errors.add("email", "Introduzca una dirección de correo electrónico válida.");
    }
}

/// Shared by the three public forms.
pub trait Submission: Record {
    fn full_name(&self) -> &str;
    fn email(&self) -> &str;
    fn status_mut(&mut self) -> &mut SubmissionStatus;
    fn internal_notes_mut(&mut self) -> &mut String;
    fn resolved_at_mut(&mut self) -> &mut Option<DateTime<Utc>>;

    /// Drops anything a public client must not choose for itself.
    fn reset_for_public_create(&mut self) {
        *self.meta_mut() = RecordMeta::default();
        *self.status_mut() = SubmissionStatus::Pending;
        self.internal_notes_mut().clear();
        *self.resolved_at_mut() = None;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimRequest {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(alias = "fullName")]
    pub full_name: String,
    pub document: String,
    pub phone: String,
    pub email: String,
    #[serde(alias = "productType")]
    pub product_type: String,
    #[serde(alias = "claimType")]
    pub claim_type: String,
    #[serde(alias = "distributionChannel")]
    pub distribution_channel: String,
    pub message: String,
    pub status: SubmissionStatus,
    pub internal_notes: String,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Record for ClaimRequest {
    const KIND: &'static str = "user_support.claim_request";
    const SOFT_DELETE: bool = false;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn before_save(&mut self) {
        stamp_resolution(self.status, &mut self.resolved_at);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("full_name", &self.full_name, Some(200));
        errors.require("document", &self.document, Some(20));
        errors.require("phone", &self.phone, Some(20));
        require_email(&mut errors, &self.email);
        errors.require("product_type", &self.product_type, Some(100));
        errors.require("claim_type", &self.claim_type, Some(100));
        errors.require("distribution_channel", &self.distribution_channel, Some(100));
        errors.require("message", &self.message, None);
        errors.into_result()
    }
}

impl Submission for ClaimRequest {
    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn status_mut(&mut self) -> &mut SubmissionStatus {
        &mut self.status
    }

    fn internal_notes_mut(&mut self) -> &mut String {
        &mut self.internal_notes
    }

    fn resolved_at_mut(&mut self) -> &mut Option<DateTime<Utc>> {
        &mut self.resolved_at
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudReport {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(alias = "fullName")]
    pub full_name: String,
    pub document: String,
    pub phone: String,
    pub email: String,
    pub classification: String,
    pub message: String,
    #[serde(deserialize_with = "lenient_path")]
    pub file: Option<String>,
    pub status: SubmissionStatus,
    pub internal_notes: String,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Record for FraudReport {
    const KIND: &'static str = "user_support.fraud_report";
    const SOFT_DELETE: bool = false;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn before_save(&mut self) {
        stamp_resolution(self.status, &mut self.resolved_at);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("full_name", &self.full_name, Some(200));
        errors.require("document", &self.document, Some(20));
        errors.require("phone", &self.phone, Some(20));
        require_email(&mut errors, &self.email);
        errors.require("classification", &self.classification, Some(100));
        errors.require("message", &self.message, None);
        errors.into_result()
    }
}

impl Submission for FraudReport {
    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn status_mut(&mut self) -> &mut SubmissionStatus {
        &mut self.status
    }

    fn internal_notes_mut(&mut self) -> &mut String {
        &mut self.internal_notes
    }

    fn resolved_at_mut(&mut self) -> &mut Option<DateTime<Utc>> {
        &mut self.resolved_at
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionBox {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(alias = "fullName")]
    pub full_name: String,
    pub document: String,
    pub phone: String,
    pub email: String,
    #[serde(deserialize_with = "lenient_id")]
    pub province: Option<i64>,
    pub classification: String,
    pub message: String,
    pub status: SubmissionStatus,
    pub internal_notes: String,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Record for SuggestionBox {
    const KIND: &'static str = "user_support.suggestion_box";
    const SOFT_DELETE: bool = false;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn before_save(&mut self) {
        stamp_resolution(self.status, &mut self.resolved_at);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("full_name", &self.full_name, Some(200));
        errors.require("document", &self.document, Some(20));
        errors.require("phone", &self.phone, Some(20));
        require_email(&mut errors, &self.email);
        if self.province.is_none() {
            errors.add("province", "Este campo es requerido.");
        }
        errors.require("classification", &self.classification, Some(100));
        errors.require("message", &self.message, None);
        errors.into_result()
    }
}

impl Submission for SuggestionBox {
    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn status_mut(&mut self) -> &mut SubmissionStatus {
        &mut self.status
    }

    fn internal_notes_mut(&mut self) -> &mut String {
        &mut self.internal_notes
    }

    fn resolved_at_mut(&mut self) -> &mut Option<DateTime<Utc>> {
        &mut self.resolved_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claim_json() -> Value {
        json!({
            "fullName": "Ana Pérez",
            "document": "001-1234567-8",
            "phone": "809-555-0101",
            "email": "ana@example.com",
            "productType": "Cuenta de ahorro",
            "claimType": "Cargo no reconocido",
            "distributionChannel": "Sucursal",
            "message": "Cobro duplicado en mi estado de cuenta."
        })
    }

    #[test]
    fn claim_accepts_camel_case_aliases() {
        let claim: ClaimRequest = serde_json::from_value(claim_json()).unwrap();
        assert_eq!(claim.full_name, "Ana Pérez");
        assert_eq!(claim.distribution_channel, "Sucursal");
        assert!(claim.validate().is_ok());
    }

    #[test]
    fn claim_requires_email() {
        let mut body = claim_json();
        body.as_object_mut().unwrap().remove("email");
        let claim: ClaimRequest = serde_json::from_value(body).unwrap();
        let errors = claim.validate().unwrap_err();
        assert!(errors.contains("email"));
        assert!(!errors.contains("full_name"));
    }

    #[test]
    fn overlong_document_is_rejected() {
        let mut claim: ClaimRequest = serde_json::from_value(claim_json()).unwrap();
        claim.document = "9".repeat(21);
        assert!(claim.validate().unwrap_err().contains("document"));
    }

    #[test]
    fn resolved_at_is_stamped_once() {
        let mut claim: ClaimRequest = serde_json::from_value(claim_json()).unwrap();
        claim.before_save();
        assert!(claim.resolved_at.is_none());
        claim.status = SubmissionStatus::Resolved;
        claim.before_save();
        let first = claim.resolved_at;
        assert!(first.is_some());
        claim.status = SubmissionStatus::Closed;
        claim.before_save();
        assert_eq!(claim.resolved_at, first);
    }

    #[test]
    fn public_create_resets_staff_fields() {
        let mut claim: ClaimRequest = serde_json::from_value(claim_json()).unwrap();
        claim.meta.id = 77;
        claim.status = SubmissionStatus::Closed;
        claim.internal_notes = "nota".to_string();
        claim.resolved_at = Some(Utc::now());
        claim.reset_for_public_create();
        assert_eq!(claim.meta.id, 0);
        assert_eq!(claim.status, SubmissionStatus::Pending);
        assert!(claim.internal_notes.is_empty());
        assert!(claim.resolved_at.is_none());
    }

    #[test]
    fn suggestion_province_accepts_numeric_string() {
        let suggestion: SuggestionBox =
            serde_json::from_value(json!({"province": "12"})).unwrap();
        assert_eq!(suggestion.province, Some(12));
        let suggestion: SuggestionBox =
            serde_json::from_value(json!({"province": "santo domingo"})).unwrap();
        assert_eq!(suggestion.province, None);
    }

    #[test]
    fn fraud_file_ignores_non_string_values() {
        let report: FraudReport =
            serde_json::from_value(json!({"file": {"name": "captura.png"}})).unwrap();
        assert!(report.file.is_none());
        let report: FraudReport =
            serde_json::from_value(json!({"file": "fraud_reports/captura.png"})).unwrap();
        assert_eq!(report.file.as_deref(), Some("fraud_reports/captura.png"));
    }

    #[test]
    fn rights_section_ids_use_camel_case() {
        let section: RightsAndDutiesSection =
            serde_json::from_value(json!({"section_id": "otherRights"})).unwrap();
        assert_eq!(section.section_id, RightsSectionId::OtherRights);
        assert_eq!(section.section_id.as_str(), "otherRights");
    }
}
