use super::{Record, RecordMeta};
use crate::common::error::ValidationErrors;
use crate::common::text::{slugify, split_csv};
use crate::record;
use serde::{Deserialize, Serialize};

/// Titled bullet shown on account and card pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconBenefit {
    pub icon: String,
    pub text: String,
}

/// Shared lookup used by the slug routes.
pub trait Titled {
    fn title(&self) -> &str;

    fn slug(&self) -> String {
        slugify(self.title())
    }

    /// Case-insensitive title containment, with slug dashes read as spaces.
    fn matches_slug(&self, slug: &str) -> bool {
        let needle = slug.replace('-', " ").to_lowercase();
        self.title().to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    #[default]
    Savings,
    Checking,
    Business,
    Student,
    ClassicPhysical,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub banner_image: String,
    pub account_image: String,
    pub category: AccountCategory,
    pub features: String,
    pub requirements: String,
    pub benefits: Vec<IconBenefit>,
}

impl Record for Account {
    const KIND: &'static str = "products.account";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, Some(200));
        errors.into_result()
    }
}

impl Titled for Account {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Account {
    pub fn features_list(&self) -> Vec<String> {
        split_csv(&self.features)
    }

    pub fn requirements_list(&self) -> Vec<String> {
        split_csv(&self.requirements)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanKind {
    #[default]
    HomePurchase,
    Remodelation,
    Construction,
    LandPurchase,
    Consumer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Loan {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub loan_type: LoanKind,
    pub details: String,
    pub requirements_title: String,
    pub requirements: String,
}
record!(Loan, "products.loan");

impl Default for Loan {
    fn default() -> Self {
        Self {
            meta: RecordMeta::default(),
            title: String::new(),
            description: String::new(),
            loan_type: LoanKind::default(),
            details: String::new(),
            requirements_title: "Requisitos para Crédito Hipotecario".to_string(),
            requirements: String::new(),
        }
    }
}

impl Titled for Loan {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Loan {
    pub fn details_list(&self) -> Vec<String> {
        split_csv(&self.details)
    }

    pub fn requirements_list(&self) -> Vec<String> {
        split_csv(&self.requirements)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    #[default]
    Debit,
    Credit,
    Prepaid,
    Business,
    Student,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub banner_image: String,
    pub card_image: String,
    pub card_type: CardType,
    pub features: String,
    pub requirements: String,
    pub benefits: Vec<IconBenefit>,
}
record!(Card, "products.card");

impl Titled for Card {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Card {
    pub fn features_list(&self) -> Vec<String> {
        split_csv(&self.features)
    }

    pub fn requirements_list(&self) -> Vec<String> {
        split_csv(&self.requirements)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateType {
    #[default]
    Financial,
    Investment,
    Savings,
    Business,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateBenefit {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateRate {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositRate {
    pub range: String,
    pub rate: String,
    pub term: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateFaq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Certificate {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub banner_image: String,
    pub certificate_image: String,
    pub certificate_type: CertificateType,
    pub cta_apply: String,
    pub cta_rates: String,
    pub benefits_title: String,
    pub benefits: Vec<CertificateBenefit>,
    pub investment_title: String,
    pub investment_subtitle: String,
    pub investment_details: String,
    pub rates_title: String,
    pub rates: Vec<CertificateRate>,
    pub requirements_title: String,
    pub requirements: String,
    pub deposit_rates_title: String,
    pub deposit_rates: Vec<DepositRate>,
    pub deposit_rates_valid_from: String,
    pub faq_title: String,
    pub faq: Vec<CertificateFaq>,
}
record!(Certificate, "products.certificate");

impl Default for Certificate {
    fn default() -> Self {
        Self {
            meta: RecordMeta::default(),
            title: String::new(),
            subtitle: String::new(),
            description: String::new(),
            banner_image: String::new(),
            certificate_image: String::new(),
            certificate_type: CertificateType::default(),
            cta_apply: "Solicitar".to_string(),
            cta_rates: "Tarifario".to_string(),
            benefits_title: "Beneficios de tu Certificado Financiero".to_string(),
            benefits: Vec::new(),
            investment_title: "Tu nueva Inversión".to_string(),
            investment_subtitle: "Especificaciones del depósito a plazo fijo para personas:"
                .to_string(),
            investment_details: String::new(),
            rates_title: "Tarifas".to_string(),
            rates: Vec::new(),
            requirements_title: "Requisitos".to_string(),
            requirements: String::new(),
            deposit_rates_title: "Escala de Tasas de Captaciones de Depósitos".to_string(),
            deposit_rates: Vec::new(),
            deposit_rates_valid_from: "Vigente desde el 31 de enero del 2023".to_string(),
            faq_title: "Preguntas Frecuentes Certificado Financiero".to_string(),
            faq: Vec::new(),
        }
    }
}

impl Titled for Certificate {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Certificate {
    pub fn investment_details_list(&self) -> Vec<String> {
        split_csv(&self.investment_details)
    }

    pub fn requirements_list(&self) -> Vec<String> {
        split_csv(&self.requirements)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Banner {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub button1_name: String,
    pub button1_url: String,
    pub button2_name: String,
    pub button2_url: String,
    pub order: u32,
    pub slug: String,
}

impl Record for Banner {
    const KIND: &'static str = "products.banner";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn before_save(&mut self) {
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.title);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanType {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub order: u32,
}

impl Record for LoanType {
    const KIND: &'static str = "products.loan_type";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn before_save(&mut self) {
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.name);
        }
    }
}
