use super::RecordMeta;
use crate::common::error::ValidationErrors;
use crate::common::text::split_paragraphs;
use crate::record;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Hero {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(Hero, "about.hero");

/// "Quiénes somos" block. `paragraphs` is free text separated by blank lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuienesSomos {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub paragraphs: String,
    pub image_src: String,
    pub image_alt: String,
}
record!(QuienesSomos, "about.quienes_somos");

impl QuienesSomos {
    pub fn paragraphs_list(&self) -> Vec<String> {
        split_paragraphs(&self.paragraphs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NuestraHistoria {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub paragraphs: String,
    pub image_src: String,
    pub image_alt: String,
}
record!(NuestraHistoria, "about.nuestra_historia");

impl NuestraHistoria {
    pub fn paragraphs_list(&self) -> Vec<String> {
        split_paragraphs(&self.paragraphs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Mision {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(Mision, "about.mision");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vision {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(Vision, "about.vision");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Valor {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(Valor, "about.valor");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Director {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub position: String,
    pub image_src: String,
    pub image_alt: String,
}
record!(Director, "about.director");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityCategory {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub icon: String,
    pub description: String,
}
record!(CommunityCategory, "about.community_category");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityInitiative {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub image_src: String,
    pub image_alt: String,
    pub category_id: Option<i64>,
    pub year: Option<i32>,
    pub location: String,
    pub beneficiaries: String,
}
record!(CommunityInitiative, "about.community_initiative");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunitySupport {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(CommunitySupport, "about.community_support");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialDocumentType {
    #[default]
    Audited,
    Quarterly,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialDocument {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub file: String,
    pub quarter: Option<String>,
    pub document_type: FinancialDocumentType,
    pub year: Option<String>,
}
record!(FinancialDocument, "about.financial_document");

impl FinancialDocument {
    /// Quarterly only when typed so and a quarter is present.
    pub fn is_quarterly(&self) -> bool {
        self.document_type == FinancialDocumentType::Quarterly
            && self.quarter.as_deref().is_some_and(|q| !q.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialStatementsConfig {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(FinancialStatementsConfig, "about.financial_statements_config", singleton);

impl Default for FinancialStatementsConfig {
    fn default() -> Self {
        Self {
            meta: RecordMeta::default(),
            title: "Estados Financieros".to_string(),
            description: "Consulta nuestros estados financieros auditados y trimestrales"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryDocument {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub file: String,
    pub year: Option<String>,
}
record!(MemoryDocument, "about.memory_document");

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
}
record!(MemoryConfig, "about.memory_config", singleton);

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            meta: RecordMeta::default(),
            title: "Memorias".to_string(),
            description: "Un recorrido por nuestra historia y logros institucionales".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyDocument {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub file: String,
    pub last_update: Option<NaiveDate>,
}
record!(PolicyDocument, "about.policy_document");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyCategory {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub icon: String,
    pub description: String,
    pub document_ids: Vec<i64>,
}

impl super::Record for PolicyCategory {
    const KIND: &'static str = "about.policy_category";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn before_save(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.document_ids.retain(|id| seen.insert(*id));
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, Some(200));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub download_text: String,
    pub last_update_text: String,
    pub all_policies_text: String,
}
record!(PolicyConfig, "about.policy_config", singleton);

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            meta: RecordMeta::default(),
            title: "Políticas".to_string(),
            description: "Nuestras políticas institucionales garantizan la transparencia y eficiencia en nuestras operaciones.".to_string(),
            download_text: "Descargar documento".to_string(),
            last_update_text: "Última actualización".to_string(),
            all_policies_text: "Todas las Políticas".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;

    #[test]
    fn quarterly_requires_a_quarter() {
        let mut doc = FinancialDocument {
            document_type: FinancialDocumentType::Quarterly,
            ..Default::default()
        };
        assert!(!doc.is_quarterly());
        doc.quarter = Some("Q2".to_string());
        assert!(doc.is_quarterly());
        doc.document_type = FinancialDocumentType::Audited;
        assert!(!doc.is_quarterly());
    }

    #[test]
    fn config_defaults_survive_sparse_json() {
        let config: PolicyConfig = serde_json::from_value(serde_json::json!({"title": "Normas"})).unwrap();
        assert_eq!(config.title, "Normas");
        assert_eq!(config.download_text, "Descargar documento");
        assert!(config.is_active());
    }

    #[test]
    fn policy_category_dedups_documents() {
        let mut category = PolicyCategory {
            title: "Cumplimiento".to_string(),
            document_ids: vec![3, 1, 3, 2, 1],
            ..Default::default()
        };
        category.before_save();
        assert_eq!(category.document_ids, vec![3, 1, 2]);
    }
}
