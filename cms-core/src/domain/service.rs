use super::RecordMeta;
use crate::record;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesPage {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub subtitle: String,
    pub search_placeholder: String,
    pub no_results_text: String,
    pub internet_banking_url: String,
    pub internet_banking_button: String,
}
record!(ServicesPage, "service.services_page", singleton);

impl Default for ServicesPage {
    fn default() -> Self {
        Self {
            meta: RecordMeta::default(),
            title: String::new(),
            subtitle: String::new(),
            search_placeholder: "Buscar servicios...".to_string(),
            no_results_text: "No se encontraron servicios".to_string(),
            internet_banking_url: String::new(),
            internet_banking_button: "Acceder a Banca en Línea".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub services_page_id: Option<i64>,
    pub title: String,
    pub description: String,
    /// Rich text with the steps to request the service.
    pub steps: String,
    pub image: String,
    pub image_alt: String,
    pub pdf_file: String,
    pub pdf_url: String,
    pub order: u32,
}
record!(ServiceInfo, "service.service_info");
