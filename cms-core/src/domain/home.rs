use super::RecordMeta;
use crate::record;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebitCardPromo {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub highlighted_title: String,
    pub description: String,
    pub primary_button_text: String,
    pub secondary_button_text: String,
    pub image: String,
    pub image_alt: String,
}
record!(DebitCardPromo, "home.debit_card_promo");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationItem {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub image: String,
    pub alt: String,
    pub description: String,
    pub order: u32,
}
record!(EducationItem, "home.education_item");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationSection {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub subtitle: String,
    pub education_item_ids: Vec<i64>,
    pub footer_text: String,
}
record!(EducationSection, "home.education_section", singleton);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeKeAccountSummary {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub button_text: String,
    pub image: String,
    pub image_alt: String,
}
record!(PeKeAccountSummary, "home.peke_account_summary", singleton);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    #[default]
    Prestamos,
    Cuentas,
    Tarjetas,
    Certificados,
}

/// Product teaser shown on the home page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub image: String,
    pub category: ProductCategory,
    pub image_width: u32,
    pub image_height: u32,
    pub order: u32,
}
record!(Product, "home.product");

impl Default for Product {
    fn default() -> Self {
        Self {
            meta: RecordMeta::default(),
            title: String::new(),
            description: String::new(),
            image: String::new(),
            category: ProductCategory::default(),
            image_width: 600,
            image_height: 400,
            order: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSection {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
    pub product_ids: Vec<i64>,
}
record!(ProductSection, "home.product_section", singleton);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderItem {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub image_desktop: String,
    pub image_tablet: String,
    pub image_mobile: String,
    pub alt: String,
    pub order: u32,
}
record!(SliderItem, "home.slider_item");
