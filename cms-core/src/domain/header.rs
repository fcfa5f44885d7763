use super::RecordMeta;
use crate::common::text::split_csv;
use crate::record;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationType {
    #[default]
    Individual,
    Empresarial,
}

impl NavigationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationType::Individual => "individual",
            NavigationType::Empresarial => "empresarial",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NavigationType::Individual => "Individual",
            NavigationType::Empresarial => "Empresarial",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Navigation {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub navigation_type: NavigationType,
    pub menu_items: String,
}
record!(Navigation, "header.navigation");

impl Navigation {
    pub fn menu_items_list(&self) -> Vec<String> {
        split_csv(&self.menu_items)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeRate {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub show_buy_rate: bool,
    pub show_sell_rate: bool,
    pub currency_name: String,
    pub buy_rate: f64,
    pub sell_rate: f64,
}
record!(ExchangeRate, "header.exchange_rate", singleton);

impl Default for ExchangeRate {
    fn default() -> Self {
        Self {
            meta: RecordMeta::default(),
            show_buy_rate: true,
            show_sell_rate: false,
            currency_name: "US DOLAR".to_string(),
            buy_rate: 55.50,
            sell_rate: 56.50,
        }
    }
}
