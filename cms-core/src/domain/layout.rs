use super::RecordMeta;
use crate::common::text::split_csv;
use crate::record;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Footer {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub sections: String,
    pub company_name: String,
    pub company_description: String,
    pub company_phone: String,
    pub company_email: String,
    pub location_address: String,
    pub location_city: String,
    pub location_country: String,
}
record!(Footer, "layout.footer");

impl Footer {
    pub fn sections_list(&self) -> Vec<String> {
        split_csv(&self.sections)
    }
}
