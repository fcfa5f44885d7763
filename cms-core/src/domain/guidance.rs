use super::RecordMeta;
use crate::record;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SavingTip {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    /// Rich text.
    pub content: String,
    pub link: String,
    pub order: u32,
}
record!(SavingTip, "guidance.saving_tip");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderSlide {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub image_url: String,
    pub title: String,
    pub description: String,
    pub order: u32,
}
record!(SliderSlide, "guidance.slider_slide");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqItem {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub question: String,
    pub answer: String,
    pub order: u32,
}
record!(FaqItem, "guidance.faq_item");
