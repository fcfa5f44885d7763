use super::{Record, RecordMeta};
use crate::common::error::ValidationErrors;
use crate::common::text::{spanish_long_date, split_csv};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    Image,
    Video,
    Document,
}

/// Attachment owned by a news item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsMedia {
    pub media_type: MediaType,
    pub file: String,
    pub caption: String,
    pub order: u32,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Default for NewsMedia {
    fn default() -> Self {
        Self {
            media_type: MediaType::default(),
            file: String::new(),
            caption: String::new(),
            order: 0,
            is_active: true,
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct News {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub image: String,
    pub author: String,
    pub category: String,
    pub tags: String,
    pub fecha_publicacion: Option<DateTime<Utc>>,
    /// Rich text.
    pub full_content: String,
    pub media: Vec<NewsMedia>,
    pub media_urls: String,
    pub related_links: String,
}

impl Record for News {
    const KIND: &'static str = "news.news";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn before_save(&mut self) {
        let now = Utc::now();
        for media in &mut self.media {
            media.created_at.get_or_insert(now);
        }
        if self.fecha_publicacion.is_none() {
            self.fecha_publicacion = Some(now);
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, Some(200));
        errors.into_result()
    }
}

impl News {
    pub fn tags_list(&self) -> Vec<String> {
        split_csv(&self.tags)
    }

    pub fn related_links_list(&self) -> Vec<String> {
        split_csv(&self.related_links)
    }

    pub fn formatted_date(&self) -> Option<String> {
        self.fecha_publicacion
            .map(|date| spanish_long_date(date.date_naive()))
    }

    /// Active attachments by `order`, then creation time.
    pub fn active_media(&self) -> Vec<&NewsMedia> {
        let mut media: Vec<&NewsMedia> = self.media.iter().filter(|m| m.is_active).collect();
        media.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
        media
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Promotion {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: String,
    pub image: String,
    pub category: String,
    pub tags: String,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    pub full_content: String,
    pub terms: String,
    pub media_urls: String,
    pub related_links: String,
}

impl Record for Promotion {
    const KIND: &'static str = "news.promotion";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, Some(200));
        if let (Some(start), Some(end)) = (self.fecha_inicio, self.fecha_fin) {
            if end < start {
                errors.add("fecha_fin", "La fecha de fin debe ser posterior a la de inicio.");
            }
        }
        errors.into_result()
    }
}

impl Promotion {
    pub fn tags_list(&self) -> Vec<String> {
        split_csv(&self.tags)
    }

    pub fn terms_list(&self) -> Vec<String> {
        split_csv(&self.terms)
    }

    pub fn media_list(&self) -> Vec<String> {
        split_csv(&self.media_urls)
    }

    pub fn related_links_list(&self) -> Vec<String> {
        split_csv(&self.related_links)
    }

    pub fn valid_until(&self) -> Option<String> {
        self.fecha_fin.map(spanish_long_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn media_ordering_skips_inactive() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let news = News {
            media: vec![
                NewsMedia { file: "b.jpg".into(), order: 1, created_at: Some(t0), ..Default::default() },
                NewsMedia { file: "hidden.jpg".into(), order: 0, is_active: false, ..Default::default() },
                NewsMedia { file: "a2.jpg".into(), order: 0, created_at: Some(t1), ..Default::default() },
                NewsMedia { file: "a1.jpg".into(), order: 0, created_at: Some(t0), ..Default::default() },
            ],
            ..Default::default()
        };
        let files: Vec<&str> = news.active_media().iter().map(|m| m.file.as_str()).collect();
        assert_eq!(files, vec!["a1.jpg", "a2.jpg", "b.jpg"]);
    }

    #[test]
    fn promotion_end_before_start_is_rejected() {
        let promotion = Promotion {
            title: "Verano".into(),
            fecha_inicio: NaiveDate::from_ymd_opt(2025, 3, 1),
            fecha_fin: NaiveDate::from_ymd_opt(2025, 2, 1),
            ..Default::default()
        };
        let errors = promotion.validate().unwrap_err();
        assert!(errors.contains("fecha_fin"));
    }

    #[test]
    fn valid_until_is_spanish() {
        let promotion = Promotion {
            fecha_fin: NaiveDate::from_ymd_opt(2025, 3, 31),
            ..Default::default()
        };
        assert_eq!(promotion.valid_until().as_deref(), Some("31 de marzo, 2025"));
    }
}
