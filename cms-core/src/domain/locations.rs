use super::{Record, RecordMeta};
use crate::common::error::ValidationErrors;
use crate::record;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub description: String,
}
record!(Service, "locations.service");

/// Opening hours shared by several locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub is_24_7: bool,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            meta: RecordMeta::default(),
            name: String::new(),
            opening_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            closing_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            is_24_7: false,
        }
    }
}

impl Record for Schedule {
    const KIND: &'static str = "locations.schedule";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn before_save(&mut self) {
        if self.is_24_7 {
            self.opening_time = NaiveTime::MIN;
            self.closing_time = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN);
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, Some(100));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    #[default]
    Branch,
    Atm,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Branch => "branch",
            LocationType::Atm => "atm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub latitude: String,
    pub longitude: String,
    pub schedule_id: Option<i64>,
    pub service_ids: Vec<i64>,
    pub is_open: bool,
}
record!(Location, "locations.location");

impl Location {
    /// Both axes fall back to zero when either fails to parse.
    pub fn coordinates(&self) -> Coordinates {
        match (
            self.latitude.trim().parse::<f64>(),
            self.longitude.trim().parse::<f64>(),
        ) {
            (Ok(lat), Ok(lng)) => Coordinates { lat, lng },
            _ => Coordinates { lat: 0.0, lng: 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_the_clock_schedule_is_normalized() {
        let mut schedule = Schedule {
            name: "24 horas".to_string(),
            is_24_7: true,
            ..Default::default()
        };
        schedule.before_save();
        assert_eq!(schedule.opening_time, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(schedule.closing_time, NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn unparseable_coordinates_become_zero() {
        let mut location = Location {
            latitude: "18.4861".to_string(),
            longitude: "-69.9312".to_string(),
            ..Default::default()
        };
        assert_eq!(location.coordinates(), Coordinates { lat: 18.4861, lng: -69.9312 });
        location.longitude = "oeste".to_string();
        assert_eq!(location.coordinates(), Coordinates { lat: 0.0, lng: 0.0 });
    }

    #[test]
    fn location_type_uses_wire_name() {
        let location: Location =
            serde_json::from_value(serde_json::json!({"type": "atm", "name": "Cajero Centro"})).unwrap();
        assert_eq!(location.location_type, LocationType::Atm);
        assert!(location.is_active());
    }
}
