use super::{route_both, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use cms_core::storage::{self, Storage};
use cms_core::{Location, LocationType, Record, Schedule, Service};
use serde_json::{json, Value};
use std::collections::HashMap;

pub fn routes(prefix: &str) -> Router<AppState> {
    let p = prefix.trim_end_matches('/');
    let mut router = Router::new();
    router = route_both(router, &format!("{p}/"), get(list_locations));
    router = route_both(router, &format!("{p}/branches"), get(branches));
    router = route_both(router, &format!("{p}/atms"), get(atms));
    router = route_both(router, &format!("{p}/:id"), get(location_detail));
    router
}

/// Lookup tables a location view needs.
struct Lookups {
    schedules: HashMap<i64, Schedule>,
    services: HashMap<i64, Service>,
}

impl Lookups {
    async fn load(storage: &dyn Storage) -> cms_core::Result<Self> {
        let schedules = storage::list::<Schedule>(storage)
            .await?
            .into_iter()
            .map(|s| (s.id(), s))
            .collect();
        let services = storage::list_active::<Service>(storage)
            .await?
            .into_iter()
            .map(|s| (s.id(), s))
            .collect();
        Ok(Self { schedules, services })
    }

    fn hours(&self, location: &Location) -> Value {
        let Some(schedule) = location.schedule_id.and_then(|id| self.schedules.get(&id)) else {
            return Value::Null;
        };
        if schedule.is_24_7 {
            return json!({"openingTime": "12:00 AM", "closingTime": "11:59 PM"});
        }
        json!({
            "openingTime": schedule.opening_time.format("%I:%M %p").to_string(),
            "closingTime": schedule.closing_time.format("%I:%M %p").to_string(),
        })
    }

    fn view(&self, location: &Location) -> Value {
        let services: Vec<&str> = location
            .service_ids
            .iter()
            .filter_map(|id| self.services.get(id))
            .map(|s| s.name.as_str())
            .collect();
        json!({
            "id": location.id(),
            "type": location.location_type.as_str(),
            "name": location.name,
            "address": location.address,
            "phone": location.phone,
            "coordinates": location.coordinates(),
            "hours": self.hours(location),
            "is_open": location.is_open,
            "services": services,
        })
    }
}

async fn views_of(state: &AppState, filter: Option<LocationType>) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let lookups = Lookups::load(storage).await?;
    let mut locations = storage::list_active::<Location>(storage).await?;
    if let Some(wanted) = filter {
        locations.retain(|l| l.location_type == wanted);
    }
    // Type is compared by its stored text, so "atm" sorts before "branch"
    locations.sort_by(|a, b| {
        (a.location_type.as_str(), &a.name, a.id())
            .cmp(&(b.location_type.as_str(), &b.name, b.id()))
    });
    Ok(Json(Value::Array(
        locations.iter().map(|l| lookups.view(l)).collect(),
    )))
}

async fn list_locations(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    views_of(&state, None).await
}

async fn branches(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    views_of(&state, Some(LocationType::Branch)).await
}

async fn atms(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    views_of(&state, Some(LocationType::Atm)).await
}

async fn location_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id: i64 = id.parse().map_err(|_| ApiError::not_found("Not found."))?;
    let storage = state.storage();
    let location = storage::get_active::<Location>(storage, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;
    let lookups = Lookups::load(storage).await?;
    Ok(Json(lookups.view(&location)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{get_json, test_state};
    use axum::http::StatusCode;
    use chrono::NaiveTime;
    use cms_core::RecordMeta;

    async fn seed(state: &AppState) -> i64 {
        let storage = state.storage();
        let mut weekday = Schedule {
            name: "Laboral".to_string(),
            opening_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            ..Default::default()
        };
        let weekday_id = storage::save(storage, &mut weekday).await.unwrap();
        let mut always = Schedule {
            name: "24/7".to_string(),
            is_24_7: true,
            ..Default::default()
        };
        let always_id = storage::save(storage, &mut always).await.unwrap();

        let mut deposits = Service {
            name: "Depósitos".to_string(),
            ..Default::default()
        };
        let deposits_id = storage::save(storage, &mut deposits).await.unwrap();
        let mut retired = Service {
            name: "Cambio de cheques".to_string(),
            meta: RecordMeta::inactive(),
            ..Default::default()
        };
        let retired_id = storage::save(storage, &mut retired).await.unwrap();

        let mut atm = Location {
            location_type: LocationType::Atm,
            name: "Cajero Plaza".to_string(),
            schedule_id: Some(always_id),
            ..Default::default()
        };
        storage::save(storage, &mut atm).await.unwrap();
        let mut branch = Location {
            name: "Sucursal Principal".to_string(),
            latitude: "19.3".to_string(),
            longitude: "-70.25".to_string(),
            schedule_id: Some(weekday_id),
            service_ids: vec![deposits_id, retired_id],
            is_open: true,
            ..Default::default()
        };
        storage::save(storage, &mut branch).await.unwrap()
    }

    #[tokio::test]
    async fn branch_view_formats_hours_and_services() {
        let state = test_state();
        let branch_id = seed(&state).await;
        let app = routes("/api/locations").with_state(state);

        let (status, body) = get_json(app, &format!("/api/locations/{branch_id}/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "branch");
        assert_eq!(body["coordinates"], json!({"lat": 19.3, "lng": -70.25}));
        assert_eq!(body["hours"], json!({"openingTime": "08:30 AM", "closingTime": "05:00 PM"}));
        assert_eq!(body["services"], json!(["Depósitos"]));
    }

    #[tokio::test]
    async fn list_orders_by_type_text_then_name() {
        let state = test_state();
        seed(&state).await;
        let mut airport = Location {
            location_type: LocationType::Atm,
            name: "Cajero Aeropuerto".to_string(),
            ..Default::default()
        };
        storage::save(state.storage(), &mut airport).await.unwrap();
        let app = routes("/api/locations").with_state(state);

        let (_, body) = get_json(app.clone(), "/api/locations/").await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["Cajero Aeropuerto", "Cajero Plaza", "Sucursal Principal"]
        );
        assert_eq!(body[0]["type"], "atm");
        assert_eq!(body[2]["type"], "branch");

        let (_, body) = get_json(app, "/api/locations/atms").await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["hours"], Value::Null);
        assert_eq!(body[1]["hours"]["closingTime"], "11:59 PM");
        assert_eq!(body[1]["hours"]["openingTime"], "12:00 AM");
    }
}
