use super::{record_json, route_both, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use cms_core::storage;
use cms_core::Footer;
use serde_json::{json, Value};

pub fn routes(prefix: &str) -> Router<AppState> {
    let p = prefix.trim_end_matches('/');
    route_both(Router::new(), &format!("{p}/footer"), get(footer))
}

async fn footer(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let footer = storage::first_active::<Footer>(state.storage())
        .await?
        .ok_or_else(|| ApiError::not_found("Footer not found"))?;

    let mut view = record_json(&footer)?;
    if let Some(obj) = view.as_object_mut() {
        obj.insert("sections".to_string(), json!(footer.sections_list()));
        obj.insert(
            "company".to_string(),
            json!({
                "name": footer.company_name,
                "description": footer.company_description,
                "phone": footer.company_phone,
                "email": footer.company_email,
            }),
        );
        obj.insert(
            "location".to_string(),
            json!({
                "address": footer.location_address,
                "city": footer.location_city,
                "country": footer.location_country,
            }),
        );
    }
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{get_json, test_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn footer_groups_company_and_location() {
        let state = test_state();
        let app = routes("/api/layout").with_state(state.clone());
        let (status, _) = get_json(app.clone(), "/api/layout/footer/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut footer = Footer {
            sections: "Productos, Servicios".to_string(),
            company_name: "ASOMAP".to_string(),
            location_city: "San Francisco de Macorís".to_string(),
            ..Default::default()
        };
        storage::save(state.storage(), &mut footer).await.unwrap();

        let (status, body) = get_json(app, "/api/layout/footer").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sections"], json!(["Productos", "Servicios"]));
        assert_eq!(body["company"]["name"], "ASOMAP");
        assert_eq!(body["location"]["city"], "San Francisco de Macorís");
    }
}
