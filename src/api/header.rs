use super::{iso_timestamp, record_json, route_both, with_meta, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use cms_core::storage;
use cms_core::{ExchangeRate, Navigation, Record};
use serde_json::{json, Map, Value};

pub fn routes(prefix: &str) -> Router<AppState> {
    let p = prefix.trim_end_matches('/');
    let mut router = Router::new();
    router = route_both(router, &format!("{p}/"), get(navigation));
    router = route_both(router, &format!("{p}/navigation"), get(navigation));
    router = route_both(router, &format!("{p}/exchange"), get(exchange));
    router = route_both(router, &format!("{p}/header-data"), get(header_data));
    router
}

fn navigation_view(nav: &Navigation) -> ApiResult<Value> {
    let mut view = record_json(nav)?;
    if let Some(obj) = view.as_object_mut() {
        obj.insert("menu_items".to_string(), json!(nav.menu_items_list()));
    }
    Ok(view)
}

fn rates(rate: &ExchangeRate) -> Value {
    json!([{
        "currency": rate.currency_name,
        "buyRate": rate.buy_rate,
        "sellRate": rate.sell_rate,
    }])
}

fn exchange_view(rate: &ExchangeRate) -> Value {
    let view = json!({
        "id": rate.id(),
        "rates": rates(rate),
        "showBuyRate": rate.show_buy_rate,
        "showSellRate": rate.show_sell_rate,
        "lastUpdated": iso_timestamp(&rate.meta),
    });
    with_meta(view, &rate.meta)
}

async fn navigation(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rows = storage::list_active::<Navigation>(state.storage()).await?;
    let views = rows.iter().map(navigation_view).collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(Value::Array(views)))
}

async fn exchange(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rate = storage::first_active::<ExchangeRate>(state.storage())
        .await?
        .ok_or_else(|| ApiError::not_found("Exchange rates not found"))?;
    Ok(Json(exchange_view(&rate)))
}

async fn header_data(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let mut navigation = Map::new();
    for nav in storage::list_active::<Navigation>(storage).await? {
        navigation.insert(
            nav.navigation_type.as_str().to_string(),
            json!(nav.navigation_type.label()),
        );
    }

    let rate = storage::first_active::<ExchangeRate>(storage).await?;
    let defaults = ExchangeRate::default();
    let exchange = json!({
        "base": "Tasa de Cambio",
        "lastUpdated": rate.as_ref().and_then(|r| iso_timestamp(&r.meta)),
        "showBuyRate": rate.as_ref().map_or(defaults.show_buy_rate, |r| r.show_buy_rate),
        "showSellRate": rate.as_ref().map_or(defaults.show_sell_rate, |r| r.show_sell_rate),
        "rates": rate.as_ref().map_or(json!([]), rates),
    });

    Ok(Json(json!({
        "navigation": navigation,
        "exchange": exchange,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{get_json, test_state};
    use axum::http::StatusCode;
    use cms_core::NavigationType;

    #[tokio::test]
    async fn header_data_falls_back_to_defaults() {
        let app = routes("/api/header").with_state(test_state());
        let (status, body) = get_json(app, "/api/header/header-data/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "navigation": {},
                "exchange": {
                    "base": "Tasa de Cambio",
                    "lastUpdated": null,
                    "showBuyRate": true,
                    "showSellRate": false,
                    "rates": []
                }
            })
        );
    }

    #[tokio::test]
    async fn exchange_reports_single_active_rate() {
        let state = test_state();
        let mut old = ExchangeRate::default();
        storage::save(state.storage(), &mut old).await.unwrap();
        let mut current = ExchangeRate {
            buy_rate: 58.25,
            ..Default::default()
        };
        storage::save(state.storage(), &mut current).await.unwrap();

        let mut nav = Navigation {
            navigation_type: NavigationType::Empresarial,
            menu_items: "Cuentas, Préstamos".to_string(),
            ..Default::default()
        };
        storage::save(state.storage(), &mut nav).await.unwrap();

        let app = routes("/api/Header").with_state(state);
        let (status, body) = get_json(app.clone(), "/api/Header/exchange").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rates"][0]["buyRate"], 58.25);
        assert_eq!(body["rates"][0]["currency"], "US DOLAR");

        let (_, body) = get_json(app.clone(), "/api/Header/header-data").await;
        assert_eq!(body["navigation"], json!({"empresarial": "Empresarial"}));

        let (_, body) = get_json(app, "/api/Header/navigation/").await;
        assert_eq!(body[0]["menu_items"], json!(["Cuentas", "Préstamos"]));
    }

    #[tokio::test]
    async fn exchange_missing_is_404() {
        let app = routes("/api/header").with_state(test_state());
        let (status, body) = get_json(app, "/api/header/exchange/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Exchange rates not found");
    }
}
