use super::{route_both, with_meta, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use cms_core::storage;
use cms_core::{Record, ServiceInfo, ServicesPage};
use serde_json::{json, Value};

/// Mounts `/services/` and `/service-info/` under `api_root`.
pub fn routes(api_root: &str) -> Router<AppState> {
    let root = api_root.trim_end_matches('/');
    let mut router = Router::new();
    router = route_both(router, &format!("{root}/services/"), get(list_pages));
    router = route_both(router, &format!("{root}/services/:id"), get(page_detail));
    router = route_both(router, &format!("{root}/service-info/"), get(list_infos));
    router = route_both(router, &format!("{root}/service-info/:id"), get(info_detail));
    router
}

fn info_view(state: &AppState, info: &ServiceInfo) -> Value {
    let pdf_url = if info.pdf_url.trim().is_empty() {
        state.media_url(&info.pdf_file)
    } else {
        Some(info.pdf_url.clone())
    };
    json!({
        "id": info.id(),
        "title": info.title,
        "description": info.description,
        "steps": info.steps,
        "image_url": state.media_url(&info.image),
        "image_alt": info.image_alt,
        "pdf_url": pdf_url,
    })
}

async fn active_infos(state: &AppState) -> ApiResult<Vec<ServiceInfo>> {
    let mut infos = storage::list_active::<ServiceInfo>(state.storage()).await?;
    infos.sort_by_key(|i| (i.order, i.id()));
    Ok(infos)
}

/// Pages with at least one active info, each carrying those infos.
async fn page_views(state: &AppState) -> ApiResult<Vec<Value>> {
    let infos = active_infos(state).await?;
    let pages = storage::list_active::<ServicesPage>(state.storage()).await?;

    Ok(pages
        .iter()
        .filter_map(|page| {
            let own: Vec<&ServiceInfo> = infos
                .iter()
                .filter(|i| i.services_page_id == Some(page.id()))
                .collect();
            if own.is_empty() {
                return None;
            }
            let view = json!({
                "id": page.id(),
                "title": page.title,
                "subtitle": page.subtitle,
                "search_placeholder": page.search_placeholder,
                "no_results_text": page.no_results_text,
                "internet_banking_url": page.internet_banking_url,
                "internet_banking_button": page.internet_banking_button,
                "items": own.iter().map(|i| i.title.as_str()).collect::<Vec<_>>(),
                "item_details": own.iter().map(|i| info_view(state, i)).collect::<Vec<_>>(),
            });
            Some(with_meta(view, &page.meta))
        })
        .collect())
}

async fn list_pages(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(Json(Value::Array(page_views(&state).await?)))
}

async fn page_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id: i64 = id.parse().map_err(|_| ApiError::not_found("Not found."))?;
    page_views(&state)
        .await?
        .into_iter()
        .find(|view| view["id"] == json!(id))
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Not found."))
}

async fn list_infos(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let infos = active_infos(&state).await?;
    Ok(Json(Value::Array(
        infos.iter().map(|i| info_view(&state, i)).collect(),
    )))
}

async fn info_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id: i64 = id.parse().map_err(|_| ApiError::not_found("Not found."))?;
    let info = storage::get_active::<ServiceInfo>(state.storage(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;
    Ok(Json(info_view(&state, &info)))
}
