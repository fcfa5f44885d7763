//! `/api/home/`: the landing page blocks. Missing blocks answer 404 with
//! row counts under `debug_info` to help editors spot deactivated content.

use super::{route_both, with_meta, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use cms_core::storage::{self, Storage};
use cms_core::{
    DebitCardPromo, EducationItem, EducationSection, PeKeAccountSummary, Product, ProductSection,
    Record, SliderItem,
};
use serde_json::{json, Value};
use std::collections::HashMap;

pub fn routes(prefix: &str) -> Router<AppState> {
    let p = prefix.trim_end_matches('/');
    let mut router = Router::new();
    router = route_both(router, &format!("{p}/debit-card-promo"), get(debit_card_promo));
    router = route_both(router, &format!("{p}/education-section"), get(education_section));
    router = route_both(router, &format!("{p}/peke-account-summary"), get(peke_account_summary));
    router = route_both(router, &format!("{p}/product-section"), get(product_section));
    router = route_both(router, &format!("{p}/slider"), get(slider));
    router
}

/// `(active, total)` row counts for a kind.
async fn counts<T: Record>(storage: &dyn Storage) -> cms_core::Result<(usize, usize)> {
    let rows = storage::list::<T>(storage).await?;
    let active = rows.iter().filter(|r| r.is_active()).count();
    Ok((active, rows.len()))
}

/// Active rows of `T` picked by id, in `order`.
async fn members_by_order<T, F>(storage: &dyn Storage, ids: &[i64], order: F) -> cms_core::Result<Vec<T>>
where
    T: Record,
    F: Fn(&T) -> u32,
{
    let mut by_id: HashMap<i64, T> = storage::list_active::<T>(storage)
        .await?
        .into_iter()
        .map(|row| (row.id(), row))
        .collect();
    let mut members: Vec<T> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
    members.sort_by_key(|row| (order(row), row.id()));
    Ok(members)
}

async fn debit_card_promo(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let Some(promo) = storage::first_active::<DebitCardPromo>(storage).await? else {
        let (active, total) = counts::<DebitCardPromo>(storage).await?;
        return Err(ApiError::not_found_with(
            "Debit card promotion not found",
            json!({"active_promos_count": active, "total_promos_count": total}),
        ));
    };

    let view = json!({
        "id": promo.id(),
        "title": promo.title,
        "highlighted_title": promo.highlighted_title,
        "description": promo.description,
        "primary_button_text": promo.primary_button_text,
        "secondary_button_text": promo.secondary_button_text,
        "image_url": state.media_url(&promo.image),
        "image_alt": promo.image_alt,
    });
    Ok(Json(with_meta(view, &promo.meta)))
}

async fn education_section(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let Some(section) = storage::first_active::<EducationSection>(storage).await? else {
        let (active, total) = counts::<EducationSection>(storage).await?;
        let (_, items) = counts::<EducationItem>(storage).await?;
        return Err(ApiError::not_found_with(
            "Education section not found",
            json!({
                "active_sections_count": active,
                "total_sections_count": total,
                "total_items_count": items,
            }),
        ));
    };

    let items: Vec<Value> =
        members_by_order::<EducationItem, _>(storage, &section.education_item_ids, |i| i.order)
            .await?
            .iter()
            .map(|item| {
                json!({
                    "image": state.media_url(&item.image),
                    "alt": item.alt,
                    "description": item.description,
                })
            })
            .collect();

    Ok(Json(json!({
        "data": {
            "title": section.title,
            "subtitle": section.subtitle,
            "educationItems": items,
            "footerText": section.footer_text,
        }
    })))
}

async fn peke_account_summary(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let Some(summary) = storage::first_active::<PeKeAccountSummary>(storage).await? else {
        let (active, total) = counts::<PeKeAccountSummary>(storage).await?;
        return Err(ApiError::not_found_with(
            "PeKe account summary not found",
            json!({"active_summaries_count": active, "total_summaries_count": total}),
        ));
    };

    let view = json!({
        "id": summary.id(),
        "title": summary.title,
        "description": summary.description,
        "button_text": summary.button_text,
        "image_url": state.media_url(&summary.image),
        "image_alt": summary.image_alt,
    });
    Ok(Json(with_meta(view, &summary.meta)))
}

async fn product_section(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let Some(section) = storage::first_active::<ProductSection>(storage).await? else {
        let (active, total) = counts::<ProductSection>(storage).await?;
        let (_, products) = counts::<Product>(storage).await?;
        return Err(ApiError::not_found_with(
            "Product section not found",
            json!({
                "active_sections_count": active,
                "total_sections_count": total,
                "total_products_count": products,
            }),
        ));
    };

    let products: Vec<Value> =
        members_by_order::<Product, _>(storage, &section.product_ids, |p| p.order)
            .await?
            .iter()
            .map(|product| {
                json!({
                    "id": product.id().to_string(),
                    "title": product.title,
                    "description": product.description,
                    "image": state.media_url(&product.image),
                    "category": product.category,
                    "imageWidth": product.image_width,
                    "imageHeight": product.image_height,
                })
            })
            .collect();

    Ok(Json(json!({
        "data": {
            "section": {
                "title": section.title,
                "subtitle": section.subtitle,
            },
            "buttonText": section.button_text,
            "products": products,
        }
    })))
}

async fn slider(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let mut items = storage::list_active::<SliderItem>(storage).await?;
    if items.is_empty() {
        let (active, total) = counts::<SliderItem>(storage).await?;
        return Err(ApiError::not_found_with(
            "Slider items not found",
            json!({"active_items_count": active, "total_items_count": total}),
        ));
    }
    items.sort_by_key(|item| (item.order, item.id()));

    let slides: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "id": item.id(),
                "image": state.media_url(&item.image_desktop),
                "imageTablet": state.media_url(&item.image_tablet),
                "imageMobile": state.media_url(&item.image_mobile),
                "alt": item.alt,
            })
        })
        .collect();
    Ok(Json(Value::Array(slides)))
}
