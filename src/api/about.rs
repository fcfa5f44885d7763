//! `/api/about/`: institutional pages, community support and the document
//! libraries (financial statements, annual memories, policies).

use super::{record_json, route_both, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use cms_core::storage::{self, Storage};
use cms_core::{
    CommunityCategory, CommunityInitiative, CommunitySupport, Director, FinancialDocument,
    FinancialStatementsConfig, Hero, MemoryConfig, MemoryDocument, Mision, NuestraHistoria,
    PolicyCategory, PolicyConfig, PolicyDocument, QuienesSomos, Record, Valor, Vision,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

pub fn routes(prefix: &str) -> Router<AppState> {
    let p = prefix.trim_end_matches('/');
    let mut router = Router::new();
    router = route_both(router, &format!("{p}/hero"), get(hero));
    router = route_both(router, &format!("{p}/quienes-somos"), get(quienes_somos));
    router = route_both(router, &format!("{p}/nuestra-historia"), get(nuestra_historia));
    router = route_both(router, &format!("{p}/mision"), get(mision));
    router = route_both(router, &format!("{p}/vision"), get(vision));
    router = route_both(router, &format!("{p}/valores"), get(valores));
    router = route_both(router, &format!("{p}/consejo-directores"), get(consejo_directores));
    router = route_both(router, &format!("{p}/community-categories"), get(community_categories));
    router = route_both(router, &format!("{p}/community-initiatives"), get(community_initiatives));
    router = route_both(router, &format!("{p}/community-support"), get(community_support));
    router = route_both(router, &format!("{p}/financial-statements"), get(financial_statements));
    router = route_both(router, &format!("{p}/memories"), get(memories));
    router = route_both(router, &format!("{p}/policies"), get(policies));
    router
}

async fn newest_active<T: Record>(state: &AppState, missing: &str) -> ApiResult<Json<Value>> {
    match storage::first_active::<T>(state.storage()).await? {
        Some(record) => Ok(Json(record_json(&record)?)),
        None => Err(ApiError::not_found(missing)),
    }
}

/// Active rows by creation time, newest first.
async fn newest_created<T: Record>(storage: &dyn Storage) -> cms_core::Result<Vec<T>> {
    let mut rows = storage::list_active::<T>(storage).await?;
    rows.sort_by(|a, b| {
        (b.meta().created_at, b.id()).cmp(&(a.meta().created_at, a.id()))
    });
    Ok(rows)
}

/// Replaces the stored `image_src` path with its absolute media URL.
fn with_image(mut view: Value, state: &AppState, image_src: &str) -> Value {
    if let Some(obj) = view.as_object_mut() {
        obj.insert("image_src".to_string(), json!(state.media_url(image_src)));
    }
    view
}

fn paragraphs_view(record: Value, paragraphs: Vec<String>) -> Value {
    let mut record = record;
    if let Some(obj) = record.as_object_mut() {
        obj.insert("paragraphs".to_string(), json!(paragraphs));
    }
    record
}

async fn hero(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    newest_active::<Hero>(&state, "Hero section not found").await
}

async fn quienes_somos(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let record = storage::first_active::<QuienesSomos>(state.storage())
        .await?
        .ok_or_else(|| ApiError::not_found("Quienes Somos not found"))?;
    let view = with_image(record_json(&record)?, &state, &record.image_src);
    Ok(Json(paragraphs_view(view, record.paragraphs_list())))
}

async fn nuestra_historia(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rows = newest_created::<NuestraHistoria>(state.storage()).await?;
    let views = rows
        .iter()
        .map(|row| {
            let view = with_image(record_json(row)?, &state, &row.image_src);
            Ok(paragraphs_view(view, row.paragraphs_list()))
        })
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(Value::Array(views)))
}

async fn mision(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    newest_active::<Mision>(&state, "Mision not found").await
}

async fn vision(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    newest_active::<Vision>(&state, "Vision not found").await
}

async fn valores(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rows = newest_created::<Valor>(state.storage()).await?;
    Ok(Json(record_json(&rows)?))
}

async fn consejo_directores(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rows = newest_created::<Director>(state.storage()).await?;
    let views = rows
        .iter()
        .map(|row| Ok(with_image(record_json(row)?, &state, &row.image_src)))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(Value::Array(views)))
}

async fn community_categories(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rows = storage::list_active::<CommunityCategory>(state.storage()).await?;
    Ok(Json(record_json(&rows)?))
}

/// Active initiatives ordered by category then id, each with its category
/// nested.
async fn initiative_views(state: &AppState) -> ApiResult<Vec<Value>> {
    let storage = state.storage();
    let categories: HashMap<i64, CommunityCategory> = storage::list::<CommunityCategory>(storage)
        .await?
        .into_iter()
        .map(|c| (c.id(), c))
        .collect();

    let mut initiatives = storage::list_active::<CommunityInitiative>(storage).await?;
    initiatives.sort_by_key(|i| (i.category_id, i.id()));

    initiatives
        .iter()
        .map(|initiative| {
            let mut view = with_image(record_json(initiative)?, state, &initiative.image_src);
            let category = initiative
                .category_id
                .and_then(|id| categories.get(&id))
                .map(record_json)
                .transpose()?;
            if let Some(obj) = view.as_object_mut() {
                obj.insert("category".to_string(), category.unwrap_or(Value::Null));
            }
            Ok(view)
        })
        .collect()
}

async fn community_initiatives(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(Json(Value::Array(initiative_views(&state).await?)))
}

async fn community_support(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let support = storage::first_active::<CommunitySupport>(storage)
        .await?
        .ok_or_else(|| ApiError::not_found("Community support not found"))?;
    let categories = storage::list_active::<CommunityCategory>(storage).await?;
    let initiatives = initiative_views(&state).await?;

    Ok(Json(json!({
        "title": support.title,
        "description": support.description,
        "categories": record_json(&categories)?,
        "initiatives": initiatives,
    })))
}

/// The active singleton, created from its defaults the first time it is asked for.
async fn config_or_default<T: Record + Default>(storage: &dyn Storage) -> cms_core::Result<T> {
    if let Some(config) = storage::first_active::<T>(storage).await? {
        return Ok(config);
    }
    let mut config = T::default();
    storage::save(storage, &mut config).await?;
    info!("Created default {}", T::KIND);
    Ok(config)
}

/// Years in descending order; documents without a year are skipped.
fn group_by_year<'a, D: 'a>(
    docs: impl IntoIterator<Item = &'a D>,
    year_of: impl Fn(&D) -> Option<&str>,
) -> Vec<(String, Vec<&'a D>)> {
    let mut years: BTreeMap<String, Vec<&D>> = BTreeMap::new();
    for doc in docs {
        let Some(year) = year_of(doc).map(str::trim).filter(|y| !y.is_empty()) else {
            continue;
        };
        years.entry(year.to_string()).or_default().push(doc);
    }
    years.into_iter().rev().collect()
}

async fn financial_statements(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let config = config_or_default::<FinancialStatementsConfig>(storage).await?;
    let documents = storage::list_active::<FinancialDocument>(storage).await?;

    let years: Vec<Value> = group_by_year(&documents, |d| d.year.as_deref())
        .into_iter()
        .map(|(year, docs)| {
            let mut audited = Vec::new();
            let mut quarterly = Vec::new();
            for doc in docs {
                let url = state.media_url(&doc.file);
                if doc.is_quarterly() {
                    quarterly.push(json!({"title": doc.title, "url": url, "quarter": doc.quarter}));
                } else {
                    audited.push(json!({"title": doc.title, "url": url}));
                }
            }
            json!({"year": year, "documents": {"audited": audited, "quarterly": quarterly}})
        })
        .collect();

    Ok(Json(json!({
        "title": config.title,
        "description": config.description,
        "years": years,
    })))
}

async fn memories(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let config = config_or_default::<MemoryConfig>(storage).await?;
    let documents = storage::list_active::<MemoryDocument>(storage).await?;

    let years: Vec<Value> = group_by_year(&documents, |d| d.year.as_deref())
        .into_iter()
        .map(|(year, docs)| {
            let documents: Vec<Value> = docs
                .iter()
                .map(|doc| json!({"url": state.media_url(&doc.file)}))
                .collect();
            json!({"year": year, "documents": documents})
        })
        .collect();

    Ok(Json(json!({
        "title": config.title,
        "description": config.description,
        "years": years,
    })))
}

async fn policies(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let config = config_or_default::<PolicyConfig>(storage).await?;
    let documents: HashMap<i64, PolicyDocument> = storage::list_active::<PolicyDocument>(storage)
        .await?
        .into_iter()
        .map(|d| (d.id(), d))
        .collect();

    let mut categories = storage::list_active::<PolicyCategory>(storage).await?;
    categories.sort_by(|a, b| a.title.cmp(&b.title));

    let categories: Vec<Value> = categories
        .iter()
        .map(|category| {
            let documents: Vec<Value> = category
                .document_ids
                .iter()
                .filter_map(|id| documents.get(id))
                .map(|doc| {
                    json!({
                        "title": doc.title,
                        "description": doc.description,
                        "url": state.media_url(&doc.file),
                        "lastUpdate": doc.last_update.map(|d| d.format("%Y-%m-%d").to_string()),
                    })
                })
                .collect();
            json!({
                "title": category.title,
                "icon": category.icon,
                "description": category.description,
                "documents": documents,
            })
        })
        .collect();

    Ok(Json(json!({
        "title": config.title,
        "description": config.description,
        "download_text": config.download_text,
        "last_update_text": config.last_update_text,
        "all_policies_text": config.all_policies_text,
        "categories": categories,
    })))
}
