//! Product catalog: accounts, loans, cards and certificates under
//! `/api/products/` and `/api/productos/`, plus banners and loan types.

use super::{record_json, route_both, with_meta, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use cms_core::storage::{self, Storage};
use cms_core::{Account, Banner, Card, Certificate, Loan, LoanType, Record, Titled};
use serde_json::{json, Value};

/// A catalog kind with its public shape.
trait Product: Record + Titled {
    /// Used in 404 messages.
    const LABEL: &'static str;

    fn view(&self, state: &AppState) -> Value;
}

impl Product for Account {
    const LABEL: &'static str = "Account";

    fn view(&self, state: &AppState) -> Value {
        let view = json!({
            "id": self.id(),
            "title": self.title,
            "description": self.description,
            "bannerImage": state.media_url(&self.banner_image),
            "accountImage": state.media_url(&self.account_image),
            "category": self.category,
            "features": self.features_list(),
            "requirements": self.requirements_list(),
            "benefits": self.benefits,
            "slug": self.slug(),
        });
        with_meta(view, &self.meta)
    }
}

impl Product for Loan {
    const LABEL: &'static str = "Loan";

    fn view(&self, _state: &AppState) -> Value {
        let view = json!({
            "id": self.id(),
            "title": self.title,
            "description": self.description,
            "loan_type": self.loan_type,
            "details": self.details_list(),
            "requirements_title": self.requirements_title,
            "requirements": self.requirements_list(),
        });
        with_meta(view, &self.meta)
    }
}

impl Product for Card {
    const LABEL: &'static str = "Card";

    fn view(&self, state: &AppState) -> Value {
        let view = json!({
            "id": self.id(),
            "title": self.title,
            "description": self.description,
            "bannerImage": state.media_url(&self.banner_image),
            "cardImage": state.media_url(&self.card_image),
            "card_type": self.card_type,
            "features": self.features_list(),
            "requirements": self.requirements_list(),
            "benefits": self.benefits,
            "slug": self.slug(),
        });
        with_meta(view, &self.meta)
    }
}

impl Product for Certificate {
    const LABEL: &'static str = "Certificate";

    fn view(&self, state: &AppState) -> Value {
        let image = state.media_url(&self.certificate_image);
        let view = json!({
            "id": self.id(),
            "title": self.title,
            "subtitle": self.subtitle,
            "description": self.description,
            "bannerImage": state.media_url(&self.banner_image),
            "certificateImage": image,
            "certificate_type": self.certificate_type,
            "cta_apply": self.cta_apply,
            "cta_rates": self.cta_rates,
            "benefits_title": self.benefits_title,
            "benefits": {"title": self.benefits_title, "items": self.benefits},
            "investment_title": self.investment_title,
            "investment_subtitle": self.investment_subtitle,
            "investment": {
                "title": self.investment_title,
                "subtitle": self.investment_subtitle,
                "details": self.investment_details_list(),
                "imageUrl": image,
            },
            "rates_title": self.rates_title,
            "rates": {"title": self.rates_title, "items": self.rates},
            "requirements_title": self.requirements_title,
            "requirements": {"title": self.requirements_title, "items": self.requirements_list()},
            "deposit_rates_title": self.deposit_rates_title,
            "depositRates": {
                "title": self.deposit_rates_title,
                "items": self.deposit_rates,
                "validFrom": self.deposit_rates_valid_from,
            },
            "deposit_rates_valid_from": self.deposit_rates_valid_from,
            "faq_title": self.faq_title,
            "faq": {"title": self.faq_title, "items": self.faq},
            "slug": self.slug(),
        });
        with_meta(view, &self.meta)
    }
}

/// Mounts every catalog route below the API root (normally `/api`).
pub fn routes(api_root: &str) -> Router<AppState> {
    let root = api_root.trim_end_matches('/');
    let mut router = Router::new();

    router = route_both(router, &format!("{root}/products/"), get(list_products::<Account>));
    router = route_both(router, &format!("{root}/products/:id"), get(product_by_id::<Account>));
    router = catalog::<Account>(router, root, "accounts", "cuenta");
    router = catalog::<Loan>(router, root, "loans", "prestamo");
    router = catalog::<Card>(router, root, "cards", "tarjeta");
    router = catalog::<Certificate>(router, root, "certificates", "certificado");

    router = route_both(router, &format!("{root}/banners/"), get(banners));
    router = route_both(router, &format!("{root}/banners/main"), get(main_banner));
    router = route_both(router, &format!("{root}/banners/:id"), get(banner_detail));
    router = route_both(router, &format!("{root}/loan-types/"), get(loan_types));
    router = route_both(router, &format!("{root}/loan-types/:id"), get(loan_type_detail));
    router
}

fn catalog<T: Product>(
    router: Router<AppState>,
    root: &str,
    plural: &str,
    spanish: &str,
) -> Router<AppState> {
    let router = route_both(router, &format!("{root}/products/{plural}"), get(list_products::<T>));
    let router = route_both(
        router,
        &format!("{root}/products/{plural}/:slug"),
        get(product_by_slug::<T>),
    );
    route_both(
        router,
        &format!("{root}/productos/{spanish}/:key"),
        get(product_by_key::<T>),
    )
}

/// Active rows by creation time, newest first.
async fn newest_first<T: Record>(storage: &dyn Storage) -> cms_core::Result<Vec<T>> {
    let mut rows = storage::list_active::<T>(storage).await?;
    rows.sort_by(|a, b| (b.meta().created_at, b.id()).cmp(&(a.meta().created_at, a.id())));
    Ok(rows)
}

async fn list_products<T: Product>(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rows = newest_first::<T>(state.storage()).await?;
    Ok(Json(Value::Array(rows.iter().map(|r| r.view(&state)).collect())))
}

async fn find_by_slug<T: Product>(state: &AppState, slug: &str) -> ApiResult<Value> {
    storage::list_active::<T>(state.storage())
        .await?
        .iter()
        .find(|row| row.matches_slug(slug))
        .map(|row| row.view(state))
        .ok_or_else(|| ApiError::not_found(format!("{} with slug \"{}\" not found", T::LABEL, slug)))
}

async fn find_by_id<T: Product>(state: &AppState, raw: &str) -> ApiResult<Value> {
    let missing = || ApiError::not_found(format!("{} with ID \"{}\" not found", T::LABEL, raw));
    let id: i64 = raw.parse().map_err(|_| missing())?;
    storage::get_active::<T>(state.storage(), id)
        .await?
        .map(|row| row.view(state))
        .ok_or_else(missing)
}

async fn product_by_slug<T: Product>(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(find_by_slug::<T>(&state, &slug).await?))
}

async fn product_by_id<T: Product>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(find_by_id::<T>(&state, &id).await?))
}

/// All-digit keys are ids, anything else a slug.
async fn product_by_key<T: Product>(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Value>> {
    let view = if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
        find_by_id::<T>(&state, &key).await?
    } else {
        find_by_slug::<T>(&state, &key).await?
    };
    Ok(Json(view))
}

async fn ordered_banners(storage: &dyn Storage) -> cms_core::Result<Vec<Banner>> {
    let mut rows = storage::list_active::<Banner>(storage).await?;
    rows.sort_by(|a, b| (a.order, &a.title, a.id()).cmp(&(b.order, &b.title, b.id())));
    Ok(rows)
}

async fn banners(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rows = ordered_banners(state.storage()).await?;
    Ok(Json(record_json(&rows)?))
}

async fn main_banner(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let banner = ordered_banners(state.storage())
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("No active banners found"))?;
    Ok(Json(record_json(&banner)?))
}

async fn active_detail<T: Record>(state: &AppState, raw: &str) -> ApiResult<Json<Value>> {
    let id: i64 = raw.parse().map_err(|_| ApiError::not_found("Not found."))?;
    let row = storage::get_active::<T>(state.storage(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;
    Ok(Json(record_json(&row)?))
}

async fn banner_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    active_detail::<Banner>(&state, &id).await
}

async fn loan_types(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut rows = storage::list_active::<LoanType>(state.storage()).await?;
    rows.sort_by(|a, b| (a.order, &a.name, a.id()).cmp(&(b.order, &b.name, b.id())));
    Ok(Json(record_json(&rows)?))
}

async fn loan_type_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    active_detail::<LoanType>(&state, &id).await
}
