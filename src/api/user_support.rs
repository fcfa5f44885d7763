//! `/api/user-support/`: read-only consumer-protection pages and the three
//! public forms (claims, fraud reports, suggestions).

use super::{record_json, route_both, with_meta, ApiError, ApiResult};
use crate::email;
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use cms_core::storage::{self, Storage};
use cms_core::{
    AbandonedAccountsSection, AccountContractsSection, AccountType, ClaimRequest,
    ClaimRequestPage, Contract, ContractCategory, FraudReport, FraudReportPage, Province, Record,
    RightsAndDutiesImage, RightsAndDutiesPage, RightsAndDutiesSection, ServiceCategory,
    ServiceRate, ServiceRatesPage, Submission, SuggestionBox, SuggestionBoxPage, ValidationErrors,
    YearlyDocument,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

pub fn routes(prefix: &str) -> Router<AppState> {
    let p = prefix.trim_end_matches('/');
    let mut router = Router::new();

    router = read_only::<AbandonedAccountsSection>(router, &format!("{p}/abandoned-accounts"));
    router = read_only::<AccountType>(router, &format!("{p}/account-types"));
    router = read_only::<YearlyDocument>(router, &format!("{p}/yearly-documents"));
    router = read_only::<ContractCategory>(router, &format!("{p}/contract-categories"));
    router = read_only::<AccountContractsSection>(router, &format!("{p}/account-contracts"));
    router = read_only::<Contract>(router, &format!("{p}/contracts"));
    router = read_only::<RightsAndDutiesPage>(router, &format!("{p}/rights-and-duties"));
    router = read_only::<ServiceRatesPage>(router, &format!("{p}/service-rates"));
    router = read_only::<ServiceCategory>(router, &format!("{p}/service-categories"));
    router = read_only::<Province>(router, &format!("{p}/provinces"));
    router = read_only::<SuggestionBoxPage>(router, &format!("{p}/suggestion-box-page"));
    router = read_only::<FraudReportPage>(router, &format!("{p}/fraud-report-page"));
    router = read_only::<ClaimRequestPage>(router, &format!("{p}/claim-request-page"));

    for action in ["by-year", "by_year"] {
        router = route_both(router, &format!("{p}/yearly-documents/{action}"), get(documents_by_year));
    }
    for action in ["by-category", "by_category"] {
        router = route_both(router, &format!("{p}/contracts/{action}"), get(contracts_by_category));
    }

    router = form::<ClaimRequest>(router, &format!("{p}/claim-requests"));
    router = form::<FraudReport>(router, &format!("{p}/fraud-reports"));
    router = form::<SuggestionBox>(router, &format!("{p}/suggestion-box"));
    router
}

fn read_only<T: Resource>(router: Router<AppState>, base: &str) -> Router<AppState> {
    let router = route_both(router, &format!("{base}/"), get(list_resource::<T>));
    route_both(router, &format!("{base}/:id"), get(resource_detail::<T>))
}

fn form<T: Form>(router: Router<AppState>, base: &str) -> Router<AppState> {
    let router = route_both(
        router,
        &format!("{base}/"),
        get(list_forms::<T>).post(create_form::<T>),
    );
    route_both(
        router,
        &format!("{base}/:id"),
        get(form_detail::<T>)
            .put(deny_update::<T>)
            .patch(deny_update::<T>)
            .delete(deny_delete::<T>),
    )
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse().map_err(|_| ApiError::not_found("Not found."))
}

fn by_order<T: Record>(rows: &mut [T], order: impl Fn(&T) -> u32) {
    rows.sort_by_key(|row| (order(row), row.id()));
}

/// A read-only resource: which active rows it lists and how they render.
#[async_trait]
trait Resource: Record {
    async fn rows(storage: &dyn Storage) -> cms_core::Result<Vec<Self>> {
        storage::list_active::<Self>(storage).await
    }

    async fn render(state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>>;
}

async fn list_resource<T: Resource>(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rows = T::rows(state.storage()).await?;
    Ok(Json(Value::Array(T::render(&state, &rows).await?)))
}

async fn resource_detail<T: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    let row: Vec<T> = T::rows(state.storage())
        .await?
        .into_iter()
        .filter(|r| r.id() == id)
        .collect();
    T::render(&state, &row)
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Not found."))
}

fn account_type_view(t: &AccountType) -> Value {
    json!({"id": t.id(), "label": t.label, "description": t.description})
}

#[async_trait]
impl Resource for AccountType {
    async fn render(_state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>> {
        Ok(rows.iter().map(account_type_view).collect())
    }
}

fn yearly_entry(state: &AppState, doc: &YearlyDocument) -> Value {
    json!({
        "title": doc.title,
        "url": state.media_url(&doc.document),
        "date": doc.date.map(|d| d.format("%Y-%m-%d").to_string()),
        "type": doc.document_type,
    })
}

/// `[{year, documents: {<account_type_id>: entry}}]`, years descending.
fn group_yearly(state: &AppState, docs: &[YearlyDocument]) -> Vec<Value> {
    let mut years: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();
    for doc in docs {
        let Some(account_type) = doc.account_type_id else {
            continue;
        };
        years
            .entry(doc.year.as_str())
            .or_default()
            .insert(account_type.to_string(), yearly_entry(state, doc));
    }
    years
        .into_iter()
        .rev()
        .map(|(year, documents)| json!({"year": year, "documents": documents}))
        .collect()
}

#[async_trait]
impl Resource for AbandonedAccountsSection {
    async fn render(state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>> {
        let storage = state.storage();
        let account_types: HashMap<i64, AccountType> = storage::list_active::<AccountType>(storage)
            .await?
            .into_iter()
            .map(|t| (t.id(), t))
            .collect();
        let documents = storage::list_active::<YearlyDocument>(storage).await?;

        let mut views = Vec::with_capacity(rows.len());
        for section in rows {
            let types: Vec<Value> = section
                .account_type_ids
                .iter()
                .filter_map(|id| account_types.get(id))
                .map(account_type_view)
                .collect();
            let docs: Vec<YearlyDocument> = documents
                .iter()
                .filter(|d| {
                    d.account_type_id
                        .is_some_and(|id| section.account_type_ids.contains(&id))
                })
                .cloned()
                .collect();
            let view = json!({
                "id": section.id(),
                "title": section.title,
                "description": section.description,
                "account_types": types,
                "years": group_yearly(state, &docs),
            });
            views.push(with_meta(view, &section.meta));
        }
        Ok(views)
    }
}

#[async_trait]
impl Resource for YearlyDocument {
    async fn render(state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>> {
        Ok(rows
            .iter()
            .map(|doc| {
                json!({
                    "title": doc.title,
                    "document_url": state.media_url(&doc.document),
                    "date": doc.date,
                    "type": doc.document_type,
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ByYearQuery {
    year: Option<String>,
    account_type: Option<String>,
}

async fn documents_by_year(
    State(state): State<AppState>,
    Query(query): Query<ByYearQuery>,
) -> ApiResult<Json<Value>> {
    let mut docs = storage::list_active::<YearlyDocument>(state.storage()).await?;
    if let Some(year) = query.year.filter(|y| !y.is_empty()) {
        docs.retain(|d| d.year == year);
    }
    if let Some(account_type) = query.account_type.filter(|a| !a.is_empty()) {
        let wanted = account_type.parse::<i64>().ok();
        docs.retain(|d| wanted.is_some() && d.account_type_id == wanted);
    }
    let results = group_yearly(&state, &docs);
    Ok(Json(json!({"count": results.len(), "results": results})))
}

#[async_trait]
impl Resource for ContractCategory {
    async fn render(_state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>> {
        Ok(rows
            .iter()
            .map(|c| json!({"id": c.id(), "name": c.name}))
            .collect())
    }
}

async fn category_names(storage: &dyn Storage) -> cms_core::Result<HashMap<i64, String>> {
    Ok(storage::list::<ContractCategory>(storage)
        .await?
        .into_iter()
        .map(|c| (c.id(), c.name))
        .collect())
}

fn contract_name<'a>(names: &'a HashMap<i64, String>, contract: &Contract) -> &'a str {
    contract
        .category_id
        .and_then(|id| names.get(&id))
        .map_or("", String::as_str)
}

fn contract_entry(state: &AppState, names: &HashMap<i64, String>, contract: &Contract) -> Value {
    json!({
        "title": contract.title,
        "url": state.media_url(&contract.document),
        "category": contract_name(names, contract),
    })
}

#[async_trait]
impl Resource for AccountContractsSection {
    async fn render(state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>> {
        let storage = state.storage();
        let names = category_names(storage).await?;
        let mut contracts = storage::list_active::<Contract>(storage).await?;
        contracts.sort_by(|a, b| {
            (contract_name(&names, a), a.order, &a.title).cmp(&(contract_name(&names, b), b.order, &b.title))
        });
        let contracts: Vec<Value> = contracts
            .iter()
            .map(|c| contract_entry(state, &names, c))
            .collect();

        let mut categories: Vec<String> = storage::list_active::<ContractCategory>(storage)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        categories.sort();

        Ok(rows
            .iter()
            .map(|section| {
                let view = json!({
                    "id": section.id(),
                    "title": section.title,
                    "description": section.description,
                    "contracts": contracts,
                    "categories": categories,
                });
                with_meta(view, &section.meta)
            })
            .collect())
    }
}

#[async_trait]
impl Resource for Contract {
    async fn render(state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>> {
        let names = category_names(state.storage()).await?;
        Ok(rows
            .iter()
            .map(|c| {
                json!({
                    "id": c.id(),
                    "title": c.title,
                    "document_url": state.media_url(&c.document),
                    "category": contract_name(&names, c),
                    "order": c.order,
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ByCategoryQuery {
    category: Option<String>,
}

async fn contracts_by_category(
    State(state): State<AppState>,
    Query(query): Query<ByCategoryQuery>,
) -> ApiResult<Json<Value>> {
    let storage = state.storage();
    let names = category_names(storage).await?;
    let contracts = storage::list_active::<Contract>(storage).await?;
    let wanted = query.category.filter(|c| !c.is_empty());

    let mut results: Map<String, Value> = Map::new();
    for contract in contracts.iter().filter(|c| c.category_id.is_some()) {
        let name = contract_name(&names, contract);
        if wanted.as_deref().is_some_and(|w| w != name) {
            continue;
        }
        let entry = contract_entry(&state, &names, contract);
        match results.get_mut(name) {
            Some(Value::Array(list)) => list.push(entry),
            _ => {
                results.insert(name.to_string(), json!([entry]));
            }
        }
    }
    Ok(Json(json!({"count": results.len(), "results": results})))
}

#[async_trait]
impl Resource for RightsAndDutiesPage {
    async fn render(state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>> {
        let storage = state.storage();
        let mut sections = storage::list_active::<RightsAndDutiesSection>(storage).await?;
        by_order(&mut sections, |s| s.order);
        let mut images = storage::list_active::<RightsAndDutiesImage>(storage).await?;
        by_order(&mut images, |i| i.order);

        let sections: Vec<Value> = sections
            .iter()
            .map(|section| {
                let images: Vec<Value> = images
                    .iter()
                    .filter(|i| i.section_record_id == Some(section.id()))
                    .map(|i| {
                        json!({
                            "id": i.id(),
                            "src": state.media_url(&i.image),
                            "alt_text": i.alt_text,
                            "description": i.description,
                        })
                    })
                    .collect();
                json!({
                    "id": section.section_id.as_str(),
                    "title": section.title,
                    "description": section.description,
                    "button_text": section.button_text,
                    "additional_info": section.additional_info,
                    "images": images,
                })
            })
            .collect();

        Ok(rows
            .iter()
            .map(|page| {
                let view = json!({
                    "id": page.id(),
                    "pageTitle": page.page_title,
                    "pageDescription": page.page_description,
                    "sections": sections,
                });
                with_meta(view, &page.meta)
            })
            .collect())
    }
}

/// Active categories by order, each with its active rates by order.
async fn rate_categories(
    storage: &dyn Storage,
    categories: &[ServiceCategory],
) -> cms_core::Result<Vec<(ServiceCategory, Vec<ServiceRate>)>> {
    let mut rates = storage::list_active::<ServiceRate>(storage).await?;
    by_order(&mut rates, |r| r.order);
    let mut categories = categories.to_vec();
    by_order(&mut categories, |c| c.order);
    Ok(categories
        .into_iter()
        .map(|category| {
            let own = rates
                .iter()
                .filter(|r| r.category_id == Some(category.id()))
                .cloned()
                .collect();
            (category, own)
        })
        .collect())
}

fn rate_category_view(category: &ServiceCategory, rates: &[ServiceRate]) -> Value {
    let rates: Vec<Value> = rates
        .iter()
        .map(|r| {
            json!({
                "id": r.id(),
                "service": r.service,
                "description": r.description,
                "rate": r.rate,
                "details": r.details,
            })
        })
        .collect();
    json!({"id": category.id(), "name": category.name, "rates": rates})
}

#[async_trait]
impl Resource for ServiceRatesPage {
    async fn render(state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>> {
        let storage = state.storage();
        let categories = storage::list_active::<ServiceCategory>(storage).await?;
        let categories: Vec<Value> = rate_categories(storage, &categories)
            .await?
            .iter()
            .map(|(c, rates)| rate_category_view(c, rates))
            .collect();
        Ok(rows
            .iter()
            .map(|page| {
                let view = json!({
                    "id": page.id(),
                    "title": page.title,
                    "description": page.description,
                    "categories": categories,
                });
                with_meta(view, &page.meta)
            })
            .collect())
    }
}

#[async_trait]
impl Resource for ServiceCategory {
    async fn render(state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>> {
        Ok(rate_categories(state.storage(), rows)
            .await?
            .iter()
            .filter(|(_, rates)| !rates.is_empty())
            .map(|(c, rates)| rate_category_view(c, rates))
            .collect())
    }
}

#[async_trait]
impl Resource for Province {
    async fn render(_state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>> {
        Ok(rows
            .iter()
            .map(|p| json!({"id": p.id(), "name": p.name}))
            .collect())
    }
}

macro_rules! page_resource {
    ($($ty:ty),+) => {
        $(
            #[async_trait]
            impl Resource for $ty {
                async fn render(_state: &AppState, rows: &[Self]) -> ApiResult<Vec<Value>> {
                    Ok(rows
                        .iter()
                        .map(|page| {
                            let view = json!({
                                "id": page.id(),
                                "title": page.title,
                                "description": page.description,
                            });
                            with_meta(view, &page.meta)
                        })
                        .collect())
                }
            }
        )+
    };
}

page_resource!(SuggestionBoxPage, FraudReportPage, ClaimRequestPage);

/// A public form: anonymous create, staff-only edits.
#[async_trait]
trait Form: Submission {
    const CREATED: &'static str;
    const UPDATE_DENIED: &'static str;
    const DELETE_DENIED: &'static str;

    /// Checks that need storage, added to the field errors.
    async fn check(_state: &AppState, _form: &Self, _errors: &mut ValidationErrors) -> ApiResult<()> {
        Ok(())
    }

    /// Best-effort confirmation email; returns whether it went out.
    async fn confirm(state: &AppState, form: &Self) -> bool;

    fn view(&self, _state: &AppState) -> ApiResult<Value> {
        let mut view = record_json(self)?;
        if let Some(obj) = view.as_object_mut() {
            obj.remove("internal_notes");
        }
        Ok(view)
    }
}

#[async_trait]
impl Form for ClaimRequest {
    const CREATED: &'static str = "Solicitud de reclamo enviada exitosamente";
    const UPDATE_DENIED: &'static str = "No se permite actualizar desde la API";
    const DELETE_DENIED: &'static str = "No se permite eliminar desde la API";

    async fn confirm(state: &AppState, form: &Self) -> bool {
        email::send_claim_confirmation(state.storage(), state.mailer.as_ref(), form).await
    }
}

#[async_trait]
impl Form for FraudReport {
    const CREATED: &'static str = "Reporte de fraude enviado exitosamente";
    const UPDATE_DENIED: &'static str = "No se permite actualizar desde la API";
    const DELETE_DENIED: &'static str = "No se permite eliminar desde la API";

    async fn confirm(state: &AppState, form: &Self) -> bool {
        email::send_fraud_confirmation(state.storage(), state.mailer.as_ref(), form).await
    }

    fn view(&self, state: &AppState) -> ApiResult<Value> {
        let mut view = record_json(self)?;
        if let Some(obj) = view.as_object_mut() {
            obj.remove("internal_notes");
            let url = self.file.as_deref().and_then(|f| state.media_url(f));
            obj.insert("file_url".to_string(), json!(url));
        }
        Ok(view)
    }
}

#[async_trait]
impl Form for SuggestionBox {
    const CREATED: &'static str = "Sugerencia enviada exitosamente. Gracias por tu feedback.";
    const UPDATE_DENIED: &'static str = "No se permiten actualizaciones desde el frontend";
    const DELETE_DENIED: &'static str = "No se permiten eliminaciones desde el frontend";

    async fn check(state: &AppState, form: &Self, errors: &mut ValidationErrors) -> ApiResult<()> {
        if let Some(province) = form.province {
            if storage::get::<Province>(state.storage(), province).await?.is_none() {
                errors.add(
                    "province",
                    format!("Clave primaria \"{province}\" inválida - objeto no existe."),
                );
            }
        }
        Ok(())
    }

    async fn confirm(state: &AppState, form: &Self) -> bool {
        email::send_suggestion_confirmation(state.storage(), state.mailer.as_ref(), form).await
    }
}

async fn create_form<T: Form>(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(payload) = payload?;
    if !payload.is_object() {
        return Err(ApiError::BadRequest(
            "Datos inválidos. Se esperaba un diccionario.".to_string(),
        ));
    }
    let mut form: T =
        serde_json::from_value(payload).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    form.reset_for_public_create();

    let mut errors = form.validate().err().unwrap_or_default();
    T::check(&state, &form, &mut errors).await?;
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let id = storage::save(state.storage(), &mut form).await?;
    info!("{} #{} received from {}", T::KIND, id, form.email());

    if !T::confirm(&state, &form).await {
        warn!("Confirmation email for {} #{} was not sent", T::KIND, id);
    }
    Ok((StatusCode::CREATED, Json(json!({"message": T::CREATED}))))
}

async fn list_forms<T: Form>(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut rows = storage::list::<T>(state.storage()).await?;
    rows.sort_by(|a, b| (b.meta().created_at, b.id()).cmp(&(a.meta().created_at, a.id())));
    let views = rows
        .iter()
        .map(|r| r.view(&state))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(Value::Array(views)))
}

async fn form_detail<T: Form>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    let row = storage::get::<T>(state.storage(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;
    Ok(Json(row.view(&state)?))
}

async fn deny_update<T: Form>() -> ApiError {
    ApiError::MethodNotAllowed(T::UPDATE_DENIED.to_string())
}

async fn deny_delete<T: Form>() -> ApiError {
    ApiError::MethodNotAllowed(T::DELETE_DENIED.to_string())
}
