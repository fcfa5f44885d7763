//! `/admin/`: the editing surface. Staff log in for a bearer token, then
//! read and write any record kind through `/admin/api/<kind>/`.

use super::{record_json, route_both, ApiError, ApiResult};
use crate::email;
use crate::security::{admin_guard, client_ip};
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cms_core::storage::{self, Storage};
use cms_core::domain::*;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::net::SocketAddr;
use tracing::{info, warn};

const READ_ONLY_MESSAGE: &str = "Este registro es de solo lectura";
const SERVER_MANAGED: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

/// Typed storage operations for one record kind, behind a slug.
#[async_trait]
pub trait AdminKind: Send + Sync {
    fn kind(&self) -> &'static str;
    fn writable(&self) -> bool;
    fn soft_delete(&self) -> bool;

    async fn list(&self, storage: &dyn Storage) -> ApiResult<Vec<Value>>;
    async fn get(&self, storage: &dyn Storage, id: i64) -> ApiResult<Value>;
    async fn create(&self, storage: &dyn Storage, body: Map<String, Value>) -> ApiResult<Value>;
    async fn update(&self, storage: &dyn Storage, id: i64, body: Map<String, Value>) -> ApiResult<Value>;
    async fn delete(&self, storage: &dyn Storage, id: i64) -> ApiResult<()>;
    async fn restore(&self, storage: &dyn Storage, id: i64) -> ApiResult<Value>;

    /// `(active, total)` rows.
    async fn counts(&self, storage: &dyn Storage) -> cms_core::Result<(usize, usize)>;
}

struct Kind<T> {
    writable: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Kind<T> {
    fn boxed() -> Box<dyn AdminKind> {
        Box::new(Self {
            writable: true,
            _record: PhantomData,
        })
    }

    fn read_only() -> Box<dyn AdminKind> {
        Box::new(Self {
            writable: false,
            _record: PhantomData,
        })
    }
}

fn decode_body<T: Record>(body: Value) -> ApiResult<T> {
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn strip_server_fields(body: &mut Map<String, Value>) {
    for field in SERVER_MANAGED {
        body.remove(field);
    }
}

#[async_trait]
impl<T: Record> AdminKind for Kind<T> {
    fn kind(&self) -> &'static str {
        T::KIND
    }

    fn writable(&self) -> bool {
        self.writable
    }

    fn soft_delete(&self) -> bool {
        T::SOFT_DELETE
    }

    async fn list(&self, storage: &dyn Storage) -> ApiResult<Vec<Value>> {
        storage::list::<T>(storage)
            .await?
            .iter()
            .map(record_json)
            .collect()
    }

    async fn get(&self, storage: &dyn Storage, id: i64) -> ApiResult<Value> {
        record_json(&storage::require::<T>(storage, id).await?)
    }

    async fn create(&self, storage: &dyn Storage, mut body: Map<String, Value>) -> ApiResult<Value> {
        strip_server_fields(&mut body);
        let mut record: T = decode_body(Value::Object(body))?;
        storage::save(storage, &mut record).await?;
        record_json(&record)
    }

    async fn update(&self, storage: &dyn Storage, id: i64, mut body: Map<String, Value>) -> ApiResult<Value> {
        let existing = storage::require::<T>(storage, id).await?;
        strip_server_fields(&mut body);
        let mut merged = record_json(&existing)?;
        if let Some(fields) = merged.as_object_mut() {
            fields.extend(body);
        }
        let mut record: T = decode_body(merged)?;
        storage::save(storage, &mut record).await?;
        record_json(&record)
    }

    async fn delete(&self, storage: &dyn Storage, id: i64) -> ApiResult<()> {
        if storage::delete::<T>(storage, id).await? {
            Ok(())
        } else {
            Err(ApiError::not_found("Not found."))
        }
    }

    async fn restore(&self, storage: &dyn Storage, id: i64) -> ApiResult<Value> {
        record_json(&storage::restore::<T>(storage, id).await?)
    }

    async fn counts(&self, storage: &dyn Storage) -> cms_core::Result<(usize, usize)> {
        let rows = storage::list::<T>(storage).await?;
        let active = rows.iter().filter(|r| r.is_active()).count();
        Ok((active, rows.len()))
    }
}

macro_rules! kinds {
    ($($slug:literal => $ty:ty),+ $(,)?) => {{
        let mut kinds: BTreeMap<&'static str, Box<dyn AdminKind>> = BTreeMap::new();
        $( kinds.insert($slug, Kind::<$ty>::boxed()); )+
        kinds
    }};
}

static KINDS: Lazy<BTreeMap<&'static str, Box<dyn AdminKind>>> = Lazy::new(|| {
    let mut kinds = kinds![
        "email-configurations" => EmailConfiguration,
        "heroes" => Hero,
        "quienes-somos" => QuienesSomos,
        "nuestra-historia" => NuestraHistoria,
        "mision" => Mision,
        "vision" => Vision,
        "valores" => Valor,
        "directors" => Director,
        "community-categories" => CommunityCategory,
        "community-initiatives" => CommunityInitiative,
        "community-support" => CommunitySupport,
        "financial-documents" => FinancialDocument,
        "financial-statements-config" => FinancialStatementsConfig,
        "memory-documents" => MemoryDocument,
        "memory-config" => MemoryConfig,
        "policy-documents" => PolicyDocument,
        "policy-categories" => PolicyCategory,
        "policy-config" => PolicyConfig,
        "news" => News,
        "promotions" => Promotion,
        "navigation" => Navigation,
        "exchange-rates" => ExchangeRate,
        "footers" => Footer,
        "debit-card-promos" => DebitCardPromo,
        "education-items" => EducationItem,
        "education-sections" => EducationSection,
        "peke-account-summaries" => PeKeAccountSummary,
        "home-products" => Product,
        "product-sections" => ProductSection,
        "slider-items" => SliderItem,
        "location-services" => Service,
        "schedules" => Schedule,
        "locations" => Location,
        "accounts" => Account,
        "loans" => Loan,
        "cards" => Card,
        "certificates" => Certificate,
        "banners" => Banner,
        "loan-types" => LoanType,
        "account-types" => AccountType,
        "abandoned-accounts-sections" => AbandonedAccountsSection,
        "yearly-documents" => YearlyDocument,
        "contract-categories" => ContractCategory,
        "account-contracts-sections" => AccountContractsSection,
        "contracts" => Contract,
        "service-rates-pages" => ServiceRatesPage,
        "service-categories" => ServiceCategory,
        "service-rates" => ServiceRate,
        "rights-and-duties-pages" => RightsAndDutiesPage,
        "rights-and-duties-sections" => RightsAndDutiesSection,
        "rights-and-duties-images" => RightsAndDutiesImage,
        "provinces" => Province,
        "suggestion-box-pages" => SuggestionBoxPage,
        "fraud-report-pages" => FraudReportPage,
        "claim-request-pages" => ClaimRequestPage,
        "claim-requests" => ClaimRequest,
        "fraud-reports" => FraudReport,
        "suggestions" => SuggestionBox,
        "services-pages" => ServicesPage,
        "service-info" => ServiceInfo,
        "saving-tips" => SavingTip,
        "slider-slides" => SliderSlide,
        "faq-items" => FaqItem,
    ];
    kinds.insert("email-logs", Kind::<EmailLog>::read_only());
    kinds
});

/// Every registered slug with its handler.
pub fn registry() -> impl Iterator<Item = (&'static str, &'static dyn AdminKind)> {
    KINDS.iter().map(|(slug, kind)| (*slug, kind.as_ref()))
}

fn lookup(slug: &str) -> ApiResult<&'static dyn AdminKind> {
    KINDS
        .get(slug)
        .map(|k| k.as_ref())
        .ok_or_else(|| ApiError::not_found(format!("Unknown kind '{slug}'")))
}

fn writable(slug: &str) -> ApiResult<&'static dyn AdminKind> {
    let kind = lookup(slug)?;
    if !kind.writable() {
        return Err(ApiError::MethodNotAllowed(READ_ONLY_MESSAGE.to_string()));
    }
    Ok(kind)
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse().map_err(|_| ApiError::not_found("Not found."))
}

fn object_body(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Map<String, Value>> {
    match payload? {
        Json(Value::Object(body)) => Ok(body),
        Json(_) => Err(ApiError::BadRequest("Se esperaba un objeto JSON".to_string())),
    }
}

pub fn routes(state: AppState) -> Router<AppState> {
    let mut api = Router::new();
    api = route_both(api, "/admin/api/:kind/", get(list_rows).post(create_row));
    api = route_both(
        api,
        "/admin/api/:kind/:id",
        get(get_row).put(update_row).patch(update_row).delete(delete_row),
    );
    api = route_both(api, "/admin/api/:kind/:id/:action", post(row_action));
    let api = api.route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    route_both(Router::new(), "/admin/login", post(login))
        .merge(api)
        .layer(middleware::from_fn_with_state(state, admin_guard))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(credentials) = payload?;
    let ip = client_ip(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.config.security.trust_forwarded_for,
    );
    let admin = &state.config.admin;

    let matches = !admin.password.is_empty()
        && credentials.username == admin.username
        && credentials.password == admin.password;
    if !matches {
        let attempts = state.security.record_login_failure(&ip).await;
        warn!(
            "AUDIT: LOGIN_FAILED - IP: {}, user: {}, attempts: {}",
            ip, credentials.username, attempts
        );
        return Err(ApiError::Unauthorized("Credenciales inválidas".to_string()));
    }

    state.security.record_login_success(&ip).await;
    info!("AUDIT: LOGIN_SUCCESS - IP: {}, user: {}", ip, credentials.username);
    let token = state.sessions.issue().await;
    Ok(Json(json!({ "token": token })))
}

async fn require_session(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match token {
        Some(token) if state.sessions.is_valid(token).await => next.run(request).await,
        _ => ApiError::Unauthorized("Autenticación requerida".to_string()).into_response(),
    }
}

async fn list_rows(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Json<Value>> {
    let rows = lookup(&kind)?.list(state.storage()).await?;
    Ok(Json(Value::Array(rows)))
}

async fn create_row(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let handler = writable(&kind)?;
    let row = handler.create(state.storage(), object_body(payload)?).await?;
    info!("Admin created {} #{}", handler.kind(), row["id"]);
    Ok((StatusCode::CREATED, Json(row)))
}

async fn get_row(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let handler = lookup(&kind)?;
    Ok(Json(handler.get(state.storage(), parse_id(&id)?).await?))
}

async fn update_row(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let handler = writable(&kind)?;
    let id = parse_id(&id)?;
    let row = handler.update(state.storage(), id, object_body(payload)?).await?;
    info!("Admin updated {} #{}", handler.kind(), id);
    Ok(Json(row))
}

async fn delete_row(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let handler = writable(&kind)?;
    let id = parse_id(&id)?;
    handler.delete(state.storage(), id).await?;
    if handler.soft_delete() {
        info!("Admin deactivated {} #{}", handler.kind(), id);
    } else {
        info!("Admin deleted {} #{}", handler.kind(), id);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
struct TestEmailRequest {
    #[serde(default)]
    to: String,
}

async fn row_action(
    State(state): State<AppState>,
    Path((kind, id, action)): Path<(String, String, String)>,
    payload: Option<Json<TestEmailRequest>>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    match (kind.as_str(), action.as_str()) {
        ("email-configurations", "test") => {
            let to = payload.map(|Json(p)| p.to).unwrap_or_default();
            if !cms_core::common::text::is_valid_email(&to) {
                return Err(ApiError::BadRequest("Indique un email de destino válido".to_string()));
            }
            let config = storage::require::<EmailConfiguration>(state.storage(), id).await?;
            let (success, message) =
                email::send_test_email(state.storage(), state.mailer.as_ref(), config, &to).await?;
            Ok(Json(json!({ "success": success, "message": message })))
        }
        (_, "restore") => {
            let handler = writable(&kind)?;
            if !handler.soft_delete() {
                return Err(ApiError::MethodNotAllowed(
                    "Este tipo de registro no admite restauración".to_string(),
                ));
            }
            let row = handler.restore(state.storage(), id).await?;
            info!("Admin restored {} #{}", handler.kind(), id);
            Ok(Json(row))
        }
        _ => Err(ApiError::not_found("Not found.")),
    }
}
