use asomap_cms::config::Config;
use asomap_cms::email::MemoryBackend;
use asomap_cms::{create_app, AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use cms_core::storage::{self, InMemoryStorage, Storage};
use cms_core::{
    ClaimRequest, CmsError, EmailConfiguration, EmailLog, EmailProvider, EmailStatus,
    ExclusiveRule, Hero, Province, SubmissionStatus,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    state: AppState,
    mailer: Arc<MemoryBackend>,
    _media: TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with_mailer(MemoryBackend::new())
    }

    fn with_mailer(mailer: MemoryBackend) -> Self {
        let media = tempfile::tempdir().expect("media dir");
        let mut config = Config::default();
        config.media.root = media.path().to_path_buf();
        config.admin.password = "clave-segura".to_string();
        config.security.rate_limit = 5;

        let mailer = Arc::new(mailer);
        let state = AppState::new(config, Arc::new(InMemoryStorage::new()), mailer.clone());
        Self {
            state,
            mailer,
            _media: media,
        }
    }

    fn app(&self) -> Router {
        create_app(self.state.clone())
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if body.is_some() {
            request = request.header(header::CONTENT_TYPE, "application/json");
        }
        let request = request
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }
}

fn claim() -> Value {
    json!({
        "full_name": "Ana Pérez",
        "document": "001-1234567-8",
        "phone": "809-555-0101",
        "email": "ana@example.com",
        "product_type": "Cuenta de ahorro",
        "claim_type": "Cargo no reconocido",
        "distribution_channel": "Sucursal",
        "message": "Cobro duplicado."
    })
}

async fn configure_email(app: &TestApp) {
    let mut config = EmailConfiguration {
        name: "Principal".to_string(),
        provider: EmailProvider::Gmail,
        username: "notificaciones@asomap.com.do".to_string(),
        password: "app-password".to_string(),
        from_email: "no-reply@asomap.com.do".to_string(),
        is_default: true,
        ..Default::default()
    };
    storage::save(app.state.storage(), &mut config).await.unwrap();
}

#[tokio::test]
async fn health_answers_on_every_alias() {
    let app = TestApp::new();
    for uri in ["/health", "/health/", "/healthcheck", "/healthcheck/"] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!({"status": "ok"}));
    }
}

/// Storage whose every call fails, as when the database is down.
struct UnreachableStorage;

fn storage_down<T>() -> cms_core::Result<T> {
    Err(CmsError::Storage {
        message: "connection refused".to_string(),
    })
}

#[async_trait]
impl Storage for UnreachableStorage {
    async fn insert_record(&self, _kind: &str, _data: Value) -> cms_core::Result<i64> {
        storage_down()
    }

    async fn update_record(&self, _kind: &str, _id: i64, _data: Value) -> cms_core::Result<()> {
        storage_down()
    }

    async fn get_record(&self, _kind: &str, _id: i64) -> cms_core::Result<Option<Value>> {
        storage_down()
    }

    async fn list_records(&self, _kind: &str) -> cms_core::Result<Vec<Value>> {
        storage_down()
    }

    async fn delete_record(&self, _kind: &str, _id: i64) -> cms_core::Result<bool> {
        storage_down()
    }

    async fn save_exclusive(
        &self,
        _kind: &str,
        _id: Option<i64>,
        _data: Value,
        _rule: &ExclusiveRule,
    ) -> cms_core::Result<i64> {
        storage_down()
    }

    async fn clear(&self) -> cms_core::Result<()> {
        storage_down()
    }

    async fn ping(&self) -> cms_core::Result<()> {
        storage_down()
    }
}

#[tokio::test]
async fn health_is_ok_while_storage_is_down() {
    let state = AppState::new(
        Config::default(),
        Arc::new(UnreachableStorage),
        Arc::new(MemoryBackend::new()),
    );
    let send = |uri: &'static str| {
        let app = create_app(state.clone());
        async move {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = app.oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice::<Value>(&bytes).unwrap())
        }
    };

    for uri in ["/health/", "/healthcheck"] {
        let (status, body) = send(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!({"status": "ok"}));
    }

    let (status, body) = send("/api/about/hero/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn hero_is_404_until_created_and_served_on_both_prefixes() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/about/hero/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Hero section not found");

    let mut hero = Hero {
        title: "Sobre Nosotros".to_string(),
        ..Default::default()
    };
    storage::save(app.state.storage(), &mut hero).await.unwrap();

    for uri in ["/api/about/hero/", "/api/About/hero", "/api/about/hero"] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["title"], "Sobre Nosotros");
    }
}

#[tokio::test]
async fn claim_submission_sends_confirmation() {
    let app = TestApp::new();
    configure_email(&app).await;

    let (status, body) = app
        .send(Method::POST, "/api/user-support/claim-requests/", Some(claim()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Solicitud de reclamo enviada exitosamente");

    let claims = storage::list::<ClaimRequest>(app.state.storage()).await.unwrap();
    assert_eq!(claims[0].status, SubmissionStatus::Pending);

    let sent = app.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ana@example.com");
    assert_eq!(sent[0].from, "notificaciones@asomap.com.do");
    assert_eq!(sent[0].subject, format!("Solicitud #{} recibida", claims[0].meta.id));

    let logs = storage::list::<EmailLog>(app.state.storage()).await.unwrap();
    assert_eq!(logs[0].status, EmailStatus::Sent);
}

#[tokio::test]
async fn failing_transport_still_creates_the_claim() {
    let app = TestApp::with_mailer(MemoryBackend::failing("connection refused"));
    configure_email(&app).await;

    let (status, _) = app
        .send(Method::POST, "/api/user-support/claim-requests", Some(claim()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let logs = storage::list::<EmailLog>(app.state.storage()).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, EmailStatus::Failed);
    assert!(logs[0]
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("connection refused"));
}

#[tokio::test]
async fn invalid_claim_is_400_and_edits_are_405() {
    let app = TestApp::new();
    let mut body = claim();
    body["email"] = json!("no-es-un-correo");
    let (status, errors) = app
        .send(Method::POST, "/api/user-support/claim-requests/", Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(errors["email"].is_array());

    for method in [Method::PUT, Method::PATCH, Method::DELETE] {
        let (status, body) = app
            .send(method, "/api/user-support/claim-requests/1/", Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(body["error"].as_str().unwrap().starts_with("No se permite"));
    }
}

#[tokio::test]
async fn suggestion_accepts_numeric_string_province() {
    let app = TestApp::new();
    let mut province = Province {
        name: "Duarte".to_string(),
        ..Default::default()
    };
    let id = storage::save(app.state.storage(), &mut province).await.unwrap();

    let body = json!({
        "fullName": "Luis Gómez",
        "document": "001-7654321-0",
        "phone": "829-555-0199",
        "email": "luis@example.com",
        "province": id.to_string(),
        "classification": "Servicio",
        "message": "Más cajeros, por favor."
    });
    let (status, body) = app
        .send(Method::POST, "/api/user-support/suggestion-box/", Some(body))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["message"],
        "Sugerencia enviada exitosamente. Gracias por tu feedback."
    );
}

#[tokio::test]
async fn singleton_kind_keeps_one_active_row() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/admin/login/",
            Some(json!({"username": "admin", "password": "clave-segura"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    for rate in [58.1, 59.3] {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/admin/api/exchange-rates/")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(json!({"buy_rate": rate}).to_string()))
            .unwrap();
        let response = app.app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let (status, body) = app.get("/api/header/exchange/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rates"][0]["buyRate"], 59.3);

    let rates = storage::list::<cms_core::ExchangeRate>(app.state.storage())
        .await
        .unwrap();
    assert_eq!(rates.iter().filter(|r| r.meta.is_active).count(), 1);
}

#[tokio::test]
async fn admin_paths_are_rate_limited() {
    let app = TestApp::new();
    let mut statuses = Vec::new();
    for _ in 0..6 {
        let (status, _) = app.get("/admin/api/heroes/").await;
        statuses.push(status);
    }
    assert!(statuses[..5].iter().all(|s| *s == StatusCode::UNAUTHORIZED));
    assert_eq!(statuses[5], StatusCode::FORBIDDEN);

    // Public content is not limited
    for _ in 0..10 {
        let (status, _) = app.get("/health/").await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn unknown_numeric_and_textual_ids_are_404() {
    let app = TestApp::new();
    for uri in ["/api/news/999/", "/api/news/not-a-number/", "/api/locations/abc"] {
        let (status, _) = app.get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}
