use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

use casedesk_auth::PasswordChange;
use casedesk_client::api::ClientQuery;
use casedesk_client::{AppState, ClientConfig, FeatureFlags, MemoryStorage, Storage, StorageKey};
use casedesk_core::{CaseId, CaseInput, CaseStatus, ClientId, Company, CompanyId, DocumentId, DocumentUpload, WorkflowId};

/// What the fake upstream observed.
#[derive(Default)]
struct Upstream {
    bearer_tokens: Mutex<Vec<Option<String>>>,
    billing_hits: AtomicUsize,
    /// Requests to the company, FOIA and workflow endpoints.
    gated_hits: AtomicUsize,
}

type Shared = Arc<Upstream>;

struct TestServer {
    base_url: String,
    upstream: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        casedesk_observability::init();

        let upstream = Shared::default();
        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/profile", get(profile))
            .route("/auth/change-password", put(change_password))
            .route("/clients", get(list_clients))
            .route("/clients/:id", get(get_client))
            .route("/cases", get(list_cases).post(create_case))
            .route("/companies/:id", get(get_company))
            .route("/companies/:id/users", get(company_users))
            .route("/foia-cases", get(list_foia_cases))
            .route("/workflows", get(list_workflows))
            .route("/documents", get(list_documents))
            .route("/documents/upload", post(upload_document))
            .route("/documents/:id/download", get(download_document))
            .route("/billing/plans", get(billing_plans))
            .with_state(upstream.clone());
        let app = Router::new().nest("/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            upstream,
            handle,
        }
    }

    fn config(&self) -> ClientConfig {
        ClientConfig::default().with_api_url(&self.base_url)
    }

    async fn state(&self, config: ClientConfig) -> (AppState, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let state = AppState::with_storage(config, storage.clone()).await.unwrap();
        (state, storage)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn session_token() -> String {
    let exp = chrono::Utc::now().timestamp() + 3_600;
    let payload = json!({"sub": "u1", "exp": exp}).to_string();
    format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid credentials"}))).into_response();
    }
    Json(json!({
        "success": true,
        "data": {
            "token": session_token(),
            "user": {
                "_id": "u1",
                "id": "u1",
                "firstName": "Ana",
                "lastName": "Lima",
                "email": body["email"],
                "role": "attorney",
                "companyId": "co1",
                "barNumber": "NY-123"
            }
        }
    }))
    .into_response()
}

async fn profile(State(upstream): State<Shared>, headers: HeaderMap) -> Response {
    let token = bearer(&headers);
    upstream.bearer_tokens.lock().unwrap().push(token.clone());
    if token.is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "No token provided"}))).into_response();
    }
    Json(json!({
        "user": {"_id": "u1", "firstName": "Ana", "lastName": "Lima-Souza",
                 "email": "ana@firm.com", "role": "attorney", "companyId": "co1"}
    }))
    .into_response()
}

async fn change_password(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if bearer(&headers).is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "No token provided"}))).into_response();
    }
    if body["currentPassword"] != "secret" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Current password is incorrect"})),
        )
            .into_response();
    }
    Json(json!({"message": "Password updated"})).into_response()
}

async fn list_clients(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let all = vec![
        json!({"_id": "c1", "firstName": "Maria", "lastName": "Silva", "email": "maria@example.com"}),
        json!({"_id": "c2", "firstName": "Jon", "lastName": "Park", "email": "jon@example.com"}),
        json!({"_id": 42, "firstName": "Broken"}),
    ];
    let search = params.get("search").map(|s| s.to_lowercase()).unwrap_or_default();
    let clients: Vec<Value> = all
        .into_iter()
        .filter(|c| c["firstName"].as_str().unwrap_or_default().to_lowercase().contains(&search))
        .collect();
    Json(json!({"data": {"clients": clients, "total": clients.len(), "page": params.get("page")}}))
}

async fn get_client(Path(id): Path<String>) -> Response {
    if id == "c 1/x" {
        return Json(json!({"data": {"_id": id, "firstName": "Maria", "email": "maria@example.com"}}))
            .into_response();
    }
    (StatusCode::NOT_FOUND, Json(json!({"error": "Client not found"}))).into_response()
}

async fn list_cases() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Html("<h1>boom</h1>")).into_response()
}

async fn create_case(Json(body): Json<Value>) -> Response {
    let mut case = body;
    case["_id"] = json!("k1");
    case["id"] = json!("k1");
    case["status"] = json!("open");
    (StatusCode::CREATED, Json(json!({"message": "Case created", "case": case}))).into_response()
}

async fn get_company(State(upstream): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    upstream.gated_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"data": {"company": {"_id": id, "name": "Lima Immigration Law"}}}))
}

async fn list_foia_cases(State(upstream): State<Shared>) -> Json<Value> {
    upstream.gated_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"foiaCases": [{"_id": "f1", "clientId": "c1", "agency": "USCIS"}]}))
}

async fn list_workflows(State(upstream): State<Shared>) -> Json<Value> {
    upstream.gated_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"data": [{"_id": "w1", "id": "w1", "clientId": "c1", "status": "in-progress"}]}))
}

async fn company_users(State(upstream): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    upstream.gated_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "users": [
            {"_id": "u1", "email": "ana@firm.com", "role": "attorney", "companyId": id},
            {"_id": "u2", "email": "pat@firm.com", "role": "paralegal", "companyId": id}
        ]
    }))
}

async fn list_documents() -> Json<Value> {
    Json(json!([
        {"_id": "d1", "fileName": "passport.pdf", "type": "passport", "status": "verified"},
        {"_id": "d2", "name": "birth-certificate.pdf", "status": "under-review"}
    ]))
}

async fn upload_document(mut multipart: Multipart) -> Json<Value> {
    let mut fields = serde_json::Map::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            fields.insert("fileName".into(), json!(field.file_name()));
            fields.insert("mimeType".into(), json!(field.content_type()));
            fields.insert("fileSize".into(), json!(field.bytes().await.unwrap().len()));
        } else {
            let text = field.text().await.unwrap();
            let value = if name == "tags" {
                json!(text.split(',').collect::<Vec<_>>())
            } else {
                json!(text)
            };
            fields.insert(name, value);
        }
    }
    fields.insert("_id".into(), json!("d9"));
    Json(json!({"message": "uploaded", "document": fields}))
}

async fn download_document(Path(id): Path<String>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{id}.pdf\"")),
        ],
        b"%PDF-1.7 fake".to_vec(),
    )
        .into_response()
}

async fn billing_plans(State(upstream): State<Shared>) -> Json<Value> {
    upstream.billing_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"plans": [{"_id": "p1", "name": "Solo", "price": 49.0}]}))
}

#[tokio::test]
async fn login_persists_session_and_sends_bearer_token() {
    let srv = TestServer::spawn().await;
    let (state, storage) = srv.state(srv.config()).await;

    let user = state.session.login("ana@firm.com", "secret").await.unwrap();
    assert_eq!(user.email, "ana@firm.com");
    assert_eq!(user.id.as_ref().map(|id| id.as_str()), Some("u1"));
    assert!(state.session.capabilities().unwrap().is_attorney);

    let token = storage.get(StorageKey::Token).await.unwrap().unwrap();
    assert_eq!(state.session.token().as_deref(), Some(token.as_str()));
    assert_eq!(storage.get(StorageKey::CompanyId).await.unwrap().as_deref(), Some("co1"));
    let stored: Value = serde_json::from_str(&storage.get(StorageKey::User).await.unwrap().unwrap()).unwrap();
    assert_eq!(stored["barNumber"], "NY-123");

    let refreshed = state.session.refresh_profile().await.unwrap();
    assert_eq!(refreshed.last_name, "Lima-Souza");
    assert_eq!(srv.upstream.bearer_tokens.lock().unwrap().clone(), vec![Some(token)]);
}

#[tokio::test]
async fn failed_login_surfaces_server_message_and_writes_nothing() {
    let srv = TestServer::spawn().await;
    let (state, storage) = srv.state(srv.config()).await;

    let err = state.session.login("ana@firm.com", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed: Invalid credentials");
    assert!(!state.session.is_authenticated());
    assert_eq!(storage.write_count(), 0);

    let err = state.api.auth().profile().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Failed to fetch profile: No token provided");
}

#[tokio::test]
async fn list_endpoints_normalize_every_envelope() {
    let srv = TestServer::spawn().await;
    let (state, _) = srv.state(srv.config()).await;

    let res = state.api.clients().list(&ClientQuery::default()).await.unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.status_text, "OK");
    let ids: Vec<_> = res.data.iter().filter_map(|c| c.id.clone()).collect();
    assert_eq!(ids, vec![ClientId::new("c1"), ClientId::new("c2")]);

    let res = state
        .api
        .clients()
        .list(&ClientQuery::search("mar").page(1, 20))
        .await
        .unwrap();
    assert_eq!(res.data.len(), 1);
    assert_eq!(res.data[0].display_name(), "Maria Silva");

    let docs = state.api.documents().list(None).await.unwrap().data;
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].name, "passport.pdf");
    assert_eq!(docs[1].status, casedesk_core::DocumentStatus::Unknown);

    let users = state.api.company().users(&CompanyId::new("co1")).await.unwrap().data;
    assert_eq!(users.len(), 2);
    assert!(users[1].capabilities().is_paralegal);
}

#[tokio::test]
async fn errors_carry_a_domain_prefix() {
    let srv = TestServer::spawn().await;
    let (state, _) = srv.state(srv.config()).await;

    let err = state.api.cases().list(&Default::default()).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "Failed to fetch cases: 500 Internal Server Error");

    let err = state.api.clients().get(&ClientId::new("missing")).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Failed to fetch client: Client not found");

    // Path parameters are percent-encoded, so this reaches the `:id` route intact.
    let client = state.api.clients().get(&ClientId::new("c 1/x")).await.unwrap().data;
    assert_eq!(client.id, Some(ClientId::new("c 1/x")));
}

#[tokio::test]
async fn unreachable_api_is_a_prefixed_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::default().with_api_url(format!("http://{}/api", addr));
    let state = AppState::with_storage(config, Arc::new(MemoryStorage::new())).await.unwrap();
    let err = state.api.clients().list(&ClientQuery::default()).await.unwrap_err();
    assert!(matches!(err, casedesk_client::ApiError::Network { .. }));
    assert!(err.to_string().starts_with("Failed to fetch clients: "));
}

#[tokio::test]
async fn disabled_feature_never_touches_the_network() {
    let srv = TestServer::spawn().await;

    let disabled = srv.config().with_features(FeatureFlags {
        billing: false,
        ..FeatureFlags::default()
    });
    let (state, _) = srv.state(disabled).await;
    let res = state.api.billing().plans().await.unwrap();
    assert!(res.data.is_empty());
    assert_eq!(res.status, 200);
    assert_eq!(res.status_text, "Feature disabled");
    assert_eq!(srv.upstream.billing_hits.load(Ordering::SeqCst), 0);

    let (state, _) = srv.state(srv.config()).await;
    let res = state.api.billing().plans().await.unwrap();
    assert_eq!(res.data.len(), 1);
    assert_eq!(srv.upstream.billing_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn upload_and_download_documents() {
    let srv = TestServer::spawn().await;
    let (state, _) = srv.state(srv.config()).await;

    let uploaded = state
        .api
        .documents()
        .upload(DocumentUpload {
            file_name: "i-94.pdf".into(),
            mime_type: "application/pdf".into(),
            bytes: vec![0u8; 128],
            doc_type: "i-94".into(),
            client_id: Some(ClientId::new("c1")),
            case_id: None,
            tags: vec!["travel".into(), "cbp".into()],
        })
        .await
        .unwrap()
        .data;
    assert_eq!(uploaded.id, Some(DocumentId::new("d9")));
    assert_eq!(uploaded.name, "i-94.pdf");
    assert_eq!(uploaded.doc_type.as_deref(), Some("i-94"));
    assert_eq!(uploaded.client_id, Some(ClientId::new("c1")));
    assert_eq!(uploaded.file_size, Some(128));
    assert_eq!(uploaded.tags, vec!["travel", "cbp"]);

    let file = state.api.documents().download(&DocumentId::new("d9")).await.unwrap().data;
    assert_eq!(file.file_name.as_deref(), Some("d9.pdf"));
    assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(file.bytes, b"%PDF-1.7 fake");
}

#[tokio::test]
async fn every_gated_group_short_circuits_when_disabled() {
    let srv = TestServer::spawn().await;
    let all_off = srv.config().with_features(FeatureFlags {
        billing: false,
        company: false,
        foia: false,
        workflows: false,
    });
    let (state, _) = srv.state(all_off).await;

    let company = state.api.company().get(&CompanyId::new("co1")).await.unwrap();
    assert!(company.is_feature_disabled());
    assert_eq!(company.data, Company::default());
    let users = state.api.company().users(&CompanyId::new("co1")).await.unwrap();
    assert!(users.is_feature_disabled() && users.data.is_empty());
    let foia = state.api.foia().list(None).await.unwrap();
    assert!(foia.is_feature_disabled() && foia.data.is_empty());
    let workflows = state.api.workflows().list().await.unwrap();
    assert!(workflows.is_feature_disabled() && workflows.data.is_empty());
    assert_eq!(srv.upstream.gated_hits.load(Ordering::SeqCst), 0);

    let (state, _) = srv.state(srv.config()).await;
    let company = state.api.company().get(&CompanyId::new("co1")).await.unwrap();
    assert!(!company.is_feature_disabled());
    assert_eq!(company.data.id, Some(CompanyId::new("co1")));
    assert_eq!(company.data.name, "Lima Immigration Law");
    let foia = state.api.foia().list(None).await.unwrap().data;
    assert_eq!(foia.len(), 1);
    assert_eq!(foia[0].agency, "USCIS");
    let workflows = state.api.workflows().list().await.unwrap().data;
    assert_eq!(workflows.len(), 1);
    assert_eq!(workflows[0].id, Some(WorkflowId::new("w1")));
    assert_eq!(srv.upstream.gated_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn create_case_and_change_password() {
    let srv = TestServer::spawn().await;
    let (state, _) = srv.state(srv.config()).await;

    let res = state
        .api
        .cases()
        .create(&CaseInput {
            client_id: ClientId::new("c1"),
            category: "I-130".into(),
            subcategory: None,
            assigned_attorney: None,
            priority: Some("high".into()),
            description: None,
            due_date: None,
        })
        .await
        .unwrap();
    assert_eq!(res.status, 201);
    assert_eq!(res.status_text, "Created");
    assert_eq!(res.data.id, Some(CaseId::new("k1")));
    assert_eq!(res.data.client_id, Some(ClientId::new("c1")));
    assert_eq!(res.data.category.as_deref(), Some("I-130"));
    assert_eq!(res.data.status, CaseStatus::Open);

    let change = |current: &str| PasswordChange {
        current_password: current.into(),
        new_password: "n3w-secret".into(),
    };
    let err = state.api.auth().change_password(&change("secret")).await.unwrap_err();
    assert!(err.is_unauthorized());

    state.session.login("ana@firm.com", "secret").await.unwrap();
    let err = state.api.auth().change_password(&change("wrong")).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Failed to change password: Current password is incorrect");

    let res = state.api.auth().change_password(&change("secret")).await.unwrap();
    assert_eq!(res.data["message"], "Password updated");
}
