//! Backend HTTP client integration tests.
//!
//! Each test runs the real Sonarr/Radarr client against an in-process axum
//! server that plays the backend:
//! - API key and basic auth headers
//! - Lookup, library, tag and update endpoints
//! - 201-only create semantics
//! - Malformed bodies and error statuses

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio_test::{assert_err, assert_ok};

use arrbot_core::testing::fixtures;
use arrbot_core::{
    create_backend_client, BackendClient, BackendError, BackendKind, BasicAuth, CatalogRecord,
    ConnectorConfig, CreateOptions, ItemId,
};

/// A request as the fake backend saw it.
#[derive(Debug, Clone)]
struct Captured {
    method: Method,
    path: String,
    query: String,
    api_key: Option<String>,
    authorization: Option<String>,
    body: Option<Value>,
}

/// Canned answers keyed by `"{METHOD} {path}"`.
#[derive(Default)]
struct FakeState {
    routes: HashMap<String, (StatusCode, String)>,
    requests: Vec<Captured>,
}

#[derive(Clone, Default)]
struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    async fn route(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.route_raw(method, path, status, body.to_string()).await;
    }

    async fn route_raw(&self, method: Method, path: &str, status: StatusCode, body: String) {
        self.state
            .lock()
            .await
            .routes
            .insert(format!("{} /api/v3/{}", method, path), (status, body));
    }

    async fn requests(&self) -> Vec<Captured> {
        self.state.lock().await.requests.clone()
    }

    async fn requests_to(&self, method: Method, path: &str) -> Vec<Captured> {
        let full = format!("/api/v3/{}", path);
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method == method && r.path == full)
            .collect()
    }

    async fn serve(&self) -> SocketAddr {
        let app = Router::new().fallback(handle).with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        addr
    }
}

async fn handle(
    State(fake): State<FakeBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let captured = Captured {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        api_key: header("x-api-key"),
        authorization: header("authorization"),
        body: serde_json::from_slice(&body).ok(),
    };

    let mut state = fake.state.lock().await;
    state.requests.push(captured);
    state
        .routes
        .get(&format!("{} {}", method, uri.path()))
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, "{}".to_string()))
}

/// Test helper wiring a client to a fake backend.
struct TestHarness {
    fake: FakeBackend,
    client: Arc<dyn BackendClient>,
}

impl TestHarness {
    async fn new(kind: BackendKind) -> Self {
        Self::with_config(kind, |_| {}).await
    }

    async fn with_config(kind: BackendKind, adjust: impl FnOnce(&mut ConnectorConfig)) -> Self {
        let fake = FakeBackend::default();
        let addr = fake.serve().await;

        let name = match kind {
            BackendKind::Series => "sonarr",
            BackendKind::Movie => "radarr",
        };
        let mut config = fixtures::connector_config(name, kind);
        config.url = format!("http://{}/", addr);
        adjust(&mut config);

        let client = create_backend_client(&config).expect("Failed to create client");
        Self { fake, client }
    }
}

fn options() -> CreateOptions {
    CreateOptions {
        root_dir: "/media/TV".to_string(),
        quality_profile_id: 1,
        search_on_create: true,
    }
}

fn rick_and_morty() -> Value {
    json!({
        "title": "Rick and Morty",
        "year": 2013,
        "tvdbId": 275274,
        "tvRageId": 33381,
        "titleSlug": "rick-and-morty",
        "images": [{"coverType": "poster", "url": "/poster.jpg"}],
        "seasons": [{"seasonNumber": 1, "monitored": true}],
        "overview": "not copied"
    })
}

// =============================================================================
// Sonarr
// =============================================================================

#[tokio::test]
async fn test_sonarr_search_sends_api_key_and_term() {
    let h = TestHarness::new(BackendKind::Series).await;
    h.fake
        .route(
            Method::GET,
            "series/lookup",
            StatusCode::OK,
            json!([
                rick_and_morty(),
                {"title": "Rick and Morty: Extras", "tvdbId": 0},
                {"title": "Rick Steves", "year": 2000, "tvdbId": "81189"}
            ]),
        )
        .await;

    let results = assert_ok!(h.client.search("rick and morty").await);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].title, "Rick and Morty");
    assert_eq!(results[0].year, Some(2013));
    assert_eq!(results[0].item_id, Some(ItemId::new(275274)));
    assert_eq!(results[1].item_id, None);
    assert_eq!(results[2].item_id, Some(ItemId::new(81189)));

    let requests = h.fake.requests_to(Method::GET, "series/lookup").await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].api_key.as_deref(), Some("sonarr-api-key"));
    assert!(requests[0].query.starts_with("term=rick"));
    assert_eq!(requests[0].authorization, None);
}

#[tokio::test]
async fn test_sonarr_basic_auth_header() {
    let h = TestHarness::with_config(BackendKind::Series, |config| {
        config.basic_auth = Some(BasicAuth {
            username: "user".to_string(),
            password: "pass".to_string(),
        });
    })
    .await;
    h.fake
        .route(Method::GET, "series", StatusCode::OK, json!([]))
        .await;

    assert_ok!(h.client.list_library().await);
    let requests = h.fake.requests().await;
    assert_eq!(requests[0].authorization.as_deref(), Some("Basic dXNlcjpwYXNz"));
}

#[tokio::test]
async fn test_sonarr_library_skips_unusable_ids() {
    let h = TestHarness::new(BackendKind::Series).await;
    h.fake
        .route(
            Method::GET,
            "series",
            StatusCode::OK,
            json!([
                {"id": 1, "title": "Lost", "tvdbId": 73739},
                {"id": 2, "title": "Broken", "tvdbId": null}
            ]),
        )
        .await;

    let library = assert_ok!(h.client.list_library().await);
    assert_eq!(library.len(), 1);
    assert_eq!(library[0].native_id, ItemId::new(73739));
    assert_eq!(library[0].title, "Lost");
}

#[tokio::test]
async fn test_sonarr_create_payload() {
    let h = TestHarness::new(BackendKind::Series).await;
    h.fake
        .route(Method::GET, "series/lookup", StatusCode::OK, json!([rick_and_morty()]))
        .await;
    h.fake
        .route(
            Method::POST,
            "series",
            StatusCode::CREATED,
            json!({"id": 12, "title": "Rick and Morty", "tvdbId": 275274, "tags": []}),
        )
        .await;

    let record = assert_ok!(h.client.create(ItemId::new(275274), &options()).await);
    assert_eq!(record.id(), Some(12));

    let lookups = h.fake.requests_to(Method::GET, "series/lookup").await;
    assert_eq!(lookups.len(), 1);
    assert!(lookups[0].query.contains("275274"));

    let posts = h.fake.requests_to(Method::POST, "series").await;
    let body = posts[0].body.clone().expect("create body is JSON");
    assert_eq!(body["tvdbId"], json!(275274));
    assert_eq!(body["titleSlug"], json!("rick-and-morty"));
    assert_eq!(body["rootFolderPath"], json!("/media/TV"));
    assert_eq!(body["qualityProfileId"], json!(1));
    assert_eq!(body["languageProfileId"], json!(1));
    assert_eq!(body["monitored"], json!(true));
    assert_eq!(body["addOptions"]["searchForMissingEpisodes"], json!(true));
    assert!(body.get("overview").is_none());
}

#[tokio::test]
async fn test_sonarr_create_requires_201() {
    let h = TestHarness::new(BackendKind::Series).await;
    h.fake
        .route(Method::GET, "series/lookup", StatusCode::OK, json!([rick_and_morty()]))
        .await;
    h.fake
        .route(
            Method::POST,
            "series",
            StatusCode::OK,
            json!({"id": 12, "tvdbId": 275274}),
        )
        .await;

    let err = assert_err!(h.client.create(ItemId::new(275274), &options()).await);
    assert!(matches!(err, BackendError::Status { status: 200, .. }));
}

#[tokio::test]
async fn test_sonarr_create_unknown_item() {
    let h = TestHarness::new(BackendKind::Series).await;
    h.fake
        .route(Method::GET, "series/lookup", StatusCode::OK, json!([]))
        .await;

    let err = assert_err!(h.client.create(ItemId::new(1), &options()).await);
    assert!(matches!(err, BackendError::ItemNotFound(id) if id == ItemId::new(1)));
    assert!(h.fake.requests_to(Method::POST, "series").await.is_empty());
}

#[tokio::test]
async fn test_sonarr_tags_and_update() {
    let h = TestHarness::new(BackendKind::Series).await;
    h.fake
        .route(
            Method::GET,
            "tag",
            StatusCode::OK,
            json!([{"id": 7, "label": "kids"}, {"id": 9, "label": "4k"}]),
        )
        .await;
    h.fake
        .route(Method::PUT, "series/12", StatusCode::ACCEPTED, json!({}))
        .await;

    let tags = assert_ok!(h.client.list_tags().await);
    assert_eq!(tags, vec![fixtures::tag(7, "kids"), fixtures::tag(9, "4k")]);

    let mut record: CatalogRecord =
        serde_json::from_value(json!({"id": 12, "title": "Rick and Morty", "tags": [3]})).unwrap();
    record.set_tag_ids(&[3, 7]);
    assert_ok!(h.client.update(&record).await);

    let puts = h.fake.requests_to(Method::PUT, "series/12").await;
    assert_eq!(puts.len(), 1);
    let body = puts[0].body.clone().expect("update body is JSON");
    assert_eq!(body["tags"], json!([3, 7]));
    assert_eq!(body["title"], json!("Rick and Morty"));
}

#[tokio::test]
async fn test_update_without_record_id_is_format_error() {
    let h = TestHarness::new(BackendKind::Series).await;
    let err = assert_err!(h.client.update(&CatalogRecord::default()).await);
    assert!(matches!(err, BackendError::Format(_)));
    assert!(h.fake.requests().await.is_empty());
}

#[tokio::test]
async fn test_error_status_and_malformed_body() {
    let h = TestHarness::new(BackendKind::Series).await;
    h.fake
        .route(
            Method::GET,
            "series/lookup",
            StatusCode::UNAUTHORIZED,
            json!({"error": "Unauthorized"}),
        )
        .await;
    h.fake
        .route_raw(Method::GET, "series", StatusCode::OK, "<html>".to_string())
        .await;

    let err = assert_err!(h.client.search("lost").await);
    assert!(matches!(err, BackendError::Status { status: 401, .. }));
    assert!(err.is_transport());

    let err = assert_err!(h.client.list_library().await);
    assert!(matches!(err, BackendError::Format(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let mut config = fixtures::connector_config("sonarr", BackendKind::Series);
    // Nothing listens on the discard port.
    config.url = "http://127.0.0.1:9".to_string();
    let client = create_backend_client(&config).unwrap();

    let err = assert_err!(client.search("lost").await);
    assert!(matches!(err, BackendError::Transport(_)));
}

// =============================================================================
// Radarr
// =============================================================================

#[tokio::test]
async fn test_radarr_search_and_create() {
    let h = TestHarness::new(BackendKind::Movie).await;
    h.fake
        .route(
            Method::GET,
            "movie/lookup",
            StatusCode::OK,
            json!([{"title": "Dune", "year": 2021, "tmdbId": 438631}]),
        )
        .await;
    h.fake
        .route(
            Method::GET,
            "movie/lookup/tmdb",
            StatusCode::OK,
            json!({"title": "Dune", "year": 2021, "tmdbId": 438631, "titleSlug": "dune-438631", "images": []}),
        )
        .await;
    h.fake
        .route(
            Method::POST,
            "movie",
            StatusCode::CREATED,
            json!({"id": 3, "title": "Dune", "tmdbId": 438631, "tags": []}),
        )
        .await;

    let results = assert_ok!(h.client.search("dune").await);
    assert_eq!(results, vec![fixtures::candidate("Dune", Some(2021), Some(438631))]);

    let record = assert_ok!(h.client.create(ItemId::new(438631), &options()).await);
    assert_eq!(record.id(), Some(3));

    let lookups = h.fake.requests_to(Method::GET, "movie/lookup/tmdb").await;
    assert_eq!(lookups[0].query, "tmdbId=438631");

    let posts = h.fake.requests_to(Method::POST, "movie").await;
    let body = posts[0].body.clone().expect("create body is JSON");
    assert_eq!(body["tmdbId"], json!(438631));
    assert_eq!(body["addOptions"]["searchForMovie"], json!(true));
    assert_eq!(posts[0].api_key.as_deref(), Some("radarr-api-key"));
}

#[tokio::test]
async fn test_radarr_lookup_mismatch_is_not_found() {
    let h = TestHarness::new(BackendKind::Movie).await;
    h.fake
        .route(
            Method::GET,
            "movie/lookup/tmdb",
            StatusCode::OK,
            json!({"title": "Other", "tmdbId": 1}),
        )
        .await;

    let err = assert_err!(h.client.create(ItemId::new(438631), &options()).await);
    assert!(matches!(err, BackendError::ItemNotFound(_)));
}
