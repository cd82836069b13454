//! Integration test harness for ArtHive.
//!
//! Tests run against two in-process servers on random local ports:
//!
//! - a stub of the hosted platform that speaks just enough of its REST, auth
//!   and storage conventions (`/rest/v1/<table>` with `col=eq.value`
//!   filters, `/auth/v1/token`, `/storage/v1/object/...`), backed by
//!   in-memory JSON tables
//! - the real storefront router, configured to call the stub
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p arthive-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;
use url::Url;

use arthive_storefront::build_app;
use arthive_storefront::config::{PlatformConfig, StorefrontConfig};
use arthive_storefront::state::AppState;

/// Password every seeded stub account accepts.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Anon key the storefront is configured with in tests.
pub const TEST_ANON_KEY: &str = "test-anon-Zq8rX2vL9kP4mN7w";

// =============================================================================
// Stub platform
// =============================================================================

#[derive(Default)]
struct StubData {
    tables: HashMap<String, Vec<Value>>,
    get_hits: HashMap<String, usize>,
    last_apikey: Option<String>,
    uploads: Vec<String>,
}

/// Handle to a running stub platform.
#[derive(Clone)]
pub struct StubPlatform {
    pub url: Url,
    data: Arc<Mutex<StubData>>,
}

impl StubPlatform {
    fn data(&self) -> std::sync::MutexGuard<'_, StubData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of GET requests served for `table`.
    #[must_use]
    pub fn get_hits(&self, table: &str) -> usize {
        self.data().get_hits.get(table).copied().unwrap_or_default()
    }

    /// The `apikey` header of the most recent request.
    #[must_use]
    pub fn last_apikey(&self) -> Option<String> {
        self.data().last_apikey.clone()
    }

    /// Object paths uploaded so far, as `<bucket>/<path>`.
    #[must_use]
    pub fn uploads(&self) -> Vec<String> {
        self.data().uploads.clone()
    }

    /// Current rows of a table.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.data().tables.get(table).cloned().unwrap_or_default()
    }
}

fn seed() -> HashMap<String, Vec<Value>> {
    let product = |id: &str, title: &str, price: f64, status: &str, featured: bool| {
        json!({
            "id": id,
            "title": title,
            "description": null,
            "price": price,
            "image_url": format!("/img/{id}.jpg"),
            "featured": featured,
            "status": status,
            "artist_id": "u-artist",
            "created_at": "2024-05-01T00:00:00Z",
        })
    };

    let p1 = product("p1", "Harbor Print", 100.0, "approved", true);
    let p2 = product("p2", "Rice Terraces", 50.0, "approved", false);
    let p3 = product("p3", "Unreviewed Sketch", 75.0, "pending", false);

    HashMap::from([
        ("products".to_string(), vec![p1.clone(), p2, p3.clone()]),
        (
            "profiles".to_string(),
            vec![
                json!({"id": "u-artist", "username": "maria", "email": "maria@arthive.test",
                       "role": "artist", "artist_request": false}),
                json!({"id": "u-admin", "username": "boss", "email": "boss@arthive.test",
                       "role": "admin", "artist_request": false}),
                json!({"id": "u-buyer", "username": "jose", "email": "jose@arthive.test",
                       "role": "user", "artist_request": false}),
            ],
        ),
        (
            "colonies".to_string(),
            vec![json!({"id": "c1", "name": "Coastal", "slug": "coastal"})],
        ),
        (
            "product_colony".to_string(),
            vec![
                json!({"product_id": "p1", "colony_id": "c1", "products": p1}),
                json!({"product_id": "p3", "colony_id": "c1", "products": p3}),
            ],
        ),
    ])
}

/// Keep rows whose columns equal every `col=eq.value` filter.
fn matches_filters(row: &Value, query: &HashMap<String, String>) -> bool {
    query.iter().all(|(column, filter)| {
        let Some(expected) = filter.strip_prefix("eq.") else {
            return true;
        };
        match row.get(column) {
            Some(Value::String(s)) => s == expected,
            Some(Value::Bool(b)) => b.to_string() == expected,
            _ => false,
        }
    })
}

fn record(stub: &StubPlatform, headers: &HeaderMap) {
    let apikey = headers
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    stub.data().last_apikey = apikey;
}

async fn select_rows(
    State(stub): State<StubPlatform>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Vec<Value>> {
    record(&stub, &headers);
    let mut data = stub.data();
    *data.get_hits.entry(table.clone()).or_default() += 1;
    let rows = data
        .tables
        .get(&table)
        .map(|rows| {
            rows.iter()
                .filter(|row| matches_filters(row, &query))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Json(rows)
}

async fn insert_rows(
    State(stub): State<StubPlatform>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(mut row): Json<Value>,
) -> Json<Vec<Value>> {
    record(&stub, &headers);
    if let Some(obj) = row.as_object_mut() {
        let next_id = format!("{table}-{}", stub.rows(&table).len() + 1);
        obj.entry("id").or_insert_with(|| Value::String(next_id));
    }
    stub.data()
        .tables
        .entry(table)
        .or_default()
        .push(row.clone());
    Json(vec![row])
}

async fn update_rows(
    State(stub): State<StubPlatform>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Json<Vec<Value>> {
    record(&stub, &headers);
    let mut data = stub.data();
    let mut updated = Vec::new();
    if let (Some(rows), Some(patch)) = (data.tables.get_mut(&table), patch.as_object()) {
        for row in rows.iter_mut().filter(|row| matches_filters(row, &query)) {
            if let Some(obj) = row.as_object_mut() {
                for (key, value) in patch {
                    obj.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
    }
    Json(updated)
}

async fn delete_rows(
    State(stub): State<StubPlatform>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> StatusCode {
    if let Some(rows) = stub.data().tables.get_mut(&table) {
        rows.retain(|row| !matches_filters(row, &query));
    }
    StatusCode::NO_CONTENT
}

fn user_json(profile: &Value) -> Value {
    json!({ "id": profile["id"], "email": profile["email"] })
}

async fn token(State(stub): State<StubPlatform>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let profile = stub
        .rows("profiles")
        .into_iter()
        .find(|p| p["email"] == email);

    match profile {
        Some(profile) if password == TEST_PASSWORD => Json(json!({
            "access_token": format!("token-{}", profile["id"].as_str().unwrap_or_default()),
            "refresh_token": "refresh",
            "expires_in": 3600,
            "user": user_json(&profile),
        }))
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials",
            })),
        )
            .into_response(),
    }
}

async fn signup(State(stub): State<StubPlatform>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if stub.rows("profiles").iter().any(|p| p["email"] == email) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"msg": "User already registered"})),
        )
            .into_response();
    }
    let id = format!("u-{}", email.split('@').next().unwrap_or_default());
    Json(json!({
        "access_token": format!("token-{id}"),
        "user": { "id": id, "email": email },
    }))
    .into_response()
}

async fn current_user(State(stub): State<StubPlatform>, headers: HeaderMap) -> Response {
    let id = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer token-"))
        .map(String::from);

    let profile = id.and_then(|id| stub.rows("profiles").into_iter().find(|p| p["id"] == id));
    match profile {
        Some(profile) => Json(user_json(&profile)).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"msg": "invalid JWT"})),
        )
            .into_response(),
    }
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn upload(
    State(stub): State<StubPlatform>,
    Path((bucket, path)): Path<(String, String)>,
) -> Json<Value> {
    stub.data().uploads.push(format!("{bucket}/{path}"));
    Json(json!({ "Key": format!("{bucket}/{path}") }))
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    addr
}

/// Start a stub platform with seeded catalog, profiles and colonies.
///
/// Seed data:
/// - products `p1` (approved, featured, 100), `p2` (approved, 50) and `p3`
///   (pending, 75), all by `u-artist`
/// - profiles `u-artist` (maria, artist), `u-admin` (boss, admin) and
///   `u-buyer` (jose, user), each signing in with [`TEST_PASSWORD`]
/// - colony `coastal` containing `p1` and `p3`
pub async fn spawn_stub_platform() -> StubPlatform {
    let data = Arc::new(Mutex::new(StubData {
        tables: seed(),
        ..StubData::default()
    }));

    // Placeholder URL, replaced once the port is known
    let mut stub = StubPlatform {
        url: Url::parse("http://127.0.0.1/").expect("static url"),
        data,
    };

    let app = Router::new()
        .route(
            "/rest/v1/{table}",
            get(select_rows)
                .post(insert_rows)
                .patch(update_rows)
                .delete(delete_rows),
        )
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/logout", post(logout))
        .route("/auth/v1/user", get(current_user))
        .route("/storage/v1/object/{bucket}/{path}", post(upload))
        .with_state(stub.clone());

    let addr = serve(app).await;
    stub.url = Url::parse(&format!("http://{addr}/")).expect("stub url");
    stub
}

// =============================================================================
// Storefront
// =============================================================================

/// Storefront configuration pointing at `platform_url`.
#[must_use]
pub fn test_config(platform_url: &Url) -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        platform: PlatformConfig {
            url: platform_url.clone(),
            anon_key: SecretString::from(TEST_ANON_KEY),
            service_key: None,
            cache_ttl: Duration::from_secs(60),
        },
        sentry_dsn: None,
        sentry_environment: "test".to_string(),
    }
}

/// The storefront router wired to `platform_url`, with a fresh session store.
#[must_use]
pub fn storefront_app(platform_url: &Url) -> Router {
    build_app(AppState::new(test_config(platform_url)), MemoryStore::default())
}

/// Start the storefront on a random port and return its base URL.
pub async fn spawn_storefront(platform: &StubPlatform) -> String {
    let addr = serve(storefront_app(&platform.url)).await;
    format!("http://{addr}")
}
