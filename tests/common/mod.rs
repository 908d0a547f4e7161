// ============================================================================
// Serveurs factices pour les tests d'intégration
// ============================================================================
// - FakeStore : imite la collection "transactions" de RestDB
//   (filtre q=..., POST, PATCH merge, DELETE non idempotent, clé x-apikey)
// - fake_aggregator : imite GET /api/<coin>/<fiat>/<volume> de CriptoYa
// ============================================================================

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Url;
use serde_json::{json, Map, Value};

pub const API_KEY: &str = "test-api-key";

/// Lance un routeur axum sur un port libre et retourne son adresse
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

// ============================================================================
// Faux document store
// ============================================================================

#[derive(Clone, Default)]
pub struct FakeStore {
    docs: Arc<Mutex<Vec<Map<String, Value>>>>,
    next_id: Arc<AtomicU64>,
    requests: Arc<AtomicUsize>,
}

impl FakeStore {
    /// Démarre le serveur et retourne l'URL de base (".../rest/")
    pub async fn start(&self) -> Url {
        let router = Router::new()
            .route("/rest/transactions", get(list).post(create))
            .route("/rest/transactions/{id}", axum::routing::patch(update).delete(remove))
            .with_state(self.clone());
        let addr = spawn(router).await;
        Url::parse(&format!("http://{}/rest/", addr)).unwrap()
    }

    /// Nombre de requêtes reçues
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Document brut stocké, tel que le store le voit
    pub fn raw(&self, id: &str) -> Option<Map<String, Value>> {
        self.docs
            .lock()
            .unwrap()
            .iter()
            .find(|doc| doc.get("_id") == Some(&json!(id)))
            .cloned()
    }

    /// Insère directement un document (sans passer par l'API)
    pub fn insert_raw(&self, doc: Value) {
        if let Value::Object(map) = doc {
            self.docs.lock().unwrap().push(map);
        }
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match headers.get("x-apikey").and_then(|v| v.to_str().ok()) {
            Some(API_KEY) => Ok(()),
            _ => Err((StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid apikey" }))).into_response()),
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not found" }))).into_response()
}

async fn list(
    State(store): State<FakeStore>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = store.authorize(&headers) {
        return resp;
    }

    let filter: Map<String, Value> = match params.get("q") {
        Some(q) => match serde_json::from_str(q) {
            Ok(filter) => filter,
            Err(_) => return (StatusCode::BAD_REQUEST, Json(json!({ "message": "bad query" }))).into_response(),
        },
        None => Map::new(),
    };

    let docs = store.docs.lock().unwrap();
    let matching: Vec<Value> = docs
        .iter()
        .filter(|doc| filter.iter().all(|(k, v)| doc.get(k) == Some(v)))
        .map(|doc| Value::Object(doc.clone()))
        .collect();

    Json(Value::Array(matching)).into_response()
}

async fn create(State(store): State<FakeStore>, headers: HeaderMap, Json(body): Json<Map<String, Value>>) -> Response {
    if let Err(resp) = store.authorize(&headers) {
        return resp;
    }

    let id = format!("{:024x}", store.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    let mut doc = body;
    doc.insert("_id".to_string(), json!(id));
    doc.insert("_created".to_string(), json!("2024-05-01T00:00:00.000Z"));
    store.docs.lock().unwrap().push(doc.clone());

    (StatusCode::CREATED, Json(Value::Object(doc))).into_response()
}

async fn update(
    State(store): State<FakeStore>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> Response {
    if let Err(resp) = store.authorize(&headers) {
        return resp;
    }

    let mut docs = store.docs.lock().unwrap();
    match docs.iter_mut().find(|doc| doc.get("_id") == Some(&json!(id))) {
        Some(doc) => {
            for (k, v) in patch {
                doc.insert(k, v);
            }
            Json(Value::Object(doc.clone())).into_response()
        }
        None => not_found(),
    }
}

async fn remove(State(store): State<FakeStore>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(resp) = store.authorize(&headers) {
        return resp;
    }

    let mut docs = store.docs.lock().unwrap();
    let before = docs.len();
    docs.retain(|doc| doc.get("_id") != Some(&json!(id)));

    if docs.len() == before {
        return not_found();
    }
    Json(json!({ "result": [id] })).into_response()
}

// ============================================================================
// Faux agrégateur de prix
// ============================================================================

/// Corps renvoyé pour btc/usd
pub fn btc_usd_body() -> Value {
    json!({
        "binance": { "ask": 67010.5, "totalAsk": 67010.5, "bid": 66990.1, "totalBid": 66990.1, "time": 1714566000 },
        "kraken": { "ask": 67100.0, "totalAsk": 67250.3, "bid": 67050.0, "totalBid": 66900.0, "time": 1714566002, "spread": 0.1 },
        "ripio": { "ask": "67200", "totalAsk": null, "bid": 67000, "time": 1714566001.5 }
    })
}

/// Démarre le faux agrégateur et retourne l'URL de base (".../api/")
///
/// - btc/usd/*   : cotation valide
/// - down/*/*    : HTTP 503
/// - autre       : HTTP 200 avec un corps texte non JSON ("Invalid pair")
pub async fn start_fake_aggregator() -> Url {
    async fn quote(Path((coin, fiat, _volume)): Path<(String, String, String)>) -> Response {
        match (coin.as_str(), fiat.as_str()) {
            ("btc", "usd") => Json(btc_usd_body()).into_response(),
            ("down", _) => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
            _ => (StatusCode::OK, "Invalid pair").into_response(),
        }
    }

    let router = Router::new().route("/api/{coin}/{fiat}/{volume}", get(quote));
    let addr = spawn(router).await;
    Url::parse(&format!("http://{}/api/", addr)).unwrap()
}
