//! Wordbook Document Server
//!
//! Stores each account's favorites and history documents so that the CLI can
//! reconcile them across devices.
//!
//! # Configuration
//!
//! Environment variables:
//! - `WORDBOOK_PORT`: Port to listen on (default: 8080)
//! - `WORDBOOK_DATA_DIR`: Directory to store documents (default: ~/.local/share/wordbook-server)
//! - `WORDBOOK_CONFIG`: Path to config file (default: ~/.config/wordbook-server/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! api_keys:
//!   - key: "your-secret-key-here"
//!     account_id: "user1"
//! ```
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET /me`: Returns the account bound to the key
//! - `GET /accounts/{id}/documents/{kind}`: Read a document (404 if absent)
//! - `PUT /accounts/{id}/documents/{kind}`: Replace a document
//! - `POST /accounts/{id}/batch`: Replace several documents at once

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordbook::server::storage::decode;
use wordbook::server::{AccountStorage, ServerStorageError};
use wordbook_core::{DocKind, RemoteDocument};

// ============================================================================
// Configuration
// ============================================================================

/// API key entry in config
#[derive(Debug, Clone, Deserialize)]
struct ApiKeyEntry {
    key: String,
    account_id: String,
}

/// Config file structure
#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    api_keys: Vec<ApiKeyEntry>,
}

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// Directory to store account documents
    data_dir: PathBuf,
    /// Path to config file
    config_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("WORDBOOK_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("WORDBOOK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("wordbook-server")
            });

        let config_path = std::env::var("WORDBOOK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("wordbook-server")
                    .join("config.yaml")
            });

        Self {
            port,
            data_dir,
            config_path,
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Authenticated account, added to request extensions after auth
#[derive(Debug, Clone)]
struct AuthAccount {
    account_id: String,
}

/// API key store - maps key -> AuthAccount
#[derive(Debug, Clone, Default)]
struct ApiKeyStore {
    keys: HashMap<String, AuthAccount>,
}

impl ApiKeyStore {
    fn from_entries(entries: Vec<ApiKeyEntry>) -> Self {
        let keys = entries
            .into_iter()
            .map(|entry| {
                (
                    entry.key,
                    AuthAccount {
                        account_id: entry.account_id,
                    },
                )
            })
            .collect();
        Self { keys }
    }

    /// Load API keys from config file
    fn load(config_path: &FsPath) -> Self {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match serde_yaml::from_str::<ConfigFile>(&contents) {
                Ok(config) => {
                    let store = Self::from_entries(config.api_keys);
                    tracing::info!("Loaded {} API key(s)", store.keys.len());
                    store
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
                tracing::warn!("No API keys loaded - all authenticated requests will fail");
                Self::default()
            }
        }
    }

    /// Validate an API key and return the associated account
    fn validate(&self, key: &str) -> Option<AuthAccount> {
        self.keys.get(key).cloned()
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    api_keys: Arc<ApiKeyStore>,
    /// Readers share the lock; single writes and batches take it exclusively.
    storage: Arc<RwLock<AccountStorage>>,
}

/// Error response body
#[derive(Serialize)]
struct ApiError {
    error: &'static str,
    message: String,
}

fn error_response(status: StatusCode, error: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            error,
            message: message.into(),
        }),
    )
        .into_response()
}

/// Authentication middleware
async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let api_key = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(key) => key,
            None => {
                return error_response(
                    StatusCode::UNAUTHORIZED,
                    "invalid_auth",
                    "Authorization header must use Bearer scheme",
                );
            }
        },
        None => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "missing_auth",
                "Authorization header required",
            );
        }
    };

    match state.api_keys.validate(api_key) {
        Some(account) => {
            request.extensions_mut().insert(account);
            next.run(request).await
        }
        None => error_response(StatusCode::UNAUTHORIZED, "invalid_key", "Invalid API key"),
    }
}

/// Rejects requests for an account other than the key's own.
fn authorize(account: &AuthAccount, account_id: &str) -> Result<(), Response> {
    if account.account_id != account_id {
        tracing::warn!(
            key_account = %account.account_id,
            requested = %account_id,
            "rejected cross-account request"
        );
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "forbidden",
            "API key does not grant access to this account",
        ));
    }
    Ok(())
}

fn parse_kind(kind: &str) -> Result<DocKind, Response> {
    DocKind::parse(kind).ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            "unknown_document",
            format!("Unknown document kind: {}", kind),
        )
    })
}

fn storage_error(e: ServerStorageError) -> Response {
    match e {
        ServerStorageError::InvalidAccountId(_) | ServerStorageError::InvalidDocKind(_) => {
            error_response(StatusCode::BAD_REQUEST, "invalid_request", e.to_string())
        }
        ServerStorageError::DuplicateInBatch(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, "invalid_batch", e.to_string())
        }
        ServerStorageError::IoError(_, _) | ServerStorageError::JsonError(_, _) => {
            tracing::error!("Storage error: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "Failed to access document storage",
            )
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Current account response
#[derive(Serialize)]
struct MeResponse {
    account_id: String,
}

/// Get the account bound to the key (auth required)
async fn me(Extension(account): Extension<AuthAccount>) -> Json<MeResponse> {
    Json(MeResponse {
        account_id: account.account_id,
    })
}

/// Batch commit request body
#[derive(Deserialize)]
struct BatchRequest {
    documents: Vec<RemoteDocument>,
}

async fn get_document(
    State(state): State<AppState>,
    Extension(account): Extension<AuthAccount>,
    Path((account_id, kind)): Path<(String, String)>,
) -> Response {
    if let Err(response) = authorize(&account, &account_id) {
        return response;
    }
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let storage = state.storage.read().await;
    match storage.load(&account_id, kind) {
        Ok(Some(RemoteDocument::Favorites(doc))) => Json(doc).into_response(),
        Ok(Some(RemoteDocument::History(doc))) => Json(doc).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("No {} document for this account", kind.name()),
        ),
        Err(e) => storage_error(e),
    }
}

async fn put_document(
    State(state): State<AppState>,
    Extension(account): Extension<AuthAccount>,
    Path((account_id, kind)): Path<(String, String)>,
    body: axum::body::Bytes,
) -> Response {
    if let Err(response) = authorize(&account, &account_id) {
        return response;
    }
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let doc = match decode(kind, &body) {
        Ok(doc) => doc,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid_document", e.to_string())
        }
    };

    let storage = state.storage.write().await;
    match storage.save(&account_id, &doc) {
        Ok(()) => {
            tracing::debug!(account = %account_id, kind = kind.name(), "document saved");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => storage_error(e),
    }
}

async fn commit_batch(
    State(state): State<AppState>,
    Extension(account): Extension<AuthAccount>,
    Path(account_id): Path<String>,
    Json(batch): Json<BatchRequest>,
) -> Response {
    if let Err(response) = authorize(&account, &account_id) {
        return response;
    }

    let storage = state.storage.write().await;
    match storage.commit_batch(&account_id, &batch.documents) {
        Ok(()) => {
            tracing::info!(
                account = %account_id,
                documents = batch.documents.len(),
                "batch committed"
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => storage_error(e),
    }
}

fn app(state: AppState) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new().route("/health", get(health));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/me", get(me))
        .route(
            "/accounts/{account_id}/documents/{kind}",
            get(get_document).put(put_document),
        )
        .route("/accounts/{account_id}/batch", post(commit_batch))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wordbook_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Config file: {}", config.config_path.display());

    let state = AppState {
        api_keys: Arc::new(ApiKeyStore::load(&config.config_path)),
        storage: Arc::new(RwLock::new(AccountStorage::new(config.data_dir))),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
