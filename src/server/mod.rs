#![allow(clippy::result_large_err)] // Server helpers return AppError for consistent diagnostics.

mod pages;

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use axum::{
    extract::Extension,
    http::header,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DocsSettings {
    /// OpenAPI document produced by `apidocs convert`.
    pub document_path: PathBuf,
    pub bind: SocketAddr,
    /// Route serving Swagger UI, e.g. `/api-docs`.
    pub docs_route: String,
}

/// Document snapshot shared across requests; read once at startup.
struct DocsState {
    title: String,
    docs_route: String,
    yaml: String,
    json: Value,
}

pub struct DocsServer {
    settings: DocsSettings,
    state: Arc<DocsState>,
}

impl DocsServer {
    /// Load the document and prepare the server. The document is not reloaded.
    pub fn new(settings: DocsSettings) -> Result<Self, AppError> {
        if !is_valid_docs_route(&settings.docs_route) {
            return Err(AppError::new(
                ErrorCategory::ServerError,
                format!(
                    "docs route '{}' must start with '/', not end with '/', and not be the root",
                    settings.docs_route
                ),
            )
            .with_code("DOCS-004"));
        }
        let yaml = std::fs::read_to_string(&settings.document_path).map_err(|err| {
            AppError::new(
                ErrorCategory::ServerError,
                format!(
                    "failed to read OpenAPI document {}: {}",
                    settings.document_path.display(),
                    err
                ),
            )
            .with_code("DOCS-001")
        })?;
        let json: Value = serde_yaml::from_str(&yaml).map_err(|err| {
            AppError::new(
                ErrorCategory::ServerError,
                format!(
                    "OpenAPI document {} is not valid YAML: {}",
                    settings.document_path.display(),
                    err
                ),
            )
            .with_code("DOCS-002")
        })?;
        let title = json
            .pointer("/info/title")
            .and_then(Value::as_str)
            .unwrap_or("API documentation")
            .to_string();
        let state = Arc::new(DocsState {
            title,
            docs_route: settings.docs_route.clone(),
            yaml,
            json,
        });
        Ok(Self { settings, state })
    }

    pub fn settings(&self) -> &DocsSettings {
        &self.settings
    }

    pub fn router(&self) -> Router {
        let route = self.settings.docs_route.trim_end_matches('/').to_string();
        Router::new()
            .route("/", get(handle_index))
            .route(&route, get(handle_swagger_ui))
            .route(&format!("{}/", route), get(handle_swagger_ui))
            .route(&format!("{}/openapi.json", route), get(handle_json))
            .route(&format!("{}/openapi.yaml", route), get(handle_yaml))
            .layer(
                ServiceBuilder::new()
                    .layer(Extension(self.state.clone()))
                    .layer(CorsLayer::permissive()),
            )
    }

    /// Bind and serve until the process exits.
    pub async fn serve(self) -> Result<(), AppError> {
        self.serve_internal(None).await
    }

    /// Serve and report the bound address once listening (test helper).
    pub async fn serve_with_ready_notifier(
        self,
        ready_notifier: oneshot::Sender<SocketAddr>,
    ) -> Result<(), AppError> {
        self.serve_internal(Some(ready_notifier)).await
    }

    async fn serve_internal(
        self,
        ready_notifier: Option<oneshot::Sender<SocketAddr>>,
    ) -> Result<(), AppError> {
        let router = self.router();
        let bind_addr = self.settings.bind;
        let listener = TcpListener::bind(bind_addr).await.map_err(|err| {
            AppError::new(
                ErrorCategory::ServerError,
                format!("failed to bind docs server {}: {}", bind_addr, err),
            )
            .with_code("DOCS-003")
        })?;
        let local_addr = listener.local_addr().map_err(|err| {
            AppError::new(
                ErrorCategory::ServerError,
                format!("failed to determine docs server address: {}", err),
            )
        })?;
        if let Some(tx) = ready_notifier {
            let _ = tx.send(local_addr);
        }
        info!(
            "docs server listening on http://{}{}",
            local_addr, self.settings.docs_route
        );
        axum::serve(listener, router.into_make_service())
            .await
            .map_err(|err| {
                AppError::new(
                    ErrorCategory::ServerError,
                    format!("docs server terminated: {}", err),
                )
            })
    }
}

/// A docs route is an absolute path other than `/` without a trailing slash.
pub fn is_valid_docs_route(route: &str) -> bool {
    route.starts_with('/') && route != "/" && !route.ends_with('/')
}

async fn handle_index(Extension(state): Extension<Arc<DocsState>>) -> Html<String> {
    Html(pages::index_page(&state.title, &state.docs_route))
}

async fn handle_swagger_ui(Extension(state): Extension<Arc<DocsState>>) -> Html<String> {
    let spec_url = format!("{}/openapi.json", state.docs_route.trim_end_matches('/'));
    Html(pages::swagger_ui_page(&state.title, &spec_url))
}

async fn handle_json(Extension(state): Extension<Arc<DocsState>>) -> Json<Value> {
    Json(state.json.clone())
}

async fn handle_yaml(Extension(state): Extension<Arc<DocsState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/yaml; charset=utf-8")],
        state.yaml.clone(),
    )
}
