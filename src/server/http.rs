use crate::config::Config;
use crate::error::{DocflowError, Result};
use crate::fetcher::RelationFetcher;
use crate::navigation::BroadcastSink;
use crate::server::types::*;
use crate::session::{Session, SourceRef};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{sse::{Event, KeepAlive, Sse}, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Buffered navigation events per SSE subscriber
const EVENT_BUFFER: usize = 64;

/// Check if a port is available by attempting to bind to it
async fn check_port_available(port: u16) -> bool {
    tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .is_ok()
}

/// HTTP adapter between a graph view and one expansion session
pub struct HttpGraphServer {
    state: AppState,
    allowed_origins: Vec<String>,
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<Session>>,
    events: BroadcastSink,
    default_source_type: String,
}

impl HttpGraphServer {
    /// Create a server around a fresh, empty session
    pub fn new(fetcher: Arc<dyn RelationFetcher>, config: &Config) -> Self {
        Self::with_settings(
            fetcher,
            config.expansion.subgraph_cache_capacity,
            config.expansion.default_source_type.clone(),
            config.http_server.allowed_origins.clone(),
        )
    }

    pub fn with_settings(
        fetcher: Arc<dyn RelationFetcher>,
        cache_capacity: usize,
        default_source_type: String,
        allowed_origins: Vec<String>,
    ) -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        let events = BroadcastSink::new(tx);
        let session = Session::new(fetcher, Arc::new(events.clone()), cache_capacity);

        Self {
            state: AppState {
                session: Arc::new(Mutex::new(session)),
                events,
                default_source_type,
            },
            allowed_origins,
        }
    }

    /// Load the initial graph before serving
    pub async fn load(&self, source: Option<SourceRef>) {
        self.state.session.lock().await.load(source).await;
    }

    /// Run the HTTP server
    pub async fn run(&self, port: u16) -> Result<()> {
        let app = self.create_router();

        let addr = format!("127.0.0.1:{}", port);
        log::info!("Starting document flow server on http://{}", addr);

        if !check_port_available(port).await {
            return Err(DocflowError::Config(format!(
                "Port {} is already in use. Set http_server.port in config.toml to a free port.",
                port
            )));
        }

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            DocflowError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", addr, e),
            ))
        })?;

        axum::serve(listener, app).await.map_err(|e| {
            DocflowError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP server error: {}", e),
            ))
        })?;

        Ok(())
    }

    /// Create the axum router
    pub fn create_router(&self) -> Router {
        let cors = if self.allowed_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<axum::http::HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/health", get(handle_health))
            .route("/graph", get(handle_graph))
            .route("/graph/load", post(handle_load))
            .route("/nodes/:id/expand", post(handle_expand))
            .route("/nodes/:id/collapse", post(handle_collapse))
            .route("/nodes/:id/toggle", post(handle_toggle))
            .route("/nodes/:id/navigate", post(handle_navigate))
            .route("/events", get(handle_events))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
            .with_state(self.state.clone())
    }
}

/// Engine errors mapped onto HTTP status codes
struct ApiError(DocflowError);

impl From<DocflowError> for ApiError {
    fn from(e: DocflowError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DocflowError::NodeNotFound(_) => StatusCode::NOT_FOUND,
            DocflowError::NotExpandable(_) | DocflowError::AlreadyExpanded(_) => StatusCode::CONFLICT,
            DocflowError::Fetch(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Outcome of a mutation plus the graph after it
#[derive(Serialize)]
struct MutationResponse<T: Serialize> {
    result: T,
    graph: GraphResponse,
}

async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "docflow",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}

async fn handle_graph(State(state): State<AppState>) -> Json<GraphResponse> {
    let mut session = state.session.lock().await;
    session.apply_ready();
    Json(GraphResponse::from_session(&session))
}

async fn handle_load(
    State(state): State<AppState>,
    body: Option<Json<LoadRequest>>,
) -> Json<GraphResponse> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let source = request
        .source_id
        .filter(|id| !id.trim().is_empty())
        .map(|source_id| SourceRef {
            source_id,
            source_type: request
                .source_type
                .unwrap_or_else(|| state.default_source_type.clone()),
        });

    let mut session = state.session.lock().await;
    session.load(source).await;
    Json(GraphResponse::from_session(&session))
}

async fn handle_expand(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Response, ApiError> {
    let mut session = state.session.lock().await;
    session.apply_ready();
    let result = session.expand(&id)?;
    Ok(mutation(result, &session))
}

async fn handle_collapse(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Response, ApiError> {
    let mut session = state.session.lock().await;
    session.apply_ready();
    let result = session.collapse(&id)?;
    Ok(mutation(result, &session))
}

async fn handle_toggle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Response, ApiError> {
    let mut session = state.session.lock().await;
    session.apply_ready();
    let result = session.toggle(&id)?;
    Ok(mutation(result, &session))
}

fn mutation<T: Serialize>(result: T, session: &Session) -> Response {
    Json(MutationResponse {
        result,
        graph: GraphResponse::from_session(session),
    })
    .into_response()
}

async fn handle_navigate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<NavigateRequest>,
) -> std::result::Result<Json<NavigateResponse>, ApiError> {
    let session = state.session.lock().await;
    let sent = session.navigate(&id, request.view_type)?;
    Ok(Json(NavigateResponse { sent }))
}

/// Navigation commands for the host shell, one SSE `navigation` event each
async fn handle_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(|item| match item {
        Ok(command) => match serde_json::to_string(&command) {
            Ok(json) => Some(Ok(Event::default().event("navigation").data(json))),
            Err(e) => {
                log::warn!("Failed to encode navigation event: {}", e);
                None
            }
        },
        Err(e) => {
            log::warn!("Navigation subscriber lagged: {}", e);
            None
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
