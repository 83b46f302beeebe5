//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all page handler
//! - Wire up middleware (timeout, request ID, tracing)
//! - Resolve each request to a route, run its pipeline, assemble output
//! - Render classified failures through the error surface
//!
//! # Design Decisions
//! - Every path goes through the same handler; the route table, not the
//!   Axum router, decides what a URL means
//! - The engine is immutable after startup and shared via `Arc`; a config
//!   change means a restart
//! - Failures never escape as panics: everything becomes a classified
//!   error and then a response

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, request::Parts, Request},
    response::Response,
    routing::any,
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::pipeline::{PipelineContext, PipelineExecutor, REQUEST_KEY, VIEW_ARGS_KEY};
use crate::processors::{ProcessorValue, Registry, Services};
use crate::response;
use crate::routing::RouteTable;

/// The assembled page engine: route table, processor registry, shared
/// services. One per process, shared across all in-flight requests.
pub struct Engine {
    services: Arc<Services>,
    routes: RouteTable,
    executor: PipelineExecutor,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let services = Arc::new(Services::new(config)?);
        let routes = RouteTable::load(&services.config);
        let registry = Arc::new(Registry::with_builtins());
        let executor = PipelineExecutor::new(services.clone(), registry);
        Ok(Engine {
            services,
            routes,
            executor,
        })
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Handle one request end to end. Never fails: classified errors are
    /// rendered through the error surface.
    ///
    /// Takes the request head only; routes declare all their data sources,
    /// so the inbound body is never read. Keeping the body out also keeps
    /// this future `Send` for the Axum handler.
    pub async fn respond(&self, request: &Parts) -> Response {
        let wants_json = accepts_json(request);
        match self.handle(request).await {
            Ok(response) => {
                tracing::info!(
                    method = %request.method,
                    path = %request.uri.path(),
                    status = response.status().as_u16(),
                    "request served"
                );
                response
            }
            Err(err) => {
                let status = err.status();
                if status >= 500 {
                    tracing::error!(
                        method = %request.method,
                        path = %request.uri.path(),
                        status,
                        error = %err,
                        "request failed"
                    );
                } else {
                    tracing::info!(
                        method = %request.method,
                        path = %request.uri.path(),
                        status,
                        error = %err,
                        "request aborted"
                    );
                }
                response::error_response(&err, wants_json, &self.services)
            }
        }
    }

    async fn handle(&self, request: &Parts) -> Result<Response, EngineError> {
        let path = request.uri.path();
        let matched = self.routes.resolve(path, request.method.as_str())?;
        tracing::debug!(path, rule = %matched.rule, "route resolved");

        let mut context = PipelineContext::new();
        context.insert(
            VIEW_ARGS_KEY,
            ProcessorValue::Json(Value::Object(matched.view_args.clone())),
        );
        context.insert(REQUEST_KEY, ProcessorValue::Json(url_components(request)));

        let context = self.executor.run(&matched.route, context).await?;
        response::assemble(&matched.route, &context, &self.services)
    }
}

/// The reserved `request` context entry: URL components templates and
/// processors can reference.
fn url_components(request: &Parts) -> Value {
    let uri = &request.uri;
    let path = uri.path().to_string();
    let host = request
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let base_url = format!("http://{host}/");
    let url = format!("http://{host}{path}");
    let full_path = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => format!("{path}?"),
    };

    let mut query_args = serde_json::Map::new();
    if let Some(query) = uri.query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let entry = query_args
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(values) = entry {
                values.push(Value::String(value.to_string()));
            }
        }
    }

    json!({
        "path": path,
        "full_path": full_path,
        "base_url": base_url,
        "url": url,
        "query_args": query_args,
    })
}

/// Whether the client prefers JSON diagnostics over an HTML error page.
///
/// Quality values are honored: `application/json;q=0` does not select
/// JSON, and an explicitly higher-ranked `text/html` wins.
fn accepts_json(request: &Parts) -> bool {
    let accept = match request
        .headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
    {
        Some(accept) => accept,
        None => return false,
    };

    let mut json_q = 0.0f32;
    let mut html_q = 0.0f32;
    for entry in accept.split(',') {
        let mut pieces = entry.split(';');
        let media = pieces.next().unwrap_or("").trim();
        let mut q = 1.0f32;
        for param in pieces {
            if let Some(value) = param.trim().strip_prefix("q=") {
                q = value.trim().parse().unwrap_or(0.0);
            }
        }
        match media {
            "application/json" => json_q = json_q.max(q),
            "text/html" => html_q = html_q.max(q),
            _ => {}
        }
    }
    json_q > 0.0 && json_q >= html_q
}

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

/// HTTP server wrapping the engine.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    #[allow(deprecated)]
    pub fn new(engine: Arc<Engine>) -> Self {
        let timeout_secs = engine.services().config.request_timeout_secs;
        let state = AppState { engine };
        let router = Router::new()
            .route("/{*path}", any(page_handler))
            .route("/", any(page_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(timeout_secs)))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Arc<crate::lifecycle::Shutdown>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut rx = shutdown.subscribe();
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn page_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    // Routes declare their own data sources; the inbound body is dropped.
    let (parts, _body) = request.into_parts();
    state.engine.respond(&parts).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(uri: &str) -> Parts {
        Request::builder()
            .uri(uri)
            .header(header::HOST, "example.test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn request_accepting(accept: &str) -> Parts {
        Request::builder()
            .uri("/x")
            .header(header::ACCEPT, accept)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_url_components() {
        let components = url_components(&request("/browse/items?q=map&q=atlas&page=2"));
        assert_eq!(components["path"], json!("/browse/items"));
        assert_eq!(
            components["full_path"],
            json!("/browse/items?q=map&q=atlas&page=2")
        );
        assert_eq!(components["base_url"], json!("http://example.test/"));
        assert_eq!(components["url"], json!("http://example.test/browse/items"));
        assert_eq!(components["query_args"]["q"], json!(["map", "atlas"]));
        assert_eq!(components["query_args"]["page"], json!(["2"]));
    }

    #[test]
    fn test_url_components_without_query() {
        let components = url_components(&request("/about"));
        assert_eq!(components["full_path"], json!("/about?"));
        assert_eq!(components["query_args"], json!({}));
    }

    #[test]
    fn test_accepts_json() {
        assert!(accepts_json(&request_accepting("application/json")));
        assert!(accepts_json(&request_accepting(
            "text/html;q=0.8, application/json"
        )));
        assert!(!accepts_json(&request("/x")));
    }

    #[test]
    fn test_accepts_json_honors_quality_values() {
        assert!(!accepts_json(&request_accepting("application/json;q=0")));
        assert!(!accepts_json(&request_accepting(
            "text/html, application/json;q=0.5"
        )));
        assert!(accepts_json(&request_accepting(
            "application/json, text/html;q=0.9"
        )));
    }
}
