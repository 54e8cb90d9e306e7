//! sonoreport-server library crate
//!
//! Exposes `build_app`, `config` and the upstream client traits for
//! integration tests. The actual binary entrypoint is in `main.rs`.

pub mod ai;
pub mod config;
pub mod error;
pub mod guidelines;
mod middleware;
mod routes;
pub mod sessions;

use axum::{Extension, Router, middleware as axum_mw, routing::get};
use sonoreport_core::ReportError;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ai::{ChatClient, LanguageModel};
use config::Config;
use error::AppError;
use guidelines::{ChromaStore, GuidelineStore, OpenAIEmbedder};
use middleware::ApiKeyAuth;
use sessions::SessionStore;

/// Upstream collaborators of the drafting workflow
#[derive(Clone)]
pub struct Services {
    /// None when no gateway credentials are configured
    pub model: Option<Arc<dyn LanguageModel>>,
    /// None disables guideline retrieval; reports are drafted without context
    pub guidelines: Option<Arc<dyn GuidelineStore>>,
    pub guideline_k: usize,
    pub report_location: String,
}

impl Services {
    /// Wire the OpenAI gateway and the Chroma guideline store from config.
    ///
    /// Both need `OPENAI_API_KEY`; without it the service still runs but
    /// cannot draft or translate.
    pub fn from_config(config: &Config) -> Result<Self, ReportError> {
        let mut services = Self {
            model: None,
            guidelines: None,
            guideline_k: config.guideline_k,
            report_location: config.report_location.clone(),
        };

        let Some(api_key) = config.openai_api_key.clone() else {
            return Ok(services);
        };

        let chat = ChatClient::new(
            api_key.clone(),
            Some(config.openai_base_url.clone()),
            Some(config.chat_model.clone()),
            config.upstream_timeout(),
        )?;
        let embedder = OpenAIEmbedder::new(
            api_key,
            Some(config.embedding_model.clone()),
            Some(config.openai_base_url.clone()),
            config.upstream_timeout(),
        )?;
        let store = ChromaStore::new(
            config.chroma_url.clone(),
            Some(config.chroma_collection.clone()),
            embedder,
            config.upstream_timeout(),
        )?;

        services.model = Some(Arc::new(chat));
        services.guidelines = Some(Arc::new(store));
        Ok(services)
    }

    pub(crate) fn model(&self) -> Result<&dyn LanguageModel, AppError> {
        self.model.as_deref().ok_or_else(|| {
            AppError::BadGateway(
                "Language model gateway not configured (OPENAI_API_KEY unset)".to_string(),
            )
        })
    }
}

/// Shared state of all handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub services: Arc<Services>,
}

/// Build the full application router with all routes and middleware.
///
/// Extracted from `main()` so integration tests can construct the app
/// with stub upstreams and without binding to a TCP port.
pub fn build_app(services: Services, config: &Config) -> Router {
    let state = AppState {
        sessions: SessionStore::new(config.session_ttl()),
        services: Arc::new(services),
    };

    let auth = ApiKeyAuth::new(config.api_key.clone());
    let rate_limiter = middleware::create_rate_limiter(config.rate_limit_rps);

    // Protected routes (require auth)
    let protected_routes = Router::new()
        .nest("/api", routes::session_routes())
        .layer(axum_mw::from_fn(middleware::auth_middleware))
        .layer(Extension(auth))
        .layer(axum_mw::from_fn(middleware::rate_limit_middleware))
        .layer(Extension(rate_limiter));

    // A second install (integration tests) is ignored; the handle still renders.
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let prometheus_handle = recorder.handle();
    let _ = metrics::set_global_recorder(recorder);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .layer(Extension(prometheus_handle));

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(axum_mw::from_fn(middleware::audit_middleware))
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware))
}
