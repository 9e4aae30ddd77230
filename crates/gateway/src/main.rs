//! DealBridge API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication and authorization
//! - Rate limiting
//! - Request routing
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use axum::{
    routing::{delete, get, post, put},
    Extension, Router,
};
use dealbridge_common::{
    auth::JwtManager,
    config::AppConfig,
    errors::AppError,
    metrics,
    notify::notifier_from_config,
    store::{DbPool, PgProposalStore},
};
use dealbridge_lifecycle::{AdminOperations, PermissionResolver, ProposalService, WorkflowEngine};
use dealbridge_search::SearchEngine;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<PgProposalStore>,
    pub resolver: PermissionResolver,
    pub proposals: Arc<ProposalService<PgProposalStore>>,
    pub workflow: Arc<WorkflowEngine<PgProposalStore>>,
    pub admin: Arc<AdminOperations<PgProposalStore>>,
    pub search: Arc<SearchEngine<PgProposalStore>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?);

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("Starting DealBridge API Gateway v{}", dealbridge_common::VERSION);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port > 0 {
        let metrics_addr =
            SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    // Initialize database connection
    info!("Connecting to database...");
    let pool = DbPool::new(&config.database).await?;
    let store = Arc::new(PgProposalStore::new(pool));

    let state = build_state(config.clone(), store)?;

    let jwt_secret = config
        .auth
        .jwt_secret
        .as_deref()
        .ok_or_else(|| AppError::Configuration {
            message: "auth.jwt_secret is not set".to_string(),
        })?;
    let jwt = Arc::new(JwtManager::new(jwt_secret, config.auth.jwt_expiration_secs));

    // Build the router
    let app = create_router(state, jwt);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wire the engines around a single shared store
fn build_state(
    config: Arc<AppConfig>,
    store: Arc<PgProposalStore>,
) -> Result<AppState, AppError> {
    let notifier = notifier_from_config(&config.notify)?;
    let resolver = PermissionResolver::default();

    let workflow = Arc::new(WorkflowEngine::new(
        store.clone(),
        notifier,
        resolver.clone(),
    ));
    let proposals = Arc::new(ProposalService::new(
        store.clone(),
        resolver.clone(),
        workflow.clone(),
    ));
    let admin = Arc::new(AdminOperations::new(store.clone(), workflow.clone()));
    let search = Arc::new(SearchEngine::new(
        store.clone(),
        resolver.clone(),
        config.search.clone(),
    ));

    Ok(AppState {
        config,
        store,
        resolver,
        proposals,
        workflow,
        admin,
        search,
    })
}

/// Create the main application router
fn create_router(state: AppState, jwt: Arc<JwtManager>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Proposal CRUD
        .route("/proposals", post(handlers::proposals::create_proposal))
        .route("/proposals/mine", get(handlers::proposals::list_my_proposals))
        .route("/proposals/{id}", get(handlers::proposals::get_proposal))
        .route("/proposals/{id}", put(handlers::proposals::update_proposal))
        .route("/proposals/{id}", delete(handlers::proposals::delete_proposal))
        .route("/proposals/{id}/interest", post(handlers::proposals::record_interest))
        // Lifecycle transitions
        .route("/proposals/{id}/submit", post(handlers::workflow::submit))
        .route("/proposals/{id}/withdraw", post(handlers::workflow::withdraw))
        .route("/proposals/{id}/reopen", post(handlers::workflow::reopen))
        .route("/proposals/{id}/approve", post(handlers::workflow::approve))
        .route("/proposals/{id}/reject", post(handlers::workflow::reject))
        .route("/proposals/{id}/publish", post(handlers::workflow::publish))
        .route("/proposals/{id}/archive", post(handlers::workflow::archive))
        .route("/proposals/{id}/dispatch", post(handlers::workflow::record_dispatch))
        .route("/proposals/{id}/history", get(handlers::workflow::history))
        .route(
            "/proposals/{id}/transitions/{target}",
            get(handlers::workflow::check_transition),
        )
        // Search endpoints
        .route("/search", post(handlers::search::search))
        .route("/search/fulltext", post(handlers::search::full_text_search))
        // Admin endpoints
        .route("/admin/reviews/batch-approve", post(handlers::admin::batch_approve))
        .route("/admin/reviews/batch-reject", post(handlers::admin::batch_reject))
        .route("/admin/reviews/pending", get(handlers::admin::pending_reviews))
        .route("/admin/reviews/history", get(handlers::admin::review_history))
        .route("/admin/statistics", get(handlers::admin::statistics));

    let rate_limit = &state.config.rate_limit;
    let limiter = rate_limit
        .enabled
        .then(|| middleware::rate_limit::create_rate_limiter(
            rate_limit.requests_per_second,
            rate_limit.burst,
        ));

    let mut api_routes = api_routes;
    if let Some(limiter) = limiter {
        api_routes = api_routes.layer(axum::middleware::from_fn(
            move |request, next| {
                let limiter = limiter.clone();
                async move {
                    middleware::rate_limit::rate_limit_middleware(request, next, limiter).await
                }
            },
        ));
    }

    // Compose the app
    Router::new()
        // Health endpoints (no auth, no rate limit)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/v1", api_routes)
        .layer(Extension(jwt))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
