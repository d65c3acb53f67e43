//! Application startup and lifecycle management.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    http_trace_layer, metrics_middleware, request_id_middleware, security_headers_middleware,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use time::Duration;
use tokio::net::TcpListener;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::{PortalConfig, StorageBackend};
use crate::handlers::{auth, events, health, invoices, metrics, pages};
use crate::middleware::{require_bearer, require_session};
use crate::models::{Event, Invoice};
use crate::services::{
    init_metrics, Authenticator, EventService, InvoiceService, MemoryRepository, PortalDb,
    Repository,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: PortalConfig,
    pub events: EventService,
    pub invoices: InvoiceService,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(
        config: PortalConfig,
        event_repo: Arc<dyn Repository<Event>>,
        invoice_repo: Arc<dyn Repository<Invoice>>,
    ) -> Self {
        let events = EventService::new(event_repo);
        let invoices = InvoiceService::new(invoice_repo, events.clone());
        let auth = Arc::new(Authenticator::new(&config.auth));
        Self {
            config,
            events,
            invoices,
            auth,
        }
    }

    /// State backed by process memory. Nothing survives a restart.
    pub fn in_memory(config: PortalConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryRepository::<Event>::new()),
            Arc::new(MemoryRepository::<Invoice>::new()),
        )
    }

    /// Connect to MongoDB, ensure indexes, and build state on top of it.
    pub async fn connect(config: PortalConfig) -> Result<Self, AppError> {
        let mongo = &config.storage.mongodb;
        let db = PortalDb::connect(&mongo.uri, &mongo.database)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to MongoDB");
                e
            })?;
        db.initialize_indexes().await?;
        tracing::info!(database = %mongo.database, "Database initialized");

        let event_repo = Arc::new(db.event_repository());
        let invoice_repo = Arc::new(db.invoice_repository());
        Ok(Self::new(config, event_repo, invoice_repo))
    }

    /// Pick the backend named in configuration.
    pub async fn from_config(config: PortalConfig) -> Result<Self, AppError> {
        match config.storage.backend {
            StorageBackend::Mongodb => Self::connect(config).await,
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; records are lost on restart");
                Ok(Self::in_memory(config))
            }
        }
    }
}

fn api_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::session))
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/events/:id/invoices",
            get(events::list_event_invoices).post(events::create_event_invoice),
        )
        .route("/invoices", get(invoices::list_invoices))
        .route(
            "/invoices/:id",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route_layer(from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/auth/login", post(auth::login))
        .merge(protected)
}

fn page_routes(state: &AppState) -> Router<AppState> {
    let dashboard = Router::new()
        .route("/dashboard", get(pages::dashboard::dashboard))
        .route("/dashboard/events", post(pages::dashboard::create_event))
        .route(
            "/dashboard/events/:id",
            post(pages::dashboard::update_event),
        )
        .route(
            "/dashboard/events/:id/edit",
            get(pages::dashboard::edit_event_page),
        )
        .route(
            "/dashboard/events/:id/delete",
            post(pages::dashboard::delete_event),
        )
        .route(
            "/dashboard/events/:id/invoices/new",
            get(pages::dashboard::new_invoice_page).post(pages::dashboard::create_invoice),
        )
        .route(
            "/dashboard/invoices/:id",
            post(pages::invoices::update_invoice),
        )
        .route(
            "/dashboard/invoices/:id/edit",
            get(pages::invoices::edit_invoice_page),
        )
        .route(
            "/dashboard/invoices/:id/delete",
            post(pages::invoices::delete_invoice),
        )
        .route(
            "/dashboard/invoices/:id/print",
            get(pages::invoices::print_invoice),
        )
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/", get(pages::session::login_page))
        .route(
            "/login",
            get(pages::session::login_page).post(pages::session::login_submit),
        )
        .route(
            "/logout",
            get(pages::session::logout).post(pages::session::logout),
        )
        .merge(dashboard)
}

/// Assemble every route and the shared middleware stack.
pub fn build_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.auth.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(
            state.config.auth.token_ttl_minutes,
        )));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(metrics::metrics))
        .merge(api_routes(&state))
        .merge(page_routes(&state))
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: PortalConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(config).await?;
        Self::with_state(state).await
    }

    /// Bind a listener for already-assembled state.
    pub async fn with_state(state: AppState) -> Result<Self, AppError> {
        init_metrics();

        let address = format!("{}:{}", state.config.server.host, state.config.server.port);
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, addr = %address, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();
        tracing::info!(port = port, "Portal listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until the process is stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            service = "portal-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        let app = build_router(self.state);
        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await
    }
}
