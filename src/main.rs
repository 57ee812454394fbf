//! Dealdesk server binary.
//!
//! Wires configuration, adapters, and the application layer together and
//! serves the REST + WebSocket API until Ctrl+C.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use dealdesk::adapters::catalog::{HttpCatalog, InMemoryCatalog};
use dealdesk::adapters::events::BroadcastHub;
use dealdesk::adapters::http::{app_router, SessionAppState};
use dealdesk::adapters::inference::{GeminiClient, GeminiConfig, MockInferenceClient};
use dealdesk::adapters::lead_store::{InMemoryLeadStore, PostgresLeadStore};
use dealdesk::application::{AutopilotDispatcher, DispatchSettings, SessionRegistry};
use dealdesk::config::AppConfig;
use dealdesk::domain::foundation::ListingId;
use dealdesk::domain::listing::ListingRef;
use dealdesk::ports::{InferenceClient, LeadStore, ListingCatalog, SessionEventPublisher};

#[tokio::main]
async fn main() {
    // `.env` loading happens inside AppConfig::load (dev convenience).
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    init_tracing(&config);

    // Event fan-out shared by the registry, dispatcher, and WebSocket hub.
    let hub = Arc::new(BroadcastHub::with_default_capacity());
    let events: Arc<dyn SessionEventPublisher> = hub.clone();

    let catalog: Arc<dyn ListingCatalog> = match config.catalog.base_url.as_deref() {
        Some(base_url) if config.catalog.has_service() => {
            tracing::info!(base_url, "Listing catalog: marketplace service");
            Arc::new(HttpCatalog::with_timeout(base_url, config.catalog.timeout()))
        }
        _ => {
            tracing::warn!("No listing service configured; serving built-in demo listings");
            Arc::new(InMemoryCatalog::with_listings(demo_listings()))
        }
    };

    let inference: Arc<dyn InferenceClient> = if config.inference.has_gemini() {
        let api_key = config.inference.gemini_api_key.clone().unwrap_or_default();
        tracing::info!(model = %config.inference.model, "Inference: Gemini");
        let gemini = GeminiConfig::new(api_key)
            .with_model(config.inference.model.clone())
            .with_base_url(config.inference.base_url.clone())
            .with_timeout(config.inference.timeout());
        Arc::new(GeminiClient::new(gemini))
    } else {
        tracing::warn!("No Gemini API key configured; using canned mock replies");
        Arc::new(MockInferenceClient::new())
    };

    let lead_store: Arc<dyn LeadStore> = match config.lead_store.database_url.as_deref() {
        Some(url) if config.lead_store.has_database() => {
            let pool = match PgPoolOptions::new()
                .max_connections(config.lead_store.max_connections)
                .acquire_timeout(config.lead_store.acquire_timeout())
                .connect(url)
                .await
            {
                Ok(pool) => pool,
                Err(e) => {
                    eprintln!("Failed to connect to lead database: {}", e);
                    std::process::exit(1);
                }
            };
            if config.lead_store.run_migrations {
                if let Err(e) = sqlx::migrate!().run(&pool).await {
                    eprintln!("Failed to run lead store migrations: {}", e);
                    std::process::exit(1);
                }
                tracing::info!("Lead store migrations applied");
            }
            tracing::info!("Lead store: PostgreSQL");
            Arc::new(PostgresLeadStore::new(pool))
        }
        _ => {
            tracing::warn!("No database configured; captured leads are held in memory only");
            Arc::new(InMemoryLeadStore::new())
        }
    };

    let registry = Arc::new(SessionRegistry::new(catalog, events.clone()));
    registry.spawn_idle_sweeper(
        config.session.idle_timeout_secs,
        config.session.sweep_interval_secs,
    );

    let dispatcher = Arc::new(AutopilotDispatcher::new(
        inference,
        events.clone(),
        DispatchSettings {
            request_timeout_secs: config.inference.timeout_secs,
            transcript_window: config.session.transcript_window,
            deal_confidence_threshold: config.session.deal_confidence_threshold,
        },
    ));

    let state = SessionAppState {
        registry,
        dispatcher,
        lead_store,
        events,
        hub,
        after_capture: config.session.after_capture,
    };

    let app = app_router(state, &config.server);
    let addr = config.server.bind_addr();

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Dealdesk listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` overrides the configured log level when set.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.server.json_logs {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");
    tracing::info!("Shutdown signal received");
}

/// Built-in listings served when no marketplace service is configured.
fn demo_listings() -> Vec<ListingRef> {
    [
        (
            "lst-1001",
            "Sunny two-bedroom apartment near the park",
            "Palermo, Buenos Aires",
            185000.0,
            "Bright 72 m2 apartment on the 7th floor with balcony, park views, and a renovated kitchen. Building has a gym and 24h security.",
        ),
        (
            "lst-1002",
            "Modern loft in the old town",
            "San Telmo, Buenos Aires",
            1200.0,
            "Furnished 48 m2 loft with exposed brick, high ceilings, and fast fiber internet. Available for 12-month rental, utilities included.",
        ),
        (
            "lst-1003",
            "Family house with garden and pool",
            "Nordelta, Tigre",
            420000.0,
            "Four bedrooms, three bathrooms, landscaped garden with heated pool, and a two-car garage in a gated community.",
        ),
    ]
    .into_iter()
    .filter_map(|(id, title, location, price, description)| {
        let id = ListingId::new(id).ok()?;
        ListingRef::new(id, title, location, price, description).ok()
    })
    .collect()
}
