pub mod config;
pub mod error;
pub mod database;
pub mod models;
pub mod repository;
pub mod controllers;
pub mod middleware;
pub mod cache;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::cache::{PlanCache, SeatingCache};
use crate::repository::postgres::{PgNotificationStore, PgRosterProvider, PgSeatingRepository};
use crate::services::{notifications::NotificationSink, seating::SeatingService};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub seating: SeatingService,
}

impl AppState {
    /// Подключается к Postgres (и Redis, если задан) и собирает сервис рассадки.
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::connect(&config.database).await?;
        db.migrate().await?;

        let cache: Option<Arc<dyn PlanCache>> = match &config.redis.url {
            Some(url) => match SeatingCache::connect(url, config.redis.plan_ttl_seconds).await {
                Ok(cache) => {
                    info!("Redis connected, seating cache enabled");
                    Some(Arc::new(cache))
                }
                Err(e) => {
                    warn!("Redis unavailable, seating cache disabled: {:?}", e);
                    None
                }
            },
            None => {
                info!("REDIS_URL not set, seating cache disabled");
                None
            }
        };

        let sink = if config.notifications.enabled {
            NotificationSink::Enabled(Arc::new(PgNotificationStore::new(db.pool.clone())))
        } else {
            info!("Notifications disabled");
            NotificationSink::Disabled
        };

        let seating = SeatingService::new(
            Arc::new(PgSeatingRepository::new(db.pool.clone())),
            Arc::new(PgRosterProvider::new(db.pool.clone())),
            sink,
            cache,
            config.notifications.link.clone(),
        );

        Ok(Arc::new(Self { config, seating }))
    }
}

/// Основной роутер: API под `/api`, плюс баннер и health.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Campus Seating API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
