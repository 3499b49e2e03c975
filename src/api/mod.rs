use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

mod admin;
pub mod auth;
mod content;
mod error;
mod feedback;
mod observability;
mod subgenres;
mod sync;
mod types;
mod validation;
mod watchlist;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn ledger(&self) -> &crate::services::UsageLedger {
        &self.shared.ledger
    }

    #[must_use]
    pub fn sync_service(&self) -> &Arc<crate::services::SyncService> {
        &self.shared.sync_service
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(60)));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/content", get(content::list_content))
        .route("/content/{id}", get(content::get_content))
        .route("/subgenres", get(subgenres::list_subgenres))
        .route("/platforms", get(content::list_platforms))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_user))
        .route("/watchlist", get(watchlist::get_watchlist))
        .route("/watchlist", post(watchlist::add_to_watchlist))
        .route(
            "/watchlist/{content_id}",
            delete(watchlist::remove_from_watchlist),
        )
        .route("/feedback", post(feedback::submit_feedback))
        .route("/issues", post(feedback::submit_issue))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/content/sync", post(sync::run_catalog_sync))
        .route(
            "/admin/sync-new-to-streaming",
            post(sync::run_recent_sync),
        )
        .route("/watchmode/status", get(sync::usage_status))
        .route("/admin/watchmode/usage", put(sync::set_usage))
        .route("/admin/watchmode/genres", get(sync::list_catalog_genres))
        .route("/admin/watchmode/sources", get(sync::list_catalog_sources))
        .route("/system/status", get(observability::system_status))
        .route("/admin/content", post(admin::create_content))
        .route("/admin/content/{id}", put(admin::update_content))
        .route("/admin/content/{id}", delete(admin::delete_content))
        .route("/admin/content/{id}/hide", post(admin::hide_content))
        .route("/admin/content/{id}/show", post(admin::show_content))
        .route(
            "/admin/content/{id}/subgenres",
            get(admin::list_content_subgenres)
                .post(admin::add_content_subgenre)
                .put(admin::set_content_subgenres),
        )
        .route(
            "/admin/content/{id}/subgenres/{subgenre_id}",
            delete(admin::remove_content_subgenre),
        )
        .route(
            "/admin/content/{id}/primary-subgenre",
            put(admin::set_primary_subgenre),
        )
        .route(
            "/admin/content/{id}/platforms",
            get(admin::list_content_platforms).post(admin::upsert_platform_link),
        )
        .route(
            "/admin/content/{id}/platforms/{platform_id}",
            delete(admin::remove_platform_link),
        )
        .route("/admin/subgenres", post(subgenres::create_subgenre))
        .route(
            "/admin/subgenres/reorder",
            put(subgenres::reorder_subgenres),
        )
        .route("/admin/subgenres/{id}", get(subgenres::get_subgenre))
        .route("/admin/subgenres/{id}", put(subgenres::update_subgenre))
        .route("/admin/subgenres/{id}", delete(subgenres::delete_subgenre))
        .route("/admin/feedback", get(admin::list_feedback))
        .route("/admin/issues", get(admin::list_issues))
        .route("/admin/issues/{id}", put(admin::update_issue))
        .route("/auth/password", put(auth::change_password))
        .route(
            "/auth/api-key/regenerate",
            post(auth::regenerate_api_key),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
