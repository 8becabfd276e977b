//! # clinic_api
//!
//! HTTP API library for the clinic backend.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use axum::Router;
use axum::routing::{get, post, put};
use clinic_core::auth::session::SessionKeys;
use clinic_core::store::SharedStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{
    appointments, auth, dashboard, health, inventory, invoices, pages, seed, treatments, users,
};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Record storage, created at startup and closed on shutdown.
    pub store: SharedStore,
    /// API configuration.
    pub config: ApiConfig,
    /// Session signing keys derived from `config.session_secret`.
    pub keys: SessionKeys,
}

impl AppState {
    pub fn new(store: SharedStore, config: ApiConfig) -> Self {
        let keys = SessionKeys::from_secret(config.session_secret.as_bytes());
        Self {
            store,
            config,
            keys,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
///
/// The session gate wraps every route, including static files and the
/// fallback, so route protection lives in one place.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(routes::GET_API_HEALTH, get(health::health_handler))
        .route(routes::POST_API_SEED, post(seed::seed_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler))
        .route(routes::GET_AUTH_SESSION, get(auth::session_handler))
        .route(
            routes::APPOINTMENTS,
            get(appointments::list_handler).post(appointments::create_handler),
        )
        .route(
            routes::APPOINTMENTS_ID,
            put(appointments::update_handler).delete(appointments::delete_handler),
        )
        .route(
            routes::INVENTORY,
            get(inventory::list_handler).post(inventory::create_handler),
        )
        .route(
            routes::INVENTORY_ID,
            put(inventory::update_handler).delete(inventory::delete_handler),
        )
        .route(
            routes::INVOICES,
            get(invoices::list_handler).post(invoices::create_handler),
        )
        .route(routes::INVOICES_ID, put(invoices::update_handler))
        .route(
            routes::TREATMENTS,
            get(treatments::list_handler).post(treatments::create_handler),
        )
        .route(routes::GET_DASHBOARD_STATS, get(dashboard::stats_handler))
        .route(
            routes::USERS,
            get(users::list_handler).post(users::create_handler),
        )
        .route(
            routes::USERS_ID,
            put(users::update_handler).delete(users::delete_handler),
        );

    let pages = Router::new()
        .route(routes::PAGE_HOME, get(pages::home_page))
        .route(routes::PAGE_LOGIN, get(pages::login_page))
        .route(routes::PAGE_REGISTER, get(pages::register_page));

    Router::new()
        .merge(api)
        .merge(pages)
        .nest_service(routes::STATIC, ServeDir::new(&state.config.static_dir))
        .fallback(pages::fallback)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::session_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
