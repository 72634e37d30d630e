mod handlers;
pub mod middleware;

pub use handlers::{ApiError, STORAGE_FALLBACK_HEADER};
pub use middleware::SecurityConfig;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::DesignService;

/// Router without API-key authentication.
pub fn create_router(service: DesignService) -> Router {
    create_router_with_security(service, SecurityConfig::disabled())
}

pub fn create_router_with_security(service: DesignService, security: SecurityConfig) -> Router {
    let designs = Router::new()
        .route(
            "/designs",
            get(handlers::list_own_designs).post(handlers::create_design),
        )
        .route("/designs/public", get(handlers::list_public_designs))
        .route(
            "/designs/{id}",
            get(handlers::get_design)
                .put(handlers::update_design)
                .delete(handlers::delete_design),
        )
        .route("/designs/{id}/clone", post(handlers::clone_design))
        .route("/designs/{id}/visibility", post(handlers::toggle_visibility))
        .route("/designs/{id}/history", get(handlers::get_history))
        .route("/designs/{id}/analysis", get(handlers::get_analysis))
        .route(
            "/designs/{id}/export",
            get(handlers::export_design).post(handlers::store_export),
        )
        .route_layer(from_fn_with_state(security, middleware::auth_middleware));

    let api = designs.route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(service)
}
