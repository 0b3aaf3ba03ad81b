pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{admin_handler, driver_handler, location_handler, require_admin};
use crate::state::AppState;

// Re-export commonly used types
pub use errors::{RadarError, RadarResult, ValidationError};

/// Builds the full HTTP surface.
///
/// Admin routes sit behind the PIN check; everything else is public.
pub fn app(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/drivers", get(admin_handler::list_drivers))
        .route("/drivers/:id", delete(admin_handler::delete_driver))
        .route("/pending", get(admin_handler::list_pending))
        .route("/active", get(admin_handler::list_active))
        .route("/approve/:id", put(admin_handler::approve_driver))
        .route("/reject/:id", put(admin_handler::reject_driver))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/", get(health))
        .route("/drivers/register", post(driver_handler::register_driver))
        .route("/drivers/login", post(driver_handler::login_driver))
        .route("/drivers/location", put(driver_handler::update_location))
        .route("/drivers/status", put(driver_handler::update_status))
        .route(
            "/drivers/:id",
            get(driver_handler::get_driver).put(driver_handler::update_driver),
        )
        .route("/locations", get(location_handler::list_locations))
        .nest("/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "Road Radar API is running"
}
