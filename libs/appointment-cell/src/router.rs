// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/departments", get(handlers::get_departments))
        .route("/search", post(handlers::search_appointments))
        .route("/slots", post(handlers::create_appointment_slots))
        .route("/book", post(handlers::book_appointment))
        .route("/", delete(handlers::delete_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment_by_id))
        .route("/{appointment_id}", put(handlers::update_appointment_by_id))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
