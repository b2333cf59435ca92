use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    BooksState, MembersState, books_health, get_materialized_member, get_registered_member,
    register_member,
};

/// Creates the members service router
///
/// - POST /members - Register a member and publish member-created
/// - GET /members/:id - Get a registered member
pub fn create_members_router(state: Arc<MembersState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/members", post(register_member))
        .route("/members/:id", get(get_registered_member))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Creates the books service router
///
/// - GET /members/:id - Get a member materialized from member-created events
pub fn create_books_router(state: Arc<BooksState>) -> Router {
    Router::new()
        .route("/health", get(books_health))
        .route("/members/:id", get(get_materialized_member))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
