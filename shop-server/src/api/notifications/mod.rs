//! Notification API 模块

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/notifications", notification_routes())
}

fn notification_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/unread-count", get(handler::unread_count))
        .route("/read-all", put(handler::mark_all_read))
        .route("/{id}/read", put(handler::mark_read))
}
