//! Product API 模块

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", product_routes())
}

fn product_routes() -> Router<ServerState> {
    Router::new()
        // Storefront listing (visible products only)
        .route("/", get(handler::list).post(handler::create))
        // Operator listing (includes hidden products)
        .route("/all", get(handler::list_all))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
}
