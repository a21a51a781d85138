//! Notification API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::Notification;
use crate::db::repository::NotificationRepository;
use crate::utils::AppResult;

/// Query params for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/notifications - 通知列表 (分页，可选只看未读)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let repo = NotificationRepository::new(state.db.clone());
    let notifications = repo
        .find_all(query.unread_only, query.limit, query.offset)
        .await?;
    Ok(Json(notifications))
}

/// Unread count response
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// GET /api/notifications/unread-count - 未读数量
pub async fn unread_count(
    State(state): State<ServerState>,
) -> AppResult<Json<UnreadCountResponse>> {
    let repo = NotificationRepository::new(state.db.clone());
    let count = repo.unread_count().await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// PUT /api/notifications/:id/read - 标记单条已读
pub async fn mark_read(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Notification>> {
    let repo = NotificationRepository::new(state.db.clone());
    let notification = repo.mark_read(&id).await?;
    Ok(Json(notification))
}

/// Mark-all response
#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

/// PUT /api/notifications/read-all - 全部标记已读
pub async fn mark_all_read(
    State(state): State<ServerState>,
) -> AppResult<Json<MarkAllReadResponse>> {
    let repo = NotificationRepository::new(state.db.clone());
    let updated = repo.mark_all_read().await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
