//! Notification Repository

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::Notification;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const NOTIFICATION_TABLE: &str = "notification";

#[derive(Clone)]
pub struct NotificationRepository {
    base: BaseRepository,
}

impl NotificationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// List notifications, newest first (paginated, optionally unread only)
    pub async fn find_all(
        &self,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Notification>> {
        let query_str = if unread_only {
            "SELECT * FROM notification WHERE is_read = false ORDER BY created_at DESC LIMIT $limit START $offset"
        } else {
            "SELECT * FROM notification ORDER BY created_at DESC LIMIT $limit START $offset"
        };
        let notifications: Vec<Notification> = self
            .base
            .db()
            .query(query_str)
            .bind(("limit", limit))
            .bind(("offset", offset))
            .await?
            .take(0)?;
        Ok(notifications)
    }

    /// Persist a notification record
    pub async fn create(&self, notification: Notification) -> RepoResult<Notification> {
        let created: Option<Notification> = self
            .base
            .db()
            .create(NOTIFICATION_TABLE)
            .content(notification)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create notification".to_string()))
    }

    /// Count of unread notifications
    pub async fn unread_count(&self) -> RepoResult<i64> {
        #[derive(Deserialize)]
        struct CountRow {
            count: i64,
        }

        let rows: Vec<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM notification WHERE is_read = false GROUP ALL")
            .await?
            .take(0)?;
        Ok(rows.into_iter().next().map(|r| r.count).unwrap_or(0))
    }

    /// Flip the read flag on a single notification
    pub async fn mark_read(&self, id: &str) -> RepoResult<Notification> {
        let record_id = parse_record_id(NOTIFICATION_TABLE, id)?;
        let updated: Vec<Notification> = self
            .base
            .db()
            .query("UPDATE $id SET is_read = true RETURN AFTER")
            .bind(("id", record_id))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Notification {} not found", id)))
    }

    /// Mark every unread notification as read, returning how many were flipped
    pub async fn mark_all_read(&self) -> RepoResult<usize> {
        let updated: Vec<Notification> = self
            .base
            .db()
            .query("UPDATE notification SET is_read = true WHERE is_read = false RETURN AFTER")
            .await?
            .take(0)?;
        Ok(updated.len())
    }
}
