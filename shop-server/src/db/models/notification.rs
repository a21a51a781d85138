//! Notification Model
//!
//! 运营通知：库存越界告警与新订单提醒。
//! 只允许翻转 `is_read`，永久保留 (无过期)。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Notification category tag
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OutOfStock,
    LowStock,
    NewOrder,
}

/// Notification priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
    Urgent,
}

/// Notification entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_read: bool,
    /// 相关实体 id ("product:xyz" / "order:abc")
    pub related_id: Option<String>,
    /// 附加数据 (如 { "stock": 4, "quantity": 2 })
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: i64,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: NotificationPriority,
    ) -> Self {
        Self {
            id: None,
            kind,
            title: title.into(),
            message: message.into(),
            priority,
            is_read: false,
            related_id: None,
            metadata: None,
            created_at: crate::utils::time::now_millis(),
        }
    }

    pub fn with_related_id(mut self, related_id: impl Into<String>) -> Self {
        self.related_id = Some(related_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
