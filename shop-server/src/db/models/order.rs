//! Order Model
//!
//! 订单记录：商品引用 (非拥有)、下单时的名称/价格快照、数量、客户信息、状态。
//!
//! `stock_deducted` / `stock_restored` 是持久化的对账标记：库存扣减/回补
//! 各自最多发生一次，由标记门控，而不是从 (旧状态, 新状态) 对推导。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

// =============================================================================
// Order Status
// =============================================================================

/// Order lifecycle status
///
/// `pending → confirmed → ready → completed`，`cancelled` 只能从
/// `pending`/`confirmed` 进入。`completed`/`cancelled` 为终态。
///
/// 历史数据中的 "ready_for_pickup" 与 "ready" 是同一个状态，
/// 统一为 `ready` (旧拼写仅作为反序列化别名保留)。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    #[serde(alias = "ready_for_pickup")]
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// 终态：不允许再转移
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// 进入该状态是否触发库存扣减 (入账状态)
    pub fn is_deducting(self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Completed)
    }

    /// 状态机合法转移判定 (允许前向跳转，如 pending → completed)
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed) | (Pending, Ready) | (Pending, Completed) => true,
            (Pending, Cancelled) => true,
            (Confirmed, Ready) | (Confirmed, Completed) => true,
            (Confirmed, Cancelled) => true,
            (Ready, Completed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Order
// =============================================================================

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Record link to product (by value, not ownership)
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    /// Snapshot of product name at creation time
    pub product_name: String,
    /// Snapshot of unit price at creation time
    pub unit_price: f64,
    pub quantity: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub note: Option<String>,
    pub status: OrderStatus,
    /// unit_price × quantity，创建时固定，更新时不重算
    pub total_amount: f64,
    /// 库存已为本订单扣减过 (恰好一次)
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub stock_deducted: bool,
    /// 库存已为本订单回补过 (恰好一次)
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub stock_restored: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

// =============================================================================
// API Request Types
// =============================================================================

/// Checkout payload (POST /api/orders)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderCreateRequest {
    /// Product id ("product:xyz")
    #[validate(length(min = 1, message = "product id is required"))]
    pub product: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i64,
    #[validate(length(min = 1, max = 120, message = "customer name is required"))]
    pub customer_name: String,
    #[validate(email(message = "invalid customer email"))]
    pub customer_email: String,
    pub customer_phone: Option<String>,
    #[validate(length(max = 500, message = "note too long"))]
    pub note: Option<String>,
}

/// Partial update payload (PUT /api/orders/:id)
///
/// `status` 触发库存对账与外部邮件派发；金额字段不可更新。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Ready));
        assert!(Pending.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Ready));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Ready.can_transition_to(Completed));
    }

    #[test]
    fn test_cancellation_only_from_pending_or_confirmed() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Ready.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states_reject_all_transitions() {
        use OrderStatus::*;
        for next in [Pending, Confirmed, Ready, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn test_no_backward_transitions() {
        use OrderStatus::*;
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Ready.can_transition_to(Confirmed));
        assert!(!Ready.can_transition_to(Pending));
    }

    #[test]
    fn test_deducting_states() {
        assert!(OrderStatus::Confirmed.is_deducting());
        assert!(OrderStatus::Completed.is_deducting());
        assert!(!OrderStatus::Pending.is_deducting());
        assert!(!OrderStatus::Ready.is_deducting());
        assert!(!OrderStatus::Cancelled.is_deducting());
    }

    #[test]
    fn test_status_serde_snake_case() {
        let s: OrderStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(s, OrderStatus::Pending);
        assert_eq!(serde_json::to_string(&OrderStatus::Ready).unwrap(), "\"ready\"");
    }

    #[test]
    fn test_ready_for_pickup_alias_accepted() {
        // 旧数据模型的拼写，输入时接受，输出时统一为 "ready"
        let s: OrderStatus = serde_json::from_str("\"ready_for_pickup\"").unwrap();
        assert_eq!(s, OrderStatus::Ready);
    }
}
