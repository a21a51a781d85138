//! 库存越界判定
//!
//! 纯函数：只看一次变更的 (变更前, 变更后)，与调用路径无关。
//! 同一次下穿只会命中一条规则，已在阈值之下继续减少不再重复告警。

use crate::db::models::{Notification, NotificationKind, NotificationPriority};

/// 低库存阈值：0 < stock < 5 视为低库存
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// A qualifying stock crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAlert {
    /// previous > 0 → current == 0
    OutOfStock,
    /// previous >= threshold → 0 < current < threshold
    LowStock,
}

/// 判定一次库存变更是否越界
///
/// 返回 `None` 的情况：库存增加、未变、已在阈值下继续减少。
pub fn threshold_crossing(previous: i64, current: i64) -> Option<StockAlert> {
    if previous > 0 && current == 0 {
        return Some(StockAlert::OutOfStock);
    }
    if current > 0 && current < LOW_STOCK_THRESHOLD && previous >= LOW_STOCK_THRESHOLD {
        return Some(StockAlert::LowStock);
    }
    None
}

impl StockAlert {
    /// 构造对应的通知记录 (每次越界恰好一条)
    pub fn into_notification(self, product_name: &str, product_id: &str, stock: i64) -> Notification {
        match self {
            StockAlert::OutOfStock => Notification::new(
                NotificationKind::OutOfStock,
                "Product out of stock",
                format!("\"{}\" is out of stock", product_name),
                NotificationPriority::Urgent,
            )
            .with_related_id(product_id)
            .with_metadata(serde_json::json!({ "stock": stock })),
            StockAlert::LowStock => Notification::new(
                NotificationKind::LowStock,
                "Product low on stock",
                format!(
                    "\"{}\" is running low: {} unit(s) left (threshold {})",
                    product_name, stock, LOW_STOCK_THRESHOLD
                ),
                NotificationPriority::High,
            )
            .with_related_id(product_id)
            .with_metadata(serde_json::json!({ "stock": stock })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_stock_crossing() {
        assert_eq!(threshold_crossing(1, 0), Some(StockAlert::OutOfStock));
        assert_eq!(threshold_crossing(10, 0), Some(StockAlert::OutOfStock));
    }

    #[test]
    fn test_out_of_stock_requires_previous_positive() {
        // 已经是 0，再写 0 不重复告警
        assert_eq!(threshold_crossing(0, 0), None);
    }

    #[test]
    fn test_low_stock_crossing() {
        assert_eq!(threshold_crossing(6, 4), Some(StockAlert::LowStock));
        assert_eq!(threshold_crossing(5, 4), Some(StockAlert::LowStock));
        assert_eq!(threshold_crossing(100, 1), Some(StockAlert::LowStock));
    }

    #[test]
    fn test_no_alert_below_threshold_decrease() {
        // 已在阈值下继续减少：不再发
        assert_eq!(threshold_crossing(4, 3), None);
        assert_eq!(threshold_crossing(3, 1), None);
    }

    #[test]
    fn test_drop_to_zero_is_out_of_stock_not_low_stock() {
        // 1→0 发 out-of-stock，不发 low-stock
        assert_eq!(threshold_crossing(1, 0), Some(StockAlert::OutOfStock));
        assert_eq!(threshold_crossing(5, 0), Some(StockAlert::OutOfStock));
    }

    #[test]
    fn test_no_alert_on_increase() {
        assert_eq!(threshold_crossing(0, 10), None);
        assert_eq!(threshold_crossing(2, 4), None);
        assert_eq!(threshold_crossing(4, 6), None);
    }

    #[test]
    fn test_no_alert_when_unchanged() {
        assert_eq!(threshold_crossing(7, 7), None);
        assert_eq!(threshold_crossing(3, 3), None);
    }

    #[test]
    fn test_stay_at_or_above_threshold() {
        // 10→7，仍 >= 5：无告警
        assert_eq!(threshold_crossing(10, 7), None);
        assert_eq!(threshold_crossing(6, 5), None);
    }

    #[test]
    fn test_notification_contents() {
        let n = StockAlert::LowStock.into_notification("PE Kit", "product:pe_kit", 4);
        assert_eq!(n.kind, crate::db::models::NotificationKind::LowStock);
        assert_eq!(n.priority, crate::db::models::NotificationPriority::High);
        assert_eq!(n.related_id.as_deref(), Some("product:pe_kit"));
        assert!(!n.is_read);

        let n = StockAlert::OutOfStock.into_notification("PE Kit", "product:pe_kit", 0);
        assert_eq!(n.kind, crate::db::models::NotificationKind::OutOfStock);
        assert_eq!(n.priority, crate::db::models::NotificationPriority::Urgent);
    }
}
