//! Stock Reconciliation Engine
//!
//! 订单状态转移 → 库存增减的唯一入口。
//!
//! # 恰好一次
//!
//! 扣减/回补各自最多一次，由订单上的持久化标记门控：
//! 1. 条件更新认领标记 (`WHERE flag = false`)，并发下最多一个赢家；
//! 2. 单条原子语句增减库存并取回变更前的值；
//! 3. 商品缺失时跳过库存变更、回滚标记，状态更新照常进行 (降级，不报错)。

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{
    Notification, NotificationKind, NotificationPriority, Order, OrderCreateRequest, OrderStatus,
};
use crate::db::repository::{
    NotificationRepository, OrderRepository, ProductRepository, RepoError, RepoResult, StockChange,
};
use crate::services::MailerService;
use crate::stock::alerts::threshold_crossing;
use crate::utils::time::now_millis;

/// 库存对账引擎
#[derive(Clone)]
pub struct StockService {
    db: Surreal<Db>,
    mailer: Arc<MailerService>,
}

impl StockService {
    pub fn new(db: Surreal<Db>, mailer: Arc<MailerService>) -> Self {
        Self { db, mailer }
    }

    fn products(&self) -> ProductRepository {
        ProductRepository::new(self.db.clone())
    }

    fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.db.clone())
    }

    fn notifications(&self) -> NotificationRepository {
        NotificationRepository::new(self.db.clone())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// 下单：库存充足性检查 → 快照商品名/价格 → 创建 pending 订单 → 新订单通知
    ///
    /// 不做预留：库存只在确认时扣减。并发下单可能同时通过检查，
    /// 这是已知的良性竞争 (确认阶段的原子扣减会钳在 0)。
    pub async fn place_order(&self, req: OrderCreateRequest) -> RepoResult<Order> {
        let product = self
            .products()
            .find_by_id(&req.product)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", req.product)))?;

        if !product.is_visible {
            return Err(RepoError::Validation(
                "product is not available for ordering".into(),
            ));
        }

        if req.quantity > product.stock {
            return Err(RepoError::BusinessRule(format!(
                "insufficient stock: requested {}, available {}",
                req.quantity, product.stock
            )));
        }

        let product_id = product
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("product record has no id".into()))?;

        let now = now_millis();
        let order = Order {
            id: None,
            product: product_id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: req.quantity,
            customer_name: req.customer_name,
            customer_email: req.customer_email,
            customer_phone: req.customer_phone,
            note: req.note,
            status: OrderStatus::Pending,
            total_amount: product.price * req.quantity as f64,
            stock_deducted: false,
            stock_restored: false,
            created_at: now,
            updated_at: now,
        };

        let created = self.orders().create(order).await?;
        let order_id = created
            .id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default();

        tracing::info!(
            order = %order_id,
            product = %created.product,
            quantity = created.quantity,
            total = created.total_amount,
            "Order placed"
        );

        // 新订单通知：尽力而为，失败不影响下单
        let notification = Notification::new(
            NotificationKind::NewOrder,
            "New order received",
            format!(
                "{} ordered {} × \"{}\"",
                created.customer_name, created.quantity, created.product_name
            ),
            NotificationPriority::Normal,
        )
        .with_related_id(&order_id)
        .with_metadata(serde_json::json!({
            "quantity": created.quantity,
            "total_amount": created.total_amount,
        }));

        if let Err(e) = self.notifications().create(notification).await {
            tracing::error!(order = %order_id, error = %e, "Failed to persist new-order notification");
        }

        self.mailer
            .send_admin_notification(
                "New order received",
                &format!(
                    "{} ordered {} × \"{}\" ({:.2})",
                    created.customer_name,
                    created.quantity,
                    created.product_name,
                    created.total_amount
                ),
                serde_json::json!({
                    "order_id": order_id,
                    "quantity": created.quantity,
                    "total_amount": created.total_amount,
                }),
            )
            .await;

        Ok(created)
    }

    // =========================================================================
    // Status transitions
    // =========================================================================

    /// 为一次已验证的状态转移应用库存影响 (在状态落库之前调用)
    ///
    /// 调用方负责状态机合法性检查；本方法只关心库存一致性。
    pub async fn apply_status_transition(
        &self,
        order: &Order,
        new_status: OrderStatus,
    ) -> RepoResult<()> {
        if new_status == order.status {
            return Ok(());
        }

        let order_id = order
            .id
            .as_ref()
            .map(|id| id.to_string())
            .ok_or_else(|| RepoError::Validation("order record has no id".into()))?;

        // 进入入账状态 → 尝试扣减 (标记认领决定是否真的执行)
        if new_status.is_deducting() {
            self.deduct_for_order(&order_id, order).await?;
        }

        // 进入取消 → 尝试回补 (仅已扣减且未回补的订单能认领成功)
        if new_status == OrderStatus::Cancelled {
            self.restore_for_order(&order_id, order, false).await?;
        }

        Ok(())
    }

    /// 删除订单前的回补：未取消、已扣减、未回补 → 库存加回
    pub async fn apply_order_deleted(&self, order: &Order) -> RepoResult<()> {
        if order.status == OrderStatus::Cancelled {
            // 取消时已经回补过 (或从未扣减过)
            return Ok(());
        }
        let order_id = order
            .id
            .as_ref()
            .map(|id| id.to_string())
            .ok_or_else(|| RepoError::Validation("order record has no id".into()))?;

        self.restore_for_order(&order_id, order, true).await
    }

    /// 管理端直接编辑库存：原子设置绝对值并评估越界告警
    ///
    /// 商品不存在返回 `Ok(None)`。
    pub async fn apply_stock_edit(
        &self,
        product_id: &str,
        product_name: &str,
        new_stock: i64,
    ) -> RepoResult<Option<StockChange>> {
        let Some(change) = self.products().set_stock(product_id, new_stock).await? else {
            return Ok(None);
        };

        tracing::info!(
            product = %product_id,
            previous = change.previous,
            current = change.current,
            "Stock edited directly"
        );

        self.emit_stock_alerts(product_id, product_name, change).await;
        Ok(Some(change))
    }

    // =========================================================================
    // Internal
    // =========================================================================

    async fn deduct_for_order(&self, order_id: &str, order: &Order) -> RepoResult<()> {
        if !self.orders().claim_deduction(order_id).await? {
            // 已为该订单扣减过 (如 pending→confirmed→completed 的第二跳)
            tracing::debug!(order = %order_id, "Stock already deducted, skipping");
            return Ok(());
        }

        let product_id = order.product.to_string();
        let adjusted = self
            .products()
            .adjust_stock(&product_id, -order.quantity)
            .await;

        let change = match adjusted {
            Ok(change) => change,
            Err(e) => {
                // 库存未动：回滚标记，让重试可以重新认领
                self.orders().release_deduction(order_id).await?;
                return Err(e);
            }
        };

        match change {
            Some(change) => {
                tracing::info!(
                    order = %order_id,
                    product = %product_id,
                    previous = change.previous,
                    current = change.current,
                    "Stock deducted for order"
                );
                self.emit_stock_alerts(&product_id, &order.product_name, change)
                    .await;
            }
            None => {
                // 商品已被删除：跳过库存变更，状态更新照常进行
                tracing::warn!(
                    order = %order_id,
                    product = %product_id,
                    "Referenced product no longer exists, skipping stock deduction"
                );
                self.orders().release_deduction(order_id).await?;
            }
        }

        Ok(())
    }

    async fn restore_for_order(
        &self,
        order_id: &str,
        order: &Order,
        deleting: bool,
    ) -> RepoResult<()> {
        if !self.orders().claim_restoration(order_id).await? {
            // 从未扣减过 (pending 取消/删除) 或已回补过：不动库存
            tracing::debug!(order = %order_id, "No stock restoration applicable");
            return Ok(());
        }

        let product_id = order.product.to_string();
        let adjusted = self
            .products()
            .adjust_stock(&product_id, order.quantity)
            .await;

        let change = match adjusted {
            Ok(change) => change,
            Err(e) => {
                // 库存未动且错误会中止后续的状态落库/删除：回滚标记
                self.orders().release_restoration(order_id).await?;
                return Err(e);
            }
        };

        match change {
            Some(change) => {
                tracing::info!(
                    order = %order_id,
                    product = %product_id,
                    previous = change.previous,
                    current = change.current,
                    deleting,
                    "Stock restored for order"
                );
            }
            None => {
                tracing::warn!(
                    order = %order_id,
                    product = %product_id,
                    "Referenced product no longer exists, skipping stock restoration"
                );
                if !deleting {
                    // 订单即将被删除时无需回滚标记
                    self.orders().release_restoration(order_id).await?;
                }
            }
        }

        Ok(())
    }

    /// 评估越界并发射通知 (最多一条记录 + 一封运营告警邮件)
    ///
    /// 邮件失败只记日志，不回滚通知记录。
    async fn emit_stock_alerts(&self, product_id: &str, product_name: &str, change: StockChange) {
        let Some(alert) = threshold_crossing(change.previous, change.current) else {
            return;
        };

        let notification = alert.into_notification(product_name, product_id, change.current);
        let title = notification.title.clone();
        let message = notification.message.clone();

        match self.notifications().create(notification).await {
            Ok(_) => {
                self.mailer
                    .send_admin_notification(
                        &title,
                        &message,
                        serde_json::json!({
                            "product_id": product_id,
                            "stock": change.current,
                        }),
                    )
                    .await;
            }
            Err(e) => {
                tracing::error!(
                    product = %product_id,
                    error = %e,
                    "Failed to persist stock alert notification"
                );
            }
        }
    }
}
