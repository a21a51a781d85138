//! Order Repository
//!
//! 对账标记 (`stock_deducted` / `stock_restored`) 的认领使用条件更新：
//! `UPDATE $id SET flag = true WHERE flag = false`。并发请求最多一个成功，
//! 这是「每订单最多一次扣减/回补」的落库保证。

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Order, OrderStatus, OrderUpdate};
use crate::utils::time::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const ORDER_TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// List orders, newest first (paginated)
    pub async fn find_all(&self, limit: i64, offset: i64) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY created_at DESC LIMIT $limit START $offset")
            .bind(("limit", limit))
            .bind(("offset", offset))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let record_id = parse_record_id(ORDER_TABLE, id)?;
        let order: Option<Order> = self.base.db().select(record_id).await?;
        Ok(order)
    }

    /// Insert a fully built order (caller snapshots product name/price)
    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(ORDER_TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Partial update (customer fields, note, status)
    ///
    /// 金额快照字段不可更新；状态由 handler 先走对账再落库。
    pub async fn update(&self, id: &str, data: OrderUpdate) -> RepoResult<Order> {
        let record_id = parse_record_id(ORDER_TABLE, id)?;

        let mut set_parts: Vec<&str> = vec!["updated_at = $updated_at"];

        if data.status.is_some() {
            set_parts.push("status = $status");
        }
        if data.customer_name.is_some() {
            set_parts.push("customer_name = $customer_name");
        }
        if data.customer_email.is_some() {
            set_parts.push("customer_email = $customer_email");
        }
        if data.customer_phone.is_some() {
            set_parts.push("customer_phone = $customer_phone");
        }
        if data.note.is_some() {
            set_parts.push("note = $note");
        }

        let query_str = format!("UPDATE $id SET {} RETURN AFTER", set_parts.join(", "));

        let mut query = self
            .base
            .db()
            .query(&query_str)
            .bind(("id", record_id))
            .bind(("updated_at", now_millis()));

        if let Some(v) = data.status {
            query = query.bind(("status", v));
        }
        if let Some(v) = data.customer_name {
            query = query.bind(("customer_name", v));
        }
        if let Some(v) = data.customer_email {
            query = query.bind(("customer_email", v));
        }
        if let Some(v) = data.customer_phone {
            query = query.bind(("customer_phone", v));
        }
        if let Some(v) = data.note {
            query = query.bind(("note", v));
        }

        let orders: Vec<Order> = query.await?.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Persist a new status
    pub async fn set_status(&self, id: &str, status: OrderStatus) -> RepoResult<Order> {
        let record_id = parse_record_id(ORDER_TABLE, id)?;
        let orders: Vec<Order> = self
            .base
            .db()
            .query("UPDATE $id SET status = $status, updated_at = $now RETURN AFTER")
            .bind(("id", record_id))
            .bind(("status", status))
            .bind(("now", now_millis()))
            .await?
            .take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// 认领扣减标记。返回 true 表示本次调用赢得扣减权
    pub async fn claim_deduction(&self, id: &str) -> RepoResult<bool> {
        let record_id = parse_record_id(ORDER_TABLE, id)?;
        let claimed: Vec<Order> = self
            .base
            .db()
            .query("UPDATE $id SET stock_deducted = true, updated_at = $now WHERE stock_deducted = false RETURN AFTER")
            .bind(("id", record_id))
            .bind(("now", now_millis()))
            .await?
            .take(0)?;
        Ok(!claimed.is_empty())
    }

    /// 回滚扣减标记 (商品缺失时扣减被跳过)
    pub async fn release_deduction(&self, id: &str) -> RepoResult<()> {
        let record_id = parse_record_id(ORDER_TABLE, id)?;
        self.base
            .db()
            .query("UPDATE $id SET stock_deducted = false, updated_at = $now")
            .bind(("id", record_id))
            .bind(("now", now_millis()))
            .await?
            .check()?;
        Ok(())
    }

    /// 认领回补标记。只有已扣减且未回补的订单能赢得回补权
    pub async fn claim_restoration(&self, id: &str) -> RepoResult<bool> {
        let record_id = parse_record_id(ORDER_TABLE, id)?;
        let claimed: Vec<Order> = self
            .base
            .db()
            .query("UPDATE $id SET stock_restored = true, updated_at = $now WHERE stock_deducted = true AND stock_restored = false RETURN AFTER")
            .bind(("id", record_id))
            .bind(("now", now_millis()))
            .await?
            .take(0)?;
        Ok(!claimed.is_empty())
    }

    /// 回滚回补标记 (商品缺失时回补被跳过)
    pub async fn release_restoration(&self, id: &str) -> RepoResult<()> {
        let record_id = parse_record_id(ORDER_TABLE, id)?;
        self.base
            .db()
            .query("UPDATE $id SET stock_restored = false, updated_at = $now")
            .bind(("id", record_id))
            .bind(("now", now_millis()))
            .await?
            .check()?;
        Ok(())
    }

    /// Hard delete an order, returning the erased record
    pub async fn delete(&self, id: &str) -> RepoResult<Option<Order>> {
        let record_id = parse_record_id(ORDER_TABLE, id)?;
        let deleted: Option<Order> = self.base.db().delete(record_id).await?;
        Ok(deleted)
    }
}
