//! Order API Handlers
//!
//! 状态转移的编排顺序 (见 stock 模块)：
//! 1. 状态机合法性检查 (非法转移 → 400，无任何变更)
//! 2. 库存对账 (StockService，标记门控的恰好一次扣减/回补)
//! 3. 状态落库
//! 4. 外部邮件派发 (fire-and-forget，失败不影响已落库的变更)

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{Order, OrderCreateRequest, OrderStatus, OrderUpdate};
use crate::db::repository::OrderRepository;
use crate::utils::{AppError, AppResult};

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/orders - 订单列表 (分页)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    let orders = repo.find_all(query.limit, query.offset).await?;
    Ok(Json(orders))
}

/// GET /api/orders/:id - 获取单个订单
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;
    Ok(Json(order))
}

/// Checkout response
#[derive(Debug, Serialize)]
pub struct OrderCreateResponse {
    pub success: bool,
    pub id: String,
}

/// POST /api/orders - 下单 (库存充足性检查，不预留)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<OrderCreateRequest>,
) -> AppResult<Json<OrderCreateResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let order = state.stock_service().place_order(payload).await?;

    Ok(Json(OrderCreateResponse {
        success: true,
        id: order.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
    }))
}

/// PUT /api/orders/:id - 更新订单 (可含状态转移)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(mut payload): Json<OrderUpdate>,
) -> AppResult<Json<Order>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;

    let mut transitioned: Option<OrderStatus> = None;

    if let Some(new_status) = payload.status {
        if new_status == order.status {
            // 同状态写入是空操作，不触发对账
            payload.status = None;
        } else {
            if !order.status.can_transition_to(new_status) {
                return Err(AppError::validation(format!(
                    "invalid status transition: {} -> {}",
                    order.status, new_status
                )));
            }
            // 先对账，再落库状态
            state
                .stock_service()
                .apply_status_transition(&order, new_status)
                .await?;
            transitioned = Some(new_status);
        }
    }

    let updated = repo.update(&id, payload).await?;

    // 进入 confirmed/ready/completed/cancelled 时通知客户 (失败仅记日志)
    if let Some(new_status) = transitioned
        && new_status != OrderStatus::Pending
    {
        state.mailer.send_order_status_email(&updated, new_status).await;
    }

    Ok(Json(updated))
}

/// DELETE /api/orders/:id - 删除订单
///
/// 已扣减且未取消的订单在删除前回补库存。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;

    state.stock_service().apply_order_deleted(&order).await?;

    repo.delete(&id).await?;

    tracing::info!(order = %id, status = %order.status, "Order deleted");

    Ok(Json(true))
}
