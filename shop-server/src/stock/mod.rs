//! 库存对账模块
//!
//! 维护跨实体不变量：商品库存 = 初始库存 − (所有进入过入账状态且未被
//! 取消/回补的订单数量之和)，每次逻辑转移恰好生效一次。
//!
//! - [`StockService`] - 对账引擎 (下单、状态转移、删除、直接编辑)
//! - [`alerts`] - 库存越界判定与告警发射

pub mod alerts;
mod reconcile;

pub use alerts::{LOW_STOCK_THRESHOLD, StockAlert, threshold_crossing};
pub use reconcile::StockService;
