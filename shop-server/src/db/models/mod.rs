//! Database Models
//!
//! 文档模型定义 (SurrealDB)：
//! - [`Product`] - 商品台账
//! - [`Order`] - 订单记录
//! - [`Notification`] - 运营通知

pub mod notification;
pub mod order;
pub mod product;
pub mod serde_helpers;

pub use notification::{Notification, NotificationKind, NotificationPriority};
pub use order::{Order, OrderCreateRequest, OrderStatus, OrderUpdate};
pub use product::{Product, ProductCategory, ProductCreate, ProductUpdate};
