//! Product Model
//!
//! 商品台账：名称、分类、价格、库存、可见性。
//! 库存只允许通过 [`crate::stock::StockService`] 或管理端直接编辑路径变更。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Product category (固定枚举)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Uniform,
    Books,
    Stationery,
    Sports,
    Other,
}

/// Product model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub category: ProductCategory,
    /// Unit price (non-negative)
    pub price: f64,
    /// Sellable units. Invariant: never negative (clamped at the store level)
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub category: ProductCategory,
    pub price: f64,
    pub stock: Option<i64>,
    pub is_visible: Option<bool>,
}

/// Partial update payload. `stock` 走独立的原子编辑路径 (见 products handler)，
/// 不在这里出现。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<ProductCategory>,
    pub price: Option<f64>,
    pub is_visible: Option<bool>,
}
