//! Product Repository
//!
//! 库存变更只提供两个原子入口：
//! - [`ProductRepository::adjust_stock`] - 相对增减 (订单对账)
//! - [`ProductRepository::set_stock`] - 绝对设置 (管理端直接编辑)
//!
//! 两者都用单条 `UPDATE ... RETURN BEFORE` 语句在同一次原子更新里拿到
//! 变更前的值，避免 read-modify-write 丢失更新。

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use crate::utils::time::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const PRODUCT_TABLE: &str = "product";

/// 一次库存变更的前后值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub previous: i64,
    pub current: i64,
}

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all visible products (storefront)
    pub async fn find_visible(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE is_visible = true ORDER BY name")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find all products including hidden ones (operator view)
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY name")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let record_id = parse_record_id(PRODUCT_TABLE, id)?;
        let product: Option<Product> = self.base.db().select(record_id).await?;
        Ok(product)
    }

    /// Create a new product
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        if data.price < 0.0 {
            return Err(RepoError::Validation("price cannot be negative".into()));
        }
        let stock = data.stock.unwrap_or(0);
        if stock < 0 {
            return Err(RepoError::Validation("stock cannot be negative".into()));
        }

        let now = now_millis();
        let product = Product {
            id: None,
            name: data.name,
            category: data.category,
            price: data.price,
            stock,
            is_visible: data.is_visible.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created: Option<Product> = self
            .base
            .db()
            .create(PRODUCT_TABLE)
            .content(product)
            .await?;

        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update a product (non-stock fields)
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        let record_id = parse_record_id(PRODUCT_TABLE, id)?;

        if let Some(price) = data.price
            && price < 0.0
        {
            return Err(RepoError::Validation("price cannot be negative".into()));
        }

        // Build dynamic SET clauses with proper type bindings
        let mut set_parts: Vec<&str> = vec!["updated_at = $updated_at"];

        if data.name.is_some() {
            set_parts.push("name = $name");
        }
        if data.category.is_some() {
            set_parts.push("category = $category");
        }
        if data.price.is_some() {
            set_parts.push("price = $price");
        }
        if data.is_visible.is_some() {
            set_parts.push("is_visible = $is_visible");
        }

        let query_str = format!("UPDATE $id SET {} RETURN AFTER", set_parts.join(", "));

        let mut query = self
            .base
            .db()
            .query(&query_str)
            .bind(("id", record_id))
            .bind(("updated_at", now_millis()));

        if let Some(v) = data.name {
            query = query.bind(("name", v));
        }
        if let Some(v) = data.category {
            query = query.bind(("category", v));
        }
        if let Some(v) = data.price {
            query = query.bind(("price", v));
        }
        if let Some(v) = data.is_visible {
            query = query.bind(("is_visible", v));
        }

        let products: Vec<Product> = query.await?.take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// 原子增减库存，返回变更前后的值；商品不存在返回 None
    ///
    /// `math::max(..., 0)` 在存储端强制「库存永不为负」不变量。
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> RepoResult<Option<StockChange>> {
        let record_id = parse_record_id(PRODUCT_TABLE, id)?;
        let before: Vec<Product> = self
            .base
            .db()
            .query("UPDATE $id SET stock = math::max([stock + $delta, 0]), updated_at = $now RETURN BEFORE")
            .bind(("id", record_id))
            .bind(("delta", delta))
            .bind(("now", now_millis()))
            .await?
            .take(0)?;

        Ok(before.into_iter().next().map(|p| StockChange {
            previous: p.stock,
            current: (p.stock + delta).max(0),
        }))
    }

    /// 原子设置库存绝对值 (负值钳为 0)，返回变更前后的值
    pub async fn set_stock(&self, id: &str, value: i64) -> RepoResult<Option<StockChange>> {
        let record_id = parse_record_id(PRODUCT_TABLE, id)?;
        let clamped = value.max(0);
        let before: Vec<Product> = self
            .base
            .db()
            .query("UPDATE $id SET stock = $value, updated_at = $now RETURN BEFORE")
            .bind(("id", record_id))
            .bind(("value", clamped))
            .bind(("now", now_millis()))
            .await?
            .take(0)?;

        Ok(before.into_iter().next().map(|p| StockChange {
            previous: p.stock,
            current: clamped,
        }))
    }
}
