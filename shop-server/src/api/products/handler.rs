//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{Product, ProductCategory, ProductCreate, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::{AppError, AppResult};

/// GET /api/products - 获取在售商品 (storefront)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.db.clone());
    let products = repo.find_visible().await?;
    Ok(Json(products))
}

/// GET /api/products/all - 获取全部商品 (含隐藏，管理端)
pub async fn list_all(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.db.clone());
    let products = repo.find_all().await?;
    Ok(Json(products))
}

/// GET /api/products/:id - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))?;
    Ok(Json(product))
}

/// POST /api/products - 创建商品
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo.create(payload).await?;

    tracing::info!(
        product = %product.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
        stock = product.stock,
        "Product created"
    );

    Ok(Json(product))
}

/// Update payload: non-stock fields plus the direct stock-edit path
#[derive(Debug, Deserialize)]
pub struct ProductUpdateRequest {
    pub name: Option<String>,
    pub category: Option<ProductCategory>,
    pub price: Option<f64>,
    pub is_visible: Option<bool>,
    /// 直接编辑库存：原子设置并独立触发越界告警
    pub stock: Option<i64>,
}

/// PUT /api/products/:id - 更新商品
///
/// `stock` 字段走直接编辑路径 (原子设置 + 越界告警)，与订单对账互不干扰。
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdateRequest>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());

    let has_field_update = payload.name.is_some()
        || payload.category.is_some()
        || payload.price.is_some()
        || payload.is_visible.is_some();

    let mut product = if has_field_update {
        repo.update(
            &id,
            ProductUpdate {
                name: payload.name,
                category: payload.category,
                price: payload.price,
                is_visible: payload.is_visible,
            },
        )
        .await?
    } else {
        repo.find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))?
    };

    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::validation("stock cannot be negative"));
        }
        let change = state
            .stock_service()
            .apply_stock_edit(&id, &product.name, stock)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))?;
        product.stock = change.current;
    }

    Ok(Json(product))
}
