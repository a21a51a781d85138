//! End-to-end stock reconciliation flows against an embedded database
//! Run: cargo test -p shop-server --test stock_flow

use std::sync::Arc;

use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use shop_server::db::DbService;
use shop_server::db::models::{
    NotificationKind, NotificationPriority, Order, OrderCreateRequest, OrderStatus, Product,
    ProductCategory, ProductCreate,
};
use shop_server::db::repository::{
    NotificationRepository, OrderRepository, ProductRepository, RepoError,
};
use shop_server::services::MailerService;
use shop_server::stock::StockService;

async fn setup() -> (tempfile::TempDir, Surreal<Db>, StockService) {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("shop.db");
    let service = DbService::new(&db_path.to_string_lossy()).await.unwrap();
    let db = service.db;
    let stock = StockService::new(db.clone(), Arc::new(MailerService::disabled()));
    (tmp, db, stock)
}

async fn seed_product(db: &Surreal<Db>, name: &str, price: f64, stock: i64) -> Product {
    ProductRepository::new(db.clone())
        .create(ProductCreate {
            name: name.into(),
            category: ProductCategory::Stationery,
            price,
            stock: Some(stock),
            is_visible: Some(true),
        })
        .await
        .unwrap()
}

async fn place(stock: &StockService, product: &Product, quantity: i64) -> Order {
    stock
        .place_order(OrderCreateRequest {
            product: product.id.as_ref().unwrap().to_string(),
            quantity,
            customer_name: "Zhang Wei".into(),
            customer_email: "zhang.wei@school.example".into(),
            customer_phone: None,
            note: None,
        })
        .await
        .unwrap()
}

/// Mimics the order update handler: validate the transition, reconcile
/// stock, then persist the new status.
async fn transition(
    db: &Surreal<Db>,
    stock: &StockService,
    order_id: &str,
    to: OrderStatus,
) -> Order {
    let orders = OrderRepository::new(db.clone());
    let order = orders.find_by_id(order_id).await.unwrap().unwrap();
    assert!(
        order.status.can_transition_to(to),
        "transition {} -> {} should be legal",
        order.status,
        to
    );
    stock.apply_status_transition(&order, to).await.unwrap();
    orders.set_status(order_id, to).await.unwrap()
}

async fn current_stock(db: &Surreal<Db>, product: &Product) -> i64 {
    ProductRepository::new(db.clone())
        .find_by_id(&product.id.as_ref().unwrap().to_string())
        .await
        .unwrap()
        .unwrap()
        .stock
}

async fn notifications_of_kind(
    db: &Surreal<Db>,
    kind: NotificationKind,
) -> Vec<shop_server::db::models::Notification> {
    NotificationRepository::new(db.clone())
        .find_all(false, 100, 0)
        .await
        .unwrap()
        .into_iter()
        .filter(|n| n.kind == kind)
        .collect()
}

#[tokio::test]
async fn confirm_then_complete_deducts_exactly_once() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Notebook A5", 3.5, 10).await;
    let order = place(&stock, &product, 3).await;
    let order_id = order.id.as_ref().unwrap().to_string();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, 10.5);
    // Pending orders do not touch stock
    assert_eq!(current_stock(&db, &product).await, 10);

    let confirmed = transition(&db, &stock, &order_id, OrderStatus::Confirmed).await;
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert!(confirmed.stock_deducted);
    assert_eq!(current_stock(&db, &product).await, 7);

    // Completing a confirmed order must not deduct again
    transition(&db, &stock, &order_id, OrderStatus::Completed).await;
    assert_eq!(current_stock(&db, &product).await, 7);

    // 10 -> 7 stays above the threshold, no alert
    assert!(notifications_of_kind(&db, NotificationKind::LowStock).await.is_empty());
    assert!(notifications_of_kind(&db, NotificationKind::OutOfStock).await.is_empty());
}

#[tokio::test]
async fn direct_completion_deducts_and_raises_low_stock_alert() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Gym Shirt", 12.0, 6).await;
    let order = place(&stock, &product, 2).await;
    let order_id = order.id.as_ref().unwrap().to_string();

    // pending -> completed skips confirmed but still deducts once
    transition(&db, &stock, &order_id, OrderStatus::Completed).await;
    assert_eq!(current_stock(&db, &product).await, 4);

    let alerts = notifications_of_kind(&db, NotificationKind::LowStock).await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].priority, NotificationPriority::High);
}

#[tokio::test]
async fn cancellation_restores_exactly_once() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Pencil Case", 4.0, 10).await;
    let order = place(&stock, &product, 4).await;
    let order_id = order.id.as_ref().unwrap().to_string();

    let confirmed = transition(&db, &stock, &order_id, OrderStatus::Confirmed).await;
    assert_eq!(current_stock(&db, &product).await, 6);

    let cancelled = transition(&db, &stock, &order_id, OrderStatus::Cancelled).await;
    assert!(cancelled.stock_restored);
    assert_eq!(current_stock(&db, &product).await, 10);

    // Terminal state: the state machine rejects any further transition
    assert!(!cancelled.status.can_transition_to(OrderStatus::Cancelled));

    // Replay with a stale copy of the confirmed order: the persisted
    // restoration marker blocks a second restore
    stock
        .apply_status_transition(&confirmed, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(current_stock(&db, &product).await, 10);
}

#[tokio::test]
async fn cancelling_pending_order_leaves_stock_untouched() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Ruler", 1.5, 8).await;
    let order = place(&stock, &product, 3).await;
    let order_id = order.id.as_ref().unwrap().to_string();

    // Never deducted, so cancellation must not restore
    let cancelled = transition(&db, &stock, &order_id, OrderStatus::Cancelled).await;
    assert!(!cancelled.stock_restored);
    assert_eq!(current_stock(&db, &product).await, 8);
}

#[tokio::test]
async fn insufficient_stock_checkout_rejected_without_side_effects() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Calculator", 25.0, 2).await;

    let result = stock
        .place_order(OrderCreateRequest {
            product: product.id.as_ref().unwrap().to_string(),
            quantity: 5,
            customer_name: "Li Na".into(),
            customer_email: "li.na@school.example".into(),
            customer_phone: None,
            note: None,
        })
        .await;

    assert!(matches!(result, Err(RepoError::BusinessRule(_))));
    assert_eq!(current_stock(&db, &product).await, 2);

    let orders = OrderRepository::new(db.clone()).find_all(10, 0).await.unwrap();
    assert!(orders.is_empty());
    assert!(notifications_of_kind(&db, NotificationKind::NewOrder).await.is_empty());
}

#[tokio::test]
async fn hidden_product_cannot_be_ordered() {
    let (_tmp, db, stock) = setup().await;
    let product = ProductRepository::new(db.clone())
        .create(ProductCreate {
            name: "Old Uniform".into(),
            category: ProductCategory::Uniform,
            price: 30.0,
            stock: Some(5),
            is_visible: Some(false),
        })
        .await
        .unwrap();

    let result = stock
        .place_order(OrderCreateRequest {
            product: product.id.as_ref().unwrap().to_string(),
            quantity: 1,
            customer_name: "Wang Fang".into(),
            customer_email: "wang.fang@school.example".into(),
            customer_phone: None,
            note: None,
        })
        .await;

    assert!(matches!(result, Err(RepoError::Validation(_))));
}

#[tokio::test]
async fn deleting_pending_order_does_not_restore() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Eraser", 0.5, 20).await;
    let order = place(&stock, &product, 5).await;
    let order_id = order.id.as_ref().unwrap().to_string();

    stock.apply_order_deleted(&order).await.unwrap();
    OrderRepository::new(db.clone()).delete(&order_id).await.unwrap();

    assert_eq!(current_stock(&db, &product).await, 20);
}

#[tokio::test]
async fn deleting_confirmed_order_restores_stock() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Textbook", 18.0, 20).await;
    let order = place(&stock, &product, 5).await;
    let order_id = order.id.as_ref().unwrap().to_string();

    let confirmed = transition(&db, &stock, &order_id, OrderStatus::Confirmed).await;
    assert_eq!(current_stock(&db, &product).await, 15);

    stock.apply_order_deleted(&confirmed).await.unwrap();
    OrderRepository::new(db.clone()).delete(&order_id).await.unwrap();

    assert_eq!(current_stock(&db, &product).await, 20);
}

#[tokio::test]
async fn deleting_cancelled_order_does_not_restore_again() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Water Bottle", 6.0, 10).await;
    let order = place(&stock, &product, 2).await;
    let order_id = order.id.as_ref().unwrap().to_string();

    transition(&db, &stock, &order_id, OrderStatus::Confirmed).await;
    let cancelled = transition(&db, &stock, &order_id, OrderStatus::Cancelled).await;
    assert_eq!(current_stock(&db, &product).await, 10);

    stock.apply_order_deleted(&cancelled).await.unwrap();
    assert_eq!(current_stock(&db, &product).await, 10);
}

#[tokio::test]
async fn over_deduction_clamps_stock_at_zero() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Lined Paper", 1.0, 3).await;

    // Both checkouts pass the sufficiency check against stock 3
    let first = place(&stock, &product, 2).await;
    let second = place(&stock, &product, 2).await;

    transition(&db, &stock, &first.id.as_ref().unwrap().to_string(), OrderStatus::Confirmed).await;
    assert_eq!(current_stock(&db, &product).await, 1);

    // The benign checkout race: the second deduction clamps at zero
    transition(&db, &stock, &second.id.as_ref().unwrap().to_string(), OrderStatus::Confirmed).await;
    assert_eq!(current_stock(&db, &product).await, 0);

    let urgent = notifications_of_kind(&db, NotificationKind::OutOfStock).await;
    assert_eq!(urgent.len(), 1);
    assert_eq!(urgent[0].priority, NotificationPriority::Urgent);
}

fn bad_link_order(deducted: bool, status: OrderStatus) -> Order {
    Order {
        id: None,
        product: RecordId::from_table_key("catalog", "ghost"),
        product_name: "Ghost Item".into(),
        unit_price: 1.0,
        quantity: 1,
        customer_name: "Chen Jie".into(),
        customer_email: "chen.jie@school.example".into(),
        customer_phone: None,
        note: None,
        status,
        total_amount: 1.0,
        stock_deducted: deducted,
        stock_restored: false,
        created_at: 0,
        updated_at: 0,
    }
}

#[tokio::test]
async fn failed_deduction_releases_marker_for_retry() {
    let (_tmp, db, stock) = setup().await;
    let orders = OrderRepository::new(db.clone());

    // Product link points outside the product table: the stock adjustment
    // fails after the deduction marker has been claimed
    let order = orders
        .create(bad_link_order(false, OrderStatus::Pending))
        .await
        .unwrap();
    let order_id = order.id.as_ref().unwrap().to_string();

    let result = stock
        .apply_status_transition(&order, OrderStatus::Confirmed)
        .await;
    assert!(result.is_err());

    // Marker rolled back: a retry can claim the deduction again
    let reloaded = orders.find_by_id(&order_id).await.unwrap().unwrap();
    assert!(!reloaded.stock_deducted);
}

#[tokio::test]
async fn failed_restoration_releases_marker_for_retry() {
    let (_tmp, db, stock) = setup().await;
    let orders = OrderRepository::new(db.clone());

    let order = orders
        .create(bad_link_order(true, OrderStatus::Confirmed))
        .await
        .unwrap();
    let order_id = order.id.as_ref().unwrap().to_string();

    let result = stock
        .apply_status_transition(&order, OrderStatus::Cancelled)
        .await;
    assert!(result.is_err());

    // The deduction record stays, the restoration marker is rolled back
    let reloaded = orders.find_by_id(&order_id).await.unwrap().unwrap();
    assert!(reloaded.stock_deducted);
    assert!(!reloaded.stock_restored);
}

#[tokio::test]
async fn stock_edit_emits_threshold_alerts() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Marker Set", 8.0, 10).await;
    let product_id = product.id.as_ref().unwrap().to_string();

    // 10 -> 4: crosses the low-stock threshold
    let change = stock
        .apply_stock_edit(&product_id, &product.name, 4)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(change.previous, 10);
    assert_eq!(change.current, 4);
    assert_eq!(
        notifications_of_kind(&db, NotificationKind::LowStock).await.len(),
        1
    );

    // 4 -> 3: already below, no new alert
    stock
        .apply_stock_edit(&product_id, &product.name, 3)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        notifications_of_kind(&db, NotificationKind::LowStock).await.len(),
        1
    );

    // 3 -> 0: out-of-stock, urgent
    stock
        .apply_stock_edit(&product_id, &product.name, 0)
        .await
        .unwrap()
        .unwrap();
    let urgent = notifications_of_kind(&db, NotificationKind::OutOfStock).await;
    assert_eq!(urgent.len(), 1);
    assert_eq!(urgent[0].priority, NotificationPriority::Urgent);

    // Editing a missing product returns None
    let missing = stock
        .apply_stock_edit("product:does_not_exist", "ghost", 5)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn missing_product_degrades_gracefully_on_confirm() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Discontinued Pen", 2.0, 10).await;
    let order = place(&stock, &product, 2).await;
    let order_id = order.id.as_ref().unwrap().to_string();

    // Product is removed from the catalog while the order is still pending
    let _: Option<Product> = db
        .delete(product.id.clone().unwrap())
        .await
        .unwrap();

    // The transition still goes through, stock reconciliation is skipped
    let confirmed = transition(&db, &stock, &order_id, OrderStatus::Confirmed).await;
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    // Marker was released so the order is not recorded as deducted
    assert!(!confirmed.stock_deducted);
}

#[tokio::test]
async fn order_snapshot_survives_product_price_change() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Backpack", 40.0, 10).await;
    let order = place(&stock, &product, 1).await;
    let order_id = order.id.as_ref().unwrap().to_string();

    // Price change after checkout must not affect the order snapshot
    ProductRepository::new(db.clone())
        .update(
            &product.id.as_ref().unwrap().to_string(),
            shop_server::db::models::ProductUpdate {
                name: None,
                category: None,
                price: Some(55.0),
                is_visible: None,
            },
        )
        .await
        .unwrap();

    let reloaded = OrderRepository::new(db.clone())
        .find_by_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.unit_price, 40.0);
    assert_eq!(reloaded.total_amount, 40.0);
}

#[tokio::test]
async fn checkout_creates_new_order_notification() {
    let (_tmp, db, stock) = setup().await;
    let product = seed_product(&db, "Lab Goggles", 9.0, 10).await;
    place(&stock, &product, 1).await;

    let new_orders = notifications_of_kind(&db, NotificationKind::NewOrder).await;
    assert_eq!(new_orders.len(), 1);
    assert_eq!(new_orders[0].priority, NotificationPriority::Normal);
    assert!(!new_orders[0].is_read);

    let repo = NotificationRepository::new(db.clone());
    assert_eq!(repo.unread_count().await.unwrap(), 1);

    let id = new_orders[0].id.as_ref().unwrap().to_string();
    let marked = repo.mark_read(&id).await.unwrap();
    assert!(marked.is_read);
    assert_eq!(repo.unread_count().await.unwrap(), 0);
}
