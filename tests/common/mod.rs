#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use stockledger_api::{
    db::{self, DbPool},
    entities::stock,
    events::{self, EventSender},
    services::{catalog::CatalogService, movements::MovementService, stocks::StockService},
};
use tokio::sync::mpsc;
use uuid::Uuid;

pub struct TestContext {
    pub db: Arc<DbPool>,
    pub movements: MovementService,
    pub stocks: StockService,
    pub catalog: CatalogService,
}

/// Fresh in-memory database with migrations applied. The pool is capped at
/// one connection, so the database is shared across all operations.
pub async fn setup() -> TestContext {
    let pool = db::establish_connection("sqlite::memory:")
        .await
        .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");

    let db = Arc::new(pool);
    let (tx, rx) = mpsc::channel(100);
    let sender = EventSender::new(tx);
    tokio::spawn(events::process_events(rx));

    TestContext {
        movements: MovementService::new(db.clone(), sender.clone()),
        stocks: StockService::new(db.clone(), sender),
        catalog: CatalogService::new(db.clone()),
        db,
    }
}

pub struct Fixture {
    pub product_id: Uuid,
    pub other_product_id: Uuid,
    pub warehouse_one_id: Uuid,
    pub warehouse_two_id: Uuid,
    pub user_id: Uuid,
}

/// One store with two warehouses and two products.
pub async fn seed_catalog(ctx: &TestContext) -> Fixture {
    let store = ctx
        .catalog
        .create_store("Central".into(), "1 Main St".into())
        .await
        .expect("store");
    let warehouse_one = ctx
        .catalog
        .create_warehouse(store.id, "North".into(), "2 Dock Rd".into())
        .await
        .expect("warehouse one");
    let warehouse_two = ctx
        .catalog
        .create_warehouse(store.id, "South".into(), "3 Dock Rd".into())
        .await
        .expect("warehouse two");
    let product = ctx
        .catalog
        .create_product("WIDGET-1".into(), "Widget".into())
        .await
        .expect("product");
    let other_product = ctx
        .catalog
        .create_product("GADGET-1".into(), "Gadget".into())
        .await
        .expect("other product");

    Fixture {
        product_id: product.id,
        other_product_id: other_product.id,
        warehouse_one_id: warehouse_one.id,
        warehouse_two_id: warehouse_two.id,
        user_id: Uuid::new_v4(),
    }
}

/// Inserts a stock row directly, bypassing the intake uniqueness check, for
/// tests that need precise starting quantities.
pub async fn insert_stock(
    ctx: &TestContext,
    code: &str,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: i32,
) -> stock::Model {
    stock::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        product_id: Set(product_id),
        warehouse_id: Set(warehouse_id),
        quantity: Set(quantity),
        unit_price: Set(Decimal::new(999, 2)),
        is_active: Set(true),
        expires_at: Set(None),
        threshold: Set(5),
        ..Default::default()
    }
    .insert(ctx.db.as_ref())
    .await
    .expect("stock insert")
}

pub async fn reload_stock(ctx: &TestContext, id: Uuid) -> stock::Model {
    use sea_orm::EntityTrait;
    stock::Entity::find_by_id(id)
        .one(ctx.db.as_ref())
        .await
        .expect("query")
        .expect("stock exists")
}
