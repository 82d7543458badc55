use crate::{
    db::DbPool,
    entities::{
        product::Entity as Product,
        stock::{self, Entity as Stock},
        store::Entity as Store,
        warehouse::Entity as Warehouse,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Stock intake command: brings a new stock record into existence. All later
/// quantity changes go through the movement ledger.
#[derive(Debug, Clone)]
pub struct NewStock {
    pub code: String,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub expires_at: Option<NaiveDate>,
    pub threshold: i32,
}

/// Stock row enriched with catalog names for read responses.
#[derive(Debug, Clone, Serialize)]
pub struct StockDetails {
    #[serde(flatten)]
    pub stock: stock::Model,
    pub product_name: String,
    pub product_code: String,
    pub warehouse_name: String,
    pub store_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct StockFilter {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventorySummary {
    pub total_products: u64,
    pub total_warehouses: u64,
    pub total_quantity: i64,
    pub total_value: Decimal,
}

#[derive(Clone)]
pub struct StockService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl StockService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a stock record. At most one active record may exist per
    /// (product, warehouse) pair.
    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create(&self, request: NewStock) -> Result<stock::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        if request.quantity < 0 {
            return Err(ServiceError::ValidationError(
                "initial quantity cannot be negative".to_string(),
            ));
        }
        if request.unit_price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "unit price must be positive".to_string(),
            ));
        }

        Product::find_by_id(request.product_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", request.product_id))
            })?;
        Warehouse::find_by_id(request.warehouse_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Warehouse {} not found", request.warehouse_id))
            })?;

        let existing = Stock::find()
            .filter(stock::Column::ProductId.eq(request.product_id))
            .filter(stock::Column::WarehouseId.eq(request.warehouse_id))
            .filter(stock::Column::IsActive.eq(true))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "an active stock record already exists for this product in this warehouse"
                    .to_string(),
            ));
        }

        let duplicate_code = Stock::find()
            .filter(stock::Column::Code.eq(request.code.clone()))
            .one(db)
            .await?;
        if duplicate_code.is_some() {
            return Err(ServiceError::Conflict(format!(
                "stock code {} is already in use",
                request.code
            )));
        }

        // The checks above give precise messages; a unique index on active
        // (product, warehouse) rows is the authority when two intakes race.
        let created = stock::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(request.code),
            product_id: Set(request.product_id),
            warehouse_id: Set(request.warehouse_id),
            quantity: Set(request.quantity),
            unit_price: Set(request.unit_price),
            is_active: Set(true),
            expires_at: Set(request.expires_at),
            threshold: Set(request.threshold),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::Conflict(
                "an active stock record already exists for this product in this warehouse"
                    .to_string(),
            ),
            _ => ServiceError::DatabaseError(err),
        })?;

        let event = Event::StockCreated {
            stock_id: created.id,
            product_id: created.product_id,
            warehouse_id: created.warehouse_id,
        };
        if let Err(err) = self.event_sender.send(event).await {
            warn!(error = %err, "failed to publish stock-created event");
        }

        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<StockDetails, ServiceError> {
        let db = self.db_pool.as_ref();

        let stock = Stock::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock {} not found", id)))?;

        self.with_details(stock).await
    }

    /// Lists stock records, newest first. Inactive records are hidden unless
    /// the filter asks for them.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: StockFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = Stock::find();
        if !filter.include_inactive {
            query = query.filter(stock::Column::IsActive.eq(true));
        }
        if let Some(product_id) = filter.product_id {
            query = query.filter(stock::Column::ProductId.eq(product_id));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(stock::Column::WarehouseId.eq(warehouse_id));
        }

        let paginator = query
            .order_by(stock::Column::CreatedAt, Order::Desc)
            .paginate(db, limit.max(1));

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    /// Soft delete: the record stays referenced by its ledger history.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> Result<stock::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let stock = Stock::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock {} not found", id)))?;

        if !stock.is_active {
            return Err(ServiceError::InvalidOperation(format!(
                "stock {} is already inactive",
                stock.code
            )));
        }

        let mut active: stock::ActiveModel = stock.into();
        active.is_active = Set(false);
        let updated = active.update(db).await?;

        let event = Event::StockDeactivated {
            stock_id: updated.id,
        };
        if let Err(err) = self.event_sender.send(event).await {
            warn!(error = %err, "failed to publish stock-deactivated event");
        }

        Ok(updated)
    }

    /// Totals over active stock: distinct products and warehouses, summed
    /// quantity, summed value (quantity x unit price).
    #[instrument(skip(self))]
    pub async fn inventory_summary(&self) -> Result<InventorySummary, ServiceError> {
        let db = self.db_pool.as_ref();

        #[derive(FromQueryResult)]
        struct SummaryRow {
            product_id: Uuid,
            warehouse_id: Uuid,
            quantity: i32,
            unit_price: Decimal,
        }

        let rows = Stock::find()
            .select_only()
            .column(stock::Column::ProductId)
            .column(stock::Column::WarehouseId)
            .column(stock::Column::Quantity)
            .column(stock::Column::UnitPrice)
            .filter(stock::Column::IsActive.eq(true))
            .into_model::<SummaryRow>()
            .all(db)
            .await?;

        let mut products = HashSet::new();
        let mut warehouses = HashSet::new();
        let mut total_quantity: i64 = 0;
        let mut total_value = Decimal::ZERO;
        for row in &rows {
            products.insert(row.product_id);
            warehouses.insert(row.warehouse_id);
            total_quantity += i64::from(row.quantity);
            total_value += Decimal::from(row.quantity) * row.unit_price;
        }

        Ok(InventorySummary {
            total_products: products.len() as u64,
            total_warehouses: warehouses.len() as u64,
            total_quantity,
            total_value,
        })
    }

    /// Active stocks at or below their reorder threshold.
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<stock::Model>, ServiceError> {
        let db = self.db_pool.as_ref();

        let items = Stock::find()
            .filter(stock::Column::IsActive.eq(true))
            .filter(Expr::col(stock::Column::Quantity).lte(Expr::col(stock::Column::Threshold)))
            .order_by(stock::Column::Quantity, Order::Asc)
            .all(db)
            .await?;

        Ok(items)
    }

    async fn with_details(&self, stock: stock::Model) -> Result<StockDetails, ServiceError> {
        let db = self.db_pool.as_ref();

        let product = Product::find_by_id(stock.product_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "stock {} references missing product {}",
                    stock.id, stock.product_id
                ))
            })?;
        let warehouse = Warehouse::find_by_id(stock.warehouse_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "stock {} references missing warehouse {}",
                    stock.id, stock.warehouse_id
                ))
            })?;
        let store = Store::find_by_id(warehouse.store_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "warehouse {} references missing store {}",
                    warehouse.id, warehouse.store_id
                ))
            })?;

        Ok(StockDetails {
            stock,
            product_name: product.name,
            product_code: product.code,
            warehouse_name: warehouse.name,
            store_name: store.name,
        })
    }
}
