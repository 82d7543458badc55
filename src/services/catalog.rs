use crate::{
    db::DbPool,
    entities::{
        product::{self, Entity as Product},
        store::{self, Entity as Store},
        warehouse::{self, Entity as Warehouse},
    },
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Thin data-access layer for the catalog resources the ledger references:
/// stores, their warehouses, and products. No business rules live here.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    // Stores

    pub async fn create_store(
        &self,
        name: String,
        address: String,
    ) -> Result<store::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let created = store::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            address: Set(address),
            created_at: Set(chrono::Utc::now()),
            updated_at: Set(chrono::Utc::now()),
        }
        .insert(db)
        .await?;

        Ok(created)
    }

    pub async fn get_store(&self, id: Uuid) -> Result<store::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        Store::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Store {} not found", id)))
    }

    pub async fn list_stores(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<store::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let paginator = Store::find()
            .order_by(store::Column::Name, Order::Asc)
            .paginate(db, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn update_store(
        &self,
        id: Uuid,
        name: Option<String>,
        address: Option<String>,
    ) -> Result<store::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_store(id).await?;

        let mut active: store::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(address) = address {
            active.address = Set(address);
        }
        active.updated_at = Set(chrono::Utc::now());
        Ok(active.update(db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_store(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_store(id).await?;
        existing.delete(db).await?;
        Ok(())
    }

    // Warehouses

    pub async fn create_warehouse(
        &self,
        store_id: Uuid,
        name: String,
        address: String,
    ) -> Result<warehouse::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        // Reject dangling store references up front for a clearer error than
        // the FK violation.
        self.get_store(store_id).await?;

        let created = warehouse::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store_id),
            name: Set(name),
            address: Set(address),
            created_at: Set(chrono::Utc::now()),
            updated_at: Set(chrono::Utc::now()),
        }
        .insert(db)
        .await?;

        Ok(created)
    }

    pub async fn get_warehouse(&self, id: Uuid) -> Result<warehouse::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        Warehouse::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {} not found", id)))
    }

    pub async fn list_warehouses(
        &self,
        store_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<warehouse::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = Warehouse::find();
        if let Some(store_id) = store_id {
            query = query.filter(warehouse::Column::StoreId.eq(store_id));
        }

        let paginator = query
            .order_by(warehouse::Column::Name, Order::Asc)
            .paginate(db, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn update_warehouse(
        &self,
        id: Uuid,
        name: Option<String>,
        address: Option<String>,
    ) -> Result<warehouse::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_warehouse(id).await?;

        let mut active: warehouse::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(address) = address {
            active.address = Set(address);
        }
        active.updated_at = Set(chrono::Utc::now());
        Ok(active.update(db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_warehouse(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.get_warehouse(id).await?;
        existing.delete(db).await?;
        Ok(())
    }

    // Products

    pub async fn create_product(
        &self,
        code: String,
        name: String,
    ) -> Result<product::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let duplicate = Product::find()
            .filter(product::Column::Code.eq(code.clone()))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "product code {} is already in use",
                code
            )));
        }

        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            name: Set(name),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(db)
        .await?;

        Ok(created)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        Product::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    pub async fn list_products(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let paginator = Product::find()
            .order_by(product::Column::Name, Order::Asc)
            .paginate(db, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}
