use crate::{
    db::DbPool,
    entities::{
        stock::{self, Entity as Stock},
        stock_movement::{self, Entity as StockMovement, MovementOperation, MovementStructure},
    },
    errors::{ServiceError, StockSide},
    events::{Event, EventSender},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, DbBackend,
    EntityTrait, FromQueryResult, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A proposed movement, as accepted from the boundary layer.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub operation: MovementOperation,
    pub structure: MovementStructure,
    pub quantity: i32,
    pub motive: String,
    pub description: Option<String>,
    pub stock_one_id: Uuid,
    pub stock_two_id: Option<Uuid>,
}

/// A committed movement together with the affected stock rows as they stood
/// at commit time.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedMovement {
    pub movement: stock_movement::Model,
    pub stock_one: stock::Model,
    pub stock_two: Option<stock::Model>,
}

/// Filters for the movement history listing. A `stock_id` matches movements
/// referencing the stock on either side.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovementFilter {
    pub stock_id: Option<Uuid>,
    pub operation: Option<MovementOperation>,
    pub structure: Option<MovementStructure>,
    pub created_by: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementSummary {
    pub period_days: i64,
    pub total_movements: u64,
    pub total_inbound: u64,
    pub total_outbound: u64,
    pub total_quantity_moved: i64,
    pub by_structure: Vec<StructureBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureBreakdown {
    pub structure: String,
    pub count: i64,
    pub total_quantity: i64,
}

/// Checks a proposed movement against the given stock state. Read-only; the
/// applier runs this a second time on post-lock state inside its transaction,
/// so the quantity check always reflects true row contents.
pub fn validate_movement(
    request: &NewMovement,
    stock_one: &stock::Model,
    stock_two: Option<&stock::Model>,
) -> Result<(), ServiceError> {
    if request.quantity <= 0 {
        return Err(ServiceError::InvalidQuantity(request.quantity));
    }

    match request.structure {
        MovementStructure::Simple => {
            if stock_two.is_some() {
                return Err(ServiceError::StructureMismatch(
                    "stock_two must be empty for a simple movement".to_string(),
                ));
            }
            if request.operation == MovementOperation::Outbound
                && stock_one.quantity < request.quantity
            {
                return Err(ServiceError::InsufficientStock {
                    side: StockSide::StockOne,
                    available: stock_one.quantity,
                    requested: request.quantity,
                });
            }
        }
        MovementStructure::Paired => {
            let stock_two = stock_two.ok_or_else(|| {
                ServiceError::StructureMismatch(
                    "stock_two is required for a paired movement".to_string(),
                )
            })?;
            if stock_one.id == stock_two.id {
                return Err(ServiceError::DuplicateStockReference);
            }
            if stock_one.product_id != stock_two.product_id {
                return Err(ServiceError::ProductMismatch);
            }
            // The side that depletes must cover the quantity: stock_one on an
            // outbound transfer, stock_two on an inbound one.
            match request.operation {
                MovementOperation::Outbound => {
                    if stock_one.quantity < request.quantity {
                        return Err(ServiceError::InsufficientStock {
                            side: StockSide::StockOne,
                            available: stock_one.quantity,
                            requested: request.quantity,
                        });
                    }
                }
                MovementOperation::Inbound => {
                    if stock_two.quantity < request.quantity {
                        return Err(ServiceError::InsufficientStock {
                            side: StockSide::StockTwo,
                            available: stock_two.quantity,
                            requested: request.quantity,
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

/// Quantity deltas per (structure, operation). The second element is
/// meaningless for simple movements.
fn quantity_deltas(
    structure: MovementStructure,
    operation: MovementOperation,
    quantity: i32,
) -> (i32, i32) {
    match (structure, operation) {
        (MovementStructure::Simple, MovementOperation::Outbound) => (-quantity, 0),
        (MovementStructure::Simple, MovementOperation::Inbound) => (quantity, 0),
        (MovementStructure::Paired, MovementOperation::Outbound) => (-quantity, quantity),
        (MovementStructure::Paired, MovementOperation::Inbound) => (quantity, -quantity),
    }
}

/// Applies a signed delta to a stock balance. Validation already rules out
/// negative results; the checked add additionally refuses balances past
/// `i32::MAX`.
fn apply_delta(record: &stock::Model, delta: i32) -> Result<i32, ServiceError> {
    record
        .quantity
        .checked_add(delta)
        .filter(|quantity| *quantity >= 0)
        .ok_or_else(|| {
            ServiceError::InvalidOperation(format!(
                "stock {} at quantity {} cannot absorb a change of {}",
                record.code, record.quantity, delta
            ))
        })
}

fn ensure_active(record: &stock::Model) -> Result<(), ServiceError> {
    if !record.is_active {
        return Err(ServiceError::InvalidOperation(format!(
            "stock {} is inactive",
            record.code
        )));
    }
    Ok(())
}

/// Service owning the stock movement ledger: validation, atomic application
/// of quantity deltas, and the read side over historical movements.
#[derive(Clone)]
pub struct MovementService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl MovementService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Validates and applies a movement atomically, writing the ledger row in
    /// the same transaction as the quantity mutation.
    ///
    /// The affected stock rows are re-fetched under lock inside the
    /// transaction (ascending id order, so two movements referencing the same
    /// pair in opposite orders cannot deadlock) and validation re-runs on the
    /// locked state. Submissions are not idempotent: resubmitting the same
    /// payload records a second independent movement.
    #[instrument(skip(self, request), fields(stock_one = %request.stock_one_id))]
    pub async fn submit(
        &self,
        request: NewMovement,
        acting_user: Uuid,
    ) -> Result<RecordedMovement, ServiceError> {
        let db = self.db_pool.as_ref();

        // Pre-check on a plain read so obviously bad requests never open a
        // write transaction. The authoritative check is the one under lock.
        let (stock_one, stock_two) = self.fetch_pair(db, &request).await?;
        ensure_active(&stock_one)?;
        if let Some(ref two) = stock_two {
            ensure_active(two)?;
        }
        validate_movement(&request, &stock_one, stock_two.as_ref())?;

        let applied = db
            .transaction::<_, RecordedMovement, ServiceError>(move |txn| {
                Box::pin(async move { apply_movement(txn, request, acting_user).await })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.publish_events(&applied).await;

        info!(
            movement_id = %applied.movement.id,
            operation = %applied.movement.operation,
            structure = %applied.movement.structure,
            quantity = applied.movement.quantity,
            "movement committed"
        );

        Ok(applied)
    }

    /// Fetches a movement with the current state of its stock references.
    pub async fn get(&self, id: Uuid) -> Result<RecordedMovement, ServiceError> {
        let db = self.db_pool.as_ref();

        let movement = StockMovement::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Movement {} not found", id)))?;

        let stock_one = Stock::find_by_id(movement.stock_one_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "movement {} references missing stock {}",
                    movement.id, movement.stock_one_id
                ))
            })?;

        let stock_two = match movement.stock_two_id {
            Some(two_id) => Stock::find_by_id(two_id).one(db).await?,
            None => None,
        };

        Ok(RecordedMovement {
            movement,
            stock_one,
            stock_two,
        })
    }

    /// Lists ledger entries, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: MovementFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = StockMovement::find();

        if let Some(stock_id) = filter.stock_id {
            query = query.filter(
                Condition::any()
                    .add(stock_movement::Column::StockOneId.eq(stock_id))
                    .add(stock_movement::Column::StockTwoId.eq(stock_id)),
            );
        }
        if let Some(operation) = filter.operation {
            query = query.filter(stock_movement::Column::Operation.eq(operation.as_ref()));
        }
        if let Some(structure) = filter.structure {
            query = query.filter(stock_movement::Column::Structure.eq(structure.as_ref()));
        }
        if let Some(created_by) = filter.created_by {
            query = query.filter(stock_movement::Column::CreatedBy.eq(created_by));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(stock_movement::Column::CreatedAt.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(stock_movement::Column::CreatedAt.lte(end));
        }

        let paginator = query
            .order_by(stock_movement::Column::CreatedAt, Order::Desc)
            .paginate(db, limit.max(1));

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    /// Aggregated counts and quantity totals over a trailing window.
    #[instrument(skip(self))]
    pub async fn summary(&self, days: i64) -> Result<MovementSummary, ServiceError> {
        let db = self.db_pool.as_ref();
        let since = Utc::now() - Duration::days(days);

        let total_movements = StockMovement::find()
            .filter(stock_movement::Column::CreatedAt.gte(since))
            .count(db)
            .await?;
        let total_inbound = StockMovement::find()
            .filter(stock_movement::Column::CreatedAt.gte(since))
            .filter(stock_movement::Column::Operation.eq(MovementOperation::Inbound.as_ref()))
            .count(db)
            .await?;
        // Counted independently rather than derived from the total; a
        // movement committing between the two queries would otherwise skew
        // the difference.
        let total_outbound = StockMovement::find()
            .filter(stock_movement::Column::CreatedAt.gte(since))
            .filter(stock_movement::Column::Operation.eq(MovementOperation::Outbound.as_ref()))
            .count(db)
            .await?;

        #[derive(FromQueryResult)]
        struct QuantitySum {
            total: Option<i64>,
        }

        let quantity = StockMovement::find()
            .select_only()
            .column_as(stock_movement::Column::Quantity.sum(), "total")
            .filter(stock_movement::Column::CreatedAt.gte(since))
            .into_model::<QuantitySum>()
            .one(db)
            .await?
            .and_then(|row| row.total)
            .unwrap_or(0);

        #[derive(FromQueryResult)]
        struct StructureRow {
            structure: String,
            count: i64,
            total_quantity: Option<i64>,
        }

        let by_structure = StockMovement::find()
            .select_only()
            .column(stock_movement::Column::Structure)
            .column_as(stock_movement::Column::Id.count(), "count")
            .column_as(stock_movement::Column::Quantity.sum(), "total_quantity")
            .filter(stock_movement::Column::CreatedAt.gte(since))
            .group_by(stock_movement::Column::Structure)
            .into_model::<StructureRow>()
            .all(db)
            .await?
            .into_iter()
            .map(|row| StructureBreakdown {
                structure: row.structure,
                count: row.count,
                total_quantity: row.total_quantity.unwrap_or(0),
            })
            .collect();

        Ok(MovementSummary {
            period_days: days,
            total_movements,
            total_inbound,
            total_outbound,
            total_quantity_moved: quantity,
            by_structure,
        })
    }

    async fn fetch_pair(
        &self,
        db: &DbPool,
        request: &NewMovement,
    ) -> Result<(stock::Model, Option<stock::Model>), ServiceError> {
        let stock_one = Stock::find_by_id(request.stock_one_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Stock {} not found", request.stock_one_id))
            })?;

        let stock_two = match request.stock_two_id {
            Some(two_id) => Some(Stock::find_by_id(two_id).one(db).await?.ok_or_else(|| {
                ServiceError::NotFound(format!("Stock {} not found", two_id))
            })?),
            None => None,
        };

        Ok((stock_one, stock_two))
    }

    async fn publish_events(&self, applied: &RecordedMovement) {
        // Post-commit notifications are best-effort; the ledger row is
        // already durable.
        let event = Event::MovementRecorded {
            movement_id: applied.movement.id,
            operation: applied.movement.operation.clone(),
            structure: applied.movement.structure.clone(),
            quantity: applied.movement.quantity,
            stock_one_id: applied.movement.stock_one_id,
            stock_two_id: applied.movement.stock_two_id,
        };
        if let Err(err) = self.event_sender.send(event).await {
            warn!(error = %err, "failed to publish movement event");
        }

        for record in std::iter::once(&applied.stock_one).chain(applied.stock_two.as_ref()) {
            if record.quantity <= record.threshold {
                let event = Event::LowStockDetected {
                    stock_id: record.id,
                    quantity: record.quantity,
                    threshold: record.threshold,
                };
                if let Err(err) = self.event_sender.send(event).await {
                    warn!(error = %err, "failed to publish low-stock event");
                }
            }
        }
    }
}

/// Applies the movement inside an open transaction: lock, re-validate,
/// mutate, write the ledger row.
async fn apply_movement(
    txn: &DatabaseTransaction,
    request: NewMovement,
    acting_user: Uuid,
) -> Result<RecordedMovement, ServiceError> {
    let mut ids = vec![request.stock_one_id];
    if let Some(two_id) = request.stock_two_id {
        if two_id != request.stock_one_id {
            ids.push(two_id);
        }
    }
    ids.sort();

    // Row locks in ascending id order; SQLite has no FOR UPDATE and
    // serializes writers at the database level instead.
    let mut query = Stock::find()
        .filter(stock::Column::Id.is_in(ids.clone()))
        .order_by_asc(stock::Column::Id);
    if txn.get_database_backend() == DbBackend::Postgres {
        query = query.lock_exclusive();
    }
    let rows = query.all(txn).await?;

    let find = |id: Uuid| -> Result<stock::Model, ServiceError> {
        rows.iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Stock {} not found", id)))
    };

    let stock_one = find(request.stock_one_id)?;
    let stock_two = request.stock_two_id.map(find).transpose()?;

    ensure_active(&stock_one)?;
    if let Some(ref two) = stock_two {
        ensure_active(two)?;
    }
    validate_movement(&request, &stock_one, stock_two.as_ref())?;

    let (delta_one, delta_two) =
        quantity_deltas(request.structure, request.operation, request.quantity);

    let new_one = apply_delta(&stock_one, delta_one)?;
    let mut active_one: stock::ActiveModel = stock_one.into();
    active_one.quantity = Set(new_one);
    let stock_one = active_one.update(txn).await?;

    let stock_two = match stock_two {
        Some(two) => {
            let new_two = apply_delta(&two, delta_two)?;
            let mut active_two: stock::ActiveModel = two.into();
            active_two.quantity = Set(new_two);
            Some(active_two.update(txn).await?)
        }
        None => None,
    };

    let movement = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        operation: Set(request.operation.as_ref().to_string()),
        structure: Set(request.structure.as_ref().to_string()),
        quantity: Set(request.quantity),
        motive: Set(request.motive),
        description: Set(request.description),
        created_by: Set(acting_user),
        stock_one_id: Set(stock_one.id),
        stock_two_id: Set(stock_two.as_ref().map(|s| s.id)),
        created_at: Set(Utc::now()),
    }
    .insert(txn)
    .await?;

    Ok(RecordedMovement {
        movement,
        stock_one,
        stock_two,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn stock_with(id: u128, product: u128, quantity: i32) -> stock::Model {
        stock::Model {
            id: Uuid::from_u128(id),
            code: format!("STK-{}", id),
            product_id: Uuid::from_u128(product),
            warehouse_id: Uuid::from_u128(900 + id),
            quantity,
            unit_price: dec!(19.99),
            is_active: true,
            expires_at: None,
            threshold: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn movement(
        operation: MovementOperation,
        structure: MovementStructure,
        quantity: i32,
        stock_one: &stock::Model,
        stock_two: Option<&stock::Model>,
    ) -> NewMovement {
        NewMovement {
            operation,
            structure,
            quantity,
            motive: "test".to_string(),
            description: None,
            stock_one_id: stock_one.id,
            stock_two_id: stock_two.map(|s| s.id),
        }
    }

    #[test_case(0; "zero quantity")]
    #[test_case(-3; "negative quantity")]
    fn non_positive_quantity_is_rejected(quantity: i32) {
        let one = stock_with(1, 10, 50);
        let request = movement(
            MovementOperation::Inbound,
            MovementStructure::Simple,
            quantity,
            &one,
            None,
        );
        assert_matches!(
            validate_movement(&request, &one, None),
            Err(ServiceError::InvalidQuantity(q)) if q == quantity
        );
    }

    #[test]
    fn simple_movement_rejects_second_stock() {
        let one = stock_with(1, 10, 50);
        let two = stock_with(2, 10, 50);
        let request = movement(
            MovementOperation::Outbound,
            MovementStructure::Simple,
            5,
            &one,
            Some(&two),
        );
        assert_matches!(
            validate_movement(&request, &one, Some(&two)),
            Err(ServiceError::StructureMismatch(_))
        );
    }

    #[test]
    fn simple_outbound_requires_available_quantity() {
        let one = stock_with(1, 10, 10);
        let request = movement(
            MovementOperation::Outbound,
            MovementStructure::Simple,
            15,
            &one,
            None,
        );
        assert_matches!(
            validate_movement(&request, &one, None),
            Err(ServiceError::InsufficientStock {
                side: StockSide::StockOne,
                available: 10,
                requested: 15,
            })
        );
    }

    #[test]
    fn simple_inbound_accepts_any_positive_quantity() {
        let one = stock_with(1, 10, 0);
        let request = movement(
            MovementOperation::Inbound,
            MovementStructure::Simple,
            1000,
            &one,
            None,
        );
        assert!(validate_movement(&request, &one, None).is_ok());
    }

    #[test]
    fn paired_movement_requires_second_stock() {
        let one = stock_with(1, 10, 50);
        let request = movement(
            MovementOperation::Outbound,
            MovementStructure::Paired,
            5,
            &one,
            None,
        );
        assert_matches!(
            validate_movement(&request, &one, None),
            Err(ServiceError::StructureMismatch(_))
        );
    }

    #[test]
    fn paired_movement_rejects_same_stock_on_both_sides() {
        let one = stock_with(1, 10, 50);
        let request = movement(
            MovementOperation::Outbound,
            MovementStructure::Paired,
            5,
            &one,
            Some(&one),
        );
        assert_matches!(
            validate_movement(&request, &one, Some(&one)),
            Err(ServiceError::DuplicateStockReference)
        );
    }

    #[test]
    fn paired_movement_rejects_product_mismatch() {
        let one = stock_with(1, 10, 50);
        let two = stock_with(2, 11, 50);
        let request = movement(
            MovementOperation::Outbound,
            MovementStructure::Paired,
            5,
            &one,
            Some(&two),
        );
        assert_matches!(
            validate_movement(&request, &one, Some(&two)),
            Err(ServiceError::ProductMismatch)
        );
    }

    #[test]
    fn paired_inbound_checks_the_decremented_side() {
        // Inbound transfer drains stock_two; stock_one balance is irrelevant.
        let one = stock_with(1, 10, 0);
        let two = stock_with(2, 10, 3);
        let request = movement(
            MovementOperation::Inbound,
            MovementStructure::Paired,
            5,
            &one,
            Some(&two),
        );
        assert_matches!(
            validate_movement(&request, &one, Some(&two)),
            Err(ServiceError::InsufficientStock {
                side: StockSide::StockTwo,
                available: 3,
                requested: 5,
            })
        );
    }

    #[test]
    fn paired_outbound_with_cover_is_accepted() {
        let one = stock_with(1, 10, 10);
        let two = stock_with(2, 10, 3);
        let request = movement(
            MovementOperation::Outbound,
            MovementStructure::Paired,
            5,
            &one,
            Some(&two),
        );
        assert!(validate_movement(&request, &one, Some(&two)).is_ok());
    }

    #[test_case(MovementStructure::Simple, MovementOperation::Outbound, (-7, 0); "simple outbound")]
    #[test_case(MovementStructure::Simple, MovementOperation::Inbound, (7, 0); "simple inbound")]
    #[test_case(MovementStructure::Paired, MovementOperation::Outbound, (-7, 7); "paired outbound")]
    #[test_case(MovementStructure::Paired, MovementOperation::Inbound, (7, -7); "paired inbound")]
    fn delta_table(structure: MovementStructure, operation: MovementOperation, expected: (i32, i32)) {
        assert_eq!(quantity_deltas(structure, operation, 7), expected);
    }

    #[test]
    fn paired_deltas_conserve_quantity() {
        for operation in [MovementOperation::Outbound, MovementOperation::Inbound] {
            let (one, two) = quantity_deltas(MovementStructure::Paired, operation, 42);
            assert_eq!(one + two, 0);
        }
    }

    #[test]
    fn delta_application_refuses_overflow() {
        let full = stock_with(1, 10, i32::MAX);
        assert_matches!(
            apply_delta(&full, 1),
            Err(ServiceError::InvalidOperation(_))
        );
        assert_eq!(apply_delta(&full, -1).unwrap(), i32::MAX - 1);

        let empty = stock_with(2, 10, 0);
        assert_matches!(
            apply_delta(&empty, -1),
            Err(ServiceError::InvalidOperation(_))
        );
    }

    #[test]
    fn inactive_stock_is_rejected() {
        let mut one = stock_with(1, 10, 50);
        one.is_active = false;
        assert_matches!(ensure_active(&one), Err(ServiceError::InvalidOperation(_)));
    }
}
