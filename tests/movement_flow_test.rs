mod common;

use assert_matches::assert_matches;
use stockledger_api::{
    entities::stock_movement::{MovementOperation, MovementStructure},
    errors::{ServiceError, StockSide},
    services::movements::{MovementFilter, NewMovement},
};

fn movement(
    operation: MovementOperation,
    structure: MovementStructure,
    quantity: i32,
    stock_one_id: uuid::Uuid,
    stock_two_id: Option<uuid::Uuid>,
) -> NewMovement {
    NewMovement {
        operation,
        structure,
        quantity,
        motive: "integration test".to_string(),
        description: None,
        stock_one_id,
        stock_two_id,
    }
}

#[tokio::test]
async fn simple_movements_adjust_quantity_and_write_ledger_rows() {
    let ctx = common::setup().await;
    let fx = common::seed_catalog(&ctx).await;
    let stock = common::insert_stock(&ctx, "STK-1", fx.product_id, fx.warehouse_one_id, 10).await;

    let inbound = ctx
        .movements
        .submit(
            movement(
                MovementOperation::Inbound,
                MovementStructure::Simple,
                7,
                stock.id,
                None,
            ),
            fx.user_id,
        )
        .await
        .expect("inbound");
    assert_eq!(inbound.stock_one.quantity, 17);
    assert!(inbound.stock_two.is_none());

    let outbound = ctx
        .movements
        .submit(
            movement(
                MovementOperation::Outbound,
                MovementStructure::Simple,
                4,
                stock.id,
                None,
            ),
            fx.user_id,
        )
        .await
        .expect("outbound");
    assert_eq!(outbound.stock_one.quantity, 13);

    assert_eq!(common::reload_stock(&ctx, stock.id).await.quantity, 13);

    let (entries, total) = ctx
        .movements
        .list(
            MovementFilter {
                stock_id: Some(stock.id),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .expect("list");
    assert_eq!(total, 2);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].created_by, fx.user_id);
}

#[tokio::test]
async fn paired_transfer_conserves_total_quantity() {
    let ctx = common::setup().await;
    let fx = common::seed_catalog(&ctx).await;
    let one = common::insert_stock(&ctx, "STK-A", fx.product_id, fx.warehouse_one_id, 10).await;
    let two = common::insert_stock(&ctx, "STK-B", fx.product_id, fx.warehouse_two_id, 3).await;

    let recorded = ctx
        .movements
        .submit(
            movement(
                MovementOperation::Outbound,
                MovementStructure::Paired,
                5,
                one.id,
                Some(two.id),
            ),
            fx.user_id,
        )
        .await
        .expect("paired outbound");

    assert_eq!(recorded.stock_one.quantity, 5);
    assert_eq!(recorded.stock_two.as_ref().map(|s| s.quantity), Some(8));
    assert_eq!(
        recorded.stock_one.quantity + recorded.stock_two.unwrap().quantity,
        13
    );

    // Inbound transfers drain the other side.
    let back = ctx
        .movements
        .submit(
            movement(
                MovementOperation::Inbound,
                MovementStructure::Paired,
                3,
                one.id,
                Some(two.id),
            ),
            fx.user_id,
        )
        .await
        .expect("paired inbound");
    assert_eq!(back.stock_one.quantity, 8);
    assert_eq!(back.stock_two.map(|s| s.quantity), Some(5));
}

#[tokio::test]
async fn insufficient_stock_leaves_no_trace() {
    let ctx = common::setup().await;
    let fx = common::seed_catalog(&ctx).await;
    let stock = common::insert_stock(&ctx, "STK-1", fx.product_id, fx.warehouse_one_id, 10).await;

    let err = ctx
        .movements
        .submit(
            movement(
                MovementOperation::Outbound,
                MovementStructure::Simple,
                15,
                stock.id,
                None,
            ),
            fx.user_id,
        )
        .await
        .expect_err("should be rejected");
    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            side: StockSide::StockOne,
            available: 10,
            requested: 15,
        }
    );

    // Quantity untouched and nothing in the ledger.
    assert_eq!(common::reload_stock(&ctx, stock.id).await.quantity, 10);
    let (_, total) = ctx
        .movements
        .list(MovementFilter::default(), 1, 20)
        .await
        .expect("list");
    assert_eq!(total, 0);
}

#[tokio::test]
async fn paired_movement_rejects_duplicate_and_mismatched_references() {
    let ctx = common::setup().await;
    let fx = common::seed_catalog(&ctx).await;
    let one = common::insert_stock(&ctx, "STK-A", fx.product_id, fx.warehouse_one_id, 10).await;
    let other =
        common::insert_stock(&ctx, "STK-X", fx.other_product_id, fx.warehouse_two_id, 10).await;

    let err = ctx
        .movements
        .submit(
            movement(
                MovementOperation::Outbound,
                MovementStructure::Paired,
                2,
                one.id,
                Some(one.id),
            ),
            fx.user_id,
        )
        .await
        .expect_err("same stock twice");
    assert_matches!(err, ServiceError::DuplicateStockReference);

    let err = ctx
        .movements
        .submit(
            movement(
                MovementOperation::Outbound,
                MovementStructure::Paired,
                2,
                one.id,
                Some(other.id),
            ),
            fx.user_id,
        )
        .await
        .expect_err("different products");
    assert_matches!(err, ServiceError::ProductMismatch);
}

#[tokio::test]
async fn resubmitting_a_movement_applies_it_twice() {
    let ctx = common::setup().await;
    let fx = common::seed_catalog(&ctx).await;
    let stock = common::insert_stock(&ctx, "STK-1", fx.product_id, fx.warehouse_one_id, 20).await;

    let request = movement(
        MovementOperation::Outbound,
        MovementStructure::Simple,
        4,
        stock.id,
        None,
    );

    ctx.movements
        .submit(request.clone(), fx.user_id)
        .await
        .expect("first submission");
    ctx.movements
        .submit(request, fx.user_id)
        .await
        .expect("second submission");

    assert_eq!(common::reload_stock(&ctx, stock.id).await.quantity, 12);
    let (_, total) = ctx
        .movements
        .list(MovementFilter::default(), 1, 20)
        .await
        .expect("list");
    assert_eq!(total, 2);
}

#[tokio::test]
async fn inbound_into_a_full_stock_is_rejected() {
    let ctx = common::setup().await;
    let fx = common::seed_catalog(&ctx).await;
    let stock =
        common::insert_stock(&ctx, "STK-1", fx.product_id, fx.warehouse_one_id, i32::MAX).await;

    let err = ctx
        .movements
        .submit(
            movement(
                MovementOperation::Inbound,
                MovementStructure::Simple,
                1,
                stock.id,
                None,
            ),
            fx.user_id,
        )
        .await
        .expect_err("balance cannot exceed i32::MAX");
    assert_matches!(err, ServiceError::InvalidOperation(_));

    assert_eq!(common::reload_stock(&ctx, stock.id).await.quantity, i32::MAX);
    let (_, total) = ctx
        .movements
        .list(MovementFilter::default(), 1, 20)
        .await
        .expect("list");
    assert_eq!(total, 0);
}

#[tokio::test]
async fn inactive_stock_cannot_move() {
    let ctx = common::setup().await;
    let fx = common::seed_catalog(&ctx).await;
    let stock = common::insert_stock(&ctx, "STK-1", fx.product_id, fx.warehouse_one_id, 10).await;

    ctx.stocks.deactivate(stock.id).await.expect("deactivate");

    let err = ctx
        .movements
        .submit(
            movement(
                MovementOperation::Inbound,
                MovementStructure::Simple,
                5,
                stock.id,
                None,
            ),
            fx.user_id,
        )
        .await
        .expect_err("inactive stock");
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn movement_lookup_returns_current_stock_state() {
    let ctx = common::setup().await;
    let fx = common::seed_catalog(&ctx).await;
    let stock = common::insert_stock(&ctx, "STK-1", fx.product_id, fx.warehouse_one_id, 10).await;

    let recorded = ctx
        .movements
        .submit(
            movement(
                MovementOperation::Outbound,
                MovementStructure::Simple,
                2,
                stock.id,
                None,
            ),
            fx.user_id,
        )
        .await
        .expect("submit");

    let fetched = ctx.movements.get(recorded.movement.id).await.expect("get");
    assert_eq!(fetched.movement.id, recorded.movement.id);
    assert_eq!(fetched.movement.motive, "integration test");
    assert_eq!(fetched.stock_one.quantity, 8);

    let missing = ctx.movements.get(uuid::Uuid::new_v4()).await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn summary_reflects_recorded_movements() {
    let ctx = common::setup().await;
    let fx = common::seed_catalog(&ctx).await;
    let one = common::insert_stock(&ctx, "STK-A", fx.product_id, fx.warehouse_one_id, 50).await;
    let two = common::insert_stock(&ctx, "STK-B", fx.product_id, fx.warehouse_two_id, 50).await;

    for _ in 0..2 {
        ctx.movements
            .submit(
                movement(
                    MovementOperation::Inbound,
                    MovementStructure::Simple,
                    10,
                    one.id,
                    None,
                ),
                fx.user_id,
            )
            .await
            .expect("inbound");
    }
    ctx.movements
        .submit(
            movement(
                MovementOperation::Outbound,
                MovementStructure::Paired,
                5,
                one.id,
                Some(two.id),
            ),
            fx.user_id,
        )
        .await
        .expect("transfer");

    let summary = ctx.movements.summary(30).await.expect("summary");
    assert_eq!(summary.total_movements, 3);
    assert_eq!(summary.total_inbound, 2);
    assert_eq!(summary.total_outbound, 1);
    assert_eq!(summary.total_quantity_moved, 25);

    let paired = summary
        .by_structure
        .iter()
        .find(|b| b.structure == "paired")
        .expect("paired bucket");
    assert_eq!(paired.count, 1);
    assert_eq!(paired.total_quantity, 5);
}
