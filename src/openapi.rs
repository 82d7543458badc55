use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockledger API",
        description = "Inventory and stock-ledger backend: stock records per product/warehouse and an immutable ledger of stock movements",
        version = env!("CARGO_PKG_VERSION")
    ),
    paths(
        crate::handlers::movements::create_movement,
        crate::handlers::movements::list_movements,
        crate::handlers::movements::movement_summary,
        crate::handlers::movements::get_movement,
        crate::handlers::stocks::create_stock,
        crate::handlers::stocks::list_stocks,
        crate::handlers::stocks::inventory_summary,
        crate::handlers::stocks::low_stock,
        crate::handlers::stocks::get_stock,
        crate::handlers::stocks::deactivate_stock,
        crate::handlers::stocks::stock_movements,
        crate::handlers::stores::create_store,
        crate::handlers::stores::list_stores,
        crate::handlers::stores::get_store,
        crate::handlers::stores::update_store,
        crate::handlers::stores::delete_store,
        crate::handlers::warehouses::create_warehouse,
        crate::handlers::warehouses::list_warehouses,
        crate::handlers::warehouses::get_warehouse,
        crate::handlers::warehouses::update_warehouse,
        crate::handlers::warehouses::delete_warehouse,
        crate::handlers::products::create_product,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::errors::StockSide,
        crate::entities::stock_movement::MovementOperation,
        crate::entities::stock_movement::MovementStructure,
        crate::handlers::movements::CreateMovementRequest,
        crate::handlers::stocks::CreateStockRequest,
        crate::handlers::stores::CreateStoreRequest,
        crate::handlers::stores::UpdateStoreRequest,
        crate::handlers::warehouses::CreateWarehouseRequest,
        crate::handlers::warehouses::UpdateWarehouseRequest,
        crate::handlers::products::CreateProductRequest,
    )),
    tags(
        (name = "movements", description = "Stock movement ledger"),
        (name = "stocks", description = "Stock records"),
        (name = "stores", description = "Stores"),
        (name = "warehouses", description = "Warehouses"),
        (name = "products", description = "Products")
    )
)]
pub struct ApiDoc;
