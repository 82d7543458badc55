pub mod product;
pub mod stock;
pub mod stock_movement;
pub mod store;
pub mod warehouse;
