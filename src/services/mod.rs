pub mod catalog;
pub mod movements;
pub mod stocks;
