pub mod inventory_ledger;
pub mod order_query;
pub mod order_service;
pub mod order_validator;

pub use inventory_ledger::{InventoryLedger, Reservation};
pub use order_query::OrderQuery;
pub use order_service::OrderService;
pub use order_validator::{OrderRules, OrderValidator};
