//! Persistence seam of the order core.
//!
//! Every mutating call takes the caller's transaction handle explicitly, so
//! the unit of atomicity is visible in each signature. Reads that happen
//! outside a transaction (hydration, listing) go straight to the backend.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    dto::orders::OrderFilter,
    error::AppResult,
    models::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, Product},
    routes::params::PageRequest,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::SeaOrmStore;

#[async_trait]
pub trait TransactionProvider: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> AppResult<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> AppResult<()>;

    async fn rollback(&self, tx: Self::Tx) -> AppResult<()>;
}

/// Transaction handle of a backend.
pub type TxOf<S> = <S as TransactionProvider>::Tx;

/// Order shell as first inserted, before items are priced.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub notes: Option<String>,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub total: Option<i64>,
}

impl OrderChanges {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn payment_status(status: PaymentStatus) -> Self {
        Self {
            payment_status: Some(status),
            ..Self::default()
        }
    }

    pub fn total(total: i64) -> Self {
        Self {
            total: Some(total),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait OrderRepository: TransactionProvider {
    async fn create(&self, tx: &mut Self::Tx, order: NewOrder) -> AppResult<Order>;

    async fn create_item(&self, tx: &mut Self::Tx, item: NewOrderItem) -> AppResult<OrderItem>;

    /// Load an order and hold its row lock until the transaction ends.
    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> AppResult<Option<Order>>;

    async fn find_items_in(&self, tx: &mut Self::Tx, order_id: Uuid) -> AppResult<Vec<OrderItem>>;

    async fn update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
        changes: OrderChanges,
    ) -> AppResult<Order>;

    /// Remove an order together with its items.
    async fn destroy(&self, tx: &mut Self::Tx, id: Uuid) -> AppResult<()>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>>;

    async fn find_items(&self, order_ids: &[Uuid]) -> AppResult<Vec<OrderItem>>;

    async fn find_and_count(
        &self,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<Order>, u64)>;
}

#[async_trait]
pub trait ProductRepository: TransactionProvider {
    /// Load a product and hold its row lock until the transaction ends.
    async fn find_for_update(&self, tx: &mut Self::Tx, id: Uuid) -> AppResult<Option<Product>>;

    /// Apply a signed stock delta. A negative delta only applies while the
    /// stock covers it. Returns `false` when no row was changed.
    async fn adjust_stock(&self, tx: &mut Self::Tx, id: Uuid, delta: i32) -> AppResult<bool>;

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Product>>;
}
