//! In-process backend with the same transactional contract as Postgres.
//!
//! `begin` takes the table lock and works on a private copy; `commit` swaps
//! the copy in, `rollback` (or dropping the handle) discards it. Holding the
//! lock for the whole transaction serializes writers, which stands in for the
//! row locks the database would take.

use std::{collections::HashMap, sync::Arc};
#[cfg(any(test, feature = "test-util"))]
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    dto::orders::OrderFilter,
    error::{AppError, AppResult},
    models::{Order, OrderItem, Product},
    routes::params::{OrderSortBy, PageRequest, SortOrder},
    store::{
        NewOrder, NewOrderItem, OrderChanges, OrderRepository, ProductRepository,
        TransactionProvider,
    },
};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
    items: Vec<OrderItem>,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    #[cfg(any(test, feature = "test-util"))]
    item_insert_budget: Arc<AtomicUsize>,
}

pub struct MemoryTx {
    committed: OwnedMutexGuard<Tables>,
    working: Tables,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            #[cfg(any(test, feature = "test-util"))]
            item_insert_budget: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    pub async fn put_product(&self, product: Product) {
        self.tables
            .lock()
            .await
            .products
            .insert(product.id, product);
    }

    pub async fn product(&self, id: Uuid) -> Option<Product> {
        self.tables.lock().await.products.get(&id).cloned()
    }

    pub async fn remove_product(&self, id: Uuid) -> Option<Product> {
        self.tables.lock().await.products.remove(&id)
    }

    pub async fn order_count(&self) -> usize {
        self.tables.lock().await.orders.len()
    }

    pub async fn item_count(&self) -> usize {
        self.tables.lock().await.items.len()
    }

    /// Let `n` more item inserts succeed, then fail every following one with
    /// a storage error.
    #[cfg(any(test, feature = "test-util"))]
    pub fn fail_item_inserts_after(&self, n: usize) {
        self.item_insert_budget.store(n, Ordering::SeqCst);
    }

    #[cfg(any(test, feature = "test-util"))]
    pub fn clear_faults(&self) {
        self.item_insert_budget.store(usize::MAX, Ordering::SeqCst);
    }

    #[cfg(any(test, feature = "test-util"))]
    fn take_item_insert(&self) -> AppResult<()> {
        let granted = self
            .item_insert_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok();
        if granted {
            Ok(())
        } else {
            Err(sea_orm::DbErr::Custom("injected order_items insert failure".into()).into())
        }
    }
}

#[async_trait]
impl TransactionProvider for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> AppResult<Self::Tx> {
        let committed = self.tables.clone().lock_owned().await;
        let working = committed.clone();
        Ok(MemoryTx { committed, working })
    }

    async fn commit(&self, tx: Self::Tx) -> AppResult<()> {
        let MemoryTx {
            mut committed,
            working,
        } = tx;
        *committed = working;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> AppResult<()> {
        drop(tx);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create(&self, tx: &mut Self::Tx, order: NewOrder) -> AppResult<Order> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            status: order.status,
            total: order.total,
            shipping_address: order.shipping_address,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            notes: order.notes,
            created_at: now,
            updated_at: now,
        };
        tx.working.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn create_item(&self, tx: &mut Self::Tx, item: NewOrderItem) -> AppResult<OrderItem> {
        #[cfg(any(test, feature = "test-util"))]
        self.take_item_insert()?;

        let duplicate = tx
            .working
            .items
            .iter()
            .any(|i| i.order_id == item.order_id && i.product_id == item.product_id);
        if duplicate {
            return Err(sea_orm::DbErr::Custom(format!(
                "duplicate key value violates order_items_order_product_key ({}, {})",
                item.order_id, item.product_id
            ))
            .into());
        }
        if !tx.working.orders.contains_key(&item.order_id) {
            return Err(sea_orm::DbErr::Custom(format!(
                "order_items.order_id references missing order {}",
                item.order_id
            ))
            .into());
        }

        let item = OrderItem {
            id: Uuid::new_v4(),
            order_id: item.order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            created_at: Utc::now(),
        };
        tx.working.items.push(item.clone());
        Ok(item)
    }

    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> AppResult<Option<Order>> {
        Ok(tx.working.orders.get(&id).cloned())
    }

    async fn find_items_in(&self, tx: &mut Self::Tx, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        Ok(items_of(&tx.working.items, &[order_id]))
    }

    async fn update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
        changes: OrderChanges,
    ) -> AppResult<Order> {
        let order = tx
            .working
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Order not found"))?;

        if let Some(status) = changes.status {
            order.status = status;
        }
        if let Some(payment_status) = changes.payment_status {
            order.payment_status = payment_status;
        }
        if let Some(total) = changes.total {
            order.total = total;
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn destroy(&self, tx: &mut Self::Tx, id: Uuid) -> AppResult<()> {
        tx.working.items.retain(|item| item.order_id != id);
        tx.working.orders.remove(&id);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn find_items(&self, order_ids: &[Uuid]) -> AppResult<Vec<OrderItem>> {
        Ok(items_of(&self.tables.lock().await.items, order_ids))
    }

    async fn find_and_count(
        &self,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<Order>, u64)> {
        let tables = self.tables.lock().await;
        let mut matched: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();
        drop(tables);

        matched.sort_by(|a, b| {
            let ordering = match page.sort_by {
                OrderSortBy::CreatedAt => a.created_at.cmp(&b.created_at),
                OrderSortBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                OrderSortBy::Total => a.total.cmp(&b.total),
                OrderSortBy::Status => a.status.as_str().cmp(b.status.as_str()),
                OrderSortBy::PaymentStatus => {
                    a.payment_status.as_str().cmp(b.payment_status.as_str())
                }
            };
            let ordering = match page.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });

        let total = matched.len() as u64;
        let orders = matched
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();
        Ok((orders, total))
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn find_for_update(&self, tx: &mut Self::Tx, id: Uuid) -> AppResult<Option<Product>> {
        Ok(tx.working.products.get(&id).cloned())
    }

    async fn adjust_stock(&self, tx: &mut Self::Tx, id: Uuid, delta: i32) -> AppResult<bool> {
        let Some(product) = tx.working.products.get_mut(&id) else {
            return Ok(false);
        };
        let Some(next) = product.stock.checked_add(delta).filter(|s| *s >= 0) else {
            return Ok(false);
        };
        product.stock = next;
        Ok(true)
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        let tables = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.products.get(id).cloned())
            .collect())
    }
}

fn items_of(items: &[OrderItem], order_ids: &[Uuid]) -> Vec<OrderItem> {
    items
        .iter()
        .filter(|item| order_ids.contains(&item.order_id))
        .cloned()
        .collect()
}
