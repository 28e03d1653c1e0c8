use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use uuid::Uuid;

use crate::{
    dto::orders::{OrderFilter, OrderItemOutput, OrderOutput, PaginatedOrders},
    error::{AppError, AppResult},
    models::Order,
    routes::params::Pagination,
    store::{OrderRepository, ProductRepository},
};

/// Read path: filtered listing and hydration of orders with their items and
/// a live view of each item's product.
pub struct OrderQuery<S> {
    store: Arc<S>,
}

impl<S> Clone for OrderQuery<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> OrderQuery<S>
where
    S: OrderRepository + ProductRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn get_order_by_id(&self, id: Uuid) -> AppResult<OrderOutput> {
        let order = self.store.find_by_id(id).await?;
        let order = match order {
            Some(o) => o,
            None => return Err(AppError::not_found("Order not found")),
        };

        let mut hydrated = self.hydrate(vec![order]).await?;
        hydrated
            .pop()
            .ok_or_else(|| AppError::not_found("Order not found"))
    }

    pub async fn get_orders(
        &self,
        filter: &OrderFilter,
        pagination: &Pagination,
    ) -> AppResult<PaginatedOrders> {
        let page = pagination.normalize();
        let (orders, total) = self.store.find_and_count(filter, &page).await?;
        let orders = self.hydrate(orders).await?;

        Ok(PaginatedOrders::new(orders, total, page.page, page.limit))
    }

    /// Attach items and product views to a batch of orders, keeping their order.
    pub async fn hydrate(&self, orders: Vec<Order>) -> AppResult<Vec<OrderOutput>> {
        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = self.store.find_items(&order_ids).await?;

        let product_ids: Vec<Uuid> = items
            .iter()
            .map(|item| item.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let products: HashMap<_, _> = self
            .store
            .find_many(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut by_order: HashMap<Uuid, Vec<OrderItemOutput>> = HashMap::new();
        for item in items {
            let product = products.get(&item.product_id).cloned();
            by_order
                .entry(item.order_id)
                .or_default()
                .push(OrderItemOutput::new(item, product));
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderOutput::new(order, items)
            })
            .collect())
    }
}
