use std::sync::Arc;

use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderInput, OrderFilter, OrderOutput, PaginatedOrders},
    error::{AppError, AppResult},
    models::{OrderStatus, PaymentMethod, PaymentStatus},
    routes::params::Pagination,
    services::{
        inventory_ledger::InventoryLedger, order_query::OrderQuery,
        order_validator::OrderValidator,
    },
    store::{
        NewOrder, NewOrderItem, OrderChanges, OrderRepository, ProductRepository, TxOf,
    },
    transitions::{ORDER_STATUS_TRANSITIONS, PAYMENT_STATUS_TRANSITIONS, is_transition_allowed},
};

const CREATE_ORDER: &str = "Error creating order";
const DELETE_ORDER: &str = "Error deleting order";
const FETCH_ORDER: &str = "Error fetching order";
const FETCH_ORDERS: &str = "Error fetching orders";

/// Order lifecycle engine.
///
/// Creation and deletion each run in a single transaction covering the order
/// row, every item row and every stock movement; any failure rolls all of it
/// back. Status changes lock the order row for their read-check-write.
pub struct OrderService<S> {
    store: Arc<S>,
    validator: OrderValidator,
    ledger: InventoryLedger<S>,
    query: OrderQuery<S>,
}

impl<S> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            validator: self.validator.clone(),
            ledger: self.ledger.clone(),
            query: self.query.clone(),
        }
    }
}

impl<S> OrderService<S>
where
    S: OrderRepository + ProductRepository,
{
    pub fn new(store: Arc<S>, validator: OrderValidator) -> Self {
        Self {
            ledger: InventoryLedger::new(Arc::clone(&store)),
            query: OrderQuery::new(Arc::clone(&store)),
            store,
            validator,
        }
    }

    pub async fn create_order(&self, input: CreateOrderInput) -> AppResult<OrderOutput> {
        let payment_method = self.validator.validate(&input)?;

        let mut tx = self.store.begin().await.map_err(|e| e.context(CREATE_ORDER))?;
        let order_id = match self.place_order(&mut tx, &input, payment_method).await {
            Ok(order_id) => order_id,
            Err(err) => {
                self.abort(tx, &err).await;
                return Err(err.context(CREATE_ORDER));
            }
        };
        self.store
            .commit(tx)
            .await
            .map_err(|e| e.context(CREATE_ORDER))?;

        tracing::info!(
            order_id = %order_id,
            user_id = %input.user_id,
            items = input.items.len(),
            "order created"
        );

        self.query.get_order_by_id(order_id).await
    }

    async fn place_order(
        &self,
        tx: &mut TxOf<S>,
        input: &CreateOrderInput,
        payment_method: PaymentMethod,
    ) -> AppResult<Uuid> {
        let order = self
            .store
            .create(
                tx,
                NewOrder {
                    user_id: input.user_id,
                    status: OrderStatus::Pending,
                    payment_status: PaymentStatus::Pending,
                    payment_method,
                    shipping_address: input.shipping_address.clone(),
                    notes: input.notes.clone(),
                    total: 0,
                },
            )
            .await?;

        let mut total: i64 = 0;
        for item in &input.items {
            let reservation = self.ledger.reserve(tx, item.product_id, item.quantity).await?;
            total = total
                .checked_add(reservation.line_total()?)
                .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;

            self.store
                .create_item(
                    tx,
                    NewOrderItem {
                        order_id: order.id,
                        product_id: reservation.product_id,
                        quantity: reservation.quantity,
                        price: reservation.unit_price,
                    },
                )
                .await?;
        }

        if total <= 0 {
            return Err(AppError::BadRequest(
                "Order total must be greater than zero".into(),
            ));
        }

        self.store
            .update(tx, order.id, OrderChanges::total(total))
            .await?;

        Ok(order.id)
    }

    pub async fn get_order_by_id(&self, id: Uuid) -> AppResult<OrderOutput> {
        self.query.get_order_by_id(id).await.map_err(|err| match err {
            AppError::NotFound(_) => err,
            other => other.context(FETCH_ORDER),
        })
    }

    pub async fn get_orders(
        &self,
        filter: OrderFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedOrders> {
        self.query
            .get_orders(&filter, &pagination)
            .await
            .map_err(|e| e.context(FETCH_ORDERS))
    }

    /// Move an order along the fulfillment graph. Cancelling does not
    /// restock; only deletion gives stock back.
    pub async fn update_order_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
    ) -> AppResult<OrderOutput> {
        let mut tx = self.store.begin().await?;
        let previous = match self.transition_status(&mut tx, id, new_status).await {
            Ok(previous) => previous,
            Err(err) => {
                self.abort(tx, &err).await;
                return Err(err);
            }
        };
        self.store.commit(tx).await?;

        tracing::info!(
            order_id = %id,
            from = %previous,
            to = %new_status,
            "order status updated"
        );

        self.get_order_by_id(id).await
    }

    async fn transition_status(
        &self,
        tx: &mut TxOf<S>,
        id: Uuid,
        new_status: OrderStatus,
    ) -> AppResult<OrderStatus> {
        let order = self.store.find_by_id_for_update(tx, id).await?;
        let order = match order {
            Some(o) => o,
            None => return Err(AppError::not_found("Order not found")),
        };

        if !is_transition_allowed(&ORDER_STATUS_TRANSITIONS, order.status, new_status) {
            return Err(AppError::validation(format!(
                "Invalid status transition from {} to {}",
                order.status, new_status
            )));
        }

        self.store
            .update(tx, id, OrderChanges::status(new_status))
            .await?;
        Ok(order.status)
    }

    /// Move an order along the payment graph, independent of its fulfillment state.
    pub async fn update_payment_status(
        &self,
        id: Uuid,
        new_status: PaymentStatus,
    ) -> AppResult<OrderOutput> {
        let mut tx = self.store.begin().await?;
        let previous = match self.transition_payment(&mut tx, id, new_status).await {
            Ok(previous) => previous,
            Err(err) => {
                self.abort(tx, &err).await;
                return Err(err);
            }
        };
        self.store.commit(tx).await?;

        tracing::info!(
            order_id = %id,
            from = %previous,
            to = %new_status,
            "payment status updated"
        );

        self.get_order_by_id(id).await
    }

    async fn transition_payment(
        &self,
        tx: &mut TxOf<S>,
        id: Uuid,
        new_status: PaymentStatus,
    ) -> AppResult<PaymentStatus> {
        let order = self.store.find_by_id_for_update(tx, id).await?;
        let order = match order {
            Some(o) => o,
            None => return Err(AppError::not_found("Order not found")),
        };

        if !is_transition_allowed(&PAYMENT_STATUS_TRANSITIONS, order.payment_status, new_status)
        {
            return Err(AppError::validation(format!(
                "Invalid payment status transition from {} to {}",
                order.payment_status, new_status
            )));
        }

        self.store
            .update(tx, id, OrderChanges::payment_status(new_status))
            .await?;
        Ok(order.payment_status)
    }

    /// Delete a pending or cancelled order and give its stock back.
    ///
    /// Returns `false` when the order does not exist.
    pub async fn delete_order(&self, id: Uuid) -> AppResult<bool> {
        let mut tx = self.store.begin().await.map_err(|e| e.context(DELETE_ORDER))?;
        let deleted = match self.remove_order(&mut tx, id).await {
            Ok(deleted) => deleted,
            Err(err) => {
                self.abort(tx, &err).await;
                return Err(err.context(DELETE_ORDER));
            }
        };
        self.store
            .commit(tx)
            .await
            .map_err(|e| e.context(DELETE_ORDER))?;

        if deleted {
            tracing::info!(order_id = %id, "order deleted and stock restored");
        }
        Ok(deleted)
    }

    async fn remove_order(&self, tx: &mut TxOf<S>, id: Uuid) -> AppResult<bool> {
        let order = match self.store.find_by_id_for_update(tx, id).await? {
            Some(o) => o,
            None => return Ok(false),
        };

        if !order.status.is_deletable() {
            return Err(AppError::BadRequest(
                "Only pending or cancelled orders can be deleted".into(),
            ));
        }

        let items = self.store.find_items_in(tx, id).await?;
        for item in &items {
            self.ledger.release(tx, item.product_id, item.quantity).await?;
        }

        self.store.destroy(tx, id).await?;
        Ok(true)
    }

    async fn abort(&self, tx: TxOf<S>, cause: &AppError) {
        tracing::warn!(error = %cause, "rolling back order transaction");
        if let Err(err) = self.store.rollback(tx).await {
            tracing::error!(error = ?err, "rollback failed");
        }
    }
}
