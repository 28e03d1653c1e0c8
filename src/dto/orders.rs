use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, Product};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Everything needed to place an order. `payment_method` stays a raw label
/// until the validator accepts it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderInput {
    pub user_id: Uuid,
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemOutput {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Unit price frozen when the order was placed.
    pub price: i64,
    pub created_at: DateTime<Utc>,
    /// Live catalog view at query time; `None` once the product is gone.
    pub product: Option<Product>,
}

impl OrderItemOutput {
    pub fn new(item: OrderItem, product: Option<Product>) -> Self {
        Self {
            id: item.id,
            order_id: item.order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            created_at: item.created_at,
            product,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderOutput {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total: i64,
    pub shipping_address: String,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemOutput>,
}

impl OrderOutput {
    pub fn new(order: Order, items: Vec<OrderItemOutput>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total: order.total,
            shipping_address: order.shipping_address,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            notes: order.notes,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items,
        }
    }
}

/// Conjunctive filter; `None` fields are not applied.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OrderFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.is_none_or(|id| order.user_id == id)
            && self.status.is_none_or(|s| order.status == s)
            && self.payment_status.is_none_or(|s| order.payment_status == s)
            && self.start_date.is_none_or(|start| order.created_at >= start)
            && self.end_date.is_none_or(|end| order.created_at <= end)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedOrders {
    pub orders: Vec<OrderOutput>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl PaginatedOrders {
    pub fn new(orders: Vec<OrderOutput>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            orders,
            total,
            page,
            total_pages,
            has_more: page < total_pages,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
    pub items: Vec<OrderItemInput>,
}

impl CreateOrderRequest {
    pub fn into_input(self, user_id: Uuid) -> CreateOrderInput {
        CreateOrderInput {
            user_id,
            shipping_address: self.shipping_address,
            payment_method: self.payment_method,
            notes: self.notes,
            items: self.items,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_three_orders_at_ten_per_page_span_three_pages() {
        let pages: Vec<_> = (1..=3)
            .map(|page| PaginatedOrders::new(Vec::new(), 23, page, 10))
            .collect();

        assert!(pages.iter().all(|p| p.total_pages == 3));
        assert_eq!(
            pages.iter().map(|p| p.has_more).collect::<Vec<_>>(),
            vec![true, true, false]
        );
    }

    #[test]
    fn empty_result_has_no_pages() {
        let page = PaginatedOrders::new(Vec::new(), 0, 1, 10);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_more);
    }
}
