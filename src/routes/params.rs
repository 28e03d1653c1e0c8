use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::orders::OrderFilter,
    models::{OrderStatus, PaymentStatus},
};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Largest offset Postgres accepts (`OFFSET` is a bigint).
pub const MAX_OFFSET: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    Total,
    Status,
    PaymentStatus,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: Option<OrderSortBy>,
    pub sort_order: Option<SortOrder>,
}

/// Pagination with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
    pub sort_by: OrderSortBy,
    pub sort_order: SortOrder,
}

impl Pagination {
    pub fn page(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn normalize(&self) -> PageRequest {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        PageRequest {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit).min(MAX_OFFSET),
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: Option<OrderSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn into_parts(self) -> (OrderFilter, Pagination) {
        let filter = OrderFilter {
            user_id: self.user_id,
            status: self.status,
            payment_status: self.payment_status,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        let pagination = Pagination {
            page: self.page,
            limit: self.limit,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        };
        (filter, pagination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten_newest_first() {
        let req = Pagination::default().normalize();
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 10);
        assert_eq!(req.offset, 0);
        assert_eq!(req.sort_by, OrderSortBy::CreatedAt);
        assert_eq!(req.sort_order, SortOrder::Desc);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let req = Pagination {
            page: Some(0),
            limit: Some(500),
            ..Pagination::default()
        }
        .normalize();
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_PAGE_SIZE);

        let req = Pagination::page(3, 10).normalize();
        assert_eq!(req.offset, 20);
    }

    #[test]
    fn huge_page_caps_offset() {
        let req = Pagination::page(u64::MAX, 10).normalize();
        assert_eq!(req.page, u64::MAX);
        assert_eq!(req.offset, MAX_OFFSET);

        let req = Pagination::page(u64::MAX, MAX_PAGE_SIZE).normalize();
        assert_eq!(req.offset, MAX_OFFSET);

        let req = Pagination::page(MAX_OFFSET / 10, 10).normalize();
        assert_eq!(req.offset, (MAX_OFFSET / 10 - 1) * 10);
    }
}
