use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    audit::audit_order,
    dto::orders::{
        CreateOrderRequest, OrderFilter, OrderOutput, PaginatedOrders, UpdateOrderStatusRequest,
        UpdatePaymentStatusRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_STAFF, ensure_admin, ensure_role},
    models::{OrderStatus, PaymentStatus},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/my-orders", get(list_my_orders))
        .route("/{id}", get(get_order).delete(delete_order))
        .route("/{id}/status", patch(update_order_status))
        .route("/{id}/payment", patch(update_payment_status))
}

fn page_meta(page: &PaginatedOrders, limit: u64) -> Meta {
    Meta::new(page.page, limit, page.total)
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed and stock reserved", body = ApiResponse<OrderOutput>),
        (status = 400, description = "Validation or stock failure"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderOutput>>)> {
    let order = state
        .orders
        .create_order(payload.into_input(user.user_id))
        .await?;

    audit_order(
        &state.pool,
        user.user_id,
        "order_create",
        order.id,
        serde_json::json!({ "total": order.total }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Order created",
            order,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("user_id" = Option<Uuid>, Query, description = "Filter by owner"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("payment_status" = Option<String>, Query, description = "Filter by payment status"),
        ("start_date" = Option<String>, Query, description = "Created at or after (RFC 3339)"),
        ("end_date" = Option<String>, Query, description = "Created at or before (RFC 3339)"),
        ("page" = Option<u64>, Query, description = "Page number, default 1"),
        ("limit" = Option<u64>, Query, description = "Items per page, default 10"),
        ("sort_by" = Option<String>, Query, description = "created_at, updated_at, total, status, payment_status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Orders (admin/staff)", body = ApiResponse<PaginatedOrders>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedOrders>>> {
    ensure_role(&user, &[ROLE_ADMIN, ROLE_STAFF])?;
    let (filter, pagination) = query.into_parts();
    let limit = pagination.normalize().limit;

    let page = state.orders.get_orders(filter, pagination).await?;
    let meta = page_meta(&page, limit);
    Ok(Json(ApiResponse::success("Orders", page, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/orders/my-orders",
    params(
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("payment_status" = Option<String>, Query, description = "Filter by payment status"),
        ("page" = Option<u64>, Query, description = "Page number, default 1"),
        ("limit" = Option<u64>, Query, description = "Items per page, default 10")
    ),
    responses(
        (status = 200, description = "Orders of the caller", body = ApiResponse<PaginatedOrders>),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedOrders>>> {
    let (filter, pagination) = query.into_parts();
    let filter = OrderFilter {
        user_id: Some(user.user_id),
        ..filter
    };
    let limit = pagination.normalize().limit;

    let page = state.orders.get_orders(filter, pagination).await?;
    let meta = page_meta(&page, limit);
    Ok(Json(ApiResponse::success("Orders", page, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderOutput>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderOutput>>> {
    let order = state.orders.get_order_by_id(id).await?;
    if !user.is_back_office() && order.user_id != user.user_id {
        return Err(AppError::not_found("Order not found"));
    }

    Ok(Json(ApiResponse::success(
        "OK",
        order,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<OrderOutput>),
        (status = 400, description = "Invalid status or transition"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderOutput>>> {
    ensure_role(&user, &[ROLE_ADMIN, ROLE_STAFF])?;
    let status: OrderStatus = payload
        .status
        .parse()
        .map_err(|_| AppError::validation("Invalid order status"))?;

    let order = state.orders.update_order_status(id, status).await?;

    audit_order(
        &state.pool,
        user.user_id,
        "order_status_update",
        order.id,
        serde_json::json!({ "status": order.status }),
    )
    .await;

    Ok(Json(ApiResponse::success(
        "Order updated",
        order,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/payment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status updated", body = ApiResponse<OrderOutput>),
        (status = 400, description = "Invalid payment status or transition"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderOutput>>> {
    ensure_role(&user, &[ROLE_ADMIN, ROLE_STAFF])?;
    let status: PaymentStatus = payload
        .payment_status
        .parse()
        .map_err(|_| AppError::validation("Invalid payment status"))?;

    let order = state.orders.update_payment_status(id, status).await?;

    audit_order(
        &state.pool,
        user.user_id,
        "order_payment_update",
        order.id,
        serde_json::json!({ "payment_status": order.payment_status }),
    )
    .await;

    Ok(Json(ApiResponse::success(
        "Payment status updated",
        order,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order deleted, stock restored"),
        (status = 400, description = "Order is past pending/cancelled"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ensure_admin(&user)?;
    if !state.orders.delete_order(id).await? {
        return Err(AppError::not_found("Order not found"));
    }

    audit_order(
        &state.pool,
        user.user_id,
        "order_delete",
        id,
        serde_json::Value::Null,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
