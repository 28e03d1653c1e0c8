use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::orders::{
        CreateOrderRequest, OrderItemInput, OrderItemOutput, OrderOutput, PaginatedOrders,
        UpdateOrderStatusRequest, UpdatePaymentStatusRequest,
    },
    models::{OrderStatus, PaymentMethod, PaymentStatus, Product},
    response::{ApiResponse, Meta},
    routes::{health, orders},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        orders::create_order,
        orders::list_orders,
        orders::list_my_orders,
        orders::get_order,
        orders::update_order_status,
        orders::update_payment_status,
        orders::delete_order
    ),
    components(
        schemas(
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            Product,
            OrderItemInput,
            OrderItemOutput,
            OrderOutput,
            PaginatedOrders,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest,
            Meta,
            ApiResponse<OrderOutput>,
            ApiResponse<PaginatedOrders>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Orders", description = "Order lifecycle endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_order_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/orders",
            "/api/orders/my-orders",
            "/api/orders/{id}",
            "/api/orders/{id}/status",
            "/api/orders/{id}/payment",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
