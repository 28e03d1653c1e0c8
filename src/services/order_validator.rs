use std::collections::HashSet;

use crate::{
    dto::orders::{CreateOrderInput, OrderItemInput},
    error::{AppError, AppResult},
    models::PaymentMethod,
};

/// Business limits applied to every new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRules {
    pub max_items: usize,
    pub min_quantity: i32,
    pub max_quantity: i32,
    pub min_address_len: usize,
}

impl Default for OrderRules {
    fn default() -> Self {
        Self {
            max_items: 10,
            min_quantity: 1,
            max_quantity: 100,
            min_address_len: 10,
        }
    }
}

/// Stateless input checks that run before any I/O.
#[derive(Debug, Clone, Default)]
pub struct OrderValidator {
    rules: OrderRules,
}

impl OrderValidator {
    pub fn new(rules: OrderRules) -> Self {
        Self { rules }
    }

    /// Run every check in order; the first failure wins.
    pub fn validate(&self, input: &CreateOrderInput) -> AppResult<PaymentMethod> {
        self.validate_order_items(&input.items)?;
        self.validate_shipping_address(&input.shipping_address)?;
        self.validate_payment_method(&input.payment_method)
    }

    pub fn validate_order_items(&self, items: &[OrderItemInput]) -> AppResult<()> {
        if items.is_empty() {
            return Err(AppError::validation("Order must contain at least one item"));
        }

        if items.len() > self.rules.max_items {
            return Err(AppError::validation(format!(
                "Order cannot contain more than {} items",
                self.rules.max_items
            )));
        }

        let mut seen = HashSet::with_capacity(items.len());
        if !items.iter().all(|item| seen.insert(item.product_id)) {
            return Err(AppError::validation("Duplicate products are not allowed"));
        }

        let quantity_range = self.rules.min_quantity..=self.rules.max_quantity;
        if items
            .iter()
            .any(|item| !quantity_range.contains(&item.quantity))
        {
            return Err(AppError::validation(format!(
                "Quantity must be between {} and {}",
                self.rules.min_quantity, self.rules.max_quantity
            )));
        }

        Ok(())
    }

    pub fn validate_shipping_address(&self, address: &str) -> AppResult<()> {
        if address.trim().is_empty() {
            return Err(AppError::validation("Shipping address cannot be empty"));
        }
        if address.chars().count() < self.rules.min_address_len {
            return Err(AppError::validation(format!(
                "Shipping address must be at least {} characters long",
                self.rules.min_address_len
            )));
        }
        Ok(())
    }

    pub fn validate_payment_method(&self, method: &str) -> AppResult<PaymentMethod> {
        method
            .parse()
            .map_err(|_| AppError::validation("Invalid payment method"))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn item(quantity: i32) -> OrderItemInput {
        OrderItemInput {
            product_id: Uuid::new_v4(),
            quantity,
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_and_oversized_item_lists() {
        let validator = OrderValidator::default();

        let err = validator.validate_order_items(&[]).unwrap_err();
        assert_eq!(message(err), "Order must contain at least one item");

        let items: Vec<_> = (0..11).map(|_| item(1)).collect();
        let err = validator.validate_order_items(&items).unwrap_err();
        assert_eq!(message(err), "Order cannot contain more than 10 items");

        let items: Vec<_> = (0..10).map(|_| item(1)).collect();
        assert!(validator.validate_order_items(&items).is_ok());
    }

    #[test]
    fn rejects_duplicate_products_regardless_of_quantity() {
        let validator = OrderValidator::default();
        let first = item(1);
        let second = OrderItemInput {
            product_id: first.product_id,
            quantity: 7,
        };

        let err = validator.validate_order_items(&[first, second]).unwrap_err();
        assert_eq!(message(err), "Duplicate products are not allowed");
    }

    #[test]
    fn quantity_bounds_are_inclusive() {
        let validator = OrderValidator::default();
        assert!(validator.validate_order_items(&[item(1), item(100)]).is_ok());

        for bad in [0, -3, 101] {
            let err = validator.validate_order_items(&[item(bad)]).unwrap_err();
            assert_eq!(message(err), "Quantity must be between 1 and 100");
        }
    }

    #[test]
    fn shipping_address_needs_ten_characters() {
        let validator = OrderValidator::default();

        let err = validator.validate_shipping_address("   ").unwrap_err();
        assert_eq!(message(err), "Shipping address cannot be empty");

        let err = validator.validate_shipping_address("1 Main St").unwrap_err();
        assert_eq!(
            message(err),
            "Shipping address must be at least 10 characters long"
        );

        assert!(validator.validate_shipping_address("12 Main St").is_ok());
    }

    #[test]
    fn payment_method_must_be_known() {
        let validator = OrderValidator::default();
        assert_eq!(
            validator.validate_payment_method("paypal").unwrap(),
            PaymentMethod::Paypal
        );

        let err = validator.validate_payment_method("cash").unwrap_err();
        assert_eq!(message(err), "Invalid payment method");
    }

    #[test]
    fn custom_rules_are_honoured() {
        let validator = OrderValidator::new(OrderRules {
            max_items: 2,
            ..OrderRules::default()
        });
        let err = validator
            .validate_order_items(&[item(1), item(1), item(1)])
            .unwrap_err();
        assert_eq!(message(err), "Order cannot contain more than 2 items");
    }
}
