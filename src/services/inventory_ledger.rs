use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    store::ProductRepository,
};

/// Stock taken for one order line, with the unit price seen at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

impl Reservation {
    pub fn line_total(&self) -> AppResult<i64> {
        self.unit_price
            .checked_mul(i64::from(self.quantity))
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Line total overflows for product {}",
                    self.product_id
                ))
            })
    }
}

/// Reads and moves catalog stock inside the caller's transaction.
pub struct InventoryLedger<P> {
    products: Arc<P>,
}

impl<P> Clone for InventoryLedger<P> {
    fn clone(&self) -> Self {
        Self {
            products: Arc::clone(&self.products),
        }
    }
}

impl<P: ProductRepository> InventoryLedger<P> {
    pub fn new(products: Arc<P>) -> Self {
        Self { products }
    }

    pub async fn reserve(
        &self,
        tx: &mut P::Tx,
        product_id: Uuid,
        quantity: i32,
    ) -> AppResult<Reservation> {
        let product = self.products.find_for_update(tx, product_id).await?;
        let product = match product {
            Some(p) => p,
            None => return Err(AppError::not_found(format!("Product {product_id} not found"))),
        };

        if !product.is_active {
            return Err(AppError::BadRequest(format!(
                "Product {} is not available for purchase",
                product.name
            )));
        }

        if product.stock < quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {}",
                product.name
            )));
        }

        // the guarded decrement refuses if a concurrent writer got there first
        if !self.products.adjust_stock(tx, product_id, -quantity).await? {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {}",
                product.name
            )));
        }

        tracing::debug!(
            product_id = %product_id,
            quantity,
            remaining = product.stock - quantity,
            "stock reserved"
        );

        Ok(Reservation {
            product_id,
            quantity,
            unit_price: product.price,
        })
    }

    /// Put stock back. A product that no longer exists is skipped.
    pub async fn release(&self, tx: &mut P::Tx, product_id: Uuid, quantity: i32) -> AppResult<()> {
        if self.products.adjust_stock(tx, product_id, quantity).await? {
            tracing::debug!(product_id = %product_id, quantity, "stock released");
        } else {
            tracing::warn!(
                product_id = %product_id,
                quantity,
                "product missing from catalog, stock not restored"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Product, store::MemoryStore, store::TransactionProvider};

    async fn store_with(stock: i32, is_active: bool) -> (Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::new_v4();
        store
            .put_product(Product {
                id,
                name: "Ferris Mug".into(),
                price: 1_200,
                stock,
                is_active,
            })
            .await;
        (store, id)
    }

    #[tokio::test]
    async fn reserve_decrements_and_snapshots_price() -> anyhow::Result<()> {
        let (store, id) = store_with(10, true).await;
        let ledger = InventoryLedger::new(store.clone());

        let mut tx = store.begin().await?;
        let reservation = ledger.reserve(&mut tx, id, 3).await?;
        store.commit(tx).await?;

        assert_eq!(reservation.unit_price, 1_200);
        assert_eq!(reservation.line_total()?, 3_600);
        assert_eq!(store.product(id).await.map(|p| p.stock), Some(7));
        Ok(())
    }

    #[tokio::test]
    async fn reserve_refuses_inactive_and_short_stock() -> anyhow::Result<()> {
        let (store, id) = store_with(1, true).await;
        let ledger = InventoryLedger::new(store.clone());
        let mut tx = store.begin().await?;
        let err = ledger.reserve(&mut tx, id, 2).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock for product Ferris Mug");
        store.rollback(tx).await?;

        let (store, id) = store_with(5, false).await;
        let ledger = InventoryLedger::new(store.clone());
        let mut tx = store.begin().await?;
        let err = ledger.reserve(&mut tx, id, 1).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Product Ferris Mug is not available for purchase"
        );
        store.rollback(tx).await?;
        assert_eq!(store.product(id).await.map(|p| p.stock), Some(5));
        Ok(())
    }

    #[tokio::test]
    async fn reserve_unknown_product_is_not_found() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        let ledger = InventoryLedger::new(store.clone());
        let mut tx = store.begin().await?;
        let err = ledger.reserve(&mut tx, Uuid::new_v4(), 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn release_skips_missing_products() -> anyhow::Result<()> {
        let (store, id) = store_with(2, true).await;
        let ledger = InventoryLedger::new(store.clone());

        let mut tx = store.begin().await?;
        ledger.release(&mut tx, id, 3).await?;
        ledger.release(&mut tx, Uuid::new_v4(), 3).await?;
        store.commit(tx).await?;

        assert_eq!(store.product(id).await.map(|p| p.stock), Some(5));
        Ok(())
    }
}
