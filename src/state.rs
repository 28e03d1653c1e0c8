use std::sync::Arc;

use crate::{
    db::{DbPool, orm_from_pool},
    services::{OrderService, OrderValidator},
    store::SeaOrmStore,
};

pub type PgOrderService = OrderService<SeaOrmStore>;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orders: PgOrderService,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(pool: DbPool, validator: OrderValidator, jwt_secret: &str) -> Self {
        let store = Arc::new(SeaOrmStore::new(orm_from_pool(pool.clone())));
        Self {
            pool,
            orders: OrderService::new(store, validator),
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}
