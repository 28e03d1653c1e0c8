use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::OrderFilter,
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, Product},
    routes::params::{OrderSortBy, PageRequest, SortOrder},
    store::{
        NewOrder, NewOrderItem, OrderChanges, OrderRepository, ProductRepository,
        TransactionProvider,
    },
};

/// Postgres backend built on sea-orm. Row locks use `SELECT ... FOR UPDATE`.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    conn: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl TransactionProvider for SeaOrmStore {
    type Tx = DatabaseTransaction;

    async fn begin(&self) -> AppResult<Self::Tx> {
        Ok(self.conn.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> AppResult<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> AppResult<()> {
        tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for SeaOrmStore {
    async fn create(&self, tx: &mut Self::Tx, order: NewOrder) -> AppResult<Order> {
        let model = OrderActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(order.user_id),
            status: Set(order.status.as_str().into()),
            total: Set(order.total),
            shipping_address: Set(order.shipping_address),
            payment_status: Set(order.payment_status.as_str().into()),
            payment_method: Set(order.payment_method.as_str().into()),
            notes: Set(order.notes),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&*tx)
        .await?;

        order_from_entity(model)
    }

    async fn create_item(&self, tx: &mut Self::Tx, item: NewOrderItem) -> AppResult<OrderItem> {
        let model = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(item.order_id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            price: Set(item.price),
            created_at: NotSet,
        }
        .insert(&*tx)
        .await?;

        Ok(order_item_from_entity(model))
    }

    async fn find_by_id_for_update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> AppResult<Option<Order>> {
        Orders::find_by_id(id)
            .lock(LockType::Update)
            .one(&*tx)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn find_items_in(&self, tx: &mut Self::Tx, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order_id))
            .order_by_asc(OrderItemCol::CreatedAt)
            .all(&*tx)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect();
        Ok(items)
    }

    async fn update(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
        changes: OrderChanges,
    ) -> AppResult<Order> {
        let existing = Orders::find_by_id(id).one(&*tx).await?;
        let existing = match existing {
            Some(o) => o,
            None => return Err(AppError::not_found("Order not found")),
        };

        let mut active: OrderActive = existing.into();
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().into());
        }
        if let Some(payment_status) = changes.payment_status {
            active.payment_status = Set(payment_status.as_str().into());
        }
        if let Some(total) = changes.total {
            active.total = Set(total);
        }
        active.updated_at = Set(Utc::now().into());

        let order = active.update(&*tx).await?;
        order_from_entity(order)
    }

    async fn destroy(&self, tx: &mut Self::Tx, id: Uuid) -> AppResult<()> {
        OrderItems::delete_many()
            .filter(OrderItemCol::OrderId.eq(id))
            .exec(&*tx)
            .await?;
        Orders::delete_by_id(id).exec(&*tx).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        Orders::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn find_items(&self, order_ids: &[Uuid]) -> AppResult<Vec<OrderItem>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(order_ids.iter().copied()))
            .order_by_asc(OrderItemCol::CreatedAt)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect();
        Ok(items)
    }

    async fn find_and_count(
        &self,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<Order>, u64)> {
        let mut condition = Condition::all();
        if let Some(user_id) = filter.user_id {
            condition = condition.add(OrderCol::UserId.eq(user_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(OrderCol::Status.eq(status.as_str()));
        }
        if let Some(payment_status) = filter.payment_status {
            condition = condition.add(OrderCol::PaymentStatus.eq(payment_status.as_str()));
        }
        if let Some(start) = filter.start_date {
            condition = condition.add(OrderCol::CreatedAt.gte(start));
        }
        if let Some(end) = filter.end_date {
            condition = condition.add(OrderCol::CreatedAt.lte(end));
        }

        let sort_col = match page.sort_by {
            OrderSortBy::CreatedAt => OrderCol::CreatedAt,
            OrderSortBy::UpdatedAt => OrderCol::UpdatedAt,
            OrderSortBy::Total => OrderCol::Total,
            OrderSortBy::Status => OrderCol::Status,
            OrderSortBy::PaymentStatus => OrderCol::PaymentStatus,
        };

        let mut finder = Orders::find().filter(condition);
        finder = match page.sort_order {
            SortOrder::Asc => finder.order_by_asc(sort_col),
            SortOrder::Desc => finder.order_by_desc(sort_col),
        };
        finder = finder.order_by_asc(OrderCol::Id);

        let total = finder.clone().count(&self.conn).await?;

        let orders = finder
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((orders, total))
    }
}

#[async_trait]
impl ProductRepository for SeaOrmStore {
    async fn find_for_update(&self, tx: &mut Self::Tx, id: Uuid) -> AppResult<Option<Product>> {
        let product = Products::find_by_id(id)
            .lock(LockType::Update)
            .one(&*tx)
            .await?
            .map(product_from_entity);
        Ok(product)
    }

    async fn adjust_stock(&self, tx: &mut Self::Tx, id: Uuid, delta: i32) -> AppResult<bool> {
        let mut update = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(delta))
            .filter(ProdCol::Id.eq(id));
        if delta < 0 {
            // compare-and-decrement: never drive stock below zero
            update = update.filter(ProdCol::Stock.gte(-delta));
        }

        let result = update.exec(&*tx).await?;
        Ok(result.rows_affected > 0)
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let products = Products::find()
            .filter(ProdCol::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect();
        Ok(products)
    }
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        status: model.status.parse::<OrderStatus>().map_err(anyhow::Error::from)?,
        total: model.total,
        shipping_address: model.shipping_address,
        payment_status: model
            .payment_status
            .parse::<PaymentStatus>()
            .map_err(anyhow::Error::from)?,
        payment_method: model
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(anyhow::Error::from)?,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        price: model.price,
        stock: model.stock,
        is_active: model.is_active,
    }
}
