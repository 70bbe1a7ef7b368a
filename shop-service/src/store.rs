use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{pooled_connection::bb8::Pool, AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::*;
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::*;
use crate::schema::*;

pub type DbPool = Pool<AsyncPgConnection>;

/// Persistence for the two resources the API exposes.
///
/// No product update exists: placing an order never touches stock.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    async fn create_product(&self, request: CreateProductRequest) -> Result<Product, StoreError>;

    /// Returns `false` when no product had that id. Orders referencing the
    /// product are left alone.
    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Fails with [`ValidationError::EmptyOrder`] without writing anything
    /// when there are no line items.
    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, StoreError>;

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;
}

pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn assemble_orders(
        &self,
        conn: &mut AsyncPgConnection,
        db_orders: Vec<DbOrder>,
        db_items: Vec<DbOrderItem>,
    ) -> Result<Vec<Order>, StoreError> {
        let mut product_ids: Vec<Uuid> = db_items.iter().map(|item| item.product_id).collect();
        product_ids.sort();
        product_ids.dedup();

        let resolved: HashMap<Uuid, Product> = products::table
            .filter(products::id.eq_any(product_ids))
            .load::<DbProduct>(conn)
            .await?
            .into_iter()
            .map(|p| Product::try_from(p).map(|product| (product.id, product)))
            .collect::<Result<_, _>>()?;

        let mut items_by_order: HashMap<Uuid, Vec<DbOrderItem>> = HashMap::new();
        for item in db_items {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        db_orders
            .into_iter()
            .map(|db_order| {
                let mut items = items_by_order.remove(&db_order.id).unwrap_or_default();
                items.sort_by_key(|item| item.position);

                Ok(Order {
                    id: db_order.id,
                    products: items
                        .into_iter()
                        .map(|item| OrderLine {
                            product_id: item.product_id,
                            quantity: item.quantity,
                            product: resolved.get(&item.product_id).cloned(),
                        })
                        .collect(),
                    total_amount: from_numeric(&db_order.total_amount)?,
                    created_at: db_order.created_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut conn = self.pool.get().await?;

        products::table
            .order(products::created_at.asc())
            .load::<DbProduct>(&mut conn)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let mut conn = self.pool.get().await?;

        let db_product = products::table
            .find(id)
            .first::<DbProduct>(&mut conn)
            .await
            .optional()?;

        db_product.map(Product::try_from).transpose()
    }

    async fn create_product(&self, request: CreateProductRequest) -> Result<Product, StoreError> {
        let mut conn = self.pool.get().await?;
        let new_product = NewProduct::try_from(request)?;

        let db_product = diesel::insert_into(products::table)
            .values(&new_product)
            .get_result::<DbProduct>(&mut conn)
            .await?;

        info!("Product {} created", db_product.id);
        Product::try_from(db_product)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;

        let deleted = diesel::delete(products::table.find(id))
            .execute(&mut conn)
            .await?;

        if deleted > 0 {
            info!("Product {} deleted", id);
        }
        Ok(deleted > 0)
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, StoreError> {
        if request.products.is_empty() {
            return Err(ValidationError::EmptyOrder.into());
        }

        let mut conn = self.pool.get().await?;

        let new_order = NewOrder {
            id: Uuid::new_v4(),
            total_amount: to_numeric(request.total_amount)?,
        };
        let items = DbOrderItem::for_order(new_order.id, &request.products);

        let items_clone = items.clone();
        let db_order = conn
            .transaction::<_, StoreError, _>(|conn| {
                Box::pin(async move {
                    let db_order = diesel::insert_into(orders::table)
                        .values(&new_order)
                        .get_result::<DbOrder>(conn)
                        .await?;

                    diesel::insert_into(order_items::table)
                        .values(&items_clone)
                        .execute(conn)
                        .await?;

                    Ok(db_order)
                })
            })
            .await?;

        info!("Order {} created with {} line items", db_order.id, items.len());

        let mut created = self.assemble_orders(&mut conn, vec![db_order], items).await?;
        created.pop().ok_or(StoreError::Database(diesel::result::Error::NotFound))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.get().await?;

        let db_orders = orders::table
            .order(orders::created_at.asc())
            .load::<DbOrder>(&mut conn)
            .await?;

        let db_items = order_items::table
            .order((order_items::order_id.asc(), order_items::position.asc()))
            .load::<DbOrderItem>(&mut conn)
            .await?;

        self.assemble_orders(&mut conn, db_orders, db_items).await
    }
}
