//! In-memory [`Store`] for exercising the router without Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::*;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::Store;

struct StoredOrder {
    id: Uuid,
    items: Vec<LineItem>,
    total_amount: f64,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<Vec<Product>>,
    orders: RwLock<Vec<StoredOrder>>,
    fail_next: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next store call fail as if the database were unreachable.
    pub async fn set_fail_next(&self, fail: bool) {
        *self.fail_next.write().await = fail;
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    async fn check_failure(&self) -> Result<(), StoreError> {
        let mut fail = self.fail_next.write().await;
        if *fail {
            *fail = false;
            return Err(StoreError::Database(diesel::result::Error::BrokenTransactionManager));
        }
        Ok(())
    }

    async fn resolve(&self, stored: &StoredOrder) -> Order {
        let products = self.products.read().await;
        Order {
            id: stored.id,
            products: stored
                .items
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    product: products.iter().find(|p| p.id == item.product_id).cloned(),
                })
                .collect(),
            total_amount: stored.total_amount,
            created_at: stored.created_at,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.check_failure().await?;
        Ok(self.products.read().await.clone())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        self.check_failure().await?;
        Ok(self.products.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, request: CreateProductRequest) -> Result<Product, StoreError> {
        self.check_failure().await?;
        let product = Product {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            description: request.description,
            price: request.price,
            image: request.image,
            stock: request.stock,
            created_at: Utc::now(),
        };
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_failure().await?;
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() < before)
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, StoreError> {
        self.check_failure().await?;
        if request.products.is_empty() {
            return Err(ValidationError::EmptyOrder.into());
        }
        let stored = StoredOrder {
            id: Uuid::new_v4(),
            items: request.products,
            total_amount: request.total_amount,
            created_at: Utc::now(),
        };
        let order = self.resolve(&stored).await;
        self.orders.write().await.push(stored);
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        self.check_failure().await?;
        let orders = self.orders.read().await;
        let mut resolved = Vec::with_capacity(orders.len());
        for stored in orders.iter() {
            resolved.push(self.resolve(stored).await);
        }
        Ok(resolved)
    }
}
