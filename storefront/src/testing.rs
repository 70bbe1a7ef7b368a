//! In-memory [`ShopApi`] used by the client tests.

use async_trait::async_trait;
use chrono::Utc;
use shared::*;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::api::{ClientError, ShopApi};

#[derive(Default)]
pub struct FakeShop {
    products: RwLock<Vec<Product>>,
    orders: RwLock<Vec<Order>>,
    submitted: RwLock<Vec<CreateOrderRequest>>,
    fail_orders: RwLock<bool>,
    fail_deletes: RwLock<bool>,
}

fn server_error() -> ClientError {
    ClientError::Status {
        status: 500,
        message: "Internal server error".to_string(),
    }
}

impl FakeShop {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_products(products: Vec<Product>) -> Self {
        let shop = Self::new();
        *shop.products.write().await = products;
        shop
    }

    pub async fn set_fail_orders(&self, fail: bool) {
        *self.fail_orders.write().await = fail;
    }

    pub async fn set_fail_deletes(&self, fail: bool) {
        *self.fail_deletes.write().await = fail;
    }

    pub async fn submitted_orders(&self) -> Vec<CreateOrderRequest> {
        self.submitted.read().await.clone()
    }
}

#[async_trait]
impl ShopApi for FakeShop {
    async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        Ok(self.products.read().await.clone())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, ClientError> {
        Ok(self.products.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, request: &CreateProductRequest) -> Result<Product, ClientError> {
        let product = Product {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            description: request.description.clone(),
            price: request.price,
            image: request.image.clone(),
            stock: request.stock,
            created_at: Utc::now(),
        };
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), ClientError> {
        if *self.fail_deletes.read().await {
            return Err(server_error());
        }
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(ClientError::Status {
                status: 404,
                message: "Product not found".to_string(),
            });
        }
        Ok(())
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ClientError> {
        if *self.fail_orders.read().await {
            return Err(server_error());
        }
        self.submitted.write().await.push(request.clone());

        let products = self.products.read().await;
        let order = Order {
            id: Uuid::new_v4(),
            products: request
                .products
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    product: products.iter().find(|p| p.id == item.product_id).cloned(),
                })
                .collect(),
            total_amount: request.total_amount,
            created_at: Utc::now(),
        };
        self.orders.write().await.push(order.clone());
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ClientError> {
        Ok(self.orders.read().await.clone())
    }
}
