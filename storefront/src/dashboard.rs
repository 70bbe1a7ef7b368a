//! Admin views. Everything here is derived from the full product and order
//! lists on each render; nothing is cached between renders.

use chrono::{DateTime, Utc};
use futures::try_join;
use shared::{CreateProductRequest, Order, OrderLine, Product};
use tracing::{error, info};
use uuid::Uuid;

use crate::api::{ClientError, ShopApi};

pub const RECENT_ORDER_WINDOW: usize = 7;

pub const REMOVED_PRODUCT: &str = "Removed product";

pub fn line_label(line: &OrderLine) -> &str {
    line.product.as_ref().map_or(REMOVED_PRODUCT, |p| p.name.as_str())
}

pub fn item_count(order: &Order) -> i64 {
    order.products.iter().map(|line| i64::from(line.quantity)).sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub id: Uuid,
    pub item_count: i64,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            item_count: item_count(order),
            total_amount: order.total_amount,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub order_count: usize,
    pub product_count: usize,
    pub items_sold: i64,
    /// Units on hand across the whole catalog.
    pub stock_units: i64,
    /// Last [`RECENT_ORDER_WINDOW`] orders in fetch order, not re-sorted.
    pub recent_orders: Vec<OrderSummary>,
}

impl DashboardSummary {
    pub fn compute(products: &[Product], orders: &[Order]) -> Self {
        let recent_start = orders.len().saturating_sub(RECENT_ORDER_WINDOW);
        Self {
            total_revenue: orders.iter().map(|o| o.total_amount).sum(),
            order_count: orders.len(),
            product_count: products.len(),
            items_sold: orders.iter().map(item_count).sum(),
            stock_units: products.iter().map(|p| i64::from(p.stock)).sum(),
            recent_orders: orders[recent_start..].iter().map(OrderSummary::from).collect(),
        }
    }
}

/// The admin's working copy of the catalog.
pub struct AdminCatalog {
    products: Vec<Product>,
    orders: Vec<Order>,
}

impl AdminCatalog {
    pub async fn load(api: &dyn ShopApi) -> Result<Self, ClientError> {
        let (products, orders) = try_join!(api.list_products(), api.list_orders())?;
        Ok(Self { products, orders })
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary::compute(&self.products, &self.orders)
    }

    pub async fn add_product(
        &mut self,
        api: &dyn ShopApi,
        request: &CreateProductRequest,
    ) -> Result<Product, ClientError> {
        let product = api.create_product(request).await?;
        info!(product_id = %product.id, "Product added");
        self.products.push(product.clone());
        Ok(product)
    }

    /// The local list only changes once the server confirms the deletion.
    pub async fn delete_product(&mut self, api: &dyn ShopApi, id: Uuid) -> Result<(), ClientError> {
        if let Err(e) = api.delete_product(id).await {
            error!(product_id = %id, error = %e, "Failed to delete product");
            return Err(e);
        }
        self.products.retain(|p| p.id != id);
        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}
