use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image: Option<String>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
    pub stock: i32,
}

/// One (product reference, quantity) pair as submitted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub products: Vec<LineItem>,
    pub total_amount: f64,
}

/// A stored line item. `product` is `None` once the referenced product has
/// been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub product: Option<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub products: Vec<OrderLine>,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No products in order")]
    EmptyOrder,
    #[error("Product name is required")]
    MissingName,
    #[error("Price must be a non-negative number")]
    InvalidPrice,
    #[error("Stock must be a non-negative integer")]
    InvalidStock,
    #[error("Quantity for product {0} must be at least 1")]
    InvalidQuantity(Uuid),
    #[error("Total amount must be a non-negative number")]
    InvalidTotal,
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if !is_non_negative(self.price) {
            return Err(ValidationError::InvalidPrice);
        }
        if self.stock < 0 {
            return Err(ValidationError::InvalidStock);
        }
        Ok(())
    }
}

impl CreateOrderRequest {
    /// Checks the shape of the request only. Product existence, stock and the
    /// submitted total are taken as given.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.products.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }
        if let Some(item) = self.products.iter().find(|item| item.quantity < 1) {
            return Err(ValidationError::InvalidQuantity(item.product_id));
        }
        if !is_non_negative(self.total_amount) {
            return Err(ValidationError::InvalidTotal);
        }
        Ok(())
    }
}
