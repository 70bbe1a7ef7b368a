use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use num_traits::ToPrimitive;
use shared::*;
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone, Queryable)]
pub struct DbProduct {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub image: Option<String>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub image: Option<String>,
    pub stock: i32,
}

#[derive(Debug, Clone, Queryable)]
pub struct DbOrder {
    pub id: Uuid,
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder {
    pub id: Uuid,
    pub total_amount: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::order_items)]
pub struct DbOrderItem {
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Goes through the shortest decimal rendering of the float so that `19.99`
/// is stored as `19.99` rather than its binary expansion.
pub fn to_numeric(value: f64) -> Result<BigDecimal, StoreError> {
    value
        .to_string()
        .parse::<BigDecimal>()
        .map_err(|e| StoreError::Conversion(format!("{}: {}", value, e)))
}

pub fn from_numeric(value: &BigDecimal) -> Result<f64, StoreError> {
    value
        .to_f64()
        .ok_or_else(|| StoreError::Conversion(value.to_string()))
}

impl TryFrom<CreateProductRequest> for NewProduct {
    type Error = StoreError;

    fn try_from(request: CreateProductRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            description: request.description,
            price: to_numeric(request.price)?,
            image: request.image,
            stock: request.stock,
        })
    }
}

impl TryFrom<DbProduct> for Product {
    type Error = StoreError;

    fn try_from(db_product: DbProduct) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db_product.id,
            name: db_product.name,
            description: db_product.description,
            price: from_numeric(&db_product.price)?,
            image: db_product.image,
            stock: db_product.stock,
            created_at: db_product.created_at,
        })
    }
}

impl DbOrderItem {
    pub fn for_order(order_id: Uuid, items: &[LineItem]) -> Vec<Self> {
        items
            .iter()
            .enumerate()
            .map(|(position, item)| Self {
                order_id,
                position: position as i32,
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect()
    }
}
