//! Session-scoped shopping cart.
//!
//! The cart is owned by whoever drives the session and is only changed
//! through [`Cart::add`], [`Cart::update_quantity`], [`Cart::remove`] and
//! [`Cart::clear`]. `add` checks stock against the product it is given;
//! `update_quantity` checks against the snapshot stored in the cart, which
//! may be stale.

use shared::{LineItem, Product};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    product: Product,
    quantity: i32,
}

impl CartItem {
    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// Result of a cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    Added,
    Updated,
    Removed,
    /// The request was a no-op (bad quantity, unknown product, missing id).
    Ignored,
    /// Rejected because the quantity would exceed the snapshot stock. The
    /// cart is unchanged.
    StockLimit { available: i32 },
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn quantity_of(&self, product_id: Uuid) -> Option<i32> {
        self.items
            .iter()
            .find(|item| item.product.id == product_id)
            .map(|item| item.quantity)
    }

    pub fn total_quantity(&self) -> i32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Line items as submitted with an order: id and quantity only.
    pub fn line_items(&self) -> Vec<LineItem> {
        self.items
            .iter()
            .map(|item| LineItem {
                product_id: item.product.id,
                quantity: item.quantity,
            })
            .collect()
    }

    pub fn add(&mut self, product: &Product, quantity: i32) -> CartChange {
        if quantity <= 0 || product.id.is_nil() {
            return CartChange::Ignored;
        }

        match self.items.iter_mut().find(|item| item.product.id == product.id) {
            Some(item) => {
                let requested = item.quantity.saturating_add(quantity);
                if requested > product.stock {
                    warn!(product_id = %product.id, requested, stock = product.stock, "Stock limit reached");
                    return CartChange::StockLimit { available: product.stock };
                }
                item.quantity = requested;
                CartChange::Updated
            }
            None => {
                if quantity > product.stock {
                    warn!(product_id = %product.id, requested = quantity, stock = product.stock, "Stock limit reached");
                    return CartChange::StockLimit { available: product.stock };
                }
                self.items.push(CartItem {
                    product: product.clone(),
                    quantity,
                });
                CartChange::Added
            }
        }
    }

    /// A quantity of zero or less removes the entry.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i32) -> CartChange {
        if quantity <= 0 {
            return if self.remove(product_id) {
                CartChange::Removed
            } else {
                CartChange::Ignored
            };
        }

        let Some(item) = self.items.iter_mut().find(|item| item.product.id == product_id) else {
            return CartChange::Ignored;
        };
        if quantity > item.product.stock {
            warn!(%product_id, requested = quantity, stock = item.product.stock, "Stock limit reached");
            return CartChange::StockLimit { available: item.product.stock };
        }
        item.quantity = quantity;
        CartChange::Updated
    }

    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product.id != product_id);
        self.items.len() < before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
