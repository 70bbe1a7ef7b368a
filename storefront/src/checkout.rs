//! Cart → order submission.

use std::time::Duration;

use shared::{CreateOrderRequest, Order};
use tracing::{error, info};

use crate::api::ShopApi;
use crate::cart::Cart;

pub const DISCOUNT_RATE: f64 = 0.10;

/// How long the success message stays up before returning to the catalog.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    /// Always a whole number, floored.
    pub discount: f64,
    pub shipping: f64,
    pub total: f64,
}

impl Totals {
    pub fn from_subtotal(subtotal: f64) -> Self {
        let discount = (subtotal * DISCOUNT_RATE).floor().max(0.0);
        Self {
            subtotal,
            discount,
            shipping: 0.0,
            total: subtotal - discount,
        }
    }

    pub fn for_cart(cart: &Cart) -> Self {
        Self::from_subtotal(cart.subtotal())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlacementOutcome {
    /// The cart has been cleared. Callers show a success message and move to
    /// the catalog after `redirect_after`.
    Placed {
        order: Order,
        totals: Totals,
        redirect_after: Duration,
    },
    /// Nothing was sent.
    EmptyCart,
    /// The cart is untouched. Validation and transport failures are not told
    /// apart.
    Failed,
}

/// Submits the cart as a single order. The exclusive borrow of `cart` lasts
/// for the whole request, so a second placement cannot start while one is in
/// flight.
pub async fn place_order(api: &dyn ShopApi, cart: &mut Cart) -> PlacementOutcome {
    if cart.is_empty() {
        return PlacementOutcome::EmptyCart;
    }

    let totals = Totals::for_cart(cart);
    let request = CreateOrderRequest {
        products: cart.line_items(),
        total_amount: totals.total,
    };

    match api.create_order(&request).await {
        Ok(order) => {
            info!(order_id = %order.id, total = totals.total, "Order placed");
            cart.clear();
            PlacementOutcome::Placed {
                order,
                totals,
                redirect_after: REDIRECT_DELAY,
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to place order");
            PlacementOutcome::Failed
        }
    }
}
