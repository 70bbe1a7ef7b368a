//! Storefront and admin client for the shop API.
//!
//! The cart lives entirely on this side; the server only ever sees the final
//! order submission.

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod dashboard;

#[cfg(test)]
mod testing;

pub use api::{ClientError, HttpShopApi, ShopApi};
pub use cart::{Cart, CartChange, CartItem};
pub use checkout::{place_order, PlacementOutcome, Totals};
