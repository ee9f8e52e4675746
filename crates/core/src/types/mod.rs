//! Core types for Seesaw.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod coupon;
pub mod email;
pub mod id;
pub mod order;

pub use cart::{CartLine, VariantKey};
pub use coupon::{Coupon, CouponError, DiscountType};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderItem, OrderStatus, ShippingAddress};
