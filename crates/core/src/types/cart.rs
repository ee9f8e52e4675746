//! Cart line types.
//!
//! A cart line identifies a purchasable variant by the `(product, size,
//! color)` tuple. Two adds of the same variant accumulate quantity on one
//! line; a different size or color of the same product is a separate line.

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// The identity key of a cart line: one purchasable variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
}

impl VariantKey {
    /// Create a new variant key.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, size: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            size: size.into(),
            color: color.into(),
        }
    }
}

/// A single line in a shopper's cart.
///
/// Invariant: `quantity >= 1`. A line whose quantity would reach zero is
/// removed from the cart, never retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    /// Display name captured at add time.
    pub name: String,
    /// Unit price in minor currency units.
    pub price: i64,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub image_url: Option<String>,
}

impl CartLine {
    /// The variant key identifying this line.
    #[must_use]
    pub fn key(&self) -> VariantKey {
        VariantKey {
            product_id: self.product_id.clone(),
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }

    /// Whether this line is identified by the given key.
    #[must_use]
    pub fn matches(&self, key: &VariantKey) -> bool {
        self.product_id == key.product_id && self.size == key.size && self.color == key.color
    }

    /// Line total in minor currency units.
    #[must_use]
    pub const fn line_total(&self) -> i64 {
        self.price * self.quantity as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product: &str, size: &str, color: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            name: "Boxy Tee".to_owned(),
            price: 120_000,
            size: size.to_owned(),
            color: color.to_owned(),
            quantity,
            image_url: None,
        }
    }

    #[test]
    fn test_key_distinguishes_variants() {
        let a = line("tee-1", "M", "black", 1);
        let b = line("tee-1", "L", "black", 1);
        assert_ne!(a.key(), b.key());
        assert!(a.matches(&a.key()));
        assert!(!a.matches(&b.key()));
    }

    #[test]
    fn test_line_total() {
        let l = line("tee-1", "M", "black", 3);
        assert_eq!(l.line_total(), 360_000);
    }
}
