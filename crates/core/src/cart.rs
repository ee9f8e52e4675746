//! Pure cart reducer.
//!
//! [`CartState`] is an in-memory state machine, independent of persistence.
//! The storefront applies actions here first and then mirrors the result to
//! the active store (session for anonymous shoppers, database for
//! authenticated ones), so a failed remote write can never corrupt the
//! in-memory state.

use serde::{Deserialize, Serialize};

use crate::types::{CartLine, VariantKey};

/// Actions the cart reducer accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add a line. If the variant is already present, quantities sum.
    Add(CartLine),
    /// Remove the line with this key. No-op when absent.
    Remove(VariantKey),
    /// Set the quantity of the line with this key. No-op when absent.
    /// Setting quantity zero removes the line.
    SetQuantity(VariantKey, u32),
    /// Replace the entire cart, e.g. from a store load.
    Load(Vec<CartLine>),
    /// Remove every line.
    Clear,
    /// Toggle the cart drawer visibility flag.
    ToggleOpen,
    /// Hide the cart drawer.
    Close,
}

/// In-memory cart state.
///
/// The `open` flag models the cart drawer visibility explicitly: a
/// successful add opens the drawer, and the flag is part of state rather
/// than an implicit side effect so the view stays a pure function of state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    lines: Vec<CartLine>,
    pub open: bool,
}

impl CartState {
    /// Create a cart pre-populated with lines, e.g. from a store load.
    ///
    /// Lines violating the quantity invariant are dropped rather than
    /// surfaced; persisted state fails closed.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self {
            lines: lines.into_iter().filter(|l| l.quantity >= 1).collect(),
            open: false,
        }
    }

    /// Apply one action.
    pub fn apply(&mut self, action: CartAction) {
        match action {
            CartAction::Add(line) => self.add(line),
            CartAction::Remove(key) => self.lines.retain(|l| !l.matches(&key)),
            CartAction::SetQuantity(key, quantity) => self.set_quantity(&key, quantity),
            CartAction::Load(lines) => {
                self.lines = lines.into_iter().filter(|l| l.quantity >= 1).collect();
            }
            CartAction::Clear => self.lines.clear(),
            CartAction::ToggleOpen => self.open = !self.open,
            CartAction::Close => self.open = false,
        }
    }

    fn add(&mut self, line: CartLine) {
        // A zero-quantity add would create an invariant-violating line.
        if line.quantity == 0 {
            return;
        }

        if let Some(existing) = self.lines.iter_mut().find(|l| l.matches(&line.key())) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.lines.push(line);
        }
        self.open = true;
    }

    fn set_quantity(&mut self, key: &VariantKey, quantity: u32) {
        // Quantity zero means removal: the invariant is enforced here, in
        // the reducer, so callers cannot produce a zero-quantity line.
        if quantity == 0 {
            self.lines.retain(|l| !l.matches(key));
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.matches(key)) {
            line.quantity = quantity;
        }
    }

    /// The current cart lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Consume the state, returning its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines. Recomputed on every read.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Merchandise subtotal in minor currency units. Recomputed on every
    /// read.
    #[must_use]
    pub fn subtotal(&self) -> i64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;

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
    fn test_add_same_variant_accumulates() {
        let mut cart = CartState::default();
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 2)));
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 3)));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_add_different_variant_appends() {
        let mut cart = CartState::default();
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 1)));
        cart.apply(CartAction::Add(line("tee-1", "L", "black", 1)));

        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_add_opens_drawer() {
        let mut cart = CartState::default();
        assert!(!cart.open);
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 1)));
        assert!(cart.open);

        cart.apply(CartAction::Close);
        assert!(!cart.open);

        cart.apply(CartAction::ToggleOpen);
        assert!(cart.open);
        cart.apply(CartAction::ToggleOpen);
        assert!(!cart.open);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = CartState::default();
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 0)));
        assert!(cart.is_empty());
        assert!(!cart.open);
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let mut cart = CartState::default();
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 2)));

        let before = cart.clone();
        cart.apply(CartAction::Remove(VariantKey::new("tee-9", "M", "black")));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = CartState::default();
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 2)));
        cart.apply(CartAction::SetQuantity(
            VariantKey::new("tee-1", "M", "black"),
            7,
        ));

        assert_eq!(cart.lines()[0].quantity, 7);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = CartState::default();
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 2)));
        cart.apply(CartAction::SetQuantity(
            VariantKey::new("tee-1", "M", "black"),
            0,
        ));

        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_absent_key_is_noop() {
        let mut cart = CartState::default();
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 2)));

        let before = cart.clone();
        cart.apply(CartAction::SetQuantity(
            VariantKey::new("tee-9", "M", "black"),
            4,
        ));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_derived_totals() {
        let mut cart = CartState::default();
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 2)));
        cart.apply(CartAction::Add(line("tee-2", "S", "ecru", 1)));

        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.subtotal(), 360_000);
    }

    #[test]
    fn test_load_replaces_and_drops_invalid_lines() {
        let mut cart = CartState::default();
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 2)));

        cart.apply(CartAction::Load(vec![
            line("tee-2", "S", "ecru", 1),
            line("tee-3", "M", "navy", 0),
        ]));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product_id, ProductId::new("tee-2"));
    }

    #[test]
    fn test_clear() {
        let mut cart = CartState::default();
        cart.apply(CartAction::Add(line("tee-1", "M", "black", 2)));
        cart.apply(CartAction::Clear);
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), 0);
    }
}
