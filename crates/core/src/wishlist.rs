//! Pure wishlist reducer.
//!
//! A wishlist is an ordered set of product ids: insertion order is kept for
//! display, duplicates are impossible.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Actions the wishlist reducer accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishlistAction {
    /// Insert a product id. No-op when already present.
    Add(ProductId),
    /// Remove a product id. No-op when absent.
    Remove(ProductId),
    /// Add if absent, remove if present.
    Toggle(ProductId),
    /// Replace the entire wishlist, e.g. from a store load.
    Load(Vec<ProductId>),
}

/// In-memory wishlist state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistState {
    ids: Vec<ProductId>,
}

impl WishlistState {
    /// Create a wishlist pre-populated with ids, deduplicated in order.
    #[must_use]
    pub fn from_ids(ids: Vec<ProductId>) -> Self {
        let mut state = Self::default();
        for id in ids {
            state.insert(id);
        }
        state
    }

    /// Apply one action.
    pub fn apply(&mut self, action: WishlistAction) {
        match action {
            WishlistAction::Add(id) => self.insert(id),
            WishlistAction::Remove(id) => self.ids.retain(|existing| existing != &id),
            WishlistAction::Toggle(id) => {
                if self.contains(&id) {
                    self.ids.retain(|existing| existing != &id);
                } else {
                    self.ids.push(id);
                }
            }
            WishlistAction::Load(ids) => {
                *self = Self::from_ids(ids);
            }
        }
    }

    fn insert(&mut self, id: ProductId) {
        if !self.contains(&id) {
            self.ids.push(id);
        }
    }

    /// Whether the wishlist contains this product.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.ids.contains(id)
    }

    /// The wishlisted product ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    /// Consume the state, returning its ids.
    #[must_use]
    pub fn into_ids(self) -> Vec<ProductId> {
        self.ids
    }

    /// Number of wishlisted products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the wishlist is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut wishlist = WishlistState::default();
        wishlist.apply(WishlistAction::Add(ProductId::new("tee-1")));
        wishlist.apply(WishlistAction::Add(ProductId::new("tee-1")));

        assert_eq!(wishlist.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut wishlist = WishlistState::default();
        wishlist.apply(WishlistAction::Add(ProductId::new("tee-1")));

        let before = wishlist.clone();
        wishlist.apply(WishlistAction::Remove(ProductId::new("tee-9")));
        assert_eq!(wishlist, before);
    }

    #[test]
    fn test_toggle() {
        let mut wishlist = WishlistState::default();
        let id = ProductId::new("tee-1");

        wishlist.apply(WishlistAction::Toggle(id.clone()));
        assert!(wishlist.contains(&id));

        wishlist.apply(WishlistAction::Toggle(id.clone()));
        assert!(!wishlist.contains(&id));
    }

    #[test]
    fn test_load_dedupes_preserving_order() {
        let mut wishlist = WishlistState::default();
        wishlist.apply(WishlistAction::Load(vec![
            ProductId::new("tee-2"),
            ProductId::new("tee-1"),
            ProductId::new("tee-2"),
        ]));

        assert_eq!(
            wishlist.ids(),
            &[ProductId::new("tee-2"), ProductId::new("tee-1")]
        );
    }
}
