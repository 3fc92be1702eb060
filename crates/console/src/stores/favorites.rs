//! The authenticated user's favorites.
//!
//! The store is tagged with the user it was loaded for. Items are only ever
//! replaced wholesale from a server reload, never appended optimistically.

use std::sync::{Mutex, MutexGuard};

use pricewatch_core::{Favorite, ProductId, UserId};
use tracing::warn;

use crate::sync::lock;

/// Favorites plus the user they belong to, guarded together.
#[derive(Debug, Default)]
pub struct FavoritesSlot {
    owner: Option<UserId>,
    items: Vec<Favorite>,
}

impl FavoritesSlot {
    #[must_use]
    pub const fn owner(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }

    #[must_use]
    pub fn items(&self) -> &[Favorite] {
        &self.items
    }

    /// Whether the slot holds the favorites of `user_id`.
    #[must_use]
    pub fn is_loaded_for(&self, user_id: &UserId) -> bool {
        self.owner.as_ref() == Some(user_id)
    }

    /// Replace the contents with a server listing for `owner`.
    ///
    /// Entries owned by someone else are dropped, and only the first entry of
    /// each product id is kept. Returns the number of items stored.
    pub fn replace(&mut self, owner: &UserId, listing: Vec<Favorite>) -> usize {
        let mut items: Vec<Favorite> = Vec::with_capacity(listing.len());
        for favorite in listing {
            if favorite.owner_user_id != *owner {
                warn!(
                    product_id = %favorite.id,
                    owner = %favorite.owner_user_id,
                    expected = %owner,
                    "Dropping favorite owned by another user"
                );
                continue;
            }
            if items.iter().any(|kept| kept.id == favorite.id) {
                continue;
            }
            items.push(favorite);
        }

        self.owner = Some(owner.clone());
        self.items = items;
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.owner = None;
        self.items.clear();
    }
}

/// Holder of the current user's favorites.
#[derive(Debug, Default)]
pub struct FavoritesStore {
    inner: Mutex<FavoritesSlot>,
}

impl FavoritesStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the slot. Take the session lock first when holding both.
    pub(crate) fn lock(&self) -> MutexGuard<'_, FavoritesSlot> {
        lock(&self.inner)
    }

    #[must_use]
    pub fn items(&self) -> Vec<Favorite> {
        self.lock().items().to_vec()
    }

    #[must_use]
    pub fn owner(&self) -> Option<UserId> {
        self.lock().owner().cloned()
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.lock().items().iter().any(|f| f.id == *product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn favorite(id: &str, owner: &str) -> Favorite {
        Favorite {
            id: ProductId::new(id),
            name: id.to_uppercase(),
            owner_user_id: UserId::new(owner),
        }
    }

    #[test]
    fn test_replace_deduplicates_by_id() {
        let store = FavoritesStore::new();
        let owner = UserId::new("user123");
        let stored = store.lock().replace(
            &owner,
            vec![
                favorite("product789", "user123"),
                favorite("milk123", "user123"),
                favorite("product789", "user123"),
            ],
        );

        assert_eq!(stored, 2);
        assert_eq!(store.len(), 2);
        assert!(store.contains(&ProductId::new("product789")));
    }

    #[test]
    fn test_replace_drops_foreign_entries() {
        let store = FavoritesStore::new();
        let owner = UserId::new("user123");
        store.lock().replace(
            &owner,
            vec![favorite("milk123", "user123"), favorite("bread456", "someone")],
        );

        assert_eq!(store.items(), vec![favorite("milk123", "user123")]);
        assert!(store.lock().is_loaded_for(&owner));
    }

    #[test]
    fn test_replace_discards_previous_items() {
        let store = FavoritesStore::new();
        let owner = UserId::new("user123");
        store
            .lock()
            .replace(&owner, vec![favorite("milk123", "user123")]);
        store.lock().replace(&owner, Vec::new());

        assert!(store.is_empty());
        assert_eq!(store.owner(), Some(owner));
    }

    #[test]
    fn test_clear_forgets_owner() {
        let store = FavoritesStore::new();
        store
            .lock()
            .replace(&UserId::new("user123"), vec![favorite("milk123", "user123")]);
        store.lock().clear();

        assert!(store.is_empty());
        assert!(store.owner().is_none());
    }
}
