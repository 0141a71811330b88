//! Wishlist registry.
//!
//! A [`Wishlist`] is an immutable, insertion-ordered set of liked products
//! keyed by [`ProductId`]. [`WishlistStore`] owns the current snapshot and
//! replaces it wholesale on every change, so a snapshot handed out earlier
//! never changes underneath its holder.
//!
//! # Example
//!
//! ```
//! use lustre_core::{CurrencyCode, Notification, Price, ProductId, WishlistItem, WishlistStore};
//!
//! let mut toasts: Vec<Notification> = Vec::new();
//! let mut store = WishlistStore::new(&mut toasts);
//! let ring = WishlistItem {
//!     id: ProductId::new(1),
//!     name: "Ring".to_string(),
//!     price: Price::from_minor(9_900, CurrencyCode::USD),
//!     original_price: Price::from_minor(12_900, CurrencyCode::USD),
//!     image: "/images/ring.jpg".to_string(),
//! };
//!
//! assert!(store.add(ring.clone()));
//! assert!(!store.add(ring));
//! assert_eq!(store.count(), 1);
//! drop(store);
//! assert_eq!(toasts.len(), 1);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::notification::{Notification, Notifier};
use crate::types::{Price, ProductId};

/// A product the shopper has saved for later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: ProductId,
    pub name: String,
    /// Current selling price.
    pub price: Price,
    /// Price before any markdown.
    pub original_price: Price,
    /// Image URL or asset path.
    pub image: String,
}

impl WishlistItem {
    /// Whole-number discount shown on sale items.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        self.price.discount_percent_from(&self.original_price)
    }
}

/// Immutable registry value. At most one entry per product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<WishlistItem>", into = "Vec<WishlistItem>")]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&WishlistItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Number of saved items, computed on every call.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    /// A new registry with `item` appended, or `None` if its id is already present.
    #[must_use]
    pub fn with_item(&self, item: WishlistItem) -> Option<Self> {
        if self.contains(item.id) {
            return None;
        }
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend(self.items.iter().cloned());
        items.push(item);
        Some(Self { items })
    }

    /// A new registry without `id` plus the removed entry, or `None` if absent.
    #[must_use]
    pub fn without(&self, id: ProductId) -> Option<(Self, WishlistItem)> {
        let removed = self.get(id)?.clone();
        let items = self
            .items
            .iter()
            .filter(|item| item.id != id)
            .cloned()
            .collect();
        Some((Self { items }, removed))
    }
}

impl From<Vec<WishlistItem>> for Wishlist {
    /// Builds a registry keeping the first entry for each id.
    fn from(items: Vec<WishlistItem>) -> Self {
        items
            .into_iter()
            .fold(Self::default(), |list, item| {
                list.with_item(item).unwrap_or(list)
            })
    }
}

impl From<Wishlist> for Vec<WishlistItem> {
    fn from(list: Wishlist) -> Self {
        list.items
    }
}

/// Owner of the current wishlist snapshot.
///
/// Operations are total: duplicates and unknown ids are silent no-ops and
/// never produce a notification.
#[derive(Debug)]
pub struct WishlistStore<N> {
    current: Arc<Wishlist>,
    notifier: N,
}

impl<N: Notifier> WishlistStore<N> {
    /// Start with an empty wishlist.
    pub fn new(notifier: N) -> Self {
        Self::from_snapshot(Arc::new(Wishlist::new()), notifier)
    }

    /// Resume from a previously taken snapshot.
    pub const fn from_snapshot(snapshot: Arc<Wishlist>, notifier: N) -> Self {
        Self {
            current: snapshot,
            notifier,
        }
    }

    /// Save `item` unless its id is already present.
    ///
    /// Returns `true` if the item was inserted.
    pub fn add(&mut self, item: WishlistItem) -> bool {
        let name = item.name.clone();
        let Some(next) = self.current.with_item(item) else {
            return false;
        };
        self.current = Arc::new(next);
        self.notifier
            .notify(Notification::success(format!("{name} added to wishlist")));
        true
    }

    /// Drop the entry for `id` if present.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let Some((next, removed)) = self.current.without(id) else {
            return false;
        };
        self.current = Arc::new(next);
        self.notifier.notify(Notification::info(format!(
            "{} removed from wishlist",
            removed.name
        )));
        true
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.current.contains(id)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.current.count()
    }

    /// The current registry value. Later mutations never alter it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Wishlist> {
        Arc::clone(&self.current)
    }
}
