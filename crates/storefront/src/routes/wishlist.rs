//! Wishlist route handlers.
//!
//! The wishlist is loaded from the visitor's session, mutated through a
//! `WishlistStore`, and written back only when it actually changed.

use std::sync::Arc;

use axum::{Json, extract::Path};
use lustre_core::{Notification, ProductId, Wishlist, WishlistItem, WishlistStore};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::session::{load_or_default, save};
use crate::models::{ApiResponse, session_keys};

/// Wishlist as returned to the client.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub items: Vec<WishlistItemView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct WishlistItemView {
    #[serde(flatten)]
    pub item: WishlistItem,
    pub discount_percent: Option<u32>,
}

impl From<&Wishlist> for WishlistView {
    fn from(wishlist: &Wishlist) -> Self {
        Self {
            items: wishlist
                .items()
                .iter()
                .map(|item| WishlistItemView {
                    discount_percent: item.discount_percent(),
                    item: item.clone(),
                })
                .collect(),
            count: wishlist.count(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WishlistChange {
    /// False when the request was a no-op.
    pub changed: bool,
    pub wishlist: WishlistView,
}

#[derive(Debug, Serialize)]
pub struct Membership {
    pub id: ProductId,
    pub in_wishlist: bool,
}

async fn load(session: &Session) -> Result<Arc<Wishlist>> {
    let wishlist: Wishlist = load_or_default(session, session_keys::WISHLIST).await?;
    Ok(Arc::new(wishlist))
}

/// List the wishlist.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<WishlistView>> {
    let wishlist = load(&session).await?;
    Ok(Json(WishlistView::from(wishlist.as_ref())))
}

/// Add an item. Adding an id that is already present is a silent no-op.
#[instrument(skip(session, item), fields(product_id = %item.id))]
pub async fn add(
    session: Session,
    Json(item): Json<WishlistItem>,
) -> Result<Json<ApiResponse<WishlistChange>>> {
    let mut notifications: Vec<Notification> = Vec::new();
    let mut store = WishlistStore::from_snapshot(load(&session).await?, &mut notifications);

    let product_id = item.id;
    let changed = store.add(item);
    let snapshot = store.snapshot();
    drop(store);

    if changed {
        save(&session, session_keys::WISHLIST, snapshot.as_ref()).await?;
        add_breadcrumb("wishlist", "Item added", &[("product_id", product_id.to_string())]);
    }

    Ok(Json(ApiResponse::new(
        WishlistChange {
            changed,
            wishlist: WishlistView::from(snapshot.as_ref()),
        },
        notifications,
    )))
}

/// Remove an item. Removing an absent id is a silent no-op.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<WishlistChange>>> {
    let mut notifications: Vec<Notification> = Vec::new();
    let mut store = WishlistStore::from_snapshot(load(&session).await?, &mut notifications);

    let changed = store.remove(id);
    let snapshot = store.snapshot();
    drop(store);

    if changed {
        save(&session, session_keys::WISHLIST, snapshot.as_ref()).await?;
        add_breadcrumb("wishlist", "Item removed", &[("product_id", id.to_string())]);
    }

    Ok(Json(ApiResponse::new(
        WishlistChange {
            changed,
            wishlist: WishlistView::from(snapshot.as_ref()),
        },
        notifications,
    )))
}

/// Whether a product is in the wishlist.
#[instrument(skip(session))]
pub async fn contains(session: Session, Path(id): Path<ProductId>) -> Result<Json<Membership>> {
    let wishlist = load(&session).await?;
    Ok(Json(Membership {
        id,
        in_wishlist: wishlist.contains(id),
    }))
}
