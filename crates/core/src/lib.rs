//! Lustre Core - Shared types and state containers.
//!
//! This crate provides the pieces of the Lustre storefront that carry state
//! but perform no I/O:
//! - `storefront` - Public-facing jewelry shop (wishlist, checkout, admin login)
//! - `cli` - Command-line tools for migrations and profile sync
//!
//! # Architecture
//!
//! The core crate contains only types, pure state machines and traits - no
//! database access, no HTTP clients. Collaborators (credential checks, the
//! payment gateway, profile storage) live in the storefront crate and are
//! injected at the edges.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`notification`] - Ephemeral user-facing notifications emitted by stores
//! - [`wishlist`] - Wishlist registry with replace-on-write snapshots
//! - [`checkout`] - Checkout session and payment-retry state machine
//! - [`profile_sync`] - Planning for account/profile reconciliation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod notification;
pub mod profile_sync;
pub mod types;
pub mod wishlist;

pub use checkout::{AvailableActions, CheckoutError, CheckoutSession, MAX_PAYMENT_RETRIES};
pub use notification::{Notification, NotificationLevel, Notifier};
pub use types::*;
pub use wishlist::{Wishlist, WishlistItem, WishlistStore};
