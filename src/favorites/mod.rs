//! Favorites: persistent application-to-device bindings
//!
//! The store keeps an ordered list of associations with contiguous 1-based
//! ordinals. It is only changed by direct user actions, never by the
//! periodic inventory refresh.

mod persistence;
pub mod properties;
mod store;

pub use store::{FavoriteAssociation, FavoritesStore, LoadReport};
