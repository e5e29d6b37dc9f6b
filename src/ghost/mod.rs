//! Ghost Content API access
//!
//! `GhostClient` talks HTTP, `ContentSource` is the seam it sits behind, and
//! `ContentApi` is the error-swallowing wrapper the rest of the site uses.

mod api;
mod client;
mod error;
pub mod model;
mod source;
#[cfg(test)]
pub mod testing;

pub use api::ContentApi;
pub use client::GhostClient;
pub use error::{GhostError, GhostResult};
pub use model::{Author, NavigationItem, Post, Settings, Tag};
pub use source::{BrowseOptions, ContentSource, Limit};
