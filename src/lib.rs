//! STALCRAFT item catalog client library for Rust.
//!
//! Fetches the public STALCRAFT item database, caches it in a local SQLite
//! file, and renders item detail views built from recursively nested
//! [`InfoBlock`]s.
//!
//! # Quick Start
//!
//! ```no_run
//! use stalcraft_catalog::{CatalogClient, Config, ItemRepository, ItemStore};
//!
//! let config = Config::default();
//! let client = CatalogClient::new(&config).unwrap();
//! let store = ItemStore::open_in_memory().unwrap();
//! let mut repo = ItemRepository::new(client, store);
//!
//! if repo.needs_update() {
//!     repo.refresh(|done, total| eprintln!("{done}/{total}")).unwrap();
//! }
//! for category in repo.categories().unwrap() {
//!     println!("{category}");
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod repository;
pub mod store;
pub mod tui;

// Re-export the main public types at the crate root for convenience.
pub use client::{CatalogClient, ItemsClient, ListingClient, RepositoryClient};
pub use config::{ColorMode, Config};
pub use error::{CatalogError, Result};
pub use models::{
    DamageProfile, FormattedValue, InfoBlock, Item, ItemStatus, Listing, Rank, RepoInfo,
    TranslationLines, TranslationString,
};
pub use render::{render_blocks, render_item, render_plain, BlockVisitor, RenderOptions};
pub use repository::{fetch_catalog, CatalogSnapshot, CatalogSource, ItemRepository};
pub use store::ItemStore;
