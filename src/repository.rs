//! Update check and full-replace refresh of the local catalog.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::client::CatalogClient;
use crate::error::Result;
use crate::models::{Item, Listing, RepoInfo};
use crate::store::ItemStore;

/// Where catalog data comes from.
pub trait CatalogSource {
    fn repo_info(&self) -> Result<RepoInfo>;
    fn listings(&self) -> Result<Vec<Listing>>;
    fn item(&self, listing: &Listing) -> Result<Item>;
}

impl CatalogSource for CatalogClient {
    fn repo_info(&self) -> Result<RepoInfo> {
        self.repository().info()
    }

    fn listings(&self) -> Result<Vec<Listing>> {
        self.listing().list()
    }

    fn item(&self, listing: &Listing) -> Result<Item> {
        self.items().get_listed(listing)
    }
}

/// A complete fetched catalog, ready to replace the cache.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub items: Vec<Item>,
    pub updated_at: String,
}

/// True when `remote` is newer than `local`.
///
/// Timestamps are RFC 3339; if either fails to parse they are compared as
/// strings, which orders the ISO form correctly.
pub fn is_newer(remote: &str, local: &str) -> bool {
    match (parse_timestamp(remote), parse_timestamp(local)) {
        (Some(r), Some(l)) => r > l,
        _ => remote > local,
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Render a stored timestamp as `dd.mm.yyyy`; empty when unparseable.
pub fn display_date(value: &str) -> String {
    parse_timestamp(value)
        .map(|t| t.format("%d.%m.%Y").to_string())
        .unwrap_or_default()
}

/// Whether `source` holds a catalog newer than the `local` timestamp.
///
/// No local timestamp means nothing was downloaded yet. A failed request is
/// logged and reported as "no update".
pub fn remote_is_newer<S: CatalogSource + ?Sized>(source: &S, local: Option<&str>) -> bool {
    let remote = match source.repo_info() {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(error = %e, "update check failed");
            return false;
        }
    };
    match local {
        Some(local) => is_newer(&remote.updated_at, local),
        None => true,
    }
}

/// Fetch the listing and every item it names.
///
/// `progress(done, total)` is called after each item. The repository
/// timestamp is read before the items so a concurrent push is picked up by
/// the next check rather than silently skipped.
pub fn fetch_catalog<S, F>(source: &S, mut progress: F) -> Result<CatalogSnapshot>
where
    S: CatalogSource + ?Sized,
    F: FnMut(usize, usize),
{
    let info = source.repo_info()?;
    let listings = source.listings()?;
    let total = listings.len();
    tracing::info!(total, "fetching catalog");

    let mut items = Vec::with_capacity(total);
    for (index, listing) in listings.iter().enumerate() {
        items.push(source.item(listing)?);
        progress(index + 1, total);
        tracing::trace!(done = index + 1, total, path = %listing.data, "fetched item");
    }

    Ok(CatalogSnapshot {
        items,
        updated_at: info.updated_at,
    })
}

/// The cache plus the source it is refreshed from.
pub struct ItemRepository<S> {
    source: S,
    store: ItemStore,
}

impl<S: CatalogSource> ItemRepository<S> {
    pub fn new(source: S, store: ItemStore) -> Self {
        Self { source, store }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    /// Whether the remote catalog is newer than the cached one.
    ///
    /// Network and storage failures are logged and reported as "no update".
    pub fn needs_update(&self) -> bool {
        match self.store.last_update() {
            Ok(local) => remote_is_newer(&self.source, local.as_deref()),
            Err(e) => {
                tracing::warn!(error = %e, "could not read last update time");
                false
            }
        }
    }

    /// Replace the cached catalog with a fetched snapshot.
    pub fn apply(&mut self, snapshot: &CatalogSnapshot) -> Result<()> {
        self.store
            .replace_all(&snapshot.items, &snapshot.updated_at)
    }

    /// Fetch everything and replace the cache; returns the item count.
    ///
    /// On failure the cache is left untouched.
    pub fn refresh<F: FnMut(usize, usize)>(&mut self, progress: F) -> Result<usize> {
        let snapshot = fetch_catalog(&self.source, progress)?;
        self.apply(&snapshot)?;
        Ok(snapshot.items.len())
    }

    pub fn all_items(&self) -> Result<Vec<Item>> {
        self.store.all_items()
    }

    pub fn item_by_id(&self, id: &str) -> Result<Option<Item>> {
        self.store.item_by_id(id)
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Result<Vec<String>> {
        Ok(categories_of(&self.store.all_items()?))
    }

    pub fn items_by_category(&self, category: &str) -> Result<Vec<Item>> {
        Ok(self
            .store
            .all_items()?
            .into_iter()
            .filter(|item| item.category == category)
            .collect())
    }

    /// Last applied update as `dd.mm.yyyy`, if any.
    pub fn last_update_display(&self) -> Result<Option<String>> {
        Ok(self.store.last_update()?.map(|t| display_date(&t)))
    }
}

/// Distinct categories of `items`, sorted.
pub fn categories_of(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
