#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stalcraft_catalog::{
    CatalogError, CatalogSource, InfoBlock, Item, ItemStatus, Listing, RepoInfo, Result,
    TranslationString,
};

pub const AK74_JSON: &str = include_str!("../fixtures/ak74.json");

pub fn ak74() -> Item {
    serde_json::from_str(AK74_JSON).expect("fixture decodes")
}

pub fn item(id: &str, category: &str, name: &str) -> Item {
    Item {
        id: id.to_string(),
        category: category.to_string(),
        name: TranslationString::text(name),
        color: "RANK_NEWBIE".to_string(),
        status: ItemStatus {
            state: "NON_DROP".to_string(),
        },
        info_blocks: vec![InfoBlock::Usage {
            name: TranslationString::text(format!("{name} usage")),
        }],
        icon_path: None,
    }
}

/// In-memory catalog source.
#[derive(Clone)]
pub struct FakeSource {
    pub updated_at: String,
    pub items: Vec<Item>,
    /// Index of an item whose fetch fails.
    pub fail_at: Option<usize>,
    /// Whether `repo_info` fails, as when offline.
    pub offline: bool,
    pub info_calls: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new(updated_at: &str, items: Vec<Item>) -> Self {
        Self {
            updated_at: updated_at.to_string(),
            items,
            fail_at: None,
            offline: false,
            info_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn listing_for(item: &Item) -> Listing {
        Listing {
            data: format!("/items/{}/{}.json", item.category, item.id),
            icon: Some(format!("/icons/{}/{}.png", item.category, item.id)),
            name: Some(item.name.clone()),
            color: Some(item.color.clone()),
            status: Some(item.status.clone()),
        }
    }
}

impl CatalogSource for FakeSource {
    fn repo_info(&self) -> Result<RepoInfo> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(CatalogError::Api {
                status: 0,
                message: "offline".into(),
            });
        }
        Ok(RepoInfo {
            updated_at: self.updated_at.clone(),
        })
    }

    fn listings(&self) -> Result<Vec<Listing>> {
        Ok(self.items.iter().map(Self::listing_for).collect())
    }

    fn item(&self, listing: &Listing) -> Result<Item> {
        let position = self
            .items
            .iter()
            .position(|item| Self::listing_for(item).data == listing.data)
            .ok_or_else(|| CatalogError::NotFound {
                message: listing.data.clone(),
            })?;
        if self.fail_at == Some(position) {
            return Err(CatalogError::NotFound {
                message: listing.data.clone(),
            });
        }
        let mut item = self.items[position].clone();
        item.icon_path = listing.icon.clone();
        Ok(item)
    }
}
