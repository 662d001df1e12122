use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::client::join_url;
use crate::render::RenderOptions;
use crate::repository::{
    fetch_catalog, remote_is_newer, CatalogSnapshot, CatalogSource, ItemRepository,
};
use crate::{CatalogError, Config, Item};

/// Represents the current screen being displayed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AppScreen {
    /// Comparing the remote timestamp with the cached one.
    CheckingUpdates,
    /// Asking whether to download a newer catalog.
    UpdatePrompt,
    /// Catalog download in progress.
    Updating,
    /// Reading the cached catalog.
    LoadingItems,
    /// Category tree with item rows.
    ItemList,
    /// Info blocks of the selected item.
    ItemDetail,
}

/// One visible row of the item list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ListRow {
    Category {
        name: String,
        count: usize,
        expanded: bool,
    },
    /// Index into `AppState::items`.
    Item(usize),
}

/// Messages from the update worker thread.
pub(crate) enum UpdateEvent {
    Progress(usize, usize),
    Finished(crate::Result<CatalogSnapshot>),
}

/// Main application state.
pub struct AppState<S> {
    /// Current screen being displayed.
    pub(crate) screen: AppScreen,
    pub(crate) repo: ItemRepository<S>,
    pub(crate) options: RenderOptions,
    /// Base URL icon paths are resolved against.
    pub(crate) icon_base: String,
    /// Skip the update check on start.
    pub(crate) offline: bool,

    /// Cached items, ordered by category then id.
    pub(crate) items: Vec<Item>,
    /// Expanded category names.
    pub(crate) expanded: HashSet<String>,
    /// Flattened rows for the current expansion and filter.
    pub(crate) rows: Vec<ListRow>,
    /// Currently selected row in the list.
    pub(crate) selected_row: usize,
    /// Name filter (case-insensitive substring).
    pub(crate) filter: String,
    /// Whether keystrokes go to the filter input.
    pub(crate) filter_editing: bool,

    /// Item shown on the detail screen.
    pub(crate) selected_item: Option<Item>,
    /// Vertical scroll of the detail screen.
    pub(crate) detail_scroll: u16,

    /// Pending answer of the background update check.
    pub(crate) check_rx: Option<Receiver<bool>>,
    /// Update progress as (done, total).
    pub(crate) progress: (usize, usize),
    pub(crate) update_rx: Option<Receiver<UpdateEvent>>,
    /// Last applied update, `dd.mm.yyyy`.
    pub(crate) last_update: Option<String>,

    /// Error message to display.
    pub(crate) error_message: Option<String>,
    /// Should the application quit?
    pub should_quit: bool,
}

impl<S> AppState<S> {
    pub(crate) fn icon_url(&self, path: &str) -> String {
        join_url(&self.icon_base, path)
    }
}

impl<S: CatalogSource> AppState<S> {
    pub fn new(repo: ItemRepository<S>, config: &Config, offline: bool) -> Self {
        Self {
            screen: AppScreen::CheckingUpdates,
            repo,
            options: RenderOptions::from(config),
            icon_base: config.region_url(),
            offline,
            items: Vec::new(),
            expanded: HashSet::new(),
            rows: Vec::new(),
            selected_row: 0,
            filter: String::new(),
            filter_editing: false,
            selected_item: None,
            detail_scroll: 0,
            check_rx: None,
            progress: (0, 0),
            update_rx: None,
            last_update: None,
            error_message: None,
            should_quit: false,
        }
    }

    /// Load the cached catalog and rebuild the list.
    pub(crate) fn load_items(&mut self) -> Result<(), String> {
        self.items = self
            .repo
            .all_items()
            .map_err(|e| format!("Failed to load cached items: {e}"))?;
        self.last_update = self
            .repo
            .last_update_display()
            .map_err(|e| format!("Failed to read last update: {e}"))?;
        self.rebuild_rows();
        Ok(())
    }

    /// Recompute visible rows after a change of items, expansion or filter.
    pub(crate) fn rebuild_rows(&mut self) {
        let needle = self.filter.to_lowercase();
        let filtering = !needle.is_empty();
        let lang = self.options.language.clone();

        self.rows.clear();
        let mut start = 0;
        while start < self.items.len() {
            let category = self.items[start].category.clone();
            let end = self.items[start..]
                .iter()
                .position(|item| item.category != category)
                .map_or(self.items.len(), |offset| start + offset);

            let matching: Vec<usize> = (start..end)
                .filter(|&i| {
                    !filtering
                        || self.items[i]
                            .display_name(&lang)
                            .to_lowercase()
                            .contains(&needle)
                        || self.items[i].id.to_lowercase().contains(&needle)
                })
                .collect();

            if !matching.is_empty() {
                let expanded = filtering || self.expanded.contains(&category);
                self.rows.push(ListRow::Category {
                    name: category,
                    count: matching.len(),
                    expanded,
                });
                if expanded {
                    self.rows.extend(matching.into_iter().map(ListRow::Item));
                }
            }
            start = end;
        }

        if self.selected_row >= self.rows.len() {
            self.selected_row = self.rows.len().saturating_sub(1);
        }
    }

    pub(crate) fn toggle_category(&mut self, name: &str) {
        if !self.expanded.remove(name) {
            self.expanded.insert(name.to_string());
        }
        self.rebuild_rows();
    }

    pub(crate) fn expand_all(&mut self) {
        self.expanded = self.items.iter().map(|i| i.category.clone()).collect();
        self.rebuild_rows();
    }

    pub(crate) fn collapse_all(&mut self) {
        self.expanded.clear();
        self.selected_row = 0;
        self.rebuild_rows();
    }

    /// Open the selected row: toggle a category or show an item.
    pub(crate) fn activate_selected(&mut self) {
        match self.rows.get(self.selected_row).cloned() {
            Some(ListRow::Category { name, .. }) => self.toggle_category(&name),
            Some(ListRow::Item(index)) => {
                self.selected_item = self.items.get(index).cloned();
                self.detail_scroll = 0;
                self.screen = AppScreen::ItemDetail;
            }
            None => {}
        }
    }

    /// Drain worker messages; returns the outcome once the worker is done.
    pub(crate) fn poll_update(&mut self) -> Option<crate::Result<CatalogSnapshot>> {
        let rx = self.update_rx.as_ref()?;
        loop {
            match rx.try_recv() {
                Ok(UpdateEvent::Progress(done, total)) => self.progress = (done, total),
                Ok(UpdateEvent::Finished(result)) => {
                    self.update_rx = None;
                    return Some(result);
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    self.update_rx = None;
                    return Some(Err(CatalogError::WorkerStopped { task: "update" }));
                }
            }
        }
    }

    /// The update check result, once the worker has answered.
    pub(crate) fn poll_check(&mut self) -> Option<crate::Result<bool>> {
        let rx = self.check_rx.as_ref()?;
        let outcome = match rx.try_recv() {
            Ok(newer) => Ok(newer),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(CatalogError::WorkerStopped {
                task: "update check",
            }),
        };
        self.check_rx = None;
        Some(outcome)
    }

    /// Clear any error message.
    pub(crate) fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Set an error message.
    pub(crate) fn set_error(&mut self, message: String) {
        tracing::error!(%message);
        self.error_message = Some(message);
    }
}

impl<S> AppState<S>
where
    S: CatalogSource + Clone + Send + 'static,
{
    /// Ask the source for its timestamp on a worker thread.
    ///
    /// The cached timestamp is read here since the store stays on this thread.
    pub(crate) fn start_check(&mut self) -> crate::Result<()> {
        let local = self.repo.store().last_update()?;
        let (tx, rx) = mpsc::channel();
        let source = self.repo.source().clone();
        thread::spawn(move || {
            let _ = tx.send(remote_is_newer(&source, local.as_deref()));
        });
        self.check_rx = Some(rx);
        Ok(())
    }

    /// Start downloading the catalog on a worker thread.
    pub(crate) fn start_update(&mut self) {
        let (tx, rx) = mpsc::channel();
        let source = self.repo.source().clone();
        thread::spawn(move || {
            let progress_tx = tx.clone();
            let result = fetch_catalog(&source, |done, total| {
                let _ = progress_tx.send(UpdateEvent::Progress(done, total));
            });
            let _ = tx.send(UpdateEvent::Finished(result));
        });
        self.progress = (0, 0);
        self.update_rx = Some(rx);
        self.screen = AppScreen::Updating;
    }
}
