use super::state::{AppScreen, AppState};
use crate::repository::CatalogSource;

/// Process the current state (e.g., check for updates or load the cache).
pub fn process_state<S>(state: &mut AppState<S>)
where
    S: CatalogSource + Clone + Send + 'static,
{
    match state.screen {
        AppScreen::CheckingUpdates => {
            if state.offline {
                state.screen = AppScreen::LoadingItems;
            } else if state.check_rx.is_none() {
                if let Err(e) = state.start_check() {
                    state.set_error(format!("Update check failed: {e}"));
                    state.screen = AppScreen::LoadingItems;
                }
            } else {
                match state.poll_check() {
                    Some(Ok(true)) => state.screen = AppScreen::UpdatePrompt,
                    Some(Ok(false)) => state.screen = AppScreen::LoadingItems,
                    Some(Err(e)) => {
                        state.set_error(format!("Update check failed: {e}"));
                        state.screen = AppScreen::LoadingItems;
                    }
                    None => {}
                }
            }
        }
        AppScreen::Updating => match state.poll_update() {
            Some(Ok(snapshot)) => {
                match state.repo.apply(&snapshot) {
                    Ok(()) => state.clear_error(),
                    Err(e) => state.set_error(format!("Failed to store catalog: {e}")),
                }
                state.screen = AppScreen::LoadingItems;
            }
            Some(Err(e)) => {
                state.set_error(format!("Update failed: {e}"));
                state.screen = AppScreen::LoadingItems;
            }
            None => {}
        },
        AppScreen::LoadingItems => {
            match state.load_items() {
                Ok(()) => {
                    if state.items.is_empty() && state.error_message.is_none() {
                        state.set_error("Catalog is empty, press u to download it".into());
                    }
                }
                Err(e) => state.set_error(e),
            }
            state.screen = AppScreen::ItemList;
        }
        _ => {}
    }
}
