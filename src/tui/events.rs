use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

use super::state::{AppScreen, AppState};
use crate::repository::CatalogSource;

/// Main event handler that dispatches to the appropriate screen handler.
pub fn handle_event<S>(event: Event, state: &mut AppState<S>)
where
    S: CatalogSource + Clone + Send + 'static,
{
    if let Event::Key(key_event) = event {
        if key_event.code == KeyCode::Char('q')
            && !state.filter_editing
            && key_event.modifiers == KeyModifiers::NONE
        {
            state.should_quit = true;
            return;
        }
        if key_event.code == KeyCode::Char('c') && key_event.modifiers == KeyModifiers::CONTROL {
            state.should_quit = true;
            return;
        }

        match state.screen {
            AppScreen::UpdatePrompt => handle_update_prompt(key_event, state),
            AppScreen::ItemList if state.filter_editing => handle_filter_input(key_event, state),
            AppScreen::ItemList => handle_item_list(key_event, state),
            AppScreen::ItemDetail => handle_item_detail(key_event, state),
            _ => {}
        }
    }
}

fn handle_update_prompt<S>(event: KeyEvent, state: &mut AppState<S>)
where
    S: CatalogSource + Clone + Send + 'static,
{
    match event.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            state.clear_error();
            state.start_update();
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            state.screen = AppScreen::LoadingItems;
        }
        _ => {}
    }
}

fn handle_item_list<S: CatalogSource>(event: KeyEvent, state: &mut AppState<S>) {
    match event.code {
        KeyCode::Up => {
            if state.selected_row > 0 {
                state.selected_row -= 1;
            }
        }
        KeyCode::Down => {
            if state.selected_row < state.rows.len().saturating_sub(1) {
                state.selected_row += 1;
            }
        }
        KeyCode::PageUp => {
            state.selected_row = state.selected_row.saturating_sub(10);
        }
        KeyCode::PageDown => {
            state.selected_row = (state.selected_row + 10).min(state.rows.len().saturating_sub(1));
        }
        KeyCode::Home => {
            state.selected_row = 0;
        }
        KeyCode::End => {
            state.selected_row = state.rows.len().saturating_sub(1);
        }
        KeyCode::Enter | KeyCode::Right => {
            state.activate_selected();
        }
        KeyCode::Char('e') => {
            state.expand_all();
        }
        KeyCode::Char('c') => {
            state.collapse_all();
        }
        KeyCode::Char('u') => {
            state.clear_error();
            state.offline = false;
            state.screen = AppScreen::CheckingUpdates;
        }
        KeyCode::Char('/') => {
            state.filter_editing = true;
        }
        KeyCode::Esc => {
            if !state.filter.is_empty() {
                state.filter.clear();
                state.rebuild_rows();
            }
        }
        _ => {}
    }
}

fn handle_filter_input<S: CatalogSource>(event: KeyEvent, state: &mut AppState<S>) {
    match event.code {
        KeyCode::Char(c) => {
            state.filter.push(c);
            state.selected_row = 0;
            state.rebuild_rows();
        }
        KeyCode::Backspace => {
            state.filter.pop();
            state.rebuild_rows();
        }
        KeyCode::Enter => {
            state.filter_editing = false;
        }
        KeyCode::Esc => {
            state.filter_editing = false;
            state.filter.clear();
            state.rebuild_rows();
        }
        _ => {}
    }
}

fn handle_item_detail<S: CatalogSource>(event: KeyEvent, state: &mut AppState<S>) {
    match event.code {
        KeyCode::Up => {
            state.detail_scroll = state.detail_scroll.saturating_sub(1);
        }
        KeyCode::Down => {
            state.detail_scroll = state.detail_scroll.saturating_add(1);
        }
        KeyCode::PageUp => {
            state.detail_scroll = state.detail_scroll.saturating_sub(10);
        }
        KeyCode::PageDown => {
            state.detail_scroll = state.detail_scroll.saturating_add(10);
        }
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Left => {
            state.selected_item = None;
            state.screen = AppScreen::ItemList;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::state::tests::{sample, TestSource};

    fn press(state: &mut AppState<TestSource>, code: KeyCode) {
        handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)), state);
    }

    fn type_text(state: &mut AppState<TestSource>, text: &str) {
        for c in text.chars() {
            press(state, KeyCode::Char(c));
        }
    }

    fn on_list() -> AppState<TestSource> {
        let mut state = sample();
        state.screen = AppScreen::ItemList;
        state
    }

    #[test]
    fn q_quits_from_the_list() {
        let mut state = on_list();
        press(&mut state, KeyCode::Char('q'));
        assert!(state.should_quit);
    }

    #[test]
    fn q_goes_into_the_filter_while_editing() {
        let mut state = on_list();
        press(&mut state, KeyCode::Char('/'));
        assert!(state.filter_editing);

        type_text(&mut state, "aq");
        assert!(!state.should_quit);
        assert_eq!(state.filter, "aq");

        handle_event(
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            &mut state,
        );
        assert!(state.should_quit);
    }

    #[test]
    fn filter_input_edits_and_finishes() {
        let mut state = on_list();
        press(&mut state, KeyCode::Char('/'));
        type_text(&mut state, "pistx");
        press(&mut state, KeyCode::Backspace);
        assert_eq!(state.filter, "pist");
        assert_eq!(state.rows.len(), 2);

        press(&mut state, KeyCode::Enter);
        assert!(!state.filter_editing);
        assert_eq!(state.filter, "pist");

        // Esc on the list clears a finished filter.
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.filter, "");
        assert_eq!(state.rows.len(), 2);
    }

    #[test]
    fn esc_while_editing_drops_the_filter() {
        let mut state = on_list();
        press(&mut state, KeyCode::Char('/'));
        type_text(&mut state, "vest");
        press(&mut state, KeyCode::Esc);

        assert!(!state.filter_editing);
        assert_eq!(state.filter, "");
    }

    #[test]
    fn list_navigation_stays_in_bounds() {
        let mut state = on_list();
        press(&mut state, KeyCode::Up);
        assert_eq!(state.selected_row, 0);

        press(&mut state, KeyCode::End);
        assert_eq!(state.selected_row, 1);
        press(&mut state, KeyCode::Down);
        assert_eq!(state.selected_row, 1);

        press(&mut state, KeyCode::Home);
        assert_eq!(state.selected_row, 0);
        press(&mut state, KeyCode::PageDown);
        assert_eq!(state.selected_row, 1);
    }

    #[test]
    fn expand_and_collapse_keys() {
        let mut state = on_list();
        press(&mut state, KeyCode::Char('e'));
        assert_eq!(state.rows.len(), 5);

        press(&mut state, KeyCode::Char('c'));
        assert_eq!(state.rows.len(), 2);

        press(&mut state, KeyCode::Enter);
        assert_eq!(state.rows.len(), 3);
    }

    #[test]
    fn u_restarts_the_update_check() {
        let mut state = on_list();
        state.error_message = Some("old".into());
        press(&mut state, KeyCode::Char('u'));

        assert_eq!(state.screen, AppScreen::CheckingUpdates);
        assert!(!state.offline);
        assert_eq!(state.error_message, None);
    }

    #[test]
    fn detail_opens_scrolls_and_closes() {
        for back in [KeyCode::Esc, KeyCode::Backspace, KeyCode::Left] {
            let mut state = on_list();
            press(&mut state, KeyCode::Enter);
            press(&mut state, KeyCode::Down);
            press(&mut state, KeyCode::Enter);
            assert_eq!(state.screen, AppScreen::ItemDetail);

            press(&mut state, KeyCode::PageDown);
            press(&mut state, KeyCode::Up);
            assert_eq!(state.detail_scroll, 9);

            press(&mut state, back);
            assert_eq!(state.screen, AppScreen::ItemList);
            assert!(state.selected_item.is_none());
        }
    }

    #[test]
    fn update_prompt_answers() {
        for no in [KeyCode::Char('n'), KeyCode::Esc] {
            let mut state = sample();
            state.screen = AppScreen::UpdatePrompt;
            press(&mut state, no);
            assert_eq!(state.screen, AppScreen::LoadingItems);
        }

        for yes in [KeyCode::Char('y'), KeyCode::Enter] {
            let mut state = sample();
            state.screen = AppScreen::UpdatePrompt;
            press(&mut state, yes);
            assert_eq!(state.screen, AppScreen::Updating);
            assert!(state.update_rx.is_some());
        }
    }
}
