use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};

use super::state::{AppScreen, AppState, ListRow};
use crate::models::Item;
use crate::render::{rank_color, render_blocks, LineKind, RenderedLine, Rgb};

const TITLE: &str = "STALCRAFT Catalog";

/// Main render function that dispatches to the appropriate screen renderer.
pub fn render<S>(f: &mut Frame, state: &AppState<S>) {
    match state.screen {
        AppScreen::CheckingUpdates => render_loading(f, state, "Checking for updates"),
        AppScreen::UpdatePrompt => {
            render_item_list(f, state);
            render_update_prompt(f);
        }
        AppScreen::Updating => {
            render_item_list(f, state);
            render_progress(f, state);
        }
        AppScreen::LoadingItems => render_loading(f, state, "Loading catalog"),
        AppScreen::ItemList => render_item_list(f, state),
        AppScreen::ItemDetail => render_item_detail(f, state),
    }
}

fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

fn title_bar(text: impl Into<String>) -> Paragraph<'static> {
    Paragraph::new(text.into())
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
}

fn help_bar(text: &'static str) -> Paragraph<'static> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
}

/// Render the loading screen.
fn render_loading<S>(f: &mut Frame, state: &AppState<S>, message: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(f.area());

    f.render_widget(title_bar(TITLE), chunks[0]);

    let loading = Paragraph::new(format!("{}...", message))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(loading, chunks[1]);

    render_status_bar(f, chunks[3], state);
}

/// Render the category tree.
fn render_item_list<S>(f: &mut Frame, state: &AppState<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(2),
        ])
        .split(f.area());

    let title_text = if state.filter.is_empty() && !state.filter_editing {
        format!("{TITLE} | {} items", state.items.len())
    } else {
        let cursor = if state.filter_editing { "_" } else { "" };
        format!("{TITLE} | Filter: {}{cursor}", state.filter)
    };
    f.render_widget(title_bar(title_text), chunks[0]);

    // Rows inside borders and header.
    let visible_row_limit = chunks[1].height.saturating_sub(4).max(1) as usize;
    let visible_start = state
        .selected_row
        .saturating_sub(visible_row_limit.saturating_sub(1));
    let lang = state.options.language.as_str();

    let rows: Vec<Row> = state
        .rows
        .iter()
        .enumerate()
        .skip(visible_start)
        .take(visible_row_limit)
        .map(|(i, row)| {
            let selected = i == state.selected_row;
            let row = match row {
                ListRow::Category {
                    name,
                    count,
                    expanded,
                } => {
                    let marker = if *expanded { "▾" } else { "▸" };
                    Row::new(vec![
                        Cell::from(format!("{marker} {name}")),
                        Cell::from(""),
                        Cell::from(count.to_string()),
                    ])
                    .style(Style::default().add_modifier(Modifier::BOLD))
                }
                ListRow::Item(index) => match state.items.get(*index) {
                    Some(item) => item_row(item, lang),
                    None => Row::new(vec![Cell::from("")]),
                },
            };
            if selected {
                row.style(
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(30),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(
        Row::new(vec!["Name", "Rarity", "Id"])
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1),
    )
    .block(Block::default().borders(Borders::ALL).title(" Items "));
    f.render_widget(table, chunks[1]);

    let help = if state.filter_editing {
        help_bar("Type to filter | Enter: Done | Esc: Clear")
    } else {
        help_bar("Enter: Open | e: Expand all | c: Collapse all | /: Filter | u: Update | q: Quit")
    };
    f.render_widget(help, chunks[2]);

    render_status_bar(f, chunks[3], state);
}

fn item_row(item: &Item, lang: &str) -> Row<'static> {
    let rank = item.rank();
    Row::new(vec![
        Cell::from(format!("    {}", item.display_name(lang))),
        Cell::from(Span::styled(
            rank.label(),
            Style::default().fg(rgb(rank_color(rank))),
        )),
        Cell::from(item.id.clone()),
    ])
}

/// Render the detail screen of the selected item.
fn render_item_detail<S>(f: &mut Frame, state: &AppState<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(2),
        ])
        .split(f.area());

    let Some(item) = state.selected_item.as_ref() else {
        f.render_widget(title_bar("No item selected"), chunks[0]);
        render_status_bar(f, chunks[5], state);
        return;
    };
    let lang = state.options.language.as_str();

    f.render_widget(title_bar(item.display_name(lang).to_string()), chunks[0]);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(chunks[1]);
    let rank = item.rank();
    let card = |title: &'static str, text: String, color: Color| {
        Paragraph::new(Span::styled(text, Style::default().fg(color)))
            .block(Block::default().borders(Borders::ALL).title(format!(" {title} ")))
    };
    f.render_widget(
        card("Rarity", rank.label().to_string(), rgb(rank_color(rank))),
        cards[0],
    );
    f.render_widget(card("Category", item.category.clone(), Color::White), cards[1]);
    f.render_widget(
        card("Status", item.status.state.clone(), Color::White),
        cards[2],
    );

    let icon = item
        .icon_path
        .as_deref()
        .map(|path| state.icon_url(path))
        .unwrap_or_else(|| "no icon".to_string());
    f.render_widget(
        Paragraph::new(format!(" {} | {icon}", item.id)).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );

    let lines: Vec<Line> = render_blocks(&item.info_blocks, &state.options)
        .iter()
        .map(styled_line)
        .collect();
    let body = if lines.is_empty() {
        Paragraph::new("No characteristics")
    } else {
        Paragraph::new(lines)
    };
    f.render_widget(
        body.wrap(Wrap { trim: false })
            .scroll((state.detail_scroll, 0))
            .block(Block::default().borders(Borders::ALL).title(" Characteristics ")),
        chunks[3],
    );

    f.render_widget(help_bar("Up/Down: Scroll | Esc: Back | q: Quit"), chunks[4]);
    render_status_bar(f, chunks[5], state);
}

fn styled_line(line: &RenderedLine) -> Line<'static> {
    let indent = Span::raw("  ".repeat(line.depth));
    match line.kind {
        LineKind::Header => Line::from(vec![
            indent,
            Span::styled(
                line.label.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
        ]),
        LineKind::Note => Line::from(vec![
            indent,
            Span::styled(line.label.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        LineKind::Entry => {
            let value_style = match line.value_color {
                Some(color) => Style::default().fg(rgb(color)),
                None => Style::default(),
            };
            Line::from(vec![
                indent,
                Span::styled(line.label.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(line.value.clone().unwrap_or_default(), value_style),
            ])
        }
    }
}

/// A rectangle centred in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_update_prompt(f: &mut Frame) {
    let area = centered(f.area(), 50, 5);
    let prompt = Paragraph::new(vec![
        Line::from("A newer catalog is available."),
        Line::from("Download it now? (y/n)"),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Update "),
    );
    f.render_widget(Clear, area);
    f.render_widget(prompt, area);
}

fn render_progress<S>(f: &mut Frame, state: &AppState<S>) {
    let area = centered(f.area(), 60, 3);
    let (done, total) = state.progress;
    let ratio = if total == 0 {
        0.0
    } else {
        (done as f64 / total as f64).clamp(0.0, 1.0)
    };
    let label = if total == 0 {
        "Fetching listing...".to_string()
    } else {
        format!("{done} / {total}")
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Downloading "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio)
        .label(label);
    f.render_widget(Clear, area);
    f.render_widget(gauge, area);
}

/// Render the status bar at the bottom.
fn render_status_bar<S>(f: &mut Frame, area: Rect, state: &AppState<S>) {
    let status_text = if let Some(ref error) = state.error_message {
        format!(" Error: {}", error)
    } else {
        match &state.last_update {
            Some(date) if !date.is_empty() => format!(" Catalog updated {date}"),
            _ => " Catalog not downloaded yet".to_string(),
        }
    };

    let style = if state.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };

    let status = Paragraph::new(status_text)
        .style(style)
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(status, area);
}
