use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use rinkside_core::models::PlayerSortColumn;
use rinkside_core::utils::{format_phone, truncate_string};

use crate::app::{App, AppState, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_player_list(frame, app, chunks[0]);
    render_player_detail(frame, app, chunks[1]);
}

fn sort_header(app: &App) -> String {
    let arrow = if app.player_sort_ascending { "▲" } else { "▼" };
    [
        PlayerSortColumn::Name,
        PlayerSortColumn::Position,
        PlayerSortColumn::Jersey,
        PlayerSortColumn::Age,
    ]
    .iter()
    .map(|c| {
        if *c == app.player_sort_column {
            format!("{}{}", c.label(), arrow)
        } else {
            c.label().to_string()
        }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

fn render_player_list(frame: &mut Frame, app: &App, area: Rect) {
    let players = app.get_sorted_players();
    let items: Vec<ListItem> = players
        .iter()
        .enumerate()
        .map(|(i, player)| {
            let age = player.age().map(|a| a.to_string()).unwrap_or_default();
            let line = Line::from(format!(
                "{:<26} {:<4} {:<4} {}",
                truncate_string(&player.display_name(), 26),
                player.position.map(|p| p.abbreviation()).unwrap_or(""),
                player.jersey_display(),
                age
            ));
            let style = if i == app.player_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let mut title = vec![Span::styled(
        format!(" Players ({}) ", players.len()),
        styles::title_style(),
    )];
    if matches!(app.state, AppState::Searching) || !app.search_query.is_empty() {
        title.push(Span::styled(
            format!("/{} ", app.search_query),
            styles::search_style(),
        ));
    }
    title.push(Span::styled(format!("[{}] ", sort_header(app)), styles::muted_style()));

    let focused = matches!(app.focus, Focus::List);
    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    state.select(Some(app.player_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_player_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let players = app.get_sorted_players();

    let (title, lines) = match players.get(app.player_selection) {
        Some(player) => {
            let mut lines = vec![];
            let field = |label: &'static str, value: String| {
                Line::from(vec![
                    Span::styled(format!("{:<10}", label), styles::highlight_style()),
                    Span::raw(value),
                ])
            };
            lines.push(field("Position", player.position_display()));
            lines.push(field("Jersey", player.jersey_display()));
            if let Some(shoots) = player.shoots {
                lines.push(field("Shoots", format!("{:?}", shoots)));
            }
            if let Some(ref email) = player.email {
                lines.push(field("Email", email.clone()));
            }
            if let Some(ref phone) = player.phone {
                lines.push(field("Phone", format_phone(phone)));
            }
            if let Some(ref parent) = player.parent_name {
                lines.push(field("Parent", parent.clone()));
            }
            if let Some(ref notes) = player.notes {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(notes.clone(), styles::muted_style())));
            }
            (format!(" {} ", player.full_name()), lines)
        }
        None => (
            " Player ".to_string(),
            vec![Line::from(Span::styled(
                if app.players.is_empty() {
                    "No players yet. Import a CSV with --import-csv."
                } else {
                    "No players match the search"
                },
                styles::muted_style(),
            ))],
        ),
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
