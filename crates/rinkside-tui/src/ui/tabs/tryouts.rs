use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use rinkside_core::services::tryouts;
use rinkside_core::utils::truncate_string;

use crate::app::{App, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_tryout_list(frame, app, chunks[0]);
    render_registrations(frame, app, chunks[1]);
}

fn render_tryout_list(frame: &mut Frame, app: &App, area: Rect) {
    let list_focused = matches!(app.focus, Focus::List);
    let items: Vec<ListItem> = app
        .team_tryouts()
        .iter()
        .enumerate()
        .map(|(i, tryout)| {
            let line = Line::from(vec![
                Span::raw(format!(
                    "{:<22} {:<26} ",
                    truncate_string(&tryout.name, 22),
                    tryout.date_range_display()
                )),
                Span::styled(tryout.status.to_string(), styles::tryout_status_style(tryout.status)),
            ]);
            let style = if i == app.tryout_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let team = app.selected_team().map(|t| t.name.as_str()).unwrap_or("No team");
    let block = Block::default()
        .title(format!(" Tryouts: {} ({}) ", team, app.team_tryouts().len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(list_focused));

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    state.select(Some(app.tryout_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_registrations(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);

    let (title, lines) = match app.selected_tryout() {
        Some(tryout) => {
            let registrations = app.tryout_registrations();
            let summary = tryouts::summarize(registrations);
            let mut lines = vec![];

            if let Some(ref location) = tryout.location {
                lines.push(Line::from(vec![
                    Span::styled("Location: ", styles::highlight_style()),
                    Span::raw(location.clone()),
                ]));
            }
            let capacity = tryout
                .max_players
                .map(|max| format!("{}/{}", summary.active(), max))
                .unwrap_or_else(|| summary.active().to_string());
            lines.push(Line::from(vec![
                Span::styled("Registered: ", styles::highlight_style()),
                Span::raw(format!(
                    "{} ({} confirmed, {} pending, {} cancelled)",
                    capacity, summary.confirmed, summary.pending, summary.cancelled
                )),
            ]));
            lines.push(Line::from(""));

            for (i, reg) in registrations.iter().enumerate() {
                let jersey = reg
                    .jersey_number
                    .map(|n| format!("#{:<3}", n))
                    .unwrap_or_else(|| "    ".to_string());
                let row_style = if focused && i == app.registration_selection {
                    styles::selected_style()
                } else {
                    styles::list_item_style()
                };
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {} {:<26} ", jersey, truncate_string(&app.player_name(reg.player_id), 26)),
                        row_style,
                    ),
                    Span::styled(reg.status.to_string(), styles::registration_status_style(reg.status)),
                ]));
            }
            if registrations.is_empty() {
                lines.push(Line::from(Span::styled(
                    "  No registrations yet",
                    styles::muted_style(),
                )));
            }

            lines.push(Line::from(""));
            if tryout.status.is_closed() {
                lines.push(Line::from(Span::styled(
                    format!("Tryout {}", tryout.status),
                    styles::muted_style(),
                )));
            } else {
                lines.push(Line::from(vec![
                    Span::styled("[s]", styles::help_key_style()),
                    Span::styled(" cycle status  ", styles::muted_style()),
                    Span::styled("[c]", styles::help_key_style()),
                    Span::styled(" complete into season", styles::muted_style()),
                ]));
            }
            (format!(" {} ", tryout.name), lines)
        }
        None => (
            " No Tryout Selected ".to_string(),
            vec![Line::from(Span::styled(
                "Select a tryout from the list",
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
