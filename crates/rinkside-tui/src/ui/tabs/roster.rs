use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use rinkside_core::services::seasons;
use rinkside_core::utils::{format_date, format_phone, truncate_string};

use crate::app::{App, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_roster_list(frame, app, chunks[0]);
    render_player_card(frame, app, chunks[1]);
}

fn render_roster_list(frame: &mut Frame, app: &App, area: Rect) {
    let roster = app.current_roster();
    let items: Vec<ListItem> = roster
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let jersey = entry
                .jersey_number()
                .map(|n| format!("#{:<3}", n))
                .unwrap_or_else(|| "    ".to_string());
            let position = entry.position().map(|p| p.abbreviation()).unwrap_or("");
            let line = Line::from(vec![
                Span::raw(format!(
                    "{} {:<24} {:<3} ",
                    jersey,
                    truncate_string(&entry.player.full_name(), 24),
                    position
                )),
                Span::styled(
                    entry.status().to_string(),
                    styles::season_player_status_style(entry.status()),
                ),
            ]);
            let style = if i == app.roster_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let title = match app.current_season() {
        Some(season) => {
            let counts = seasons::count_statuses(roster);
            format!(
                " {} ({} active / {}) ",
                season.name, counts.active, counts.total
            )
        }
        None => " Roster ".to_string(),
    };

    let focused = matches!(app.focus, Focus::List);
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if app.current_season().is_none() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "No season for this team yet",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    state.select(Some(app.roster_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_player_card(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let entry = app.current_roster().get(app.roster_selection);

    let (title, lines) = match entry {
        Some(entry) => {
            let player = &entry.player;
            let mut lines = vec![];
            let field = |label: &'static str, value: String| {
                Line::from(vec![
                    Span::styled(format!("{:<10}", label), styles::highlight_style()),
                    Span::raw(value),
                ])
            };
            lines.push(field("Status", entry.status().to_string()));
            lines.push(field("Position", player.position_display()));
            if let Some(dob) = player.date_of_birth {
                let age = player.age().map(|a| format!(" (age {})", a)).unwrap_or_default();
                lines.push(field("Born", format!("{}{}", format_date(&dob), age)));
            }
            if let Some(ref email) = player.email {
                lines.push(field("Email", email.clone()));
            }
            if let Some(ref phone) = player.phone {
                lines.push(field("Phone", format_phone(phone)));
            }
            if player.parent_name.is_some() || player.parent_phone.is_some() {
                lines.push(Line::from(""));
                lines.push(field("Parent", player.parent_name.clone().unwrap_or_default()));
                if let Some(ref phone) = player.parent_phone {
                    lines.push(field("", format_phone(phone)));
                }
                if let Some(ref email) = player.parent_email {
                    lines.push(field("", email.clone()));
                }
            }
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("[s]", styles::help_key_style()),
                Span::styled(" cycle active / injured / suspended", styles::muted_style()),
            ]));
            (format!(" {} ", player.full_name()), lines)
        }
        None => (
            " Player ".to_string(),
            vec![Line::from(Span::styled(
                "Select a player from the roster",
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
