use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use rinkside_core::services::{seasons, tryouts};
use rinkside_core::utils::{format_date, truncate_string};

use crate::app::{App, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_team_list(frame, app, chunks[0]);
    render_team_detail(frame, app, chunks[1]);
}

fn render_team_list(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.config.active_team_id;
    let items: Vec<ListItem> = app
        .teams
        .iter()
        .enumerate()
        .map(|(i, team)| {
            let marker = if Some(team.id) == active { "*" } else { " " };
            let line = Line::from(format!(
                "{} {:<24} {}",
                marker,
                truncate_string(&team.name, 24),
                team.age_group.as_deref().unwrap_or("")
            ));
            let style = if i == app.team_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let focused = matches!(app.focus, Focus::List);
    let block = Block::default()
        .title(format!(" Teams ({}) ", app.teams.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    state.select(Some(app.team_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_team_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);

    let (title, lines) = match app.selected_team() {
        Some(team) => {
            let mut lines = vec![];
            let field = |label: &'static str, value: String| {
                Line::from(vec![
                    Span::styled(format!("{:<12}", label), styles::highlight_style()),
                    Span::raw(value),
                ])
            };
            lines.push(field("Age group", team.age_group.clone().unwrap_or_else(|| "-".to_string())));
            lines.push(field("Level", team.level.clone().unwrap_or_else(|| "-".to_string())));
            if let Some(ref year) = team.season_year {
                lines.push(field("Year", year.clone()));
            }
            if let Some(ref description) = team.description {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(description.clone(), styles::muted_style())));
            }

            lines.push(Line::from(""));
            let team_tryouts = app.team_tryouts();
            let open = team_tryouts.iter().filter(|t| !t.status.is_closed()).count();
            lines.push(field("Tryouts", format!("{} ({} open)", team_tryouts.len(), open)));
            for tryout in team_tryouts.iter().filter(|t| !t.status.is_closed()) {
                let summary = app
                    .registrations
                    .get(&tryout.id)
                    .map(|regs| tryouts::summarize(regs))
                    .unwrap_or_default();
                lines.push(Line::from(vec![
                    Span::raw(format!("  {} ", tryout.name)),
                    Span::styled(
                        format!("{} registered", summary.active()),
                        styles::muted_style(),
                    ),
                ]));
            }

            lines.push(Line::from(""));
            match app.current_season() {
                Some(season) => {
                    let counts = seasons::count_statuses(app.current_roster());
                    lines.push(field("Season", season.name.clone()));
                    lines.push(field("Started", format_date(&season.start_date)));
                    lines.push(field(
                        "Roster",
                        format!(
                            "{} players ({} injured, {} suspended)",
                            counts.total, counts.injured, counts.suspended
                        ),
                    ));
                }
                None => lines.push(Line::from(Span::styled(
                    "No season yet. Complete a tryout to start one.",
                    styles::muted_style(),
                ))),
            }

            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("[Enter]", styles::help_key_style()),
                Span::styled(" make active  ", styles::muted_style()),
                Span::styled("[D]", styles::help_key_style()),
                Span::styled(" delete team", styles::muted_style()),
            ]));
            (format!(" {} ", team.display_name()), lines)
        }
        None => (
            " No Team Selected ".to_string(),
            vec![Line::from(Span::styled(
                "No teams yet. Press [r] to refresh.",
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
