use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, LoginFocus, Tab};

use super::styles;
use super::tabs::{players, roster, teams, tryouts};

const LOGO: [&str; 3] = [
    "   ╦═╗╦╔╗╔╦╔═╔═╗╦╔╦╗╔═╗",
    "   ╠╦╝║║║║╠╩╗╚═╗║ ║║║╣ ",
    "   ╩╚═╩╝╚╝╩ ╩╚═╝╩═╩╝╚═╝",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_confirm_overlay(
            frame,
            vec![Line::from(Span::styled(
                "   Are you sure you want to quit?",
                styles::highlight_style(),
            ))],
            "quit",
        ),
        AppState::ConfirmingCompleteTryout => {
            let tryout = app.selected_tryout().map(|t| t.name.clone()).unwrap_or_default();
            let active = app
                .tryout_registrations()
                .iter()
                .filter(|r| !r.status.is_cancelled())
                .count();
            render_confirm_overlay(
                frame,
                vec![
                    Line::from(Span::styled(
                        format!("   Complete {}?", tryout),
                        styles::highlight_style(),
                    )),
                    Line::from(Span::styled(
                        format!("   Creates {}", app.completion_season_name()),
                        styles::muted_style(),
                    )),
                    Line::from(Span::styled(
                        format!("   with {} active players", active),
                        styles::muted_style(),
                    )),
                ],
                "complete",
            )
        }
        AppState::ConfirmingDeleteTeam => {
            let team = app.selected_team().map(|t| t.name.clone()).unwrap_or_default();
            render_confirm_overlay(
                frame,
                vec![
                    Line::from(Span::styled(
                        format!("   Delete {}?", team),
                        styles::error_style(),
                    )),
                    Line::from(Span::styled(
                        "   Tryouts, seasons and games go with it.",
                        styles::muted_style(),
                    )),
                ],
                "delete",
            )
        }
        AppState::Normal | AppState::Searching | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Rinkside";
    let coach = app
        .coach
        .as_ref()
        .map(|c| format!("  {}", c.full_name()))
        .unwrap_or_default();
    let help_hint = "[?] Help";

    let used = title.len() + coach.chars().count() + help_hint.len() + 4;
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::styled(coach, styles::muted_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        if *tab == app.current_tab {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Teams => teams::render(frame, app, area),
        Tab::Tryouts => tryouts::render(frame, app, area),
        Tab::Roster => roster::render(frame, app, area),
        Tab::Players => players::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = if app.offline_mode {
        "OFFLINE | [o]nline | [q]uit"
    } else {
        "[r]efresh | [o]ffline | [q]uit"
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" Updated {} ", app.cache_ages.last_updated()),
    };
    let left_style = if left_text.trim_start().starts_with("Error") {
        styles::error_style()
    } else {
        styles::muted_style()
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|l| Line::from(Span::styled(*l, styles::title_style())))
        .collect()
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 30, frame.area());
    frame.render_widget(Clear, area);

    let mut help_text = logo_lines();
    help_text.push(Line::from(Span::styled(
        format!("          version {}", env!("CARGO_PKG_VERSION")),
        styles::muted_style(),
    )));
    help_text.extend([
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-4", "Switch tabs"),
        help_line("←/→", "Previous/next tab"),
        help_line("Tab", "Switch focus (list ↔ detail)"),
        help_line("↑/↓ j/k", "Navigate list"),
        help_line("PgUp/PgDn", "Scroll a page"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("r", "Refresh data from the server"),
        help_line("o", "Toggle offline mode"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Teams / Tryouts / Roster", styles::highlight_style())),
        help_line("Enter", "Make the team active"),
        help_line("D", "Delete the team and its data"),
        help_line("s", "Cycle registration or player status"),
        help_line("c", "Complete tryout into a new season"),
        Line::from(""),
        Line::from(Span::styled(" Players", styles::highlight_style())),
        help_line("/", "Search"),
        help_line("n/p/#/a", "Sort by name/position/jersey/age"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(52, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));

    let field_style = |focused: bool| {
        if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        }
    };

    // Show the tail of long emails so the cursor stays visible
    let email_focused = app.login_focus == LoginFocus::Email;
    let email_tail: String = {
        let count = app.login_email.chars().count();
        app.login_email.chars().skip(count.saturating_sub(28)).collect()
    };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Email:    [", styles::muted_style()),
        Span::styled(
            format!("{:<28}{}", email_tail, if email_focused { "▌" } else { "" }),
            field_style(email_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    let password_focused = app.login_focus == LoginFocus::Password;
    let masked = "*".repeat(app.login_password.chars().count().min(28));
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(
            format!("{:<28}{}", masked, if password_focused { "▌" } else { "" }),
            field_style(password_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    let button_focused = app.login_focus == LoginFocus::Button;
    let label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("                ["),
        Span::styled(label, field_style(button_focused)),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Yes/no dialog with the given message lines
fn render_confirm_overlay(frame: &mut Frame, message: Vec<Line<'static>>, action: &str) {
    let height = 9 + message.len() as u16;
    let area = centered_rect_fixed(52, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.extend(message);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("   Press ", styles::muted_style()),
        Span::styled("[Y]", styles::help_key_style()),
        Span::styled(format!(" to {}, ", action), styles::muted_style()),
        Span::styled("[N]", styles::help_key_style()),
        Span::styled(" to cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
