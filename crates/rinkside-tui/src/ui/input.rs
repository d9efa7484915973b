//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use rinkside_core::models::PlayerSortColumn;

use crate::app::{
    can_add_email_char, can_add_password_char, App, AppState, Focus, LoginFocus, Tab,
    PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key).await,
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            return Ok(match confirmation(key) {
                Some(true) => {
                    app.state = AppState::Quitting;
                    true
                }
                Some(false) => {
                    app.state = AppState::Normal;
                    false
                }
                None => false,
            });
        }
        AppState::ConfirmingCompleteTryout => {
            match confirmation(key) {
                Some(true) => app.complete_selected_tryout().await,
                Some(false) => app.state = AppState::Normal,
                None => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDeleteTeam => {
            match confirmation(key) {
                Some(true) => app.delete_selected_team().await,
                Some(false) => app.state = AppState::Normal,
                None => {}
            }
            return Ok(false);
        }
        AppState::Searching => return handle_search_input(app, key),
        AppState::Normal | AppState::Quitting => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char(c @ '1'..='4') => {
            let index = (c as usize) - ('1' as usize);
            switch_tab(app, Tab::ALL[index]);
            return Ok(false);
        }
        KeyCode::Left => {
            switch_tab(app, app.current_tab.prev());
            return Ok(false);
        }
        KeyCode::Right => {
            switch_tab(app, app.current_tab.next());
            return Ok(false);
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.focus = match app.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
            return Ok(false);
        }
        KeyCode::Char('r') => {
            app.refresh_all_background();
            return Ok(false);
        }
        KeyCode::Char('o') => {
            app.toggle_offline();
            return Ok(false);
        }
        KeyCode::Char('/') => {
            switch_tab(app, Tab::Players);
            app.state = AppState::Searching;
            return Ok(false);
        }
        _ => {}
    }

    match app.current_tab {
        Tab::Teams => handle_teams_input(app, key),
        Tab::Tryouts => handle_tryouts_input(app, key).await,
        Tab::Roster => handle_roster_input(app, key).await,
        Tab::Players => handle_players_input(app, key),
    }
    Ok(false)
}

/// `Some(true)` for yes, `Some(false)` for no, `None` for anything else
fn confirmation(key: KeyEvent) -> Option<bool> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(true),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(false),
        _ => None,
    }
}

fn switch_tab(app: &mut App, tab: Tab) {
    app.current_tab = tab;
    app.focus = Focus::List;
}

/// Apply a navigation key to a selection index. Returns false for other keys.
fn navigate(selection: &mut usize, len: usize, key: KeyCode) -> bool {
    let max_index = len.saturating_sub(1);
    match key {
        KeyCode::Up | KeyCode::Char('k') => *selection = selection.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => *selection = (*selection + 1).min(max_index),
        KeyCode::PageUp => *selection = selection.saturating_sub(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => *selection = (*selection + PAGE_SCROLL_SIZE).min(max_index),
        KeyCode::Home => *selection = 0,
        KeyCode::End => *selection = max_index,
        _ => return false,
    }
    true
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
            app.player_selection = 0;
        }
        KeyCode::Enter => {
            // Keep the query applied
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            app.player_selection = 0;
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.player_selection = 0;
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Email,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                // On failure login_error is set and the overlay stays up
                if app.attempt_login().await.is_ok() {
                    app.load_from_cache();
                    app.refresh_all_background();
                }
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.len(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.len(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_teams_input(app: &mut App, key: KeyEvent) {
    let mut selection = app.team_selection;
    if navigate(&mut selection, app.teams.len(), key.code) {
        if selection != app.team_selection {
            app.team_selection = selection;
            app.tryout_selection = 0;
            app.registration_selection = 0;
            app.roster_selection = 0;
        }
        return;
    }
    match key.code {
        KeyCode::Enter => {
            app.select_team(app.team_selection);
            if let Some(team) = app.selected_team() {
                app.status_message = Some(format!("Active team: {}", team.name));
            }
        }
        KeyCode::Char('D') => app.request_delete_team(),
        _ => {}
    }
}

async fn handle_tryouts_input(app: &mut App, key: KeyEvent) {
    match app.focus {
        Focus::List => {
            let mut selection = app.tryout_selection;
            if navigate(&mut selection, app.team_tryouts().len(), key.code) {
                if selection != app.tryout_selection {
                    app.tryout_selection = selection;
                    app.registration_selection = 0;
                }
                return;
            }
        }
        Focus::Detail => {
            let len = app.tryout_registrations().len();
            if navigate(&mut app.registration_selection, len, key.code) {
                return;
            }
        }
    }
    match key.code {
        KeyCode::Enter if app.focus == Focus::List => app.focus = Focus::Detail,
        KeyCode::Esc => app.focus = Focus::List,
        KeyCode::Char('s') => app.cycle_registration_status().await,
        KeyCode::Char('c') => app.request_complete_tryout(),
        _ => {}
    }
}

async fn handle_roster_input(app: &mut App, key: KeyEvent) {
    let len = app.current_roster().len();
    if navigate(&mut app.roster_selection, len, key.code) {
        return;
    }
    if key.code == KeyCode::Char('s') {
        app.cycle_roster_status().await;
    }
}

fn handle_players_input(app: &mut App, key: KeyEvent) {
    let len = app.get_sorted_players().len();
    if navigate(&mut app.player_selection, len, key.code) {
        return;
    }
    match key.code {
        KeyCode::Char('n') => app.toggle_player_sort(PlayerSortColumn::Name),
        KeyCode::Char('p') => app.toggle_player_sort(PlayerSortColumn::Position),
        KeyCode::Char('#') => app.toggle_player_sort(PlayerSortColumn::Jersey),
        KeyCode::Char('a') => app.toggle_player_sort(PlayerSortColumn::Age),
        KeyCode::Esc => {
            app.search_query.clear();
            app.player_selection = 0;
        }
        _ => {}
    }
}
