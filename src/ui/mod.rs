mod client_detail;
mod list;
mod popup;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use ratatui::Frame;

use crate::action::{ConfirmAction, InputMode, Tab};
use crate::app::{App, Screen};
use crate::types::Role;

pub fn render(frame: &mut Frame, app: &App) {
    let tabs_height = if app.screen == Screen::Lists { 3 } else { 0 };
    let input_height = if app.input.is_some() { 1 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(tabs_height),
            Constraint::Min(0),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.screen {
        Screen::Lists => {
            render_tabs(frame, app, chunks[1]);
            render_tab_content(frame, app, chunks[2]);
        }
        Screen::ClientDetail => client_detail::render(frame, app, chunks[2]),
    }

    if let Some((mode, buffer)) = &app.input {
        render_input(frame, *mode, buffer, chunks[3]);
    }
    render_status_bar(frame, app, chunks[4]);

    if let Some(confirm) = &app.confirm {
        let (title, message) = confirm_text(confirm);
        popup::render_confirm(frame, title, &message);
    }
    if let Some(toast) = &app.toast {
        popup::render_toast(frame, toast);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let brand = app.brand.as_deref().unwrap_or("propdesk");
    let title = match app.screen {
        Screen::Lists => format!("{} - {}", brand, app.current_tab().title()),
        Screen::ClientDetail => match &app.client {
            Some(client) => format!("{} - Client: {}", brand, client.name),
            None => format!("{} - Client", brand),
        },
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {} ({})", app.session.name, app.session.role),
            Style::default().fg(Color::Gray),
        ),
    ]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = app.tabs.iter().map(|t| t.title().to_string()).collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(app.tab_index)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_tab_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab() {
        Tab::Properties => list::render(frame, area, "Properties", &app.properties, list::property_row),
        Tab::Recommended => {
            list::render(frame, area, "Recommended", &app.recommended, list::property_row)
        }
        Tab::Contacted => list::render(frame, area, "Contacted", &app.contacted, list::contacted_row),
        Tab::Visitors => list::render(frame, area, "Visitors", &app.visitors, list::visitor_row),
        Tab::Clients => {
            let title = if app.search.is_empty() {
                "Clients".to_string()
            } else {
                format!("Clients matching \"{}\"", app.search)
            };
            list::render(frame, area, &title, &app.clients, list::client_row)
        }
        Tab::Templates => list::render(frame, area, "Templates", &app.templates, list::template_row),
        Tab::Users => list::render(frame, area, "Users", &app.users, list::user_row),
    }
}

fn render_input(frame: &mut Frame, mode: InputMode, buffer: &str, area: Rect) {
    let prompt = match mode {
        InputMode::Search => "Search: ".to_string(),
        InputMode::Activity(kind) => format!("{}: ", kind),
        InputMode::EditActivity(_) => "Edit activity: ".to_string(),
        InputMode::FollowUpDate => "Follow-up date (YYYY-MM-DD, blank = someday): ".to_string(),
    };
    let line = Line::from(vec![
        Span::styled(prompt, Style::default().fg(Color::Yellow)),
        Span::raw(buffer.to_string()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn confirm_text(confirm: &ConfirmAction) -> (&'static str, String) {
    match confirm {
        ConfirmAction::DeleteClient(id) => ("Delete client", format!("Delete client #{}?", id)),
        ConfirmAction::DeleteFollowUp => ("Remove follow-up", "Remove the pending follow-up?".to_string()),
        ConfirmAction::DeleteProperty(id) => {
            ("Delete property", format!("Delete listing #{}?", id))
        }
        ConfirmAction::Logout => ("Log out", "Log out and forget the stored session?".to_string()),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else if app.busy {
        Line::from(vec![Span::styled(
            "Saving...",
            Style::default().fg(Color::Yellow),
        )])
    } else {
        let help = match (app.screen, app.current_tab()) {
            (_, _) if app.input.is_some() => "Enter: submit | Esc: cancel",
            (Screen::Lists, Tab::Clients) => {
                "h/l: tabs | j/k/g/G: nav | Enter: open | /: search | r: refresh | L: logout | q: quit"
            }
            (Screen::Lists, Tab::Properties)
                if matches!(app.session.role, Role::Seller | Role::Admin) =>
            {
                "h/l: tabs | j/k/g/G: nav | d: delete | r: refresh | L: logout | q: quit"
            }
            (Screen::Lists, _) => "h/l: tabs | j/k/g/G: nav | r: refresh | L: logout | q: quit",
            (Screen::ClientDetail, _) => {
                "c/m/M/v/n: log call/message/meeting/visit/note | e: edit | f: follow-up | x: remove follow-up | D: delete | q: back"
            }
        };
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

/// Cut `s` to at most `max` characters, marking the cut with "...".
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Villa near the lake", 10), "Villa n...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }
}
