use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::App;
use crate::followup::FollowUpState;
use crate::types::{ActivityKind, Client};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(client) = &app.client else {
        let block = Block::default().borders(Borders::ALL).title("Client");
        let empty = Paragraph::new("No client selected")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    render_header(frame, client, chunks[0]);
    render_timeline(frame, app, client, chunks[1]);
}

fn render_header(frame: &mut Frame, client: &Client, area: Rect) {
    let follow_up = match FollowUpState::of(client.follow_up.as_ref()) {
        FollowUpState::None => Span::styled("none", Style::default().fg(Color::Gray)),
        FollowUpState::Pending { date: Some(d), .. } => Span::styled(
            format!("pending, due {}", d),
            Style::default().fg(Color::Yellow),
        ),
        FollowUpState::Pending { date: None, .. } => Span::styled(
            "pending, someday",
            Style::default().fg(Color::Yellow),
        ),
        FollowUpState::Completed { .. } => {
            Span::styled("completed", Style::default().fg(Color::Green))
        }
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("#{} ", client.id),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                client.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw(client.phone.clone().unwrap_or_else(|| "-".to_string())),
            Span::raw(" | "),
            Span::raw(client.email.clone().unwrap_or_else(|| "-".to_string())),
            Span::raw(" | "),
            Span::styled(
                client.group.clone().unwrap_or_else(|| "no group".to_string()),
                Style::default().fg(Color::Gray),
            ),
        ]),
        Line::from(vec![Span::raw("Follow-up: "), follow_up]),
        Line::from(Span::styled(
            format!("Assigned to {} user(s)", client.assigned_users.len()),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let header = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(header, area);
}

fn kind_color(kind: ActivityKind) -> Color {
    match kind {
        ActivityKind::Call => Color::Green,
        ActivityKind::Message => Color::Cyan,
        ActivityKind::Meeting => Color::Magenta,
        ActivityKind::Visit => Color::Blue,
        ActivityKind::Note => Color::Gray,
    }
}

fn render_timeline(frame: &mut Frame, app: &App, client: &Client, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Activity ({}) ", client.activities.len()));

    if client.activities.is_empty() {
        let empty = Paragraph::new("No activity yet. Press c, m, M, v or n to log some.")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = client
        .activities
        .iter()
        .map(|a| {
            let when = a
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<16} ", when), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{:<8}", a.kind),
                    Style::default().fg(kind_color(a.kind)),
                ),
                Span::raw(a.description.clone()),
                Span::styled(
                    format!("  by {}", a.created_by.name),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.detail_scroll));
    frame.render_stateful_widget(list, area, &mut state);
}
