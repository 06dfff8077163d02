use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::truncate;
use crate::app::ListView;
use crate::followup::FollowUpState;
use crate::paging::Phase;
use crate::types::{
    Client, ContactedProperty, ContentTemplate, Identified, Property, User, Visitor,
};

/// Render one paged list: rows, then a footer for the fetch in flight.
///
/// Before anything has loaded, a failure is shown in place of the rows.
/// After that, rows stay put and the failure goes in the footer.
pub fn render<T, F>(frame: &mut Frame, area: Rect, title: &str, view: &ListView<T>, row: F)
where
    T: Identified + Send + 'static,
    F: Fn(&T) -> Line<'static>,
{
    let state = view.list.state();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ({}) ", title, state.len()));

    if state.is_empty() {
        let (text, color) = if let Some(error) = state.error() {
            (format!("Could not load: {}  (r to retry)", error), Color::Red)
        } else if state.is_refreshing() || !view.started() {
            ("Loading...".to_string(), Color::Yellow)
        } else {
            (
                state.notice().unwrap_or("Nothing here yet").to_string(),
                Color::Gray,
            )
        };
        let empty = Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(color));
        frame.render_widget(empty, area);
        return;
    }

    let mut items: Vec<ListItem> = state
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let line = row(item);
            if i == view.index {
                ListItem::new(line).style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ListItem::new(line)
            }
        })
        .collect();

    let footer = match state.phase() {
        Phase::FetchingMore => Some(("Loading more...".to_string(), Color::Yellow)),
        Phase::FetchingInitial => Some(("Refreshing...".to_string(), Color::Yellow)),
        Phase::Error => state
            .error()
            .map(|e| (format!("Could not load more: {}  (r to refresh)", e), Color::Red)),
        Phase::Idle => None,
    };
    if let Some((text, color)) = footer {
        items.push(ListItem::new(Line::from(Span::styled(
            text,
            Style::default().fg(color),
        ))));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(view.index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn dim(text: String) -> Span<'static> {
    Span::styled(text, Style::default().fg(Color::DarkGray))
}

pub fn property_row(p: &Property) -> Line<'static> {
    let mut spans = vec![
        Span::raw(format!("{:<36}", truncate(&p.title, 36))),
        Span::raw(" "),
        Span::styled(
            format!("{:>14.0}", p.price),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(format!("{:<4}", p.listing_kind), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        dim(truncate(p.city.as_deref().unwrap_or("-"), 18)),
    ];
    if let Some(beds) = p.bedrooms {
        spans.push(dim(format!("  {} bd", beds)));
    }
    if p.is_featured {
        spans.push(Span::styled("  ★", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}

pub fn contacted_row(c: &ContactedProperty) -> Line<'static> {
    let when = c
        .contacted_at
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    Line::from(vec![
        Span::raw(format!("{:<36}", truncate(&c.title, 36))),
        Span::raw(" "),
        Span::styled(format!("{:>14.0}", c.price), Style::default().fg(Color::Green)),
        Span::raw("  "),
        dim(truncate(c.owner_name.as_deref().unwrap_or("-"), 20)),
        Span::raw("  "),
        dim(when),
    ])
}

pub fn visitor_row(v: &Visitor) -> Line<'static> {
    let when = v
        .visited_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    Line::from(vec![
        Span::raw(format!("{:<24}", truncate(&v.name, 24))),
        Span::raw(" "),
        dim(format!("{:<16}", v.phone.as_deref().unwrap_or("-"))),
        Span::raw(format!("listing #{:<8}", v.property_id)),
        dim(when),
    ])
}

pub fn client_row(c: &Client) -> Line<'static> {
    let follow_up = match FollowUpState::of(c.follow_up.as_ref()) {
        FollowUpState::Pending { date: Some(d), .. } => {
            Span::styled(format!("due {}", d), Style::default().fg(Color::Yellow))
        }
        FollowUpState::Pending { date: None, .. } => {
            Span::styled("due someday", Style::default().fg(Color::Yellow))
        }
        FollowUpState::Completed { .. } => {
            Span::styled("followed up", Style::default().fg(Color::Green))
        }
        FollowUpState::None => dim(String::new()),
    };
    Line::from(vec![
        Span::raw(format!("{:<24}", truncate(&c.name, 24))),
        Span::raw(" "),
        dim(format!("{:<16}", c.phone.as_deref().unwrap_or("-"))),
        dim(format!("{:<12}", truncate(c.group.as_deref().unwrap_or(""), 12))),
        follow_up,
    ])
}

pub fn template_row(t: &ContentTemplate) -> Line<'static> {
    let first_line = t.body.lines().next().unwrap_or("");
    Line::from(vec![
        Span::raw(format!("{:<30}", truncate(&t.title, 30))),
        Span::raw(" "),
        dim(truncate(first_line, 60)),
    ])
}

pub fn user_row(u: &User) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{:<24}", truncate(&u.name, 24))),
        Span::raw(" "),
        Span::styled(format!("{:<8}", u.role), Style::default().fg(Color::Cyan)),
        dim(u.email.clone().unwrap_or_default()),
    ])
}
