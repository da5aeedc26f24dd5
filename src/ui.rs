//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).  Nothing in this module talks to
//! the controller; it only reads the latest [`FeedState`] snapshot.
//!
//! ## For contributors
//!
//! * Layout, top to bottom: tab bar, status line, article list, pagination
//!   line (hidden on single-page lists), help bar.
//! * Colours and styles are defined inline.
//!
//! [`FeedState`]: crate::controller::FeedState

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs},
    Frame,
};

use crate::app::App;
use crate::controller::Phase;
use crate::source::Country;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let pagination_height = if app.state.show_pagination() { 1 } else { 0 };
    let [tabs_area, status_area, list_area, pagination_area, help_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(pagination_height),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_tabs(app, frame, tabs_area);
    draw_status(app, frame, status_area);
    draw_article_list(app, frame, list_area);
    if pagination_height > 0 {
        draw_pagination(app, frame, pagination_area);
    }
    draw_help_bar(frame, help_area);
}

fn draw_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let titles: Vec<String> = Country::ALL
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} {}", i + 1, c.display_name()))
        .chain(std::iter::once("f Favorites".to_string()))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.tab_index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn draw_status(app: &App, frame: &mut Frame, area: Rect) {
    let state = &app.state;
    let colour = match state.phase {
        Phase::Error => Color::Red,
        Phase::Loading => Color::Yellow,
        Phase::Idle | Phase::Ready => Color::Green,
    };

    let mut spans = vec![Span::raw(" ")];
    if state.is_loading {
        spans.push(Span::styled("⟳ ", Style::default().fg(Color::Yellow)));
    }
    spans.push(Span::styled(
        state.status.as_str(),
        Style::default().fg(colour).add_modifier(Modifier::BOLD),
    ));
    if let Some(notice) = &state.notice {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("[{notice}]"),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ));
    }
    if let Some(at) = state.last_updated {
        spans.push(Span::styled(
            format!("  updated {}", at.format("%H:%M")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_article_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = app
        .state
        .page()
        .iter()
        .map(|article| {
            let heart = if article.is_favorite { "♥ " } else { "♡ " };
            let title = Line::from(vec![
                Span::styled(heart, Style::default().fg(Color::Magenta)),
                Span::styled(
                    article.translated_title.as_str(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]);
            let description = Line::from(Span::styled(
                format!("  {}", article.translated_description),
                Style::default().fg(Color::Gray),
            ));
            ListItem::new(Text::from(vec![title, description, Line::raw("")]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().title(" Headlines ").borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_pagination(app: &App, frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::raw("◀ "),
        Span::styled(app.state.page_label(), Style::default().fg(Color::Cyan)),
        Span::raw(" ▶"),
    ])
    .centered();
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the bottom key help.
pub fn draw_help_bar(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(Line::from(Span::styled(
        " q: quit  1-7/Tab: country  f: favorites  r: refresh  ←/→: page  ↑/↓: select  space: favorite",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(help, area);
}
