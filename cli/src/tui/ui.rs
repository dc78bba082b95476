use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Row, Table, Tabs},
    Frame,
};
use todos_core::Filter;
use unicode_width::UnicodeWidthStr;

use crate::state::{Entry, LocalId, TodoState};
use crate::tui::app::{App, InputMode};

const HELP: &str =
    "a: Add | e: Edit | space: Toggle | d: Delete | c: Clear done | tab: Filter | q: Quit";

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // List
            Constraint::Length(1), // Footer
        ])
        .split(size);

    draw_header(f, &app.todos, main_chunks[0]);
    draw_task_list(f, app, main_chunks[1]);
    draw_footer(f, &app.todos, main_chunks[2]);

    match app.input_mode {
        InputMode::Normal => {}
        InputMode::Adding => draw_input(f, app, " New todo "),
        InputMode::Editing(_) => draw_input(f, app, " Edit todo (empty deletes) "),
    }
}

fn draw_header(f: &mut Frame, todos: &TodoState, area: Rect) {
    let stats = todos.stats();
    let items_left = match stats.active {
        1 => "1 item left".to_string(),
        n => format!("{} items left", n),
    };
    let selected = Filter::ALL
        .iter()
        .position(|filter| *filter == todos.filter())
        .unwrap_or(0);
    let titles = Filter::ALL
        .iter()
        .enumerate()
        .map(|(i, filter)| format!("{} {}", i + 1, filter.label()));
    let accent = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(accent)
        .block(
            Block::default()
                .title(Line::from(" TODOS ").style(accent))
                .title(Line::from(format!(" {} ", items_left)).alignment(Alignment::Right))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        );
    f.render_widget(tabs, area);
}

fn empty_message(todos: &TodoState) -> Option<&'static str> {
    if todos.entries().is_empty() {
        if todos.is_loading() {
            Some("Loading todos...")
        } else {
            Some("No todos yet. Add one!")
        }
    } else if todos.visible().is_empty() {
        Some("No todos match the current filter")
    } else {
        None
    }
}

fn task_row<'a>(todos: &TodoState, entry: &'a Entry) -> Row<'a> {
    let (checkbox, text_style) = if entry.completed {
        (
            "[x]",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT),
        )
    } else {
        ("[ ]", Style::default())
    };
    let marker = match entry.id {
        LocalId::Placeholder(_) => "+",
        LocalId::Stored(_) if todos.is_pending(&entry.id) => "~",
        LocalId::Stored(_) => "",
    };

    Row::new(vec![
        Span::styled(checkbox, Style::default().fg(Color::Green)),
        Span::styled(entry.text.as_str(), text_style),
        Span::styled(marker, Style::default().fg(Color::Yellow)),
    ])
}

fn draw_task_list(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ", app.todos.filter().label()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    if let Some(message) = empty_message(&app.todos) {
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let rows: Vec<Row> = app
        .todos
        .visible()
        .into_iter()
        .map(|entry| task_row(&app.todos, entry))
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3), // Checkbox
            Constraint::Min(10),   // Text
            Constraint::Length(1), // Sync marker
        ],
    )
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn draw_footer(f: &mut Frame, todos: &TodoState, area: Rect) {
    let line = if let Some(error) = todos.error() {
        Line::from(vec![
            Span::styled(format!("Error: {}", error), Style::default().fg(Color::Red)),
            Span::styled("  (x: dismiss)", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        let mut spans = vec![Span::styled(
            format!("{} completed", todos.stats().completed),
            Style::default().fg(Color::Green),
        )];
        if todos.is_submitting() {
            spans.push(Span::styled("  Saving...", Style::default().fg(Color::Yellow)));
        }
        spans.push(Span::styled(format!("  {}", HELP), Style::default().fg(Color::DarkGray)));
        Line::from(spans)
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_input(f: &mut Frame, app: &App, title: &str) {
    let area = centered_rect(60, 3, f.area());
    let input = Paragraph::new(app.input.as_str()).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(Clear, area);
    f.render_widget(input, area);

    let before: String = app.input.chars().take(app.cursor_position).collect();
    let offset = u16::try_from(before.width()).unwrap_or(u16::MAX);
    let max_x = area.x + area.width.saturating_sub(2);
    f.set_cursor_position((area.x.saturating_add(1).saturating_add(offset).min(max_x), area.y + 1));
}

/// A rect `percent_x` wide and `height` rows tall, centered in `area`.
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
