use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, BorderType, Paragraph, Row, Table, Wrap},
    Frame,
};
use presence_core::{weekday_name, weekday_of, PresenceStatus};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::tui::app::{App, Cell, InputMode};

const NAME_WIDTH: usize = 16;

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Grid
            Constraint::Length(3), // Message / input
            Constraint::Length(1), // Help
        ])
        .split(size);

    let calendar = app.service.calendar();
    let header = Paragraph::new(format!("PRESENCE  {}", calendar.label()))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(header, main_chunks[0]);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(75),
            Constraint::Percentage(25),
        ])
        .split(main_chunks[1]);

    draw_grid(f, app, content_chunks[0]);
    draw_detail_view(f, app, content_chunks[1]);
    draw_message(f, app, main_chunks[2]);

    let footer = Paragraph::new("j/k: Person | h/l: Day | space: Toggle | [/]: Month | w: Weekdays | a: Add | d: Delete | q: Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(footer, main_chunks[3]);
}

/// Cuts `name` to at most `width` display columns, marking the cut with `…`.
pub fn truncate(name: &str, width: usize) -> String {
    if name.width() <= width {
        return name.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in name.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn cell_span(cell: Cell, selected: bool) -> Span<'static> {
    let (text, style) = match cell {
        Cell::Excused => ("E", Style::default().fg(Color::Blue)),
        Cell::Mark(PresenceStatus::Present) => ("P", Style::default().fg(Color::Green)),
        Cell::Mark(PresenceStatus::Absent) => ("A", Style::default().fg(Color::Red)),
        Cell::Mark(PresenceStatus::Unset) => ("-", Style::default().fg(Color::DarkGray)),
    };
    let style = if selected { style.add_modifier(Modifier::REVERSED) } else { style };
    Span::styled(text, style)
}

fn draw_grid(f: &mut Frame, app: &mut App, area: Rect) {
    let days = app.days();
    let selected_row = app.state.selected();

    let rows: Vec<Row> = app.people().iter().enumerate().map(|(row, person)| {
        let mut cells = vec![
            Span::styled(truncate(&person.name, NAME_WIDTH), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{:>3}%", person.rate())),
        ];
        for (col, &day) in days.iter().enumerate() {
            let selected = selected_row == Some(row) && col == app.day_index;
            cells.push(cell_span(app.cell(person, day), selected));
        }
        Row::new(cells)
    }).collect();

    let mut widths = vec![Constraint::Length(NAME_WIDTH as u16), Constraint::Length(5)];
    widths.extend(days.iter().map(|_| Constraint::Length(2)));

    let mut header = vec![Span::raw("Name"), Span::raw("Rate")];
    header.extend(days.iter().enumerate().map(|(col, day)| {
        let style = if col == app.day_index {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        Span::styled(day.to_string(), style)
    }));

    let table = Table::new(rows, widths)
        .header(Row::new(header))
        .column_spacing(1)
        .block(Block::default().title(" Roster ").borders(Borders::ALL).border_type(BorderType::Rounded))
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn draw_detail_view(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title(" Detail ").borders(Borders::ALL).border_type(BorderType::Rounded);
    let Some(person) = app.selected_person() else {
        f.render_widget(block, area);
        return;
    };

    let mut detail_text = vec![
        Line::from(Span::styled(person.name.as_str(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(vec![
            Span::styled("ID: ", Style::default().fg(Color::DarkGray)),
            Span::raw(person.short_id()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Present: ", Style::default().fg(Color::Blue)),
            Span::raw(person.total_present.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Absent:  ", Style::default().fg(Color::Blue)),
            Span::raw(person.total_absent.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Rate:    ", Style::default().fg(Color::Blue)),
            Span::raw(format!("{}%", person.rate())),
        ]),
        Line::from(""),
    ];

    if let Some(day) = app.selected_day() {
        let calendar = app.service.calendar();
        let weekday = weekday_of(day, calendar.month, calendar.year).map(weekday_name).unwrap_or("?");
        detail_text.push(Line::from(Span::styled(format!("Day {} ({})", day, weekday), Style::default().fg(Color::Blue))));
        match app.service.excuse_on(person.id, day) {
            Some(excuse) => detail_text.push(Line::from(format!("Excused: {}", excuse.description))),
            None => {
                let status = match app.cell(person, day) {
                    Cell::Mark(PresenceStatus::Present) => "Present",
                    Cell::Mark(PresenceStatus::Absent) => "Absent",
                    _ => "Not marked",
                };
                detail_text.push(Line::from(status));
            }
        }
    }

    let excuses: Vec<_> = app.service.excuses().filter(|e| e.person_id == person.id).collect();
    if !excuses.is_empty() {
        detail_text.push(Line::from(""));
        detail_text.push(Line::from(Span::styled("Excuses:", Style::default().fg(Color::Blue))));
        for excuse in excuses {
            detail_text.push(Line::from(format!("{}: {}", weekday_name(excuse.weekday), excuse.description)));
        }
    }

    let detail_block = Paragraph::new(detail_text)
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(detail_block, area);
}

fn draw_message(f: &mut Frame, app: &App, area: Rect) {
    let (text, title, style) = match app.input_mode {
        InputMode::Adding => (app.input.as_str(), " Add people (Enter to save, Esc to cancel) ", Style::default().fg(Color::Yellow)),
        InputMode::Normal => (app.message.as_deref().unwrap_or(""), " Message ", Style::default()),
    };
    let paragraph = Paragraph::new(text)
        .style(style)
        .block(Block::default().title(title).borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(paragraph, area);

    if let InputMode::Adding = app.input_mode {
        let offset: usize = app.input.chars().take(app.cursor_position).map(|c| c.width().unwrap_or(0)).sum();
        f.set_cursor_position((area.x + 1 + offset as u16, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Alice", 16), "Alice");
        assert_eq!(truncate("Bartholomew Jones", 8), "Barthol…");
        // Wide characters count two columns each
        assert_eq!(truncate("山田太郎さん", 6), "山田…");
        assert!(truncate("山田太郎さん", 6).width() <= 6);
    }
}
