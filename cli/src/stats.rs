use std::{io, time::Duration};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, BorderType, Paragraph, Gauge, Padding},
};
use presence_core::{DailyTrend, Overview, PersonSummary, PresenceService, StateRepository};

use crate::tables;

// --- THEME ---
struct Theme {
    primary: Color,
    muted: Color,
    text: Color,
    present: Color,
    absent: Color,
}

const THEME: Theme = Theme {
    primary: Color::Cyan,
    muted: Color::DarkGray,
    text: Color::White,
    present: Color::Green,
    absent: Color::Red,
};

/// Tracked days shown in the chart at once.
const DAYS_PER_PAGE: usize = 10;
const TOP_N: usize = 5;

pub struct StatsApp {
    pub label: String,
    pub overview: Overview,
    pub trends: Vec<DailyTrend>,
    pub ranking: Vec<PersonSummary>,
    pub page: usize,
}

impl StatsApp {
    pub fn new<R: StateRepository>(service: &PresenceService<R>) -> Self {
        Self {
            label: service.calendar().label(),
            overview: service.overview(),
            trends: service.daily_trends(),
            ranking: service.ranking(),
            page: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.trends.len().div_ceil(DAYS_PER_PAGE).max(1)
    }

    pub fn next_page(&mut self) {
        if self.page + 1 < self.page_count() {
            self.page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    pub fn visible_trends(&self) -> &[DailyTrend] {
        let start = (self.page * DAYS_PER_PAGE).min(self.trends.len());
        let end = (start + DAYS_PER_PAGE).min(self.trends.len());
        &self.trends[start..end]
    }
}

/// Prints the statistics as plain tables.
pub fn print<R: StateRepository>(service: &PresenceService<R>) {
    println!("\x1b[1;36m{}\x1b[0m", service.calendar().label());
    println!("{}", tables::overview_table(&service.overview()));

    let ranking = service.ranking();
    if !ranking.is_empty() {
        println!("\nTop {}", TOP_N.min(ranking.len()));
        println!("{}", tables::ranking_table(&ranking, TOP_N));
    }

    let trends = service.daily_trends();
    if trends.is_empty() {
        println!("\nNo tracked days in {}.", service.calendar().label());
    } else {
        println!("\nDaily trends");
        println!("{}", tables::trends_table(&trends));
    }
}

pub fn run<R: StateRepository>(service: &PresenceService<R>) -> Result<()> {
    if service.people().is_empty() {
        println!("No people on the roster yet.");
        return Ok(());
    }

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = StatsApp::new(service);

    loop {
        terminal.draw(|f| ui(f, &app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Left | KeyCode::Char('h') => app.previous_page(),
                        KeyCode::Right | KeyCode::Char('l') => app.next_page(),
                        _ => {}
                    }
                }
            }
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

fn ui(frame: &mut Frame, app: &StatsApp) {
    let size = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Chart + sidebar
            Constraint::Length(1), // Footer
        ])
        .split(size);

    // --- Header ---
    let header_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(THEME.muted));

    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(20),
            Constraint::Min(1),
            Constraint::Length(30),
        ])
        .split(main_layout[0]);

    let app_title = Paragraph::new(Span::styled("PRESENCE STATS", Style::default().fg(THEME.primary).add_modifier(Modifier::BOLD)))
        .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    frame.render_widget(app_title, header_layout[0]);

    let last_page = app.page + 1 >= app.page_count();
    let nav_text = Line::from(vec![
        Span::styled(" < ", Style::default().fg(if app.page > 0 { THEME.text } else { THEME.muted })),
        Span::styled(format!(" {} ", app.label), Style::default().fg(THEME.text).add_modifier(Modifier::BOLD)),
        Span::styled(" > ", Style::default().fg(if last_page { THEME.muted } else { THEME.text })),
    ]);
    let nav = Paragraph::new(nav_text).alignment(Alignment::Right).block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    frame.render_widget(nav, header_layout[2]);

    frame.render_widget(header_block, main_layout[0]);

    // --- Content ---
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(70),
            Constraint::Length(1),
            Constraint::Percentage(30),
        ])
        .split(main_layout[1]);

    if app.trends.is_empty() {
        frame.render_widget(
            Paragraph::new("No tracked days this month")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded)),
            content_chunks[0],
        );
    } else {
        draw_chart(frame, app.visible_trends(), content_chunks[0]);
    }
    draw_info_panel(frame, app, content_chunks[2]);

    // --- Footer ---
    let help = Line::from(vec![
        Span::styled("DAYS: ", Style::default().fg(THEME.muted)),
        Span::styled("←/→ ", Style::default().fg(THEME.text)),
        Span::raw("  "),
        Span::styled("QUIT: ", Style::default().fg(THEME.muted)),
        Span::styled("q", Style::default().fg(THEME.text)),
    ]);
    let footer = Paragraph::new(help).alignment(Alignment::Center).style(Style::default().fg(THEME.muted));
    frame.render_widget(footer, main_layout[2]);
}

fn draw_chart(frame: &mut Frame, trends: &[DailyTrend], area: Rect) {
    let mut bar_data = Vec::new();

    for trend in trends {
        bar_data.push((String::new(), trend.present as u64, THEME.present));
        bar_data.push((trend.day.to_string(), trend.absent as u64, THEME.absent));
        // Spacer
        bar_data.push((String::new(), 0, Color::Reset));
    }

    let bar_items: Vec<Bar> = bar_data.iter().map(|(label, value, color)| {
        Bar::default()
            .label(label.as_str())
            .value(*value)
            .style(Style::default().fg(*color))
            .text_value(if *value > 0 { value.to_string() } else { String::new() })
    }).collect();

    let chart_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(THEME.muted))
        .title(" Present / Absent per Day ");

    let chart = BarChart::default()
        .block(chart_block)
        .bar_width(3)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bar_items));

    frame.render_widget(chart, area);
}

fn draw_info_panel(frame: &mut Frame, app: &StatsApp, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(area);

    let overview = &app.overview;
    let info_text = vec![
        Line::from(vec![Span::styled("Overview", Style::default().add_modifier(Modifier::BOLD))]),
        Line::from(""),
        Line::from(vec![
            Span::styled("People:  ", Style::default().fg(THEME.muted)),
            Span::styled(overview.people.to_string(), Style::default().fg(THEME.text)),
        ]),
        Line::from(vec![
            Span::styled("Present: ", Style::default().fg(THEME.muted)),
            Span::styled(overview.present.to_string(), Style::default().fg(THEME.present).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("Absent:  ", Style::default().fg(THEME.muted)),
            Span::styled(overview.absent.to_string(), Style::default().fg(THEME.absent).add_modifier(Modifier::BOLD)),
        ]),
    ];

    let info_block = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded).border_style(Style::default().fg(THEME.muted)).title(" Summary "));
    frame.render_widget(info_block, chunks[0]);

    let gauge = Gauge::default()
        .block(Block::default().title(" Attendance ").borders(Borders::ALL).border_type(BorderType::Rounded).border_style(Style::default().fg(THEME.muted)))
        .gauge_style(Style::default().fg(if overview.rate >= 75 { THEME.present } else { THEME.absent }))
        .percent(overview.rate.min(100) as u16)
        .label(format!("{}%", overview.rate));
    frame.render_widget(gauge, chunks[1]);

    let mut top = vec![Line::from("")];
    for (i, summary) in app.ranking.iter().take(TOP_N).enumerate() {
        top.push(Line::from(vec![
            Span::styled(format!("{}. ", i + 1), Style::default().fg(THEME.muted)),
            Span::styled(summary.name.clone(), Style::default().fg(THEME.text)),
            Span::styled(format!("  {}%", summary.rate), Style::default().fg(THEME.primary)),
        ]));
    }
    let ranking = Paragraph::new(top)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded).border_style(Style::default().fg(THEME.muted)).title(" Top Attendance "));
    frame.render_widget(ranking, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_days(n: u32) -> StatsApp {
        StatsApp {
            label: "September 2025".into(),
            overview: Overview { people: 0, present: 0, absent: 0, rate: 0 },
            trends: (1..=n).map(|day| DailyTrend { day, present: 0, absent: 0, rate: 0 }).collect(),
            ranking: Vec::new(),
            page: 0,
        }
    }

    #[test]
    fn test_paging() {
        let mut app = app_with_days(22);
        assert_eq!(app.page_count(), 3);
        assert_eq!(app.visible_trends().len(), 10);

        app.next_page();
        app.next_page();
        app.next_page();
        assert_eq!(app.page, 2);
        assert_eq!(app.visible_trends().len(), 2);
        assert_eq!(app.visible_trends()[0].day, 21);

        app.previous_page();
        assert_eq!(app.page, 1);
    }

    #[test]
    fn test_paging_without_days() {
        let mut app = app_with_days(0);
        assert_eq!(app.page_count(), 1);
        app.next_page();
        assert_eq!(app.page, 0);
        assert!(app.visible_trends().is_empty());
    }
}
