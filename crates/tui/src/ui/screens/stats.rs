use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::{
    app::{AppState, SeriesSource},
    ui::{
        components::{charts, money},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status line
            Constraint::Min(6),    // Category breakdown
            Constraint::Length(6), // Daily spend
        ])
        .split(area);

    render_status(frame, layout[0], state, theme);
    render_by_category(frame, layout[1], state, theme);
    render_by_date(frame, layout[2], state, theme);
}

fn render_status(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let stats = &state.stats;
    let mut spans = Vec::new();

    if let Some(err) = &stats.error {
        spans.push(Span::styled(err.as_str(), Style::default().fg(theme.error)));
        spans.push(Span::raw(" Press "));
        spans.push(Span::styled("r", Style::default().fg(theme.accent)));
        spans.push(Span::raw(" to retry."));
        spans.push(Span::raw("  "));
    }
    spans.extend(source_spans("categories", stats.category_source, theme));
    spans.push(Span::raw("  "));
    spans.extend(source_spans("daily", stats.date_source, theme));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Each series labels where its numbers come from; a fallback series is
/// called out in the accent color.
fn source_spans(label: &str, source: SeriesSource, theme: &Theme) -> [Span<'static>; 2] {
    let (text, color) = match source {
        SeriesSource::Server => ("server", theme.dim),
        SeriesSource::PageFallback => ("loaded page", theme.accent),
    };
    [
        Span::styled(format!("{label}: "), Style::default().fg(theme.dim)),
        Span::styled(text, Style::default().fg(color)),
    ]
}

fn render_by_category(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let block = Block::default()
        .title(Span::styled(
            " Expenses by Category ",
            Style::default().fg(theme.accent),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let breakdown = &state.stats.by_category;
    if breakdown.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No expense data",
                Style::default().fg(theme.dim),
            ))
            .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let max = breakdown.iter().map(|row| row.total).fold(0.0_f64, f64::max);
    let sum: f64 = breakdown.iter().map(|row| row.total).sum();

    let rows: Vec<Line> = breakdown
        .iter()
        .take(inner.height as usize)
        .map(|row| {
            let pct = charts::percentage_of(row.total, sum);
            let bar = charts::ascii_bar(row.total, max, 20);
            let amount = money::format_amount(row.total, Some(&state.currency));

            Line::from(vec![
                Span::styled(
                    format!("{:<16}", truncate_string(&row.category, 15)),
                    Style::default().fg(theme.text),
                ),
                Span::styled(format!("{amount:>14}"), Style::default().fg(theme.error)),
                Span::raw("  "),
                Span::styled(bar, Style::default().fg(theme.error)),
                Span::styled(format!(" {pct:>3}%"), Style::default().fg(theme.dim)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(rows), inner);
}

fn render_by_date(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let block = Block::default()
        .title(Span::styled(
            " Daily Spend ",
            Style::default().fg(theme.accent),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let series = &state.stats.by_date;
    if series.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No dated expenses",
                Style::default().fg(theme.dim),
            ))
            .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    // One column per day; on a narrow terminal keep the most recent days.
    let width = inner.width.saturating_sub(2) as usize;
    let start = series.len().saturating_sub(width.max(1));
    let window = &series[start..];

    let values: Vec<f64> = window.iter().map(|row| row.total).collect();
    let chart = charts::mini_bar_chart(&values);
    let total: f64 = values.iter().sum();

    let range = match (window.first(), window.last()) {
        (Some(first), Some(last)) if first.date != last.date => {
            format!("{}..{}", first.date, last.date)
        }
        (Some(first), _) => first.date.to_string(),
        _ => String::new(),
    };

    let lines = vec![
        Line::from(Span::styled(chart, Style::default().fg(theme.accent))),
        Line::from(vec![
            Span::styled(range, Style::default().fg(theme.dim)),
            Span::raw("  "),
            money::styled_total(total, Some(&state.currency), theme),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
