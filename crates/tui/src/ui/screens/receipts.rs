use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use api_types::receipt::Receipt;

use crate::{
    app::AppState,
    ui::{components::money, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_header(frame, layout[0], state, theme);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(layout[1]);

    render_list(frame, body[0], state, theme);

    let selected = state.receipts.items.get(state.receipts.selected);
    render_detail(frame, body[1], selected, state, theme);
}

fn render_header(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let receipts = &state.receipts;

    let line = if receipts.editing_path {
        Line::from(vec![
            Span::styled("upload ", Style::default().fg(theme.dim)),
            Span::styled(
                format!("{}│", receipts.path_input),
                Style::default().fg(theme.accent),
            ),
        ])
    } else if let Some(err) = &receipts.error {
        Line::from(Span::styled(err.as_str(), Style::default().fg(theme.error)))
    } else {
        Line::from(vec![
            Span::raw(format!("{} receipts", receipts.items.len())),
            Span::styled("   o upload · r refresh", Style::default().fg(theme.dim)),
        ])
    };

    let block = Block::default().borders(Borders::ALL).title("Receipts");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_list(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let items = state
        .receipts
        .items
        .iter()
        .map(|receipt| {
            let uploaded = receipt
                .uploaded_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            let name = file_label(receipt);
            let pending = if receipt.raw_text.is_none() { " ⋯" } else { "" };

            let line = Line::from(vec![
                Span::styled(format!("{uploaded:<17}"), Style::default().fg(theme.dim)),
                Span::raw(name),
                Span::styled(pending, Style::default().fg(theme.accent)),
            ]);
            ListItem::new(line)
        })
        .collect::<Vec<_>>();

    let mut list_state = ListState::default();
    if !items.is_empty() {
        list_state.select(Some(state.receipts.selected));
    }

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_detail(
    frame: &mut Frame<'_>,
    area: Rect,
    receipt: Option<&Receipt>,
    state: &AppState,
    theme: &Theme,
) {
    let block = Block::default().borders(Borders::ALL).title("Detail");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(receipt) = receipt else {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No receipt selected",
                Style::default().fg(theme.dim),
            )),
            inner,
        );
        return;
    };

    let mut lines = Vec::new();

    if let Some(parsed) = receipt.parsed() {
        let merchant = parsed.merchant.as_deref().unwrap_or("-");
        lines.push(Line::from(vec![
            Span::styled("Merchant ", Style::default().fg(theme.dim)),
            Span::raw(merchant.to_string()),
        ]));

        let mut total_spans = vec![Span::styled("Total    ", Style::default().fg(theme.dim))];
        match parsed.total {
            Some(total) => total_spans.push(money::styled_total(
                total,
                Some(&state.currency),
                theme,
            )),
            None => total_spans.push(Span::raw("-")),
        }
        lines.push(Line::from(total_spans));

        let date = parsed.date.as_deref().unwrap_or("-");
        lines.push(Line::from(vec![
            Span::styled("Date     ", Style::default().fg(theme.dim)),
            Span::raw(date.to_string()),
        ]));

        if !parsed.raw_lines.is_empty() {
            lines.push(Line::from(""));
            for raw in parsed.raw_lines.iter().take(10) {
                lines.push(Line::from(Span::styled(
                    raw.clone(),
                    Style::default().fg(theme.dim),
                )));
            }
        }
    } else if let Some(raw_text) = receipt.raw_text.as_deref() {
        lines.push(Line::from(Span::styled(
            "Not yet summarized, raw OCR text:",
            Style::default().fg(theme.dim),
        )));
        lines.push(Line::from(""));
        for raw in raw_text.lines().take(12) {
            lines.push(Line::from(raw.to_string()));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "Processing… refresh to check again.",
            Style::default().fg(theme.dim),
        )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn file_label(receipt: &Receipt) -> String {
    receipt
        .file_path
        .rsplit('/')
        .next()
        .unwrap_or(receipt.file_path.as_str())
        .to_string()
}
