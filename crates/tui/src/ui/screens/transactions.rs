use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use api_types::transaction::TransactionType;

use crate::{
    aggregate,
    app::{AppState, FilterField, TransactionsMode},
    ui::{components::money, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    render_header(frame, layout[0], state, theme);
    match state.transactions.mode {
        TransactionsMode::List => render_list(frame, layout[1], state, theme),
        TransactionsMode::QuickAdd => {
            let body = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(2)])
                .split(layout[1]);
            render_list(frame, body[0], state, theme);
            render_quick_add(frame, body[1], state, theme);
        }
        TransactionsMode::Filter => render_filter(frame, layout[1], state, theme),
    }
}

fn render_header(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let tx = &state.transactions;

    let range = match (tx.start_date, tx.end_date) {
        (None, None) => "all".to_string(),
        (start, end) => format!(
            "{}..{}",
            start.map(|d| d.to_string()).unwrap_or_default(),
            end.map(|d| d.to_string()).unwrap_or_default(),
        ),
    };
    let kind = tx.kind.map(TransactionType::as_str).unwrap_or("all");

    let filter_line = Line::from(vec![
        Span::styled("Range", Style::default().fg(theme.dim)),
        Span::raw(format!(": {range}   ")),
        Span::styled("Type", Style::default().fg(theme.dim)),
        Span::raw(format!(": {kind}")),
    ]);

    let mut page_spans = vec![
        Span::styled("Page", Style::default().fg(theme.dim)),
        Span::raw(format!(
            ": {}/{} ({} items, {}/page)",
            tx.page,
            tx.page_count(),
            tx.total,
            tx.per_page
        )),
    ];
    if let Some(err) = &tx.error {
        page_spans.push(Span::raw("   "));
        page_spans.push(Span::styled(err.as_str(), Style::default().fg(theme.error)));
    }

    let block = Block::default().borders(Borders::ALL).title("Transactions");
    let content = Paragraph::new(vec![filter_line, Line::from(page_spans)]).block(block);
    frame.render_widget(content, area);
}

fn render_list(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let items = state
        .transactions
        .items
        .iter()
        .map(|tx| {
            let date = tx
                .date
                .map(|d| d.to_string())
                .or_else(|| tx.created_at.map(|dt| dt.date().to_string()))
                .unwrap_or_else(|| "-".to_string());
            let currency = tx
                .currency
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(&state.currency);
            let amount = money::styled_amount(tx.amount, tx.kind, Some(currency), theme);
            let pad = 16usize.saturating_sub(amount.content.chars().count());
            let category = aggregate::category_label(tx);
            let description = tx.description.as_deref().unwrap_or("");

            let line = Line::from(vec![
                Span::styled(format!("{date:<12}"), Style::default().fg(theme.dim)),
                Span::raw(format!("{:<9}", tx.kind.as_str())),
                amount,
                Span::raw(" ".repeat(pad)),
                Span::styled(format!("{category:<16}"), Style::default().fg(theme.accent)),
                Span::raw(description.to_string()),
            ]);
            ListItem::new(line)
        })
        .collect::<Vec<_>>();

    let mut list_state = ListState::default();
    if !items.is_empty() {
        list_state.select(Some(state.transactions.selected));
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

fn render_quick_add(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let tx = &state.transactions;
    let input = Line::from(vec![
        Span::styled("add> ", Style::default().fg(theme.accent)),
        Span::raw(tx.quick_input.as_str()),
        Span::styled("│", Style::default().fg(theme.accent)),
    ]);

    let status = if let Some(err) = &tx.quick_error {
        Line::from(Span::styled(err.as_str(), Style::default().fg(theme.error)))
    } else {
        Line::from(Span::styled(
            "-12.50 #food @2025-08-01 lunch · enter add · esc cancel",
            Style::default().fg(theme.dim),
        ))
    };

    frame.render_widget(Paragraph::new(vec![input, status]), area);
}

fn render_filter(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let filter = &state.transactions.filter;

    let block = Block::default().borders(Borders::ALL).title("Filter");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Start
            Constraint::Length(1), // End
            Constraint::Length(1), // Kind
            Constraint::Length(1), // Page size
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Error or hint
        ])
        .margin(1)
        .split(inner);

    render_field(
        frame,
        rows[0],
        "from",
        &filter.start,
        filter.focus == FilterField::Start,
        theme,
    );
    render_field(
        frame,
        rows[1],
        "to",
        &filter.end,
        filter.focus == FilterField::End,
        theme,
    );
    let kind = filter.kind.map(TransactionType::as_str).unwrap_or("all");
    render_field(
        frame,
        rows[2],
        "type",
        kind,
        filter.focus == FilterField::Kind,
        theme,
    );
    render_field(
        frame,
        rows[3],
        "per",
        &filter.per_page,
        filter.focus == FilterField::PerPage,
        theme,
    );

    if let Some(err) = &filter.error {
        frame.render_widget(
            Paragraph::new(Span::styled(err.as_str(), Style::default().fg(theme.error))),
            rows[5],
        );
    } else {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "dates YYYY-MM-DD, blank for open · ↑↓ type · per 1-200 · enter apply",
                Style::default().fg(theme.dim),
            )),
            rows[5],
        );
    }
}

fn render_field(
    frame: &mut Frame<'_>,
    area: Rect,
    label: &str,
    value: &str,
    focused: bool,
    theme: &Theme,
) {
    let cursor = if focused { "│" } else { "" };
    let value_style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.text)
    };

    let line = Line::from(vec![
        Span::styled(format!("{label:<6} "), Style::default().fg(theme.dim)),
        Span::styled(format!("{value}{cursor}"), value_style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
