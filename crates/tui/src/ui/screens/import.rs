use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::{
    app::AppState,
    import::ImportPhase,
    ui::{components::money, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    render_header(frame, layout[0], state, theme);

    match state.import.phase {
        ImportPhase::Idle => render_idle(frame, layout[1], theme),
        ImportPhase::Parsing => render_wait(frame, layout[1], "Uploading and parsing…", theme),
        ImportPhase::Staged => render_staged(frame, layout[1], state, theme),
        ImportPhase::Importing => render_wait(frame, layout[1], "Importing selected rows…", theme),
    }
}

fn render_header(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let import = &state.import;

    let cursor = if import.editing_path { "│" } else { "" };
    let path_style = if import.editing_path {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.text)
    };
    let path_line = Line::from(vec![
        Span::styled("file ", Style::default().fg(theme.dim)),
        Span::styled(format!("{}{cursor}", import.path_input), path_style),
    ]);

    let status_line = if let Some(message) = &import.message {
        Line::from(Span::styled(message.as_str(), message_style(message, theme)))
    } else if let Some(file) = &import.server_file {
        Line::from(vec![
            Span::styled("uploaded as ", Style::default().fg(theme.dim)),
            Span::raw(file.as_str()),
        ])
    } else {
        Line::from("")
    };

    let block = Block::default().borders(Borders::ALL).title("Import PDF");
    frame.render_widget(
        Paragraph::new(vec![path_line, status_line]).block(block),
        area,
    );
}

/// Failure strings carry a fixed prefix, everything else is progress info.
fn message_style(message: &str, theme: &Theme) -> Style {
    let failed = message.starts_with("Upload/parse failed")
        || message.starts_with("Import failed")
        || message.starts_with("Cannot read")
        || message.starts_with("No rows selected")
        || message.starts_with("Please select");
    if failed {
        Style::default().fg(theme.error)
    } else {
        Style::default().fg(theme.text)
    }
}

fn render_idle(frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("o", Style::default().fg(theme.accent)),
            Span::raw(" to type a PDF path, then "),
            Span::styled("enter", Style::default().fg(theme.accent)),
            Span::raw(" to upload and parse it."),
        ]),
        Line::from(Span::styled(
            "Imported rows are tagged as expenses.",
            Style::default().fg(theme.dim),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        area,
    );
}

fn render_wait(frame: &mut Frame<'_>, area: Rect, label: &str, theme: &Theme) {
    frame.render_widget(
        Paragraph::new(Span::styled(label, Style::default().fg(theme.accent)))
            .alignment(Alignment::Center),
        area,
    );
}

fn render_staged(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let import = &state.import;

    let items = import
        .rows
        .iter()
        .map(|staged| {
            let mark = if staged.selected { "[x]" } else { "[ ]" };
            let date = staged.row.date.as_deref().unwrap_or("-");
            let amount = money::format_amount(staged.row.amount, Some(&state.currency));

            let line = Line::from(vec![
                Span::styled(
                    format!("{mark} "),
                    Style::default().fg(if staged.selected {
                        theme.positive
                    } else {
                        theme.dim
                    }),
                ),
                Span::styled(format!("{date:<12}"), Style::default().fg(theme.dim)),
                Span::raw(format!("{amount:>14}  ")),
                Span::raw(staged.row.description.clone()),
            ]);
            ListItem::new(line)
        })
        .collect::<Vec<_>>();

    let title = format!(
        " {} of {} selected ",
        import.selected_count(),
        import.rows.len()
    );

    let mut list_state = ListState::default();
    if !import.rows.is_empty() {
        list_state.select(Some(import.cursor));
    }

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");

    frame.render_stateful_widget(list, area, &mut list_state);
}
