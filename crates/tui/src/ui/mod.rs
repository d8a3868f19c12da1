pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    app::{AppState, Screen, Section, TransactionsMode},
    import::ImportPhase,
};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let theme = Theme::default();
    let area = frame.area();
    match state.screen {
        Screen::Login => screens::login::render(frame, area, state, &theme),
        Screen::Home => render_shell(frame, area, state, &theme),
    }
}

fn render_shell(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    // Main layout: info bar, tabs, content, bottom bar
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Length(2), // Tab bar (label + breathing room)
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Bottom bar
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, theme);
    components::tabs::render_tabs(frame, layout[1], state.section, theme);

    match state.section {
        Section::Transactions => screens::transactions::render(frame, layout[2], state, theme),
        Section::Import => screens::import::render(frame, layout[2], state, theme),
        Section::Receipts => screens::receipts::render(frame, layout[2], state, theme),
        Section::Stats => screens::stats::render(frame, layout[2], state, theme),
    }

    render_bottom_bar(frame, layout[3], state, theme);
    components::toast::render(frame, area, state.toast.as_ref(), theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let user = if state.login.email.is_empty() {
        "-"
    } else {
        state.login.email.as_str()
    };
    let refresh = state
        .last_refresh
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let status = if state.connection_ok { "OK" } else { "ERR" };
    let status_style = if state.connection_ok {
        Style::default().fg(theme.positive)
    } else {
        Style::default().fg(theme.error)
    };

    let line = Line::from(vec![
        Span::styled("User", Style::default().fg(theme.dim)),
        Span::raw(format!(": {user}  ")),
        Span::styled("Currency", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", state.currency)),
        Span::styled("API", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", state.base_url)),
        Span::styled("Refresh", Style::default().fg(theme.dim)),
        Span::raw(format!(": {refresh}  ")),
        Span::styled(status, status_style),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut parts = components::tabs::tab_shortcuts(theme);

    let context_hints = get_context_hints(state, theme);
    if !context_hints.is_empty() {
        parts.push(Span::styled("  │  ", Style::default().fg(theme.border)));
        parts.extend(context_hints);
    }

    parts.push(Span::styled("  │  ", Style::default().fg(theme.border)));
    parts.push(Span::styled("l", Style::default().fg(theme.accent)));
    parts.push(Span::raw(" logout  "));
    parts.push(Span::styled("q", Style::default().fg(theme.accent)));
    parts.push(Span::raw(" quit"));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

/// Returns context-specific keyboard hints based on current section and mode.
fn get_context_hints(state: &AppState, theme: &Theme) -> Vec<Span<'static>> {
    match state.section {
        Section::Transactions => get_transactions_hints(state, theme),
        Section::Import => get_import_hints(state, theme),
        Section::Receipts => {
            if state.receipts.editing_path {
                return edit_hints(theme);
            }
            vec![
                Span::styled("o", Style::default().fg(theme.accent)),
                Span::raw(" upload  "),
                Span::styled("r", Style::default().fg(theme.accent)),
                Span::raw(" refresh"),
            ]
        }
        Section::Stats => vec![
            Span::styled("r", Style::default().fg(theme.accent)),
            Span::raw(" refresh"),
        ],
    }
}

fn get_transactions_hints(state: &AppState, theme: &Theme) -> Vec<Span<'static>> {
    match state.transactions.mode {
        TransactionsMode::List => vec![
            Span::styled("a", Style::default().fg(theme.accent)),
            Span::raw(" add  "),
            Span::styled("f", Style::default().fg(theme.accent)),
            Span::raw(" filter  "),
            Span::styled("x", Style::default().fg(theme.accent)),
            Span::raw(" clear  "),
            Span::styled("n/p", Style::default().fg(theme.accent)),
            Span::raw(" page  "),
            Span::styled("r", Style::default().fg(theme.accent)),
            Span::raw(" refresh"),
        ],
        TransactionsMode::QuickAdd => edit_hints(theme),
        TransactionsMode::Filter => vec![
            Span::styled("Tab", Style::default().fg(theme.accent)),
            Span::raw(" next  "),
            Span::styled("Enter", Style::default().fg(theme.accent)),
            Span::raw(" apply  "),
            Span::styled("Esc", Style::default().fg(theme.accent)),
            Span::raw(" cancel"),
        ],
    }
}

fn get_import_hints(state: &AppState, theme: &Theme) -> Vec<Span<'static>> {
    if state.import.editing_path {
        return vec![
            Span::styled("Enter", Style::default().fg(theme.accent)),
            Span::raw(" parse  "),
            Span::styled("Esc", Style::default().fg(theme.accent)),
            Span::raw(" cancel"),
        ];
    }
    match state.import.phase {
        ImportPhase::Idle => vec![
            Span::styled("o", Style::default().fg(theme.accent)),
            Span::raw(" file"),
        ],
        ImportPhase::Staged => vec![
            Span::styled("space", Style::default().fg(theme.accent)),
            Span::raw(" toggle  "),
            Span::styled("a", Style::default().fg(theme.accent)),
            Span::raw(" all  "),
            Span::styled("x", Style::default().fg(theme.accent)),
            Span::raw(" none  "),
            Span::styled("Enter", Style::default().fg(theme.accent)),
            Span::raw(" import  "),
            Span::styled("Esc", Style::default().fg(theme.accent)),
            Span::raw(" discard"),
        ],
        ImportPhase::Parsing | ImportPhase::Importing => vec![Span::styled(
            "working…",
            Style::default().fg(theme.dim),
        )],
    }
}

fn edit_hints(theme: &Theme) -> Vec<Span<'static>> {
    vec![
        Span::styled("Enter", Style::default().fg(theme.accent)),
        Span::raw(" save  "),
        Span::styled("Esc", Style::default().fg(theme.accent)),
        Span::raw(" cancel"),
    ]
}
