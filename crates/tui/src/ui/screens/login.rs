use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{
    app::{AppState, LoginField, LoginMode},
    ui::theme::Theme,
};

/// Calculates a centered rect for the login box
fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let login = &state.login;
    let registering = login.mode == LoginMode::Register;

    let box_width = 44;
    let box_height = if registering { 9 } else { 7 };
    let card_area = centered_box(box_width, box_height, area);

    frame.render_widget(Clear, card_area);

    let title = if registering { " register " } else { " login " };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));

    let inner = block.inner(card_area);
    frame.render_widget(block, card_area);

    let mut constraints = vec![
        Constraint::Length(1), // Email
        Constraint::Length(1), // Spacer
        Constraint::Length(1), // Password
    ];
    if registering {
        constraints.push(Constraint::Length(1)); // Spacer
        constraints.push(Constraint::Length(1)); // Username
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(inner);

    render_field(
        frame,
        rows[0],
        "email",
        &login.email,
        false,
        login.focus == LoginField::Email,
        theme,
    );
    render_field(
        frame,
        rows[2],
        "password",
        &login.password,
        true,
        login.focus == LoginField::Password,
        theme,
    );
    if registering {
        render_field(
            frame,
            rows[4],
            "username",
            &login.username,
            false,
            login.focus == LoginField::Username,
            theme,
        );
    }

    let hint = if registering {
        "tab next · enter create account · ctrl+r back to login"
    } else {
        "tab next · enter sign in · ctrl+r register"
    };
    let hint_area = Rect {
        x: area.x,
        y: card_area.y + card_area.height,
        width: area.width,
        height: 1,
    };
    if hint_area.bottom() <= area.bottom() {
        frame.render_widget(
            Paragraph::new(Span::styled(hint, Style::default().fg(theme.dim)))
                .alignment(Alignment::Center),
            hint_area,
        );
    }

    if let Some(message) = &login.message {
        let message_area = Rect {
            x: area.x,
            y: card_area.y + card_area.height + 2,
            width: area.width,
            height: 1,
        };
        if message_area.bottom() <= area.bottom() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    message.as_str(),
                    Style::default().fg(theme.error),
                ))
                .alignment(Alignment::Center),
                message_area,
            );
        }
    }
}

/// Renders one labeled input row with a cursor on the focused field.
fn render_field(
    frame: &mut Frame<'_>,
    area: Rect,
    label: &str,
    value: &str,
    is_password: bool,
    focused: bool,
    theme: &Theme,
) {
    let cursor = if focused { "│" } else { "" };

    let shown = if is_password {
        mask_password(value)
    } else {
        value.to_string()
    };

    let value_style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.text)
    };

    let line = Line::from(vec![
        Span::styled(format!("{label:<9} "), Style::default().fg(theme.dim)),
        Span::styled(format!("{shown}{cursor}"), value_style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Masks password with bullets, one per character
fn mask_password(password: &str) -> String {
    "•".repeat(password.chars().count())
}
