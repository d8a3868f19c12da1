use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub text: Color,
    pub dim: Color,
    pub accent: Color,
    pub error: Color,
    pub positive: Color,
    pub border: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Color::Rgb(220, 220, 220),
            dim: Color::Rgb(140, 140, 140),
            accent: Color::Rgb(90, 160, 200),
            error: Color::Rgb(200, 80, 80),
            positive: Color::Rgb(110, 180, 110),
            border: Color::Rgb(60, 70, 80),
        }
    }
}
