use ratatui::symbols;

/// ASCII horizontal bar scaled against the largest value in the chart.
///
/// Returns a string like `████████░░░░░░░░░░░░`.
#[must_use]
pub fn ascii_bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 {
        return "░".repeat(width);
    }

    let ratio = (value / max).clamp(0.0, 1.0);
    let filled = ((ratio * width as f64) as usize).min(width);
    let empty = width.saturating_sub(filled);

    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Mini bar chart as a string, one eighth-block column per value.
///
/// Returns something like `▁▂▃▅▇▅▃▂▁` for a day-by-day series.
#[must_use]
pub fn mini_bar_chart(values: &[f64]) -> String {
    if values.is_empty() {
        return String::new();
    }

    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return " ".repeat(values.len());
    }

    let bars = [
        symbols::bar::ONE_EIGHTH,
        symbols::bar::ONE_QUARTER,
        symbols::bar::THREE_EIGHTHS,
        symbols::bar::HALF,
        symbols::bar::FIVE_EIGHTHS,
        symbols::bar::THREE_QUARTERS,
        symbols::bar::SEVEN_EIGHTHS,
        symbols::bar::FULL,
    ];

    values
        .iter()
        .map(|&v| {
            if v <= 0.0 {
                " "
            } else {
                let index = ((v / max) * 7.0) as usize;
                bars[index.min(7)]
            }
        })
        .collect()
}

/// Share of `value` in `max`, rounded down to whole percent.
#[must_use]
pub fn percentage_of(value: f64, max: f64) -> u16 {
    if max <= 0.0 {
        return 0;
    }
    ((value.abs() / max.abs()) * 100.0).min(100.0) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(ascii_bar(5.0, 10.0, 10), "█████░░░░░");
        assert_eq!(ascii_bar(10.0, 10.0, 4), "████");
    }

    #[test]
    fn zero_max_renders_empty_bar() {
        assert_eq!(ascii_bar(3.0, 0.0, 4), "░░░░");
        assert_eq!(percentage_of(3.0, 0.0), 0);
    }

    #[test]
    fn mini_chart_scales_to_tallest_value() {
        let chart = mini_bar_chart(&[0.0, 50.0, 100.0]);
        assert_eq!(chart.chars().count(), 3);
        assert!(chart.starts_with(' '));
        assert!(chart.ends_with(symbols::bar::FULL));
    }
}
