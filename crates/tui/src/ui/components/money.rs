use api_types::transaction::TransactionType;
use ratatui::{
    style::{Modifier, Style},
    text::Span,
};

use crate::ui::theme::Theme;

/// Fallback when neither the row nor the config names a currency.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Formats an amount the way the server reports it: two decimals, then
/// the currency code.
#[must_use]
pub fn format_amount(amount: f64, currency: Option<&str>) -> String {
    let currency = currency
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CURRENCY);
    format!("{amount:.2} {currency}")
}

/// Creates a styled span for a transaction amount.
///
/// - Income: green with `+` prefix
/// - Expense: red with `-` prefix
///
/// Amounts arrive unsigned; the direction lives in the transaction type.
#[must_use]
pub fn styled_amount(
    amount: f64,
    kind: TransactionType,
    currency: Option<&str>,
    theme: &Theme,
) -> Span<'static> {
    let formatted = format_amount(amount.abs(), currency);
    let (color, prefix) = match kind {
        TransactionType::Income => (theme.positive, "+"),
        TransactionType::Expense => (theme.error, "-"),
    };

    Span::styled(format!("{prefix}{formatted}"), Style::default().fg(color))
}

/// Bold variant for totals.
#[must_use]
pub fn styled_total(amount: f64, currency: Option<&str>, theme: &Theme) -> Span<'static> {
    Span::styled(
        format_amount(amount, currency),
        Style::default()
            .fg(theme.text)
            .add_modifier(Modifier::BOLD),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_two_decimals_with_currency() {
        assert_eq!(format_amount(1234.5, Some("EUR")), "1234.50 EUR");
    }

    #[test]
    fn empty_currency_falls_back_to_default() {
        assert_eq!(format_amount(10.0, Some("")), "10.00 INR");
        assert_eq!(format_amount(10.0, None), "10.00 INR");
    }

    #[test]
    fn signs_follow_transaction_type() {
        let theme = Theme::default();
        let income = styled_amount(25.0, TransactionType::Income, None, &theme);
        assert_eq!(income.content.as_ref(), "+25.00 INR");

        let expense = styled_amount(25.0, TransactionType::Expense, None, &theme);
        assert_eq!(expense.content.as_ref(), "-25.00 INR");
    }
}
