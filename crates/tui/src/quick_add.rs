use api_types::transaction::TransactionType;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct QuickAdd {
    pub kind: TransactionType,
    pub amount: f64,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty input")]
    Empty,
    #[error("invalid amount")]
    InvalidAmount,
    #[error("invalid date, expected YYYY-MM-DD")]
    InvalidDate,
    #[error("too many tags: max 1")]
    TooManyTags,
    #[error("too many dates: max 1")]
    TooManyDates,
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a quick-add line into a draft transaction.
///
/// Rules:
/// - `12.50 ...` and `-12.50 ...` => expense
/// - `+12.50 ...` => income
/// - optional `#tag` (max 1) => category name
/// - optional `@YYYY-MM-DD` (max 1) => date, otherwise today
/// - everything else => description
pub fn parse(input: &str) -> Result<QuickAdd, ParseError> {
    let trimmed = collapse_whitespace(input.trim());
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let (kind, rest) = if let Some(stripped) = trimmed.strip_prefix('+') {
        (TransactionType::Income, stripped.trim_start())
    } else if let Some(stripped) = trimmed.strip_prefix('-') {
        (TransactionType::Expense, stripped.trim_start())
    } else {
        (TransactionType::Expense, trimmed.as_str())
    };

    let mut parts = rest.splitn(2, ' ');
    let amount_raw = parts.next().unwrap_or("").trim();
    if amount_raw.is_empty() {
        return Err(ParseError::InvalidAmount);
    }
    let tail = parts.next().unwrap_or("");

    let amount: f64 = amount_raw
        .replace(',', ".")
        .parse()
        .map_err(|_| ParseError::InvalidAmount)?;
    let amount = amount.abs();
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ParseError::InvalidAmount);
    }

    let mut category: Option<String> = None;
    let mut date: Option<NaiveDate> = None;
    let mut kept: Vec<&str> = Vec::new();

    for token in tail.split_whitespace() {
        if let Some(tag) = token.strip_prefix('#') {
            if tag.is_empty() {
                kept.push(token);
                continue;
            }
            if category.is_some() {
                return Err(ParseError::TooManyTags);
            }
            category = Some(tag.to_string());
        } else if let Some(raw) = token.strip_prefix('@') {
            if raw.is_empty() {
                kept.push(token);
                continue;
            }
            if date.is_some() {
                return Err(ParseError::TooManyDates);
            }
            date = Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ParseError::InvalidDate)?,
            );
        } else {
            kept.push(token);
        }
    }

    let description = kept.join(" ");
    let description = (!description.is_empty()).then_some(description);

    Ok(QuickAdd {
        kind,
        amount,
        category,
        date,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_default_without_sign() {
        let parsed = parse("12.50 coffee").unwrap();
        assert_eq!(parsed.kind, TransactionType::Expense);
        assert_eq!(parsed.amount, 12.5);
        assert_eq!(parsed.description.as_deref(), Some("coffee"));
    }

    #[test]
    fn expense_with_minus_sign() {
        let parsed = parse("-12.50 coffee").unwrap();
        assert_eq!(parsed.kind, TransactionType::Expense);
        assert_eq!(parsed.amount, 12.5);
    }

    #[test]
    fn income_with_plus_sign() {
        let parsed = parse("+50000 salary").unwrap();
        assert_eq!(parsed.kind, TransactionType::Income);
        assert_eq!(parsed.amount, 50000.0);
    }

    #[test]
    fn comma_decimal_separator_is_accepted() {
        let parsed = parse("12,50").unwrap();
        assert_eq!(parsed.amount, 12.5);
    }

    #[test]
    fn tag_becomes_the_category_name() {
        let parsed = parse("200 groceries #Food weekly shop").unwrap();
        assert_eq!(parsed.category.as_deref(), Some("Food"));
        assert_eq!(parsed.description.as_deref(), Some("groceries weekly shop"));
    }

    #[test]
    fn at_token_sets_the_date() {
        let parsed = parse("200 @2024-03-05 rent").unwrap();
        assert_eq!(
            parsed.date,
            Some(NaiveDate::parse_from_str("2024-03-05", "%Y-%m-%d").unwrap())
        );
        assert_eq!(parsed.description.as_deref(), Some("rent"));
    }

    #[test]
    fn bad_date_is_rejected() {
        assert_eq!(parse("200 @03-05-2024"), Err(ParseError::InvalidDate));
    }

    #[test]
    fn second_tag_is_rejected() {
        assert_eq!(parse("200 #a #b"), Err(ParseError::TooManyTags));
    }

    #[test]
    fn amount_must_be_positive_and_numeric() {
        assert_eq!(parse("abc coffee"), Err(ParseError::InvalidAmount));
        assert_eq!(parse("0"), Err(ParseError::InvalidAmount));
        assert_eq!(parse("   "), Err(ParseError::Empty));
    }
}
