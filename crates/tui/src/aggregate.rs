use api_types::{
    analytics::{CategoryTotal, DateTotal},
    transaction::{Transaction, TransactionType},
};

/// Expense totals grouped by whatever `key` extracts, in first-encounter
/// order. Rows where the selector returns `None` are skipped; income never
/// contributes.
fn sum_expenses_by<K, F>(items: &[Transaction], key: F) -> Vec<(K, f64)>
where
    K: PartialEq,
    F: Fn(&Transaction) -> Option<K>,
{
    let mut totals: Vec<(K, f64)> = Vec::new();

    for item in items {
        if item.kind != TransactionType::Expense {
            continue;
        }
        let Some(group) = key(item) else {
            continue;
        };
        match totals.iter_mut().find(|(existing, _)| *existing == group) {
            Some((_, total)) => *total += item.amount,
            None => totals.push((group, item.amount)),
        }
    }

    totals
}

/// Sums expenses per category label, in first-encounter order.
///
/// Label precedence follows the server's own analytics: the embedded
/// category name, then `#<category_id>`, then `Uncategorized`.
pub fn by_category(items: &[Transaction]) -> Vec<CategoryTotal> {
    sum_expenses_by(items, |item| Some(category_label(item)))
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect()
}

/// Sums expenses per day in ascending date order, using `created_at` when a
/// transaction has no explicit date. Rows with neither are skipped.
pub fn by_date(items: &[Transaction]) -> Vec<DateTotal> {
    let mut totals = sum_expenses_by(items, |item| {
        item.date.or_else(|| item.created_at.map(|dt| dt.date()))
    });
    totals.sort_by_key(|(date, _)| *date);
    totals
        .into_iter()
        .map(|(date, total)| DateTotal { date, total })
        .collect()
}

pub fn category_label(item: &Transaction) -> String {
    item.category
        .as_ref()
        .map(|category| category.name.clone())
        .filter(|name| !name.is_empty())
        .or_else(|| item.category_id.map(|id| format!("#{id}")))
        .unwrap_or_else(|| "Uncategorized".to_string())
}

#[cfg(test)]
mod tests {
    use api_types::category::Category;
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;

    fn txn(kind: TransactionType, amount: f64) -> Transaction {
        Transaction {
            id: 0,
            kind,
            amount,
            currency: None,
            date: None,
            description: None,
            category_id: None,
            category: None,
            created_at: None,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn income_rows_are_ignored() {
        let items = vec![
            txn(TransactionType::Income, 1000.0),
            txn(TransactionType::Expense, 40.0),
        ];
        let totals = by_category(&items);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].category, "Uncategorized");
        assert_eq!(totals[0].total, 40.0);
    }

    #[test]
    fn category_label_falls_back_to_id_then_uncategorized() {
        let mut named = txn(TransactionType::Expense, 10.0);
        named.category = Some(Category {
            id: 3,
            name: "Food".to_string(),
            description: None,
        });

        let mut id_only = txn(TransactionType::Expense, 20.0);
        id_only.category_id = Some(9);

        let bare = txn(TransactionType::Expense, 30.0);

        let totals = by_category(&[named, id_only, bare]);
        let labels: Vec<&str> = totals.iter().map(|t| t.category.as_str()).collect();
        assert_eq!(labels, ["Food", "#9", "Uncategorized"]);
    }

    #[test]
    fn categories_keep_first_encounter_order() {
        let mut a = txn(TransactionType::Expense, 1.0);
        a.category_id = Some(2);
        let mut b = txn(TransactionType::Expense, 2.0);
        b.category_id = Some(1);
        let mut c = txn(TransactionType::Expense, 3.0);
        c.category_id = Some(2);

        let totals = by_category(&[a, b, c]);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, "#2");
        assert_eq!(totals[0].total, 4.0);
        assert_eq!(totals[1].category, "#1");
    }

    #[test]
    fn dates_come_out_ascending() {
        let mut late = txn(TransactionType::Expense, 5.0);
        late.date = Some(date("2024-03-09"));
        let mut early = txn(TransactionType::Expense, 7.0);
        early.date = Some(date("2024-03-01"));
        let mut same_day = txn(TransactionType::Expense, 1.0);
        same_day.date = Some(date("2024-03-09"));

        let totals = by_date(&[late, early, same_day]);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].date, date("2024-03-01"));
        assert_eq!(totals[1].date, date("2024-03-09"));
        assert_eq!(totals[1].total, 6.0);
    }

    #[test]
    fn undated_rows_use_created_at_or_are_skipped() {
        let mut created_only = txn(TransactionType::Expense, 9.0);
        created_only.created_at = Some(datetime("2024-02-02T08:30:00"));
        let dateless = txn(TransactionType::Expense, 4.0);

        let totals = by_date(&[created_only, dateless]);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].date, date("2024-02-02"));
        assert_eq!(totals[0].total, 9.0);
    }
}
