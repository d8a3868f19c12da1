use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub mod auth {
    use super::*;

    /// Request body for both `/auth/login` and `/auth/register`.
    ///
    /// `username` is only meaningful for registration and is omitted from the
    /// JSON when absent.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Credentials {
        pub email: String,
        pub password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub username: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenResponse {
        /// Raw token, without the `Bearer ` scheme prefix.
        #[serde(default)]
        pub access_token: String,
        #[serde(default)]
        pub token_type: Option<String>,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Category {
        pub id: i64,
        pub name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionType {
        Income,
        Expense,
    }

    impl TransactionType {
        /// Returns the canonical string used on the wire and in query params.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Income => "income",
                Self::Expense => "expense",
            }
        }
    }

    /// A transaction as returned by `GET /transactions`.
    ///
    /// The server stringifies the decimal `amount` in list payloads while
    /// other endpoints produce plain numbers, so decoding accepts both and
    /// coerces anything unparseable to 0.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Transaction {
        pub id: i64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        #[serde(default, deserialize_with = "crate::lenient::amount")]
        pub amount: f64,
        #[serde(default)]
        pub currency: Option<String>,
        #[serde(default)]
        pub date: Option<NaiveDate>,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub category_id: Option<i64>,
        #[serde(default)]
        pub category: Option<crate::category::Category>,
        /// Naive ISO timestamp; the server emits no UTC offset.
        #[serde(default)]
        pub created_at: Option<NaiveDateTime>,
    }

    /// One page of transactions: `{items, total, page, per_page}`.
    ///
    /// `page` and `per_page` echo what the server actually applied, which may
    /// differ from what was requested.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionPage {
        #[serde(default)]
        pub items: Vec<Transaction>,
        #[serde(default)]
        pub total: Option<u64>,
        #[serde(default)]
        pub page: Option<u32>,
        #[serde(default)]
        pub per_page: Option<u32>,
    }

    /// Query parameters for `GET /transactions`.
    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct TransactionQuery {
        pub page: u32,
        pub per_page: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub start_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub end_date: Option<NaiveDate>,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        pub kind: Option<TransactionType>,
    }

    /// Request body for `POST /transactions`.
    ///
    /// `category_id` stays in the JSON even when null; the server accepts
    /// either form but the reference client always sends the key.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub amount: f64,
        pub currency: String,
        pub date: NaiveDate,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        pub category_id: Option<i64>,
    }
}

pub mod analytics {
    use super::*;

    /// One row of `GET /analytics/by_category`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CategoryTotal {
        pub category: String,
        #[serde(default, deserialize_with = "crate::lenient::amount")]
        pub total: f64,
    }

    /// One row of `GET /analytics/by_date`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct DateTotal {
        pub date: NaiveDate,
        #[serde(default, deserialize_with = "crate::lenient::amount")]
        pub total: f64,
    }

    /// Query parameters shared by both analytics endpoints.
    #[derive(Clone, Debug, Default, Serialize)]
    pub struct AnalyticsQuery {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub start_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub end_date: Option<NaiveDate>,
    }
}

pub mod import {
    use super::*;
    use crate::transaction::TransactionType;

    /// A candidate row extracted from an uploaded PDF.
    ///
    /// The parser keeps `date` as whatever string it matched (or null); the
    /// server re-validates dates on bulk create.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CandidateRow {
        #[serde(default)]
        pub date: Option<String>,
        #[serde(default)]
        pub description: String,
        #[serde(default, deserialize_with = "crate::lenient::amount")]
        pub amount: f64,
    }

    /// Response of `POST /transactions/upload_pdf`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ParseResponse {
        #[serde(default)]
        pub rows: Vec<CandidateRow>,
        /// Server-side path the upload was stored under.
        #[serde(default)]
        pub file: Option<String>,
    }

    /// One row of a bulk-create request: a candidate row tagged with a type.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ImportRow {
        pub date: Option<String>,
        pub description: String,
        pub amount: f64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BulkImportRequest {
        pub rows: Vec<ImportRow>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BulkImportResponse {
        #[serde(default)]
        pub created: u64,
        #[serde(default)]
        pub ids: Vec<i64>,
    }
}

pub mod receipt {
    use super::*;

    /// A stored receipt. OCR runs server-side in the background, so
    /// `raw_text` and `parsed_json` may still be empty right after an upload.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Receipt {
        pub id: i64,
        #[serde(default)]
        pub user_id: Option<i64>,
        pub file_path: String,
        #[serde(default)]
        pub uploaded_at: Option<NaiveDateTime>,
        #[serde(default)]
        pub raw_text: Option<String>,
        /// JSON encoded as a string, not an object; see [`Receipt::parsed`].
        #[serde(default)]
        pub parsed_json: Option<String>,
    }

    impl Receipt {
        /// Decodes the embedded `parsed_json` string.
        ///
        /// Absent or malformed payloads yield `None` so a half-processed
        /// receipt renders as empty rather than erroring.
        pub fn parsed(&self) -> Option<ParsedReceipt> {
            let raw = self.parsed_json.as_deref()?;
            serde_json::from_str(raw).ok()
        }
    }

    /// The summary the server's OCR pipeline extracts from a receipt image.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ParsedReceipt {
        #[serde(default)]
        pub merchant: Option<String>,
        #[serde(default, deserialize_with = "crate::lenient::amount_opt")]
        pub total: Option<f64>,
        #[serde(default)]
        pub date: Option<String>,
        #[serde(default)]
        pub raw_lines: Vec<String>,
    }
}

/// Tolerant decoders for wire quirks shared across payloads.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accepts a number or a numeric string; anything else coerces to 0.
    pub(crate) fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce(&value).unwrap_or(0.0))
    }

    /// Like [`amount`], but null and unparseable values become `None`.
    pub(crate) fn amount_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce(&value))
    }

    fn coerce(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::import::ImportRow;
    use crate::receipt::Receipt;
    use crate::transaction::{Transaction, TransactionPage, TransactionQuery, TransactionType};

    #[test]
    fn amount_accepts_string_and_number() {
        let json = r#"{"id": 1, "type": "expense", "amount": "12.50"}"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.amount, 12.5);

        let json = r#"{"id": 2, "type": "income", "amount": 3}"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.amount, 3.0);
    }

    #[test]
    fn unparseable_amount_coerces_to_zero() {
        let json = r#"{"id": 1, "type": "expense", "amount": "12,50"}"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.amount, 0.0);

        let json = r#"{"id": 1, "type": "expense", "amount": null}"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.amount, 0.0);
    }

    #[test]
    fn page_echo_fields_are_optional() {
        let json = r#"{"items": []}"#;
        let page: TransactionPage = serde_json::from_str(json).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.page, None);
        assert_eq!(page.per_page, None);
    }

    #[test]
    fn query_omits_unset_filters() {
        let query = TransactionQuery {
            page: 1,
            per_page: 25,
            start_date: None,
            end_date: None,
            kind: Some(TransactionType::Expense),
        };
        let encoded = serde_urlencoded::to_string(&query).unwrap();
        assert_eq!(encoded, "page=1&per_page=25&type=expense");
    }

    #[test]
    fn import_row_tags_the_type_on_the_wire() {
        let row = ImportRow {
            date: None,
            description: "COFFEE".to_string(),
            amount: 4.2,
            kind: TransactionType::Expense,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["type"], "expense");
        assert!(json["date"].is_null());
    }

    #[test]
    fn malformed_parsed_json_reads_as_absent() {
        let receipt = Receipt {
            id: 7,
            user_id: None,
            file_path: "uploads/7/receipt.jpg".to_string(),
            uploaded_at: None,
            raw_text: None,
            parsed_json: Some("{not json".to_string()),
        };
        assert!(receipt.parsed().is_none());
    }

    #[test]
    fn parsed_json_decodes_merchant_and_total() {
        let receipt = Receipt {
            id: 7,
            user_id: None,
            file_path: "uploads/7/receipt.jpg".to_string(),
            uploaded_at: None,
            raw_text: Some("TOTAL 12.00".to_string()),
            parsed_json: Some(
                r#"{"merchant": "SPAR", "total": "12.00", "date": null, "raw_lines": []}"#
                    .to_string(),
            ),
        };
        let parsed = receipt.parsed().unwrap();
        assert_eq!(parsed.merchant.as_deref(), Some("SPAR"));
        assert_eq!(parsed.total, Some(12.0));
    }
}
