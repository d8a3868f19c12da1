use api_types::{
    analytics::{AnalyticsQuery, CategoryTotal, DateTotal},
    auth::{Credentials, TokenResponse},
    category::{Category, CategoryNew},
    import::{BulkImportRequest, BulkImportResponse, ParseResponse},
    receipt::Receipt,
    transaction::{Transaction, TransactionNew, TransactionPage, TransactionQuery},
};
use reqwest::{StatusCode, Url, multipart};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;

use crate::error::{AppError, Result};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// True for the statuses that invalidate the stored session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Forbidden(_))
    }

    /// Human-readable message suitable for a status line.
    pub fn detail(&self) -> String {
        match self {
            Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Validation(message)
            | Self::Server(message) => message.clone(),
            Self::Transport(err) => format!("Server unreachable: {err}"),
        }
    }
}

/// Error payload the service emits: `{"detail": ...}` from validation and
/// HTTP exceptions, `{"message": ...}` from a couple of legacy paths.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| AppError::Terminal(format!("invalid base_url: {err}")))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    pub async fn login(&self, credentials: &Credentials) -> std::result::Result<TokenResponse, ApiError> {
        let endpoint = self.endpoint("auth/login")?;
        self.token_request(endpoint, credentials).await
    }

    /// Registration answers with the same token grant a login does.
    pub async fn register(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<TokenResponse, ApiError> {
        let endpoint = self.endpoint("auth/register")?;
        self.token_request(endpoint, credentials).await
    }

    async fn token_request(
        &self,
        endpoint: Url,
        credentials: &Credentials,
    ) -> std::result::Result<TokenResponse, ApiError> {
        let token: TokenResponse = self
            .execute(self.http.post(endpoint).json(credentials))
            .await?;
        if token.access_token.trim().is_empty() {
            return Err(ApiError::Server("No token in response".to_string()));
        }
        Ok(token)
    }

    pub async fn categories(&self, auth: Option<&str>) -> std::result::Result<Vec<Category>, ApiError> {
        let endpoint = self.endpoint("categories")?;
        self.execute_lenient(with_auth(self.http.get(endpoint), auth))
            .await
    }

    pub async fn create_category(
        &self,
        auth: Option<&str>,
        payload: &CategoryNew,
    ) -> std::result::Result<Category, ApiError> {
        let endpoint = self.endpoint("categories")?;
        self.execute(with_auth(self.http.post(endpoint), auth).json(payload))
            .await
    }

    pub async fn transactions(
        &self,
        auth: Option<&str>,
        query: &TransactionQuery,
    ) -> std::result::Result<TransactionPage, ApiError> {
        let endpoint = self.endpoint("transactions")?;
        self.execute_lenient(with_auth(self.http.get(endpoint), auth).query(query))
            .await
    }

    pub async fn create_transaction(
        &self,
        auth: Option<&str>,
        payload: &TransactionNew,
    ) -> std::result::Result<Transaction, ApiError> {
        let endpoint = self.endpoint("transactions")?;
        self.execute(with_auth(self.http.post(endpoint), auth).json(payload))
            .await
    }

    pub async fn analytics_by_category(
        &self,
        auth: Option<&str>,
        query: &AnalyticsQuery,
    ) -> std::result::Result<Vec<CategoryTotal>, ApiError> {
        let endpoint = self.endpoint("analytics/by_category")?;
        self.execute_lenient(with_auth(self.http.get(endpoint), auth).query(query))
            .await
    }

    pub async fn analytics_by_date(
        &self,
        auth: Option<&str>,
        query: &AnalyticsQuery,
    ) -> std::result::Result<Vec<DateTotal>, ApiError> {
        let endpoint = self.endpoint("analytics/by_date")?;
        self.execute_lenient(with_auth(self.http.get(endpoint), auth).query(query))
            .await
    }

    /// Uploads a statement PDF; the server answers with candidate rows.
    pub async fn upload_pdf(
        &self,
        auth: Option<&str>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<ParseResponse, ApiError> {
        let endpoint = self.endpoint("transactions/upload_pdf")?;
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        self.execute(with_auth(self.http.post(endpoint), auth).multipart(form))
            .await
    }

    pub async fn bulk_import(
        &self,
        auth: Option<&str>,
        payload: &BulkImportRequest,
    ) -> std::result::Result<BulkImportResponse, ApiError> {
        let endpoint = self.endpoint("transactions/bulk")?;
        self.execute(with_auth(self.http.post(endpoint), auth).json(payload))
            .await
    }

    pub async fn upload_receipt(
        &self,
        auth: Option<&str>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<Receipt, ApiError> {
        let endpoint = self.endpoint("receipts")?;
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        self.execute(with_auth(self.http.post(endpoint), auth).multipart(form))
            .await
    }

    pub async fn receipts(&self, auth: Option<&str>) -> std::result::Result<Vec<Receipt>, ApiError> {
        let endpoint = self.endpoint("receipts")?;
        self.execute_lenient(with_auth(self.http.get(endpoint), auth))
            .await
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::Server(format!("invalid base_url: {err}")))
    }

    /// Sends the request and decodes a 2xx body strictly.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<T, ApiError> {
        let res = request.send().await.map_err(ApiError::Transport)?;
        if res.status().is_success() {
            return res.json::<T>().await.map_err(ApiError::Transport);
        }
        let status = res.status();
        let path = res.url().path().to_string();
        let body = res.text().await.unwrap_or_default();
        tracing::debug!("{path} answered {status}");
        Err(classify(status, &body))
    }

    /// Like [`execute`](Self::execute), but a malformed 2xx body falls back
    /// to the default value instead of failing. List endpoints get this
    /// treatment so one bad row never blanks the whole screen with an error.
    async fn execute_lenient<T: DeserializeOwned + Default>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<T, ApiError> {
        let res = request.send().await.map_err(ApiError::Transport)?;
        if res.status().is_success() {
            let body = res.text().await.map_err(ApiError::Transport)?;
            return Ok(serde_json::from_str(&body).unwrap_or_default());
        }
        let status = res.status();
        let path = res.url().path().to_string();
        let body = res.text().await.unwrap_or_default();
        tracing::debug!("{path} answered {status}");
        Err(classify(status, &body))
    }
}

fn with_auth(request: reqwest::RequestBuilder, auth: Option<&str>) -> reqwest::RequestBuilder {
    match auth {
        Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
        None => request,
    }
}

fn classify(status: StatusCode, body: &str) -> ApiError {
    let detail = error_detail(status, body);
    match status.as_u16() {
        401 => ApiError::Unauthorized(detail),
        403 => ApiError::Forbidden(detail),
        404 => ApiError::NotFound(detail),
        422 => ApiError::Validation(detail),
        _ => ApiError::Server(detail),
    }
}

fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        match parsed.detail {
            Some(serde_json::Value::String(detail)) => return detail,
            Some(serde_json::Value::Null) | None => {}
            // Validation errors arrive as a list of objects; show them whole.
            Some(other) => return other.to_string(),
        }
        if let Some(message) = parsed.message {
            return message;
        }
    }
    format!("HTTP {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_and_forbidden_invalidate_the_session() {
        let err = classify(StatusCode::UNAUTHORIZED, r#"{"detail": "Invalid token"}"#);
        assert!(err.is_auth_failure());
        assert_eq!(err.detail(), "Invalid token");

        let err = classify(StatusCode::FORBIDDEN, r#"{"detail": "Not yours"}"#);
        assert!(err.is_auth_failure());

        let err = classify(StatusCode::NOT_FOUND, r#"{"detail": "No such transaction"}"#);
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn detail_string_is_shown_verbatim() {
        let err = classify(StatusCode::BAD_REQUEST, r#"{"detail": "No file uploaded"}"#);
        assert_eq!(err.detail(), "No file uploaded");
    }

    #[test]
    fn structured_detail_is_rendered_whole() {
        let body = r#"{"detail": [{"loc": ["body", "amount"], "msg": "value is not a valid float"}]}"#;
        let err = classify(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(err.detail().contains("valid float"));
    }

    #[test]
    fn message_field_is_a_fallback() {
        let err = classify(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message": "boom"}"#);
        assert_eq!(err.detail(), "boom");
    }

    #[test]
    fn unparseable_body_falls_back_to_the_status() {
        let err = classify(StatusCode::BAD_GATEWAY, "<html>nginx</html>");
        assert_eq!(err.detail(), "HTTP 502");
    }
}
