use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use shared_types::{
    Budget, Category, CategoryReport, CreateTransactionResponse, ErrorResponse, Family,
    FamilyMember, FamilyRequest, FamilyResponse, MonthlyReport, NewTransaction, Notification,
    SuccessResponse, SyncRequest, SyncResponse, Transaction, TransactionFilter, TransactionKind,
};
use std::time::Duration;

use super::{ApiError, FinanceBackend};

pub const USER_ID_HEADER: &str = "X-User-ID";

/// Per-call overrides. Headers are merged over the defaults; the identity
/// header is always re-applied last.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn with_query<K: Into<String>>(pairs: impl IntoIterator<Item = (K, String)>) -> Self {
        Self {
            query: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    pub fn with_body<T: serde::Serialize>(body: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("Failed to serialize request: {}", e)))?;
        Ok(Self {
            body: Some(body),
            ..Self::default()
        })
    }
}

pub struct FinanceApiClient {
    http: reqwest::Client,
    base_url: String,
    user_id: i64,
}

impl FinanceApiClient {
    pub fn new(base_url: &str, user_id: i64, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id,
        })
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from(self.user_id),
        );
        headers
    }

    fn merged_headers(&self, extra: HeaderMap) -> HeaderMap {
        let mut headers = self.default_headers();
        for (name, value) in extra.iter() {
            headers.insert(name.clone(), value.clone());
        }
        headers.insert(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from(self.user_id),
        );
        headers
    }

    fn user_query(&self) -> (String, String) {
        ("user_id".to_string(), self.user_id.to_string())
    }

    /// Sends one request and decodes the JSON body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let body = self.send(method, endpoint, options).await?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("API Error ({}): failed to decode body: {}", endpoint, e);
            ApiError::Decode(e.to_string())
        })
    }

    /// Like `request`, but an empty body counts as `{ success: true }`.
    async fn request_ack(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<SuccessResponse, ApiError> {
        let body = self.send(method, endpoint, options).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(SuccessResponse { success: true });
        }
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method, &url)
            .headers(self.merged_headers(options.headers));
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = &options.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("API Error ({}): {}", endpoint, e);
            ApiError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = ApiError::Request {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            };
            match response.json::<ErrorResponse>().await {
                Ok(detail) => {
                    tracing::error!("API Error ({}): {} ({})", endpoint, err, detail.error)
                }
                Err(_) => tracing::error!("API Error ({}): {}", endpoint, err),
            }
            return Err(err);
        }

        let bytes = response.bytes().await.map_err(|e| {
            tracing::error!("API Error ({}): {}", endpoint, e);
            ApiError::Network(e)
        })?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl FinanceBackend for FinanceApiClient {
    async fn get_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, ApiError> {
        let mut query = vec![self.user_query()];
        query.extend(
            filter
                .query_pairs()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v)),
        );
        self.request(Method::GET, "/api/transactions", RequestOptions::with_query(query))
            .await
    }

    async fn add_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> Result<CreateTransactionResponse, ApiError> {
        self.request(
            Method::POST,
            "/api/transactions",
            RequestOptions::with_body(transaction)?,
        )
        .await
    }

    async fn delete_transaction(&self, transaction_id: i64) -> Result<SuccessResponse, ApiError> {
        self.request_ack(
            Method::DELETE,
            &format!("/api/transactions/{}", transaction_id),
            RequestOptions::default(),
        )
        .await
    }

    async fn get_monthly_report(&self) -> Result<MonthlyReport, ApiError> {
        self.request(
            Method::GET,
            "/api/reports/monthly",
            RequestOptions::with_query([self.user_query()]),
        )
        .await
    }

    async fn get_category_report(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<CategoryReport, ApiError> {
        let mut query = vec![self.user_query()];
        if let Some(start) = start_date {
            query.push(("start_date".to_string(), start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = end_date {
            query.push(("end_date".to_string(), end.format("%Y-%m-%d").to_string()));
        }
        self.request(
            Method::GET,
            "/api/reports/categories",
            RequestOptions::with_query(query),
        )
        .await
    }

    async fn get_family(&self) -> Result<Option<Family>, ApiError> {
        let value: serde_json::Value = self
            .request(
                Method::GET,
                "/api/family",
                RequestOptions::with_query([self.user_query()]),
            )
            .await?;

        // The backend answers `null` or `{}` for users without a family
        if value.get("id").map_or(true, |id| id.is_null()) {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn create_family(&self, family_name: &str) -> Result<FamilyResponse, ApiError> {
        let body = FamilyRequest::Create {
            user_id: self.user_id,
            family_name: family_name.to_string(),
        };
        self.request(Method::POST, "/api/family", RequestOptions::with_body(&body)?)
            .await
    }

    async fn join_family(&self, invite_code: &str) -> Result<FamilyResponse, ApiError> {
        let body = FamilyRequest::Join {
            user_id: self.user_id,
            invite_code: invite_code.to_string(),
        };
        self.request(Method::POST, "/api/family", RequestOptions::with_body(&body)?)
            .await
    }

    async fn get_family_members(&self) -> Result<Vec<FamilyMember>, ApiError> {
        match self.get_family().await? {
            Some(family) => {
                self.request(
                    Method::GET,
                    &format!("/api/family/{}/members", family.id),
                    RequestOptions::default(),
                )
                .await
            }
            None => Ok(Vec::new()),
        }
    }

    async fn sync(&self, last_sync: Option<&str>) -> Result<SyncResponse, ApiError> {
        let body = SyncRequest {
            user_id: self.user_id,
            last_sync: last_sync.map(str::to_string),
        };
        self.request(Method::POST, "/api/sync", RequestOptions::with_body(&body)?)
            .await
    }

    async fn get_budgets(&self) -> Result<Vec<Budget>, ApiError> {
        self.request(
            Method::GET,
            "/api/budgets",
            RequestOptions::with_query([self.user_query()]),
        )
        .await
    }

    async fn set_budget(
        &self,
        category: &str,
        amount_limit: f64,
        period: &str,
    ) -> Result<SuccessResponse, ApiError> {
        let body = Budget {
            id: None,
            user_id: self.user_id,
            category: category.to_string(),
            amount_limit,
            period: period.to_string(),
            spent: None,
        };
        self.request_ack(Method::POST, "/api/budgets", RequestOptions::with_body(&body)?)
            .await
    }

    async fn get_categories(
        &self,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Category>, ApiError> {
        let mut query = vec![self.user_query()];
        if let Some(kind) = kind {
            query.push(("type".to_string(), kind.to_string()));
        }
        self.request(Method::GET, "/api/categories", RequestOptions::with_query(query))
            .await
    }

    async fn get_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.request(
            Method::GET,
            "/api/notifications",
            RequestOptions::with_query([self.user_query()]),
        )
        .await
    }

    async fn mark_notification_read(
        &self,
        notification_id: i64,
    ) -> Result<SuccessResponse, ApiError> {
        self.request_ack(
            Method::PUT,
            &format!("/api/notifications/{}/read", notification_id),
            RequestOptions::default(),
        )
        .await
    }
}
