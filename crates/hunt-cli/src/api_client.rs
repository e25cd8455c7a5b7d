//! HTTP client for the Hunt HQ admin API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use hunt_api::dto::{
    AuditLogResponse, AuditLogsResponse, ClaimAttemptsResponse, ClearClaimAttemptsRequest,
    ClearClaimAttemptsResponse, CreateHuntItemRequest, CurrentUserResponse, HealthResponse,
    HuntItemEnvelope, HuntItemListResponse, HuntItemResponse, LoginRequest, SuccessResponse,
    UpdateHuntItemRequest, UserDetail, UserDetailResponse, UserSummary,
};
use hunt_core::ClearPolicy;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Request timeout for every API call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Filters for the admin claim-attempt listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimAttemptFilters {
    pub email: Option<String>,
    pub failed_only: bool,
    pub limit: Option<u32>,
}

impl ClaimAttemptFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            pairs.push(("email", email.trim().to_string()));
        }
        if self.failed_only {
            pairs.push(("failed", "true".to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Admin operations the CLI views drive.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Lists hunt items, most recent first.
    async fn list_hunt_items(&self) -> Result<Vec<HuntItemResponse>>;

    /// Creates a hunt item.
    async fn create_hunt_item(&self, request: &CreateHuntItemRequest) -> Result<HuntItemResponse>;

    /// Applies a partial update to a hunt item.
    async fn update_hunt_item(
        &self,
        id: Uuid,
        request: &UpdateHuntItemRequest,
    ) -> Result<HuntItemResponse>;

    /// Deletes a hunt item.
    async fn delete_hunt_item(&self, id: Uuid) -> Result<()>;

    /// Lists claim attempts across users with aggregate stats.
    async fn list_claim_attempts(
        &self,
        filters: &ClaimAttemptFilters,
    ) -> Result<ClaimAttemptsResponse>;

    /// Clears a user's claim attempts under a policy.
    async fn clear_claim_attempts(
        &self,
        email: &str,
        policy: ClearPolicy,
    ) -> Result<ClearClaimAttemptsResponse>;

    /// Gets a user with history and attempts.
    async fn get_user(&self, id: Uuid) -> Result<UserDetail>;

    /// Lists admin audit records, newest first.
    async fn audit_logs(&self, limit: u32, user: Option<&str>) -> Result<Vec<AuditLogResponse>>;
}

/// API client for a Hunt HQ server.
///
/// Keeps the session cookie from [`ApiClient::login`] for later calls.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a new API client.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .cookie_store(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Checks if the API server is healthy.
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("/health", &[]).await
    }

    /// Signs in and stores the session cookie.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserSummary> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: CurrentUserResponse = self
            .send_json(reqwest::Method::POST, "/auth/login", &request)
            .await?;
        Ok(response.user)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .context("Failed to send request")?;

        handle_response(response).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .request(method, &url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        handle_response(response).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .context("Failed to send request")?;

        handle_response(response).await
    }
}

#[async_trait]
impl AdminApi for ApiClient {
    async fn list_hunt_items(&self) -> Result<Vec<HuntItemResponse>> {
        let response: HuntItemListResponse = self.get("/api/hunt-items", &[]).await?;
        Ok(response.hunt_items)
    }

    async fn create_hunt_item(&self, request: &CreateHuntItemRequest) -> Result<HuntItemResponse> {
        let response: HuntItemEnvelope = self
            .send_json(reqwest::Method::POST, "/api/hunt-items", request)
            .await?;
        Ok(response.hunt_item)
    }

    async fn update_hunt_item(
        &self,
        id: Uuid,
        request: &UpdateHuntItemRequest,
    ) -> Result<HuntItemResponse> {
        let response: HuntItemEnvelope = self
            .send_json(reqwest::Method::PUT, &format!("/api/hunt-items/{}", id), request)
            .await?;
        Ok(response.hunt_item)
    }

    async fn delete_hunt_item(&self, id: Uuid) -> Result<()> {
        let _: SuccessResponse = self.delete(&format!("/api/hunt-items/{}", id)).await?;
        Ok(())
    }

    async fn list_claim_attempts(
        &self,
        filters: &ClaimAttemptFilters,
    ) -> Result<ClaimAttemptsResponse> {
        self.get("/api/admin/claim-attempts", &filters.query_pairs())
            .await
    }

    async fn clear_claim_attempts(
        &self,
        email: &str,
        policy: ClearPolicy,
    ) -> Result<ClearClaimAttemptsResponse> {
        let request = ClearClaimAttemptsRequest {
            user_email: email.to_string(),
            clear_type: policy.as_str().to_string(),
        };
        self.send_json(reqwest::Method::POST, "/api/admin/claim-attempts", &request)
            .await
    }

    async fn get_user(&self, id: Uuid) -> Result<UserDetail> {
        let response: UserDetailResponse = self.get(&format!("/api/users/{}", id), &[]).await?;
        Ok(response.user)
    }

    async fn audit_logs(&self, limit: u32, user: Option<&str>) -> Result<Vec<AuditLogResponse>> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(user) = user {
            query.push(("user", user.to_string()));
        }
        let response: AuditLogsResponse = self.get("/api/admin/audit-logs", &query).await?;
        Ok(response.audit_logs)
    }
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        return response
            .json()
            .await
            .context("Failed to parse response body");
    }

    let error: ApiErrorResponse = response.json().await.unwrap_or_else(|_| ApiErrorResponse {
        code: "UNKNOWN".to_string(),
        error: "Unknown error".to_string(),
        retry_after_seconds: None,
    });

    match error.retry_after_seconds {
        Some(secs) => anyhow::bail!(
            "API error ({}): {} - {} (retry after {}s)",
            status,
            error.code,
            error.error,
            secs
        ),
        None => anyhow::bail!("API error ({}): {} - {}", status, error.code, error.error),
    }
}

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorResponse {
    code: String,
    error: String,
    #[serde(default)]
    retry_after_seconds: Option<u64>,
}
