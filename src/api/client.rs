//! HTTP client for the Google IAM and Cloud Resource Manager APIs.
//!
//! Wraps `reqwest::Client` with the handful of typed operations the
//! reconcilers need: role get/create/patch and organization policy
//! get/set. Error responses are mapped to [`ApiError`] by status, with the
//! message pulled from the standard Google error body where present.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::api::auth::Credentials;
use crate::api::error::{ApiError, ApiResult};
use crate::models::{CreateRoleRequest, Policy, Role, RoleDefinition, SetPolicyRequest, UpdateMask};

const IAM_BASE_URL: &str = "https://iam.googleapis.com";
const RESOURCE_MANAGER_BASE_URL: &str = "https://cloudresourcemanager.googleapis.com";

/// Standard Google API error body.
#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    message: String,
}

/// Client for organization-level role and policy operations.
#[derive(Debug, Clone)]
pub struct IamClient {
    http_client: Client,
    credentials: Credentials,
    iam_base_url: String,
    crm_base_url: String,
}

impl IamClient {
    /// Create a client against the production Google endpoints.
    pub fn new(credentials: Credentials, timeout: Duration) -> ApiResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("orgadm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            credentials,
            iam_base_url: IAM_BASE_URL.to_string(),
            crm_base_url: RESOURCE_MANAGER_BASE_URL.to_string(),
        })
    }

    /// Create a client with overridden base URLs (for testing).
    #[must_use]
    pub fn with_base_urls(
        credentials: Credentials,
        iam_base_url: impl Into<String>,
        crm_base_url: impl Into<String>,
    ) -> Self {
        Self {
            http_client: Client::new(),
            credentials,
            iam_base_url: iam_base_url.into().trim_end_matches('/').to_string(),
            crm_base_url: crm_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    // ── Role operations ───────────────────────────────────────────────

    /// Fetch a role by canonical name (GET /v1/{name}).
    pub async fn get_role(&self, name: &str) -> ApiResult<Role> {
        let url = format!("{}/v1/{}", self.iam_base_url, name);
        debug!("GET {}", url);
        let builder = self.credentials.apply(self.http_client.get(&url));
        let response = builder.send().await?;
        self.handle_response(response).await
    }

    /// Create a role under a parent (POST /v1/{parent}/roles).
    pub async fn create_role(
        &self,
        parent: &str,
        role_id: &str,
        role: &RoleDefinition,
    ) -> ApiResult<Role> {
        let url = format!("{}/v1/{}/roles", self.iam_base_url, parent);
        debug!("POST {} (roleId={})", url, role_id);
        let body = CreateRoleRequest {
            role_id: role_id.to_string(),
            role: role.clone(),
        };
        let builder = self.credentials.apply(self.http_client.post(&url));
        let response = builder.json(&body).send().await?;
        self.handle_response(response).await
    }

    /// Partially update a role (PATCH /v1/{name}?updateMask=...).
    ///
    /// The candidate carries the live name and etag; only the fields named
    /// in the mask are applied server-side.
    pub async fn patch_role(&self, candidate: &Role, mask: &UpdateMask) -> ApiResult<Role> {
        let url = format!("{}/v1/{}", self.iam_base_url, candidate.name);
        debug!("PATCH {} (updateMask={})", url, mask);
        let builder = self.credentials.apply(self.http_client.patch(&url));
        let response = builder
            .query(&[("updateMask", mask.to_query())])
            .json(candidate)
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ── Policy operations ─────────────────────────────────────────────

    /// Fetch the organization IAM policy (POST /v3/{parent}:getIamPolicy).
    pub async fn get_iam_policy(&self, parent: &str) -> ApiResult<Policy> {
        let url = format!("{}/v3/{}:getIamPolicy", self.crm_base_url, parent);
        debug!("POST {}", url);
        let builder = self.credentials.apply(self.http_client.post(&url));
        let response = builder.json(&serde_json::json!({})).send().await?;
        self.handle_response(response).await
    }

    /// Replace the organization IAM policy (POST /v3/{parent}:setIamPolicy).
    ///
    /// The policy's etag must match server-side state or the call fails
    /// with [`ApiError::Conflict`].
    pub async fn set_iam_policy(&self, parent: &str, policy: &Policy) -> ApiResult<Policy> {
        let url = format!("{}/v3/{}:setIamPolicy", self.crm_base_url, parent);
        debug!("POST {}", url);
        let body = SetPolicyRequest {
            policy: policy.clone(),
        };
        let builder = self.credentials.apply(self.http_client.post(&url));
        let response = builder.json(&body).send().await?;
        self.handle_response(response).await
    }

    // ── Response handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
        } else {
            self.handle_error_response(response).await
        }
    }

    async fn handle_error_response<T>(&self, response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        // Prefer the message from the standard error envelope.
        let message = serde_json::from_str::<GoogleErrorBody>(&body)
            .map(|e| e.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(body);

        match status {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(message)),
            StatusCode::CONFLICT => Err(ApiError::Conflict(message)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Auth(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            ))),
            _ => Err(ApiError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}
