//! Shared test fixtures: a mock Google API server and a client pointed at
//! it.
#![allow(dead_code)]

use serde_json::json;
use wiremock::MockServer;

use orgadm::api::{Credentials, IamClient};

pub struct TestContext {
    pub server: MockServer,
    pub client: IamClient,
}

impl TestContext {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let client = IamClient::with_base_urls(
            Credentials::bearer("test-token"),
            server.uri(),
            server.uri(),
        );
        Self { server, client }
    }
}

/// Wire-shape JSON for a live role.
pub fn role_json(
    name: &str,
    title: &str,
    description: &str,
    permissions: &[&str],
    stage: &str,
    etag: &str,
) -> serde_json::Value {
    json!({
        "name": name,
        "title": title,
        "description": description,
        "includedPermissions": permissions,
        "stage": stage,
        "etag": etag,
    })
}

/// Wire-shape JSON for the organization policy.
pub fn policy_json(bindings: serde_json::Value, etag: &str) -> serde_json::Value {
    json!({
        "bindings": bindings,
        "etag": etag,
        "version": 1,
    })
}

/// Standard Google API error body.
pub fn error_json(code: u16, status: &str, message: &str) -> serde_json::Value {
    json!({
        "error": {
            "code": code,
            "message": message,
            "status": status,
        }
    })
}
