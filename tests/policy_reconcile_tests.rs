//! Integration tests for organization policy reconciliation
//!
//! Tests cover:
//! - No-op when live bindings match the declaration
//! - Normalized comparison (binding and member order is insignificant)
//! - Wholesale replace carrying the fetched etag
//! - Stale etag surfaces as a conflict, never a silent overwrite
//! - Policy fetch failure is fatal

mod common;

use common::{error_json, policy_json, TestContext};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use orgadm::models::Binding;
use orgadm::reconcile::{PolicyOutcome, PolicyReconciler, ReconcileError};

const PARENT: &str = "organizations/123";

fn binding(role: &str, members: &[&str]) -> Binding {
    Binding {
        role: role.to_string(),
        members: members.iter().map(|m| m.to_string()).collect(),
    }
}

// =========================================================================
// Matching bindings: no update call
// =========================================================================

#[tokio::test]
async fn test_matching_policy_is_left_untouched() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/v3/organizations/123:getIamPolicy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(policy_json(
            json!([
                {"role": "roles/viewer", "members": ["user:a@example.com"]},
            ]),
            "BwEtag=",
        )))
        .expect(1)
        .mount(&ctx.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v3/organizations/123:setIamPolicy"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let reconciler = PolicyReconciler::new(&ctx.client, PARENT);
    let outcome = reconciler
        .reconcile(&[binding("roles/viewer", &["user:a@example.com"])])
        .await
        .expect("reconcile failed");

    assert!(matches!(outcome, PolicyOutcome::Unchanged(_)));
}

// =========================================================================
// Binding and member order must not cause a spurious write
// =========================================================================

#[tokio::test]
async fn test_reordered_bindings_are_a_noop() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/v3/organizations/123:getIamPolicy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(policy_json(
            json!([
                {"role": "roles/viewer", "members": ["user:b@example.com", "user:a@example.com"]},
                {"role": "roles/editor", "members": ["group:x@example.com"]},
            ]),
            "BwEtag=",
        )))
        .expect(1)
        .mount(&ctx.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v3/organizations/123:setIamPolicy"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let reconciler = PolicyReconciler::new(&ctx.client, PARENT);
    let outcome = reconciler
        .reconcile(&[
            binding("roles/editor", &["group:x@example.com"]),
            binding("roles/viewer", &["user:a@example.com", "user:b@example.com"]),
        ])
        .await
        .expect("reconcile failed");

    assert!(matches!(outcome, PolicyOutcome::Unchanged(_)));
}

// =========================================================================
// Differing bindings: one replace carrying the fetched etag and version 1
// =========================================================================

#[tokio::test]
async fn test_differing_policy_is_replaced_with_fetched_etag() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/v3/organizations/123:getIamPolicy"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(policy_json(json!([]), "BwFetchedEtag=")),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v3/organizations/123:setIamPolicy"))
        .and(body_partial_json(json!({
            "policy": {
                "bindings": [
                    {"role": "roles/viewer", "members": ["user:a@example.com"]},
                ],
                "etag": "BwFetchedEtag=",
                "version": 1,
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(policy_json(
            json!([
                {"role": "roles/viewer", "members": ["user:a@example.com"]},
            ]),
            "BwNextEtag=",
        )))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let reconciler = PolicyReconciler::new(&ctx.client, PARENT);
    let outcome = reconciler
        .reconcile(&[binding("roles/viewer", &["user:a@example.com"])])
        .await
        .expect("reconcile failed");

    match outcome {
        PolicyOutcome::Replaced(policy) => assert_eq!(policy.etag, "BwNextEtag="),
        other => panic!("expected Replaced, got {other:?}"),
    }
}

// =========================================================================
// Stale etag: the write fails as a conflict
// =========================================================================

#[tokio::test]
async fn test_stale_etag_is_a_conflict() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/v3/organizations/123:getIamPolicy"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(policy_json(json!([]), "BwStaleEtag=")),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v3/organizations/123:setIamPolicy"))
        .respond_with(ResponseTemplate::new(409).set_body_json(error_json(
            409,
            "ABORTED",
            "There were concurrent policy changes.",
        )))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let reconciler = PolicyReconciler::new(&ctx.client, PARENT);
    let err = reconciler
        .reconcile(&[binding("roles/viewer", &["user:a@example.com"])])
        .await
        .expect_err("expected conflict");

    match err {
        ReconcileError::PolicyConflict { message } => {
            assert!(message.contains("concurrent policy changes"));
        }
        other => panic!("expected PolicyConflict, got {other:?}"),
    }
}

// =========================================================================
// Policy fetch failure is fatal
// =========================================================================

#[tokio::test]
async fn test_policy_fetch_failure() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/v3/organizations/123:getIamPolicy"))
        .respond_with(ResponseTemplate::new(503).set_body_json(error_json(
            503,
            "UNAVAILABLE",
            "The service is currently unavailable.",
        )))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let reconciler = PolicyReconciler::new(&ctx.client, PARENT);
    let err = reconciler
        .reconcile(&[binding("roles/viewer", &["user:a@example.com"])])
        .await
        .expect_err("expected fetch failure");

    assert!(matches!(err, ReconcileError::PolicyFetchFailed { .. }));
}
