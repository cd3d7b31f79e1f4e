//! Integration tests for start-up authentication.
//!
//! A failed login is recorded as a failure and the user carries on without
//! a token.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use cartstorm_core::endpoint;
use cartstorm_integration_tests::{Behaviour, LoginMode, MockShop};
use cartstorm_loadtest::{HttpMethod, RunStats, profile};
use tokio::time::Duration;

fn failure_message(stats: &RunStats, name: &str) -> String {
    stats
        .failures
        .iter()
        .find(|f| f.name == name)
        .map(|f| f.message.clone())
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_continues_anonymously() {
    let shop = MockShop::start_with(Behaviour {
        login: LoginMode::Unauthorized,
        ..Behaviour::default()
    })
    .await
    .unwrap();
    let summary = shop
        .run(vec![profile::product_browsing().unwrap()], 2, 1)
        .await
        .unwrap();
    let stats = &summary.stats;

    let auth = stats.entry_for(HttpMethod::Post, "Authenticate").unwrap();
    assert_eq!(auth.requests, 2);
    assert_eq!(auth.failures, 2);
    assert!(failure_message(stats, "Authenticate").contains("401"));

    // Browsing still happens, without a token.
    assert_eq!(stats.total_requests(), 2 + 2 * 11);
    assert_eq!(stats.total_failures(), 2);
    assert!(shop.requests().iter().all(|r| !r.authorized));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_without_token_is_a_failure() {
    let shop = MockShop::start_with(Behaviour {
        login: LoginMode::NoToken,
        ..Behaviour::default()
    })
    .await
    .unwrap();
    let summary = shop
        .run(vec![profile::order_stress().unwrap()], 1, 1)
        .await
        .unwrap();

    // A 200 without a token is a success to goose; the login check
    // overrides it with its own message.
    assert_eq!(
        failure_message(&summary.stats, "Authenticate"),
        "No JWT token in response"
    );
    assert_eq!(summary.stats.entry("Authenticate").unwrap().failures, 1);
    assert!(shop.requests().iter().all(|r| !r.authorized));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_configured_credentials_are_sent() {
    let shop = MockShop::start().await.unwrap();
    let mut config = shop.config(1, 1);
    config.username = "loadbot".to_string();
    config.password = "wrong-password".into();

    let summary = shop
        .run_with(config, vec![profile::user_auth().unwrap()])
        .await
        .unwrap();

    let logins = shop.requests_to(&Method::POST, endpoint::AUTHENTICATE);
    // The start-up login and five login tasks.
    assert_eq!(logins.len(), 6);
    for login in &logins {
        let body = login.body.as_ref().unwrap();
        assert_eq!(body["username"], "loadbot");
        assert_eq!(body["password"], "wrong-password");
    }
    assert_eq!(
        summary
            .stats
            .entry_for(HttpMethod::Post, "Authenticate")
            .unwrap()
            .failures,
        1
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_anonymous_profile_skips_login() {
    let shop = MockShop::start().await.unwrap();
    let summary = shop
        .run(vec![profile::product_browsing().unwrap().anonymous()], 1, 1)
        .await
        .unwrap();

    assert!(summary.stats.entry("Authenticate").is_none());
    assert!(
        shop.requests_to(&Method::POST, endpoint::AUTHENTICATE)
            .is_empty()
    );
    assert!(shop.requests().iter().all(|r| !r.authorized));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slow_login_still_counts() {
    let shop = MockShop::start_with(Behaviour {
        latency: Duration::from_millis(20),
        ..Behaviour::default()
    })
    .await
    .unwrap();
    let summary = shop
        .run(vec![profile::product_browsing().unwrap()], 1, 1)
        .await
        .unwrap();

    let auth = summary.stats.entry("Authenticate").unwrap();
    assert!(auth.min_ms >= 20, "{}", auth.min_ms);
    assert!(shop.requests().iter().skip(1).all(|r| r.authorized));
}
