//! Integration tests for registration, login and profile lookups.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use cartstorm_core::endpoint;
use cartstorm_integration_tests::{Behaviour, LoginMode, MockShop};
use cartstorm_loadtest::{HttpMethod, Profile, RunStats, Task, TaskMix, WaitTime, profile};

fn only(task: Task) -> Profile {
    Profile::new(task.label(), WaitTime::none(), TaskMix::single(task))
}

fn failure<'a>(stats: &'a RunStats, name: &str) -> &'a cartstorm_loadtest::FailureStats {
    stats.failures.iter().find(|f| f.name == name).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_registration_payload() {
    let shop = MockShop::start().await.unwrap();
    let summary = shop.run(vec![only(Task::RegisterUser)], 1, 5).await.unwrap();

    assert_eq!(summary.stats.entry("Register User").unwrap().requests, 5);
    assert_eq!(summary.stats.total_failures(), 0);

    for registration in shop.requests_to(&Method::POST, endpoint::USERS) {
        let body = registration.body.unwrap();
        let username = body["username"].as_str().unwrap();
        let suffix: u32 = username.strip_prefix("loadtest").unwrap().parse().unwrap();
        assert!((10_000..=99_999).contains(&suffix));
        assert_eq!(body["email"], format!("loadtest{suffix}@example.com"));
        assert_eq!(body["firstName"], format!("LoadTest{suffix}"));
        assert_eq!(body["lastName"], "User");
        assert_eq!(body["password"], "TestPass123!");

        let phone = body["phone"].as_str().unwrap();
        assert!(phone.starts_with("+1"));
        assert_eq!(phone.len(), 12);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_duplicate_registration_is_accepted() {
    let shop = MockShop::start_with(Behaviour {
        registration_conflict: true,
        ..Behaviour::default()
    })
    .await
    .unwrap();
    let summary = shop.run(vec![only(Task::RegisterUser)], 2, 3).await.unwrap();

    let entry = summary.stats.entry("Register User").unwrap();
    assert_eq!((entry.requests, entry.failures), (6, 0));
    assert!(summary.stats.failures.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_registration_server_error_is_a_failure() {
    let shop = MockShop::start_with(Behaviour {
        fail_with: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..Behaviour::default()
    })
    .await
    .unwrap();
    let summary = shop.run(vec![only(Task::RegisterUser)], 1, 2).await.unwrap();

    let entry = summary.stats.entry("Register User").unwrap();
    assert_eq!((entry.requests, entry.failures), (2, 2));
    let failure = failure(&summary.stats, "Register User");
    assert_eq!(failure.occurrences, 2);
    assert!(failure.message.contains("500"), "{}", failure.message);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unexpected_status_names_the_task() {
    let shop = MockShop::start_with(Behaviour {
        fail_with: Some(StatusCode::ACCEPTED),
        ..Behaviour::default()
    })
    .await
    .unwrap();
    let summary = shop.run(vec![only(Task::RegisterUser)], 1, 2).await.unwrap();
    assert_eq!(
        failure(&summary.stats, "Register User").message,
        "Registration failed: 202"
    );

    let shop = MockShop::start_with(Behaviour {
        fail_with: Some(StatusCode::ACCEPTED),
        fail_path: Some(endpoint::AUTHENTICATE),
        ..Behaviour::default()
    })
    .await
    .unwrap();
    let summary = shop.run(vec![only(Task::LoginUser)], 1, 2).await.unwrap();
    let stats = &summary.stats;

    assert_eq!(
        failure(stats, "Authenticate").message,
        "Authentication failed with status 202"
    );
    let login = failure(stats, "User Login");
    assert_eq!(login.message, "Login failed: 202");
    assert_eq!(login.occurrences, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_task_is_not_a_failure() {
    let shop = MockShop::start_with(Behaviour {
        login: LoginMode::Unauthorized,
        ..Behaviour::default()
    })
    .await
    .unwrap();
    let summary = shop.run(vec![only(Task::LoginUser)], 1, 4).await.unwrap();
    let stats = &summary.stats;

    // The start-up login must yield a token; the login task accepts 401.
    assert_eq!(stats.entry("Authenticate").unwrap().failures, 1);
    let login = stats.entry_for(HttpMethod::Post, "User Login").unwrap();
    assert_eq!((login.requests, login.failures), (4, 0));
    assert_eq!(
        shop.requests_to(&Method::POST, endpoint::AUTHENTICATE).len(),
        5
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_registration_and_login_are_sent_without_token() {
    let shop = MockShop::start().await.unwrap();
    let summary = shop
        .run(vec![profile::user_auth().unwrap()], 1, 2)
        .await
        .unwrap();
    assert_eq!(summary.stats.entry("Authenticate").unwrap().failures, 0);

    let requests = shop.requests();
    let registrations: Vec<_> = requests
        .iter()
        .filter(|r| r.method == Method::POST && r.path == endpoint::USERS)
        .collect();
    let logins: Vec<_> = requests
        .iter()
        .filter(|r| r.path == endpoint::AUTHENTICATE)
        .collect();
    let lookups: Vec<_> = requests
        .iter()
        .filter(|r| r.method == Method::GET)
        .collect();

    assert_eq!(registrations.len(), 6);
    assert_eq!(logins.len(), 1 + 10);
    assert_eq!(lookups.len(), 4);
    assert!(registrations.iter().all(|r| !r.authorized));
    assert!(logins.iter().all(|r| !r.authorized));
    assert!(lookups.iter().all(|r| r.authorized));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_user_auth_profile() {
    let shop = MockShop::start().await.unwrap();
    let summary = shop
        .run(vec![profile::user_auth().unwrap()], 2, 3)
        .await
        .unwrap();
    let stats = &summary.stats;

    for entry in &stats.entries {
        assert!(
            ["Authenticate", "Register User", "User Login", "Get User Profile"]
                .contains(&entry.name.as_str()),
            "{}",
            entry.name
        );
    }
    assert_eq!(stats.total_failures(), 0);
    // Per pass: three registrations, five logins, two lookups.
    assert_eq!(stats.total_requests(), 2 + 2 * 3 * 10);
    assert_eq!(stats.entry("User Login").unwrap().requests, 30);

    for lookup in shop.requests() {
        if let Some(id) = lookup.path.strip_prefix(&format!("{}/", endpoint::USERS)) {
            let id: i64 = id.parse().unwrap();
            assert!((1..=100).contains(&id));
        }
    }
}
