//! Integration tests for run control, user allocation, thresholds and
//! reports.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use cartstorm_integration_tests::{Behaviour, MockShop};
use cartstorm_loadtest::thresholds::default_thresholds;
use cartstorm_loadtest::{Profile, Task, TaskMix, Threshold, WaitTime, profile};

fn browse_only() -> Profile {
    Profile::new("browse-only", WaitTime::none(), TaskMix::single(Task::BrowseProducts))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_users_are_split_across_profiles() {
    let shop = MockShop::start().await.unwrap();
    let summary = shop
        .run(
            vec![
                profile::product_browsing().unwrap(),
                profile::user_auth().unwrap(),
            ],
            4,
            1,
        )
        .await
        .unwrap();
    let stats = &summary.stats;

    assert_eq!(summary.users, 4);
    assert_eq!(stats.entry("Authenticate").unwrap().requests, 4);
    assert_eq!(
        summary.profiles,
        vec!["product-browsing".to_string(), "user-auth".to_string()]
    );

    // Two users each, one pass: eleven browsing and ten account requests.
    assert_eq!(stats.entry("Browse Products").unwrap().requests, 2 * 5);
    assert_eq!(stats.entry("User Login").unwrap().requests, 2 * 5);
    assert_eq!(stats.total_requests(), 4 + 2 * 11 + 2 * 10);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_weighted_profiles_get_more_users() {
    let shop = MockShop::start().await.unwrap();
    let browse = browse_only().with_weight(3).unwrap();
    let register = Profile::new(
        "register-only",
        WaitTime::none(),
        TaskMix::single(Task::RegisterUser),
    );
    let summary = shop.run(vec![browse, register], 4, 1).await.unwrap();

    assert_eq!(summary.stats.entry("Browse Products").unwrap().requests, 3);
    assert_eq!(summary.stats.entry("Register User").unwrap().requests, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_time_stops_waiting_users() {
    let shop = MockShop::start().await.unwrap();
    let mut config = shop.config(2, 1);
    config.iterations = None;
    config.run_time = Some(Duration::from_secs(1));

    let slow = browse_only().with_wait(WaitTime::constant(Duration::from_secs(3600)));
    let summary = MockShop::run_as_given(config, vec![slow]).await.unwrap();

    assert!(summary.elapsed >= Duration::from_secs(1));
    assert!(summary.elapsed < Duration::from_secs(30), "{:?}", summary.elapsed);
    // One request each before the long pause.
    assert_eq!(summary.stats.entry("Browse Products").unwrap().requests, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_spawn_rate_paces_user_starts() {
    let shop = MockShop::start().await.unwrap();
    let mut config = shop.config(3, 1);
    config.spawn_rate = 10.0;

    let summary = shop.run_with(config, vec![browse_only()]).await.unwrap();

    // Starts at 0ms, 100ms and 200ms.
    assert_eq!(summary.stats.entry("Authenticate").unwrap().requests, 3);
    assert!(
        summary.elapsed >= Duration::from_millis(200),
        "{:?}",
        summary.elapsed
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slow_responses_breach_thresholds() {
    let shop = MockShop::start_with(Behaviour {
        latency: Duration::from_millis(30),
        ..Behaviour::default()
    })
    .await
    .unwrap();
    let summary = shop.run(vec![browse_only()], 1, 5).await.unwrap();

    let breaches = summary.breaches(&[Threshold::new("Browse Products", 10)]);
    assert_eq!(breaches.len(), 1);
    assert!(breaches[0].actual_ms >= 30);

    assert!(summary.breaches(&default_thresholds()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_report_file_is_written() {
    let shop = MockShop::start().await.unwrap();
    let path = std::env::temp_dir().join(format!(
        "cartstorm-it-{}.html",
        shop.url().port().unwrap()
    ));
    let mut config = shop.config(2, 1);
    config.report_file = Some(path.clone());

    let summary = shop
        .run_with(config, vec![profile::order_stress().unwrap()])
        .await
        .unwrap();
    let report = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(!report.is_empty());
    assert_eq!(summary.host, shop.url().to_string());
    assert_eq!(summary.profiles, vec!["order-stress".to_string()]);
    assert!(summary.started_at.timestamp() > 0);
}
