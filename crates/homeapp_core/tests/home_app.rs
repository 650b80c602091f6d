mod common;

use chrono::Duration as ChronoDuration;
use common::StubAdvice;
use homeapp_core::repo::datetime::local_now;
use homeapp_core::{HomeApp, HomeConfig, QueueNotifier, SharedStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

#[tokio::test]
async fn task_added_through_app_reminds_when_due() {
    let config = HomeConfig {
        members_idle_grace: Duration::from_millis(50),
        ..HomeConfig::default()
    };
    let notifier = Arc::new(QueueNotifier::new());
    let app = HomeApp::start_with(
        config,
        SharedStore::open_in_memory().unwrap(),
        StubAdvice::ok("Stretch"),
        notifier.clone(),
    );

    let alex = app.repository().add_member("Alex").unwrap();
    app.controller().add_task(
        alex,
        "Water plants",
        local_now() + ChronoDuration::milliseconds(200),
    );
    app.controller().flush().await;
    assert_eq!(app.scheduler().pending_jobs().unwrap().len(), 1);

    timeout(Duration::from_secs(3), async {
        while notifier.pending_len() == 0 {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("reminder did not fire in time");

    let sent = notifier.drain();
    assert_eq!(sent[0].body, "Water plants");
    assert_eq!(sent[0].title, app.config().labels.overdue_title);
    assert!(app.scheduler().pending_jobs().unwrap().is_empty());
}

#[tokio::test]
async fn start_opens_file_database_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = HomeConfig {
        advice_base_url: "http://127.0.0.1:9".to_string(),
        advice_timeout: Duration::from_millis(200),
        ..HomeConfig::in_dir(dir.path())
    };
    let fallback = config.labels.advice_fallback.clone();

    let app = HomeApp::start(config, Arc::new(QueueNotifier::new())).unwrap();
    app.repository().add_member("Alex").unwrap();
    assert!(dir.path().join("homeapp.sqlite3").exists());

    let mut state = app.controller().subscribe();
    let advice = timeout(
        Duration::from_secs(3),
        state.wait_for(|s| s.daily_advice == fallback),
    )
    .await
    .expect("fallback advice not shown")
    .unwrap()
    .daily_advice
    .clone();
    assert_eq!(advice, fallback);
}
