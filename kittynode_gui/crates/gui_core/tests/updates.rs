mod common;

use common::{update_info, MockHost, MockUpdateChannel};
use gui_core::updates::{DownloadEvent, InstallOutcome, UpdateManager, UpdateState, UPDATE_WINDOW};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const HOUR: Duration = Duration::from_secs(60 * 60);

fn manager(channel: &Arc<MockUpdateChannel>, host: &Arc<MockHost>) -> Arc<UpdateManager> {
    Arc::new(UpdateManager::new(channel.clone(), host.clone()))
}

#[tokio::test(start_paused = true)]
async fn checks_are_throttled_to_the_window() {
    let channel = Arc::new(MockUpdateChannel::new(Some(update_info("0.2.0"))));
    let host = Arc::new(MockHost::default());
    let updates = manager(&channel, &host);

    assert_eq!(updates.state_kind(), UpdateState::NotChecked);
    assert_eq!(updates.get_update().await, Some(update_info("0.2.0")));
    assert_eq!(channel.checks(), 1);
    assert!(updates.last_checked().is_some());

    sleep(23 * HOUR).await;
    assert!(updates.get_update().await.is_some());
    assert_eq!(channel.checks(), 1);

    sleep(2 * HOUR).await;
    assert!(updates.get_update().await.is_some());
    assert_eq!(channel.checks(), 2);
}

#[tokio::test(start_paused = true)]
async fn recheck_happens_only_past_the_window() {
    let channel = Arc::new(MockUpdateChannel::new(None));
    let host = Arc::new(MockHost::default());
    let updates = manager(&channel, &host);

    updates.get_update().await;
    sleep(UPDATE_WINDOW - Duration::from_millis(1)).await;
    updates.get_update().await;
    assert_eq!(channel.checks(), 1);

    sleep(Duration::from_millis(2)).await;
    updates.get_update().await;
    assert_eq!(channel.checks(), 2);
    assert_eq!(updates.state_kind(), UpdateState::UpToDate);
}

#[tokio::test(start_paused = true)]
async fn failed_check_does_not_start_the_window() {
    let channel = Arc::new(MockUpdateChannel::new(Some(update_info("0.2.0"))));
    channel.check_once(Err("dns failure".to_string()));
    let host = Arc::new(MockHost::default());
    let updates = manager(&channel, &host);

    assert_eq!(updates.get_update().await, None);
    assert!(updates.last_checked().is_none());
    assert_eq!(updates.state_kind(), UpdateState::NotChecked);

    assert_eq!(updates.get_update().await, Some(update_info("0.2.0")));
    assert_eq!(channel.checks(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_checks_share_one_query() {
    let channel = Arc::new(MockUpdateChannel::new(Some(update_info("0.2.0"))));
    channel.set_check_delay(Duration::from_millis(100));
    let host = Arc::new(MockHost::default());
    let updates = manager(&channel, &host);

    let (a, b) = tokio::join!(updates.get_update(), updates.get_update());

    assert_eq!(a, b);
    assert!(a.is_some());
    assert_eq!(channel.checks(), 1);
}

#[tokio::test(start_paused = true)]
async fn dismissal_expires_after_the_window() {
    let channel = Arc::new(MockUpdateChannel::new(Some(update_info("0.2.0"))));
    let host = Arc::new(MockHost::default());
    let updates = manager(&channel, &host);
    updates.get_update().await;

    assert!(!updates.is_dismissed());
    assert_eq!(updates.state_kind(), UpdateState::Available);

    updates.dismiss();
    assert!(updates.is_dismissed());
    sleep(23 * HOUR).await;
    assert!(updates.is_dismissed());
    assert_eq!(updates.state_kind(), UpdateState::Dismissed);

    sleep(2 * HOUR).await;
    assert!(!updates.is_dismissed());
    assert!(updates.has_update());
}

#[tokio::test(start_paused = true)]
async fn dismissal_ends_exactly_at_the_window() {
    let channel = Arc::new(MockUpdateChannel::new(Some(update_info("0.2.0"))));
    let host = Arc::new(MockHost::default());
    let updates = manager(&channel, &host);
    updates.get_update().await;

    updates.dismiss();
    sleep(UPDATE_WINDOW - Duration::from_millis(1)).await;
    assert!(updates.is_dismissed());
    assert_eq!(updates.state_kind(), UpdateState::Dismissed);

    sleep(Duration::from_millis(1)).await;
    assert!(!updates.is_dismissed());
    assert_eq!(updates.state_kind(), UpdateState::Available);
}

#[tokio::test]
async fn install_without_update_is_skipped() {
    let channel = Arc::new(MockUpdateChannel::new(None));
    let host = Arc::new(MockHost::default());
    let updates = manager(&channel, &host);

    assert_eq!(updates.install_update().await, InstallOutcome::Skipped);
    updates.get_update().await;
    assert_eq!(updates.install_update().await, InstallOutcome::Skipped);
    assert_eq!(channel.installs(), 0);
}

#[tokio::test]
async fn install_downloads_then_relaunches() {
    let channel = Arc::new(MockUpdateChannel::new(Some(update_info("0.2.0"))));
    let host = Arc::new(MockHost::default());
    let updates = manager(&channel, &host);
    updates.get_update().await;

    assert_eq!(updates.install_update().await, InstallOutcome::Installed);

    assert_eq!(channel.installs(), 1);
    assert_eq!(host.relaunches.load(Ordering::SeqCst), 1);
    assert_eq!(
        channel.seen_events.lock().unwrap().last(),
        Some(&DownloadEvent::Finished)
    );
    assert!(!updates.is_processing());
}

#[tokio::test]
async fn failed_install_can_be_retried() {
    let channel = Arc::new(MockUpdateChannel::new(Some(update_info("0.2.0"))));
    channel.fail_install("signature mismatch");
    let host = Arc::new(MockHost::default());
    let updates = manager(&channel, &host);
    updates.get_update().await;

    assert_eq!(updates.install_update().await, InstallOutcome::Failed);
    assert!(!updates.is_processing());
    assert!(updates.has_update());
    assert_eq!(host.relaunches.load(Ordering::SeqCst), 0);

    assert_eq!(updates.install_update().await, InstallOutcome::Failed);
    assert_eq!(channel.installs(), 2);
}

#[tokio::test(start_paused = true)]
async fn install_is_not_reentrant() {
    let channel = Arc::new(MockUpdateChannel::new(Some(update_info("0.2.0"))));
    channel.set_install_delay(Duration::from_millis(100));
    let host = Arc::new(MockHost::default());
    let updates = manager(&channel, &host);
    updates.get_update().await;

    let first = tokio::spawn({
        let updates = updates.clone();
        async move { updates.install_update().await }
    });
    sleep(Duration::from_millis(10)).await;
    assert!(updates.is_processing());
    assert_eq!(updates.state_kind(), UpdateState::Installing);
    assert_eq!(updates.install_update().await, InstallOutcome::Skipped);

    assert_eq!(first.await.unwrap(), InstallOutcome::Installed);
    assert_eq!(channel.installs(), 1);
    assert!(!updates.is_processing());
}

#[tokio::test]
async fn clear_forgets_everything() {
    let channel = Arc::new(MockUpdateChannel::new(Some(update_info("0.2.0"))));
    let host = Arc::new(MockHost::default());
    let updates = manager(&channel, &host);
    updates.get_update().await;
    updates.dismiss();

    updates.clear();

    assert!(!updates.has_update());
    assert!(!updates.is_dismissed());
    assert!(updates.last_checked().is_none());
    assert_eq!(updates.state_kind(), UpdateState::NotChecked);
}
