
use std::time::Duration;

use bganstat::{CommandError, CommandKind, CommandOutcome, MonitorConfig};
use fixture::Fixture;
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_rejects_blank_apn_fields_without_network_io() {
    // Arrange
    let fx = Fixture::new().await;
    let monitor = fx.monitor();

    // Act
    let result = monitor.save_apn_profile("", "user", "pass").await;

    // Assert: validation failed locally, nothing hit the wire
    assert!(matches!(result, Err(CommandError::Validation(_))));
    let requests = fx.mock_server.received_requests().await.unwrap_or_default();
    assert!(
        requests.is_empty(),
        "expected no HTTP requests, got {}",
        requests.len()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_saves_apn_and_refreshes_the_profile_table() {
    // Arrange
    let fx = Fixture::new().await;
    fx.mount_status_defaults().await;
    Mock::given(method("POST"))
        .and(path("/api/m2m/apn"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true})),
        )
        .mount(&fx.mock_server)
        .await;
    let monitor = fx.monitor();

    // Act
    monitor
        .save_apn_profile("bgan.inmarsat.com", "user", "pass")
        .await
        .expect("save should succeed");

    // Assert: the immediate reconciliation refresh loaded the table
    let snap = monitor.current_snapshot();
    let profiles = snap.apn_profiles.expect("apn table should be loaded");
    assert_eq!(profiles[0].apn, "bgan.inmarsat.com");
    assert!(monitor.pending_command().borrow().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_surfaces_the_device_rejection_reason() {
    // Arrange
    let fx = Fixture::new().await;
    fx.mount_status_defaults().await;
    Mock::given(method("GET"))
        .and(path("/api/m2m/pdp-activate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "denied by NOC",
        })))
        .mount(&fx.mock_server)
        .await;
    let monitor = fx.monitor();

    // Act
    let result = monitor.activate_pdp().await;

    // Assert: the terminal's reason passes through unmodified
    match result {
        Err(CommandError::Rejected(reason)) => assert_eq!(reason, "denied by NOC"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_reports_transport_failure_distinctly_from_rejection() {
    // Arrange: no pdp-activate mock, the terminal is unreachable for it
    let fx = Fixture::new().await;
    let monitor = fx.monitor();

    // Act
    let result = monitor.activate_pdp().await;

    // Assert
    assert!(matches!(result, Err(CommandError::Transport(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_reconciles_pdp_activation_through_the_delayed_refetch() {
    // Arrange: activation succeeds and the terminal settles into active
    let fx = Fixture::new().await;
    fx.mount_status_core().await;
    fx.mount_pdp_status(true, Some("161.30.22.14")).await;
    Mock::given(method("GET"))
        .and(path("/api/m2m/pdp-activate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "ip": "161.30.22.14",
        })))
        .mount(&fx.mock_server)
        .await;
    let monitor = fx.monitor();

    // Act
    let activation = monitor.activate_pdp().await.expect("activation succeeds");

    // Assert: command response alone does not mutate the snapshot
    assert_eq!(activation.ip.as_deref(), Some("161.30.22.14"));
    assert!(!monitor.current_snapshot().pdp_active);

    // ...but the delayed re-fetch does (50 ms reconcile delay in fixture)
    tokio::time::sleep(Duration::from_millis(400)).await;
    let snap = monitor.current_snapshot();
    assert!(snap.pdp_active);
    assert_eq!(snap.pdp_ip.as_deref(), Some("161.30.22.14"));
    assert!(monitor.pending_command().borrow().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_fires_deactivation_and_learns_state_from_the_next_poll() {
    // Arrange
    let fx = Fixture::new().await;
    fx.mount_status_defaults().await;
    Mock::given(method("POST"))
        .and(path("/api/m2m/pdp-deactivate"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&fx.mock_server)
        .await;
    let monitor = fx.monitor();

    // Act
    monitor.deactivate_pdp().await.expect("deactivate succeeds");
    tokio::time::sleep(Duration::from_millis(400)).await;

    // Assert: exactly one POST, and the reconcile cycle ran
    let requests = fx.mock_server.received_requests().await.unwrap_or_default();
    let posts = requests
        .iter()
        .filter(|r| r.url.path() == "/api/m2m/pdp-deactivate")
        .count();
    assert_eq!(posts, 1);
    let snap = monitor.current_snapshot();
    assert!(!snap.pdp_active);
    assert_eq!(snap.satellite_id, "351");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_tracks_the_pending_command_lifecycle() {
    // Arrange
    let fx = Fixture::new().await;
    fx.mount_status_defaults().await;
    Mock::given(method("GET"))
        .and(path("/api/m2m/pdp-activate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "ip": "10.0.0.2"})),
        )
        .mount(&fx.mock_server)
        .await;
    let monitor = fx.monitor();
    let pending = monitor.pending_command();

    // Act
    monitor.activate_pdp().await.expect("activation succeeds");

    // Assert: command is observable while reconciliation is outstanding
    {
        let cmd = pending.borrow();
        let cmd = cmd.as_ref().expect("command should still be pending");
        assert_eq!(cmd.kind, CommandKind::ActivatePdp);
        assert_eq!(cmd.outcome, CommandOutcome::Succeeded);
    }

    // ...and destroyed once reconciliation completes
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(pending.borrow().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_keeps_a_newer_command_when_a_stale_reconcile_fires() {
    // Arrange
    let fx = Fixture::new().await;
    fx.mount_status_defaults().await;
    Mock::given(method("GET"))
        .and(path("/api/m2m/pdp-activate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "ip": "10.0.0.2"})),
        )
        .mount(&fx.mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/m2m/pdp-deactivate"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&fx.mock_server)
        .await;
    let monitor = fx.monitor_with(MonitorConfig {
        reconcile_delay: Duration::from_millis(600),
        ..fx.config.clone()
    });
    let pending = monitor.pending_command();

    // Act: second command submitted while the first reconcile is pending
    monitor.activate_pdp().await.expect("activation succeeds");
    tokio::time::sleep(Duration::from_millis(200)).await;
    monitor.deactivate_pdp().await.expect("deactivate succeeds");

    // Assert: the first command's reconcile (fires around 600 ms) must not
    // clear the second command's record (clears around 800 ms)
    tokio::time::sleep(Duration::from_millis(500)).await;
    {
        let cmd = pending.borrow();
        let cmd = cmd.as_ref().expect("newer command should still be pending");
        assert_eq!(cmd.kind, CommandKind::DeactivatePdp);
        assert_eq!(cmd.outcome, CommandOutcome::Succeeded);
    }

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(pending.borrow().is_none());
}
