mod common;

use std::collections::VecDeque;
use std::time::Duration;

use common::{Harness, USER_ID};
use rider_client::engine::tracking::{
    start_tracking, FixedPosition, PositionSource, ReplayPositions,
};
use rider_client::error::{AppError, AppResult};
use rider_client::models::rider::{GeoPoint, LocationSample};

const ACCRA: GeoPoint = GeoPoint {
    lat: 5.6037,
    lng: -0.187,
};

#[tokio::test]
async fn tracker_reports_position_on_each_tick() {
    let h = Harness::signed_in(vec![]).await;

    let handle = start_tracking(
        h.state.backend.clone(),
        FixedPosition::new(ACCRA),
        Duration::from_millis(50),
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(180)).await;
    let stats = handle.stop().await;

    assert!(stats.sent >= 2, "only {} reports sent", stats.sent);
    assert_eq!(stats.failed, 0);

    let reports = h.mock.calls_to("/locationupdate/");
    assert_eq!(reports.len() as u64, stats.sent);
    for report in &reports {
        assert_eq!(report.path, format!("/locationupdate/{USER_ID}"));
        assert_eq!(report.auth.as_deref(), Some("Bearer tok-1"));
        assert_eq!(report.body["location"]["latitude"], "5.6037");
        assert_eq!(report.body["location"]["longitude"], "-0.187");
    }

    let text = h.state.metrics.encode().unwrap();
    assert!(text.contains("location_reports_total"));
}

#[tokio::test]
async fn replayed_route_is_reported_in_order() {
    let h = Harness::signed_in(vec![]).await;
    let next = GeoPoint { lat: 5.61, lng: -0.19 };

    let handle = start_tracking(
        h.state.backend.clone(),
        ReplayPositions::new(vec![ACCRA, next]).unwrap(),
        Duration::from_millis(40),
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.stop().await;

    let reports = h.mock.calls_to("/locationupdate/");
    assert!(reports.len() >= 2);
    assert_eq!(reports[0].body["location"]["latitude"], "5.6037");
    assert_eq!(reports[1].body["location"]["latitude"], "5.61");
}

#[tokio::test]
async fn tracking_needs_a_signed_in_rider() {
    let h = Harness::start(vec![]).await;

    let err = start_tracking(
        h.state.backend.clone(),
        FixedPosition::new(ACCRA),
        Duration::from_millis(50),
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, AppError::Unauthenticated));
}

#[tokio::test]
async fn zero_interval_is_rejected() {
    let h = Harness::signed_in(vec![]).await;

    let err = start_tracking(h.state.backend.clone(), FixedPosition::new(ACCRA), Duration::ZERO)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AppError::Validation(_)));
}

/// Plays back a fixed list of outcomes, then keeps reporting no fix.
struct Scripted {
    steps: VecDeque<AppResult<Option<LocationSample>>>,
}

impl Scripted {
    fn new(steps: Vec<AppResult<Option<LocationSample>>>) -> Self {
        Self {
            steps: steps.into(),
        }
    }
}

impl PositionSource for Scripted {
    async fn sample(&mut self) -> AppResult<Option<LocationSample>> {
        self.steps.pop_front().unwrap_or(Ok(None))
    }
}

#[tokio::test]
async fn rejected_reports_are_counted_and_tracking_continues() {
    let h = Harness::signed_in(vec![]).await;
    h.mock.fail_location_updates();

    let handle = start_tracking(
        h.state.backend.clone(),
        FixedPosition::new(ACCRA),
        Duration::from_millis(40),
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!handle.is_finished());
    let stats = handle.stop().await;

    assert_eq!(stats.sent, 0);
    assert!(stats.failed >= 2, "only {} failures counted", stats.failed);
    assert_eq!(
        h.mock.calls_to("/locationupdate/").len() as u64,
        stats.failed
    );

    let text = h.state.metrics.encode().unwrap();
    assert!(text.contains("location_reports_total{outcome=\"error\"}"));
}

#[tokio::test]
async fn missing_fix_is_skipped_and_denial_stops_tracking() {
    let h = Harness::signed_in(vec![]).await;
    let source = Scripted::new(vec![
        Ok(None),
        Ok(Some(LocationSample::now(ACCRA))),
        Ok(None),
        Err(AppError::PermissionDenied("location".to_string())),
        Ok(Some(LocationSample::now(ACCRA))),
    ]);

    let handle = start_tracking(h.state.backend.clone(), source, Duration::from_millis(20))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(handle.is_finished());

    let stats = handle.stop().await;
    assert_eq!(stats.sent, 1);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(h.mock.calls_to("/locationupdate/").len(), 1);
}
