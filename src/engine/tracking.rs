use std::future::Future;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

use crate::api::BackendClient;
use crate::error::{AppError, AppResult};
use crate::models::rider::{GeoPoint, LocationSample};

/// Where rider positions come from. `Ok(None)` means no fix yet.
pub trait PositionSource: Send + 'static {
    fn sample(&mut self) -> impl Future<Output = AppResult<Option<LocationSample>>> + Send;
}

pub struct FixedPosition {
    point: GeoPoint,
}

impl FixedPosition {
    pub fn new(point: GeoPoint) -> Self {
        Self { point }
    }
}

impl PositionSource for FixedPosition {
    async fn sample(&mut self) -> AppResult<Option<LocationSample>> {
        Ok(Some(LocationSample::now(self.point)))
    }
}

/// Cycles through a recorded list of points.
pub struct ReplayPositions {
    points: Vec<GeoPoint>,
    next: usize,
}

impl ReplayPositions {
    pub fn new(points: Vec<GeoPoint>) -> AppResult<Self> {
        if points.is_empty() {
            return Err(AppError::Validation("replay needs at least one point".to_string()));
        }
        Ok(Self { points, next: 0 })
    }

    /// Reads a JSON array of `{"lat": .., "lng": ..}` points.
    pub async fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let points: Vec<GeoPoint> = serde_json::from_slice(&bytes)?;
        Self::new(points)
    }
}

impl PositionSource for ReplayPositions {
    async fn sample(&mut self) -> AppResult<Option<LocationSample>> {
        let point = self.points[self.next % self.points.len()];
        self.next = (self.next + 1) % self.points.len();
        Ok(Some(LocationSample::now(point)))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct TrackerStats {
    pub sent: u64,
    pub failed: u64,
    pub skipped: u64,
}

pub struct TrackerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<TrackerStats>,
}

impl TrackerHandle {
    pub async fn stop(self) -> TrackerStats {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(stats) => stats,
            Err(err) => {
                error!(error = %err, "location tracker task failed");
                TrackerStats::default()
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Starts periodic location reporting for the signed-in rider. Each sample
/// is sent once; failures are logged and dropped.
pub async fn start_tracking<S: PositionSource>(
    backend: BackendClient,
    source: S,
    every: Duration,
) -> AppResult<TrackerHandle> {
    if every.is_zero() {
        return Err(AppError::Validation(
            "location interval must be positive".to_string(),
        ));
    }
    let user_id = backend.require_user_id().await?;
    let (shutdown, shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(run_tracker(backend, source, user_id, every, shutdown_rx));
    Ok(TrackerHandle { shutdown, task })
}

async fn run_tracker<S: PositionSource>(
    backend: BackendClient,
    mut source: S,
    user_id: String,
    every: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> TrackerStats {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = IntervalStream::new(ticker);
    let mut stats = TrackerStats::default();
    let reports = &backend.metrics().location_reports_total;

    info!(user_id = %user_id, interval_secs = every.as_secs_f64(), "location tracking started");

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            tick = ticks.next() => {
                if tick.is_none() {
                    break;
                }

                let sample = match source.sample().await {
                    Ok(Some(sample)) => sample,
                    Ok(None) => {
                        stats.skipped += 1;
                        reports.with_label_values(&["skipped"]).inc();
                        continue;
                    }
                    Err(AppError::PermissionDenied(what)) => {
                        warn!(%what, "location permission denied; tracking stopped");
                        break;
                    }
                    Err(err) => {
                        stats.failed += 1;
                        reports.with_label_values(&["error"]).inc();
                        warn!(error = %err, "failed to read position");
                        continue;
                    }
                };

                match backend.report_location(&user_id, &sample).await {
                    Ok(()) => {
                        stats.sent += 1;
                        reports.with_label_values(&["success"]).inc();
                    }
                    Err(err) => {
                        stats.failed += 1;
                        reports.with_label_values(&["error"]).inc();
                        warn!(error = %err, "failed to update location");
                    }
                }
            }
        }
    }

    info!(
        user_id = %user_id,
        sent = stats.sent,
        failed = stats.failed,
        "location tracking stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replay_cycles_through_points() {
        let a = GeoPoint { lat: 1.0, lng: 1.0 };
        let b = GeoPoint { lat: 2.0, lng: 2.0 };
        let mut source = ReplayPositions::new(vec![a, b]).unwrap();

        let seen: Vec<GeoPoint> = [
            source.sample().await.unwrap().unwrap().point,
            source.sample().await.unwrap().unwrap().point,
            source.sample().await.unwrap().unwrap().point,
        ]
        .to_vec();
        assert_eq!(seen, vec![a, b, a]);
    }

    #[test]
    fn empty_replay_is_rejected() {
        assert!(ReplayPositions::new(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn replay_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.json");
        tokio::fs::write(&path, br#"[{"lat": 5.6, "lng": -0.18}]"#)
            .await
            .unwrap();

        let mut source = ReplayPositions::from_file(&path).await.unwrap();
        let sample = source.sample().await.unwrap().unwrap();
        assert_eq!(sample.point, GeoPoint { lat: 5.6, lng: -0.18 });
    }
}
