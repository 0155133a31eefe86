// THEORY:
// The `runner` drives a `ScanPipeline` from an asynchronous source of sweeps,
// one tick per sweep. The engine itself stays a plain synchronous call: the
// runner only decides *when* a sweep is processed and *where* the report goes.
//
// Key principles:
// 1.  **One Tick, One Call**: Each sweep is processed inline on the runner's
//     task, start to finish, before the next sweep is pulled. There is no
//     worker pool and no shared state between ticks.
// 2.  **External Timing**: The engine has no cancellation point, so wall-clock
//     limits are enforced from the outside. Every tick is timed against the
//     configured frame interval; overruns are logged and counted.
// 3.  **Local Failures**: A sweep that fails to process is logged and skipped.
//     The next tick starts from a clean slate.
// 4.  **Backpressure by Channel**: Reports go out on a bounded `mpsc` channel.
//     When the consumer hangs up, the runner stops.

use crate::core_modules::report::ClusterReport;
use crate::core_modules::scan::ScanNode;
use crate::pipeline::ScanPipeline;
use futures::{Stream, StreamExt};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Counters collected over the lifetime of one `drive` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Sweeps pulled from the source.
    pub frames: u64,
    /// Reports delivered to the consumer.
    pub reports: u64,
    /// Sweeps that failed to process.
    pub failed: u64,
    /// Ticks that took longer than the frame interval.
    pub overruns: u64,
}

/// Processes every sweep from `frames` and sends the resulting reports on `reports`.
/// Returns when the source is exhausted or the consumer is gone.
pub async fn drive<S>(pipeline: &mut ScanPipeline, frames: S, reports: mpsc::Sender<ClusterReport>) -> TickStats
where
    S: Stream<Item = Vec<ScanNode>>,
{
    let budget = pipeline.config().frame_interval();
    let mut stats = TickStats::default();
    let mut frames = std::pin::pin!(frames);

    while let Some(nodes) = frames.next().await {
        stats.frames += 1;

        let started = Instant::now();
        let result = pipeline.process_scan(&nodes);
        let elapsed = started.elapsed();
        if exceeds(elapsed, budget) {
            stats.overruns += 1;
            warn!(?elapsed, ?budget, "tick overran the frame interval");
        }

        let report = match result {
            Ok(report) => report,
            Err(err) => {
                stats.failed += 1;
                warn!(error = %err, "dropping frame");
                continue;
            }
        };

        if reports.send(report).await.is_err() {
            debug!("report consumer closed, stopping");
            break;
        }
        stats.reports += 1;
    }

    stats
}

fn exceeds(elapsed: Duration, budget: Duration) -> bool {
    elapsed > budget
}
