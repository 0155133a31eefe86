use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, BoxStream, StreamExt};
use scan_cluster::runner::drive;
use scan_cluster::{ScanConfig, ScanNode, ScanPipeline};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Replays a recorded lidar scan through the clustering pipeline and prints one
/// JSON report per frame on stdout.
#[derive(Parser, Debug)]
#[command(name = "scan_tester", version)]
struct Args {
    /// JSON pipeline configuration. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recording to replay: one JSON array of raw nodes per line.
    #[arg(long)]
    scan: PathBuf,

    /// Pace frames at the configured frame rate instead of replaying as fast as possible.
    #[arg(long)]
    realtime: bool,

    /// Fixed seed for the clustering engine, overriding the config.
    #[arg(long)]
    seed: Option<u64>,
}

/// A measurement as the sensor reports it.
#[derive(Debug, Deserialize)]
struct RawNode {
    angle_q6: u16,
    distance_q2: u16,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // --- 1. Logging ---
    // Logs go to stderr so stdout stays a clean stream of reports.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // --- 2. Configuration ---
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ScanConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    // --- 3. Recording ---
    let recording = load_recording(&args.scan)?;
    info!(frames = recording.len(), path = %args.scan.display(), "loaded recording");

    // --- 4. Pipeline & Output ---
    let interval = config.frame_interval();
    let mut pipeline = ScanPipeline::new(config).context("building scan pipeline")?;

    let (report_tx, mut report_rx) = mpsc::channel(16);
    let printer = tokio::spawn(async move {
        while let Some(report) = report_rx.recv().await {
            println!("{}", serde_json::to_string(&report)?);
        }
        Ok::<(), anyhow::Error>(())
    });

    // --- 5. Main Processing Loop ---
    let frames = if args.realtime {
        paced(recording, interval)
    } else {
        stream::iter(recording).boxed()
    };
    let stats = drive(&mut pipeline, frames, report_tx).await;
    printer.await.context("report printer panicked")??;

    info!(
        frames = stats.frames,
        reports = stats.reports,
        failed = stats.failed,
        overruns = stats.overruns,
        "replay complete"
    );
    Ok(())
}

fn load_recording(path: &Path) -> Result<Vec<Vec<ScanNode>>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading recording {}", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let raw: Vec<RawNode> =
                serde_json::from_str(line).with_context(|| format!("parsing frame on line {}", index + 1))?;
            Ok(raw
                .into_iter()
                .map(|node| ScanNode::from_raw(node.angle_q6, node.distance_q2))
                .collect())
        })
        .collect()
}

/// Releases one frame per tick of a `frame_interval` timer.
fn paced(recording: Vec<Vec<ScanNode>>, frame_interval: Duration) -> BoxStream<'static, Vec<ScanNode>> {
    let ticker = tokio::time::interval(frame_interval);
    stream::unfold((recording.into_iter(), ticker), |(mut frames, mut ticker)| async move {
        let frame = frames.next()?;
        ticker.tick().await;
        Some((frame, (frames, ticker)))
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("scan_tester_{}_{name}", std::process::id()));
        std::fs::write(&path, contents).expect("Error writing temp file.");
        path
    }

    #[test]
    fn loads_one_frame_per_line() {
        let path = write_temp(
            "frames.jsonl",
            "[{\"angle_q6\": 11521, \"distance_q2\": 4000}]\n\n[]\n",
        );
        let recording = load_recording(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(recording.len(), 2);
        assert_eq!(recording[0], vec![ScanNode::new(90.0, 1000.0)]);
        assert!(recording[1].is_empty());
    }

    #[test]
    fn reports_the_bad_line() {
        let path = write_temp("bad.jsonl", "[]\n[{\"angle_q6\": 1}]\n");
        let err = load_recording(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[tokio::test]
    async fn paced_stream_yields_every_frame() {
        let recording = vec![vec![ScanNode::new(0.0, 10.0)], Vec::new(), Vec::new()];
        let frames: Vec<_> = paced(recording.clone(), Duration::from_millis(1)).collect().await;
        assert_eq!(frames, recording);
    }
}
