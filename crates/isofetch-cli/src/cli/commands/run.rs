//! `isofetch run` – fetch isochrones for every station in a CSV file.

use anyhow::{Context, Result};
use isofetch_core::config::{IsoConfig, RetryConfig};
use isofetch_core::journal::RunJournal;
use isofetch_core::{export, stations};
use isofetch_core::{BatchOrchestrator, CancelToken, CurlClient, ProgressEvent};
use std::path::PathBuf;

/// Command-line overrides for one batch run.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub points: PathBuf,
    pub range_seconds: Option<u32>,
    pub out: Option<PathBuf>,
    /// `Some(None)` writes the log under its default name.
    pub log: Option<Option<PathBuf>>,
    pub max_attempts: Option<u32>,
}

/// Apply command-line overrides on top of the loaded config.
pub(crate) fn effective_config(cfg: &IsoConfig, args: &RunArgs) -> IsoConfig {
    let mut cfg = cfg.clone();
    if let Some(secs) = args.range_seconds {
        cfg.range_seconds = secs;
    }
    if let Some(max_attempts) = args.max_attempts {
        let retry = cfg.retry.take().unwrap_or_default();
        cfg.retry = Some(RetryConfig {
            max_attempts,
            ..retry
        });
    }
    cfg
}

pub async fn run_batch(cfg: &IsoConfig, args: RunArgs) -> Result<()> {
    let cfg = effective_config(cfg, &args);
    cfg.validate().context("invalid configuration")?;
    if cfg.resolved_api_key().is_none() {
        eprintln!(
            "warning: no API key (set api_key in config or {}); requests will likely fail with 401/403",
            isofetch_core::config::API_KEY_ENV
        );
    }

    let points = stations::load_points(&args.points)?;
    let range = cfg.range()?;
    println!(
        "Fetching {}-minute isochrones for {} station(s) from {}",
        f64::from(range.get()) / 60.0,
        points.len(),
        cfg.endpoint
    );

    let orchestrator = BatchOrchestrator::new(CurlClient::from_config(&cfg))
        .with_retry_policy(cfg.retry_policy()?)
        .with_inter_request_delay(cfg.inter_request_delay());

    let cancel = CancelToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nstop requested; finishing the current station");
                cancel.cancel();
            }
        })
    };

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressEvent>(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            if event.status.is_terminal() {
                println!("{}", event);
            } else {
                println!("  [{:>5.1}%] {}", event.fraction() * 100.0, event);
            }
        }
    });

    let journal = RunJournal::new();
    let run = orchestrator
        .run(&points, range, &cancel, Some(&progress_tx), &journal)
        .await;
    drop(progress_tx);
    let _ = printer.await;
    ctrl_c.abort();

    let merged = export::merge_results(&run);
    if merged.features.is_empty() {
        println!("No isochrones to export.");
    } else {
        let out = args
            .out
            .unwrap_or_else(|| PathBuf::from(export::default_file_name(range.get())));
        export::write_geojson(&out, &merged)?;
        println!(
            "Wrote {} feature(s) to {}",
            merged.features.len(),
            out.display()
        );
        for (category, count) in export::category_counts(&merged) {
            println!("  {}: {} feature(s)", category, count);
        }
    }

    if let Some(log_path) = args.log {
        let log_path = log_path.unwrap_or_else(|| {
            let at = run.finished_at().unwrap_or_else(|| run.started_at());
            PathBuf::from(RunJournal::default_file_name(at))
        });
        journal.write_to(&log_path)?;
        println!("Wrote run log to {}", log_path.display());
    }

    println!(
        "Succeeded: {}  Failed: {}  Skipped (invalid): {}  Total: {}",
        run.successes(),
        run.failures(),
        run.skipped_invalid(),
        run.total()
    );
    for (outcome, failure) in run.failed() {
        println!("  {} [{}]: {}", outcome.name, failure.class(), failure);
    }
    Ok(())
}
