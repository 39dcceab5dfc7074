// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operational commands: discovery, reconcile, and the worker processes.

use crate::commands::queue::parse_queue;
use crate::context::Context;
use anyhow::{Context as _, Result};
use chrono::DateTime;
use cmv_adapters::{
    CommandDiarizer, CommandVideoDownloader, CommandVideoHost, DateRange, FfmpegAudioExtractor,
    HttpAgendaClient, HttpCalendarClient,
};
use cmv_core::{QueueKind, SystemClock};
use cmv_engine::{
    default_concurrency, env, rules_from_env, DiarizeWorker, Discovery, DiscoveryOutcome,
    DownloadWorker, ExtractWorker, PhaseWorker, Reconciler, UploadWorker, WorkerPool,
};
use cmv_storage::store_from_env;
use std::fmt::Display;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fatal misconfiguration: log one configuration-error line; main exits 1
/// and the supervisor restarts per its policy.
fn config_exit(e: impl Display) -> anyhow::Error {
    tracing::error!(error = %e, "configuration error");
    anyhow::anyhow!("{e}")
}

fn parse_range(start: Option<&str>, end: Option<&str>) -> Result<Option<DateRange>> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => {
            let start = DateTime::parse_from_rfc3339(start).context("invalid --start")?;
            let end = DateTime::parse_from_rfc3339(end).context("invalid --end")?;
            Ok(Some(DateRange { start, end }))
        }
        _ => anyhow::bail!("--start and --end must be given together"),
    }
}

pub async fn discover(start: Option<&str>, end: Option<&str>) -> Result<()> {
    let range = parse_range(start, end)?;
    let ctx = Context::open()?;
    let base_url = env::calendar_base_url().map_err(config_exit)?;
    let offset = env::calendar_offset().map_err(config_exit)?;

    let discovery = Discovery::new(
        Arc::new(HttpCalendarClient::new(base_url.clone())),
        ctx.store.clone(),
        ctx.queues.clone(),
        SystemClock,
        base_url,
        offset,
        &ctx.state_dir,
    );
    match discovery.run(range).await? {
        DiscoveryOutcome::Completed(report) => {
            println!(
                "Discovered {} meeting{} ({} fetched, {} with video, {} already known)",
                report.inserted,
                if report.inserted == 1 { "" } else { "s" },
                report.fetched,
                report.with_video,
                report.already_present,
            );
        }
        DiscoveryOutcome::AlreadyRunning => {
            println!("Discovery already running, nothing to do");
        }
    }
    Ok(())
}

pub fn reconcile() -> Result<()> {
    let ctx = Context::open()?;
    let reconciler = Reconciler::new(
        ctx.store.clone(),
        ctx.queues.clone(),
        SystemClock,
        env::stale_active_after(),
    );
    let report = reconciler.run()?;
    println!(
        "Enqueued {} missing job{}, requeued {} stale active job{}",
        report.enqueued.len(),
        if report.enqueued.len() == 1 { "" } else { "s" },
        report.requeued_stale,
        if report.requeued_stale == 1 { "" } else { "s" },
    );
    for (queue, meeting_id) in &report.enqueued {
        println!("  {queue}-{meeting_id}");
    }
    Ok(())
}

fn build_worker(
    kind: QueueKind,
    artifacts: Arc<dyn cmv_storage::ArtifactStore>,
    run_root: std::path::PathBuf,
) -> Result<Arc<dyn PhaseWorker>> {
    let clock = SystemClock;
    let worker: Arc<dyn PhaseWorker> = match kind {
        QueueKind::Download => Arc::new(DownloadWorker::new(
            Arc::new(CommandVideoDownloader::new(env::downloader_cmd())),
            artifacts,
            run_root,
            clock,
        )),
        QueueKind::Extract => Arc::new(ExtractWorker::new(
            Arc::new(HttpAgendaClient::new(env::calendar_base_url().map_err(config_exit)?)),
            Arc::new(FfmpegAudioExtractor::new(env::ffmpeg_cmd())),
            artifacts,
            run_root,
            clock,
        )),
        QueueKind::Upload => Arc::new(UploadWorker::new(
            Arc::new(CommandVideoHost::new(env::uploader_cmd().map_err(config_exit)?)),
            artifacts,
            run_root,
            env::location_tag().map_err(config_exit)?,
            env::upload_tags(),
            rules_from_env().map_err(config_exit)?,
            clock,
        )),
        QueueKind::Diarize => Arc::new(DiarizeWorker::new(
            Arc::new(CommandDiarizer::new(env::diarize_cmd().map_err(config_exit)?)),
            artifacts,
            run_root,
            clock,
        )),
    };
    Ok(worker)
}

async fn shutdown_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining");
    token.cancel();
}

pub async fn worker(queue: &str) -> Result<()> {
    let kind = parse_queue(queue)?;
    let ctx = Context::open()?;
    let artifacts = store_from_env().map_err(config_exit)?;
    let run_root = env::run_root();
    std::fs::create_dir_all(&run_root)?;

    let worker = build_worker(kind, artifacts, run_root)?;
    let pool = WorkerPool::new(
        ctx.queues.clone(),
        ctx.store.clone(),
        ctx.orchestrator(),
        worker,
        SystemClock,
        default_concurrency(kind),
        env::poll_interval(),
        env::drain_timeout(),
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));
    pool.run(shutdown).await;
    Ok(())
}
