// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cmv-engine: the pipeline core.
//!
//! Encodes the meeting state machine (orchestrator), seeds it (discovery),
//! repairs it (reconcile), and drives it (one phase worker per queue,
//! executed by a bounded worker pool with graceful shutdown).

pub mod discovery;
pub mod env;
mod error;
pub mod orchestrator;
pub mod playlist;
pub mod reconcile;
pub mod worker;

pub use discovery::{Discovery, DiscoveryOutcome, DiscoveryReport};
pub use error::EngineError;
pub use orchestrator::Orchestrator;
pub use playlist::{match_playlists, rules_from_env, PlaylistRule};
pub use reconcile::{ReconcileReport, Reconciler};
pub use worker::diarize::DiarizeWorker;
pub use worker::download::DownloadWorker;
pub use worker::extract::ExtractWorker;
pub use worker::pool::WorkerPool;
pub use worker::upload::UploadWorker;
pub use worker::{default_concurrency, PhaseWorker, WorkerError};
