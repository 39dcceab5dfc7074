// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error type.

use cmv_adapters::AdapterError;
use cmv_storage::{ArtifactError, QueueError, StateError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("state store error: {0}")]
    State(#[from] StateError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("artifact store error: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
}
