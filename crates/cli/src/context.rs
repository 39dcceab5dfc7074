// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared wiring for commands: state store, queues, orchestrator.

use anyhow::{Context as _, Result};
use cmv_core::SystemClock;
use cmv_engine::Orchestrator;
use cmv_storage::{paths, QueueSet, StateStore};
use std::path::PathBuf;
use std::sync::Arc;

pub struct Context {
    pub state_dir: PathBuf,
    pub store: Arc<StateStore>,
    pub queues: Arc<QueueSet>,
}

impl Context {
    pub fn open() -> Result<Self> {
        let state_dir = paths::state_dir().context("resolving state directory")?;
        let store = Arc::new(StateStore::open(&state_dir).context("opening state store")?);
        let queues = Arc::new(QueueSet::open(&state_dir).context("opening job queues")?);
        Ok(Self { state_dir, store, queues })
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator<SystemClock>> {
        Arc::new(Orchestrator::new(self.store.clone(), self.queues.clone(), SystemClock))
    }
}
