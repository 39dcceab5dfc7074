// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool: bounded-concurrency dequeue loop with graceful shutdown.
//!
//! On shutdown the pool stops dequeuing, waits for in-flight jobs up to the
//! drain deadline, then aborts the rest. An aborted job stays active in the
//! queue and is redelivered by the reconcile sweep; workers are idempotent,
//! so redelivery is safe.

use crate::orchestrator::Orchestrator;
use crate::worker::{PhaseWorker, WorkerError};
use cmv_core::Clock;
use cmv_storage::{JobRecord, JobQueue, QueueSet, StateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

pub struct WorkerPool<C: Clock> {
    queues: Arc<QueueSet>,
    store: Arc<StateStore>,
    orchestrator: Arc<Orchestrator<C>>,
    worker: Arc<dyn PhaseWorker>,
    clock: C,
    concurrency: usize,
    poll_interval: Duration,
    drain_timeout: Duration,
}

impl<C: Clock> WorkerPool<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queues: Arc<QueueSet>,
        store: Arc<StateStore>,
        orchestrator: Arc<Orchestrator<C>>,
        worker: Arc<dyn PhaseWorker>,
        clock: C,
        concurrency: usize,
        poll_interval: Duration,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            queues,
            store,
            orchestrator,
            worker,
            clock,
            concurrency,
            poll_interval,
            drain_timeout,
        }
    }

    fn queue(&self) -> &JobQueue {
        self.queues.get(self.worker.queue())
    }

    /// Run until the shutdown token fires, then drain.
    pub async fn run(&self, shutdown: CancellationToken) {
        let kind = self.worker.queue();
        tracing::info!(queue = %kind, concurrency = self.concurrency, "worker started");
        let mut tasks: JoinSet<()> = JoinSet::new();

        loop {
            if shutdown.is_cancelled() {
                break;
            }
            if tasks.len() >= self.concurrency {
                tasks.join_next().await;
                continue;
            }
            let taken = self.queue().take(self.clock.epoch_ms());
            match taken {
                Ok(Some(job)) => {
                    let span = tracing::info_span!(
                        "job",
                        queue = %kind,
                        meeting_id = %job.meeting_id,
                        job_id = %job.id,
                    );
                    let queues = self.queues.clone();
                    let store = self.store.clone();
                    let orchestrator = self.orchestrator.clone();
                    let worker = self.worker.clone();
                    let clock = self.clock.clone();
                    tasks.spawn(
                        async move {
                            process_job(job, &queues, &store, &orchestrator, worker.as_ref(), &clock)
                                .await;
                        }
                        .instrument(span),
                    );
                }
                Ok(None) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
                Err(e) => {
                    tracing::error!(queue = %kind, error = %e, "queue take failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
            }
        }

        if !tasks.is_empty() {
            tracing::info!(queue = %kind, in_flight = tasks.len(), "draining in-flight jobs");
            let drained = tokio::time::timeout(self.drain_timeout, async {
                while tasks.join_next().await.is_some() {}
            })
            .await;
            if drained.is_err() {
                tracing::warn!(queue = %kind, "drain deadline exceeded, aborting in-flight jobs");
                tasks.abort_all();
            }
        }
        tracing::info!(queue = %kind, "worker stopped");
    }

    /// Process jobs inline until the queue has nothing ready. Test and
    /// one-shot entry point; production uses [`WorkerPool::run`].
    pub async fn run_until_idle(&self) {
        loop {
            let taken = self.queue().take(self.clock.epoch_ms());
            match taken {
                Ok(Some(job)) => {
                    process_job(
                        job,
                        &self.queues,
                        &self.store,
                        &self.orchestrator,
                        self.worker.as_ref(),
                        &self.clock,
                    )
                    .await;
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "queue take failed");
                    break;
                }
            }
        }
    }
}

/// One job attempt: load the meeting, enforce the phase precondition, run
/// the worker, record the transition. Every failure path lands back in the
/// queue (transient) or in the failed set plus the meeting's failure
/// fields (precondition); nothing is silently swallowed.
async fn process_job<C: Clock>(
    job: JobRecord,
    queues: &QueueSet,
    store: &StateStore,
    orchestrator: &Orchestrator<C>,
    worker: &dyn PhaseWorker,
    clock: &C,
) {
    let kind = worker.queue();
    let queue = queues.get(kind);
    let expected = kind.expects();

    let meeting = match store.get_meeting(&job.meeting_id) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(step = %kind, error = %e, "state store read failed");
            log_queue_error(queue.fail(&job.id, &e.to_string(), clock.epoch_ms()).err());
            return;
        }
    };
    let Some(meeting) = meeting else {
        tracing::error!(step = %kind, "meeting not found");
        log_queue_error(queue.fail_fast(&job.id, "meeting not found", clock.epoch_ms()).err());
        return;
    };

    if meeting.phase != expected {
        // Redelivery after a crash between advance and complete: the
        // transition is already recorded, so the job is simply done.
        if meeting.phase == kind.on_success() {
            tracing::info!(step = %kind, phase = %meeting.phase, "transition already recorded");
            log_queue_error(queue.complete(&job.id, clock.epoch_ms()).err());
            return;
        }
        let message = format!(
            "meeting is in phase '{}', expected '{}'",
            meeting.phase, expected
        );
        tracing::error!(step = %kind, error = %message, "phase precondition failed");
        if let Err(e) = orchestrator.fail(&meeting.id, expected, &message) {
            tracing::error!(step = %kind, error = %e, "failed to record meeting failure");
        }
        log_queue_error(queue.fail_fast(&job.id, &message, clock.epoch_ms()).err());
        return;
    }

    match worker.run(&meeting).await {
        Ok(patch) => match orchestrator.advance(&meeting.id, expected, patch) {
            Ok(_) => {
                tracing::info!(step = %kind, "job completed");
                log_queue_error(queue.complete(&job.id, clock.epoch_ms()).err());
            }
            Err(e) => {
                // The store write failed; artifacts are in place, so a
                // retry will fast-path through the worker again.
                tracing::error!(step = %kind, error = %e, "failed to record transition");
                log_queue_error(queue.fail(&job.id, &e.to_string(), clock.epoch_ms()).err());
            }
        },
        Err(WorkerError::Transient(message)) => {
            tracing::warn!(step = %kind, error = %message, "transient failure, leaving retry to the queue");
            log_queue_error(queue.fail(&job.id, &message, clock.epoch_ms()).err());
        }
        Err(WorkerError::Precondition(message)) => {
            tracing::error!(step = %kind, error = %message, "precondition failure");
            if let Err(e) = orchestrator.fail(&meeting.id, expected, &message) {
                tracing::error!(step = %kind, error = %e, "failed to record meeting failure");
            }
            log_queue_error(queue.fail_fast(&job.id, &message, clock.epoch_ms()).err());
        }
    }
}

fn log_queue_error(err: Option<cmv_storage::QueueError>) {
    if let Some(e) = err {
        tracing::error!(error = %e, "queue update failed");
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
