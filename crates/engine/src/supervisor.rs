// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor: keeps a change pipeline running.
//!
//! When a pipeline's consume loop ends without a shutdown request, the
//! supervisor builds a fresh pipeline that resumes after the last handled
//! record, or gives up according to its restart policy.

use crate::pipeline::{ChangePipeline, PipelineConfig, PipelineDeps, Termination};
use crate::SupervisorError;
use ct_adapters::{ChangeFeed, EventSink, ObjectStore};
use ct_core::{Clock, IdGen, PipelineState, SupervisorConfig};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Supervisor<F, S, K, C, I> {
    deps: PipelineDeps<F, S, K>,
    config: PipelineConfig,
    policy: SupervisorConfig,
    clock: C,
    ids: I,
}

/// Handle to a running supervisor
pub struct SupervisorHandle {
    task: JoinHandle<Result<(), SupervisorError>>,
}

impl SupervisorHandle {
    /// Wait for the supervisor to stop.
    ///
    /// `Ok` after a requested shutdown; `Err` when it gave up.
    pub async fn join(self) -> Result<(), SupervisorError> {
        self.task
            .await
            .map_err(|e| SupervisorError::Panicked(e.to_string()))?
    }
}

impl<F, S, K, C, I> Supervisor<F, S, K, C, I>
where
    F: ChangeFeed,
    S: ObjectStore,
    K: EventSink,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        deps: PipelineDeps<F, S, K>,
        config: PipelineConfig,
        policy: SupervisorConfig,
        clock: C,
        ids: I,
    ) -> Self {
        Self {
            deps,
            config,
            policy,
            clock,
            ids,
        }
    }

    /// Run pipelines on a background task until shutdown or give-up
    pub fn start(self, shutdown: CancellationToken) -> SupervisorHandle {
        SupervisorHandle {
            task: tokio::spawn(self.run(shutdown)),
        }
    }

    async fn run(self, shutdown: CancellationToken) -> Result<(), SupervisorError> {
        let mut restarts: u32 = 0;
        let mut resume_after = self.config.resume_after.clone();

        loop {
            let config = PipelineConfig {
                resume_after: resume_after.clone(),
                ..self.config.clone()
            };
            let pipeline = ChangePipeline::new(
                self.deps.clone(),
                config,
                self.clock.clone(),
                self.ids.clone(),
            );

            let termination = pipeline.start(shutdown.clone())?.join().await;
            resume_after = pipeline.position();

            if !termination.is_fatal() || shutdown.is_cancelled() {
                tracing::info!("supervisor stopped");
                return Ok(());
            }

            // A panicked loop never reached its final transition
            self.deps.monitor.set_state(PipelineState::Stopped);
            tracing::error!(
                termination = %termination,
                restarts,
                "change pipeline terminated"
            );

            if !self.policy.allows_restart(restarts) {
                tracing::error!(restarts, "giving up on change pipeline");
                return Err(SupervisorError::GaveUp {
                    restarts,
                    last: termination,
                });
            }

            restarts += 1;
            self.deps.monitor.record_restart();
            tracing::warn!(
                attempt = restarts,
                backoff_ms = self.policy.backoff.as_millis() as u64,
                resume_after = ?resume_after.as_ref().map(|t| t.0.as_str()),
                "restarting change pipeline"
            );

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("supervisor stopped during backoff");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.policy.backoff) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
