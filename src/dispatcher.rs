//! Bounded-concurrency, rate-limited, retrying dispatcher (C6).
//!
//! Wires the retry policy (C1) and rate limiter (C2) around the user
//! `Transform`, runs up to `max_concurrency` invocations concurrently via a
//! semaphore, and consumes outcomes in completion order through a
//! `JoinSet`. Progress (A4) is driven from the same outcome loop.

use crate::context::Context;
use crate::rate_limiter::RateLimiter;
use crate::record::{FailureRecord, Record};
use crate::retry::RetryPolicy;
use crate::selector::SelectedTask;
use crate::transform::Transform;
use crate::writer::BatchWriter;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

/// Tallies produced by a completed dispatch run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchCounts {
    pub success_count: usize,
    pub failure_count: usize,
    pub voided_count: usize,
}

impl DispatchCounts {
    pub fn attempted(&self) -> usize {
        self.success_count + self.failure_count + self.voided_count
    }
}

enum Outcome {
    Success(Value),
    Failure(FailureRecord),
    Voided,
}

pub struct Dispatcher<T: Transform + 'static> {
    transform: Arc<T>,
    retry_policy: RetryPolicy,
    rate_limiter: Arc<RateLimiter>,
    semaphore: Arc<Semaphore>,
    write_batch_size: usize,
}

impl<T: Transform + 'static> Dispatcher<T> {
    pub fn new(
        transform: Arc<T>,
        retry_policy: RetryPolicy,
        rate_limiter: Arc<RateLimiter>,
        max_concurrency: u32,
        write_batch_size: usize,
    ) -> Self {
        Self {
            transform,
            retry_policy,
            rate_limiter,
            semaphore: Arc::new(Semaphore::new(max_concurrency as usize)),
            write_batch_size,
        }
    }

    /// Run every selected task to completion (or until cancelled), flushing
    /// batches to `success_writer`/`failure_writer` as they fill and once
    /// more, unconditionally, when the run ends.
    pub async fn run(
        &self,
        tasks: Vec<SelectedTask>,
        ctx: Arc<Context>,
        success_writer: &BatchWriter,
        failure_writer: &BatchWriter,
        cancel: watch::Receiver<bool>,
        progress: Option<&ProgressBar>,
    ) -> DispatchCounts {
        let mut join_set = JoinSet::new();
        let total = tasks.len();
        let mut tasks = tasks.into_iter();
        let mut counts = DispatchCounts::default();
        let mut success_batch = Vec::with_capacity(self.write_batch_size);
        let mut failure_batch = Vec::with_capacity(self.write_batch_size);

        if let Some(bar) = progress {
            bar.set_length(total as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
        }

        'spawn: loop {
            if *cancel.borrow() {
                break 'spawn;
            }

            let Some(task) = tasks.next() else {
                break 'spawn;
            };

            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break 'spawn,
            };

            let transform = self.transform.clone();
            let retry_policy = self.retry_policy.clone();
            let rate_limiter = self.rate_limiter.clone();
            let ctx = ctx.clone();
            let cancel_for_task = cancel.clone();
            let id = task.id.clone();
            let record: Record = task.record;

            join_set.spawn(async move {
                let _permit = permit;
                let outcome = retry_policy
                    .execute(&cancel_for_task, || {
                        let transform = transform.clone();
                        let rate_limiter = rate_limiter.clone();
                        let ctx = ctx.clone();
                        let record = record.clone();
                        async move {
                            rate_limiter.wait().await;
                            transform.call(record, ctx).await
                        }
                    })
                    .await;

                match outcome {
                    Ok(Some(value)) => Outcome::Success(value),
                    Ok(None) => Outcome::Voided,
                    Err(err) => Outcome::Failure(FailureRecord::new(Some(&id), err.to_string(), record.clone())),
                }
            });
        }

        while let Some(joined) = join_set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(error = %err, "dispatcher task panicked");
                    continue;
                }
            };

            match outcome {
                Outcome::Success(value) => {
                    counts.success_count += 1;
                    success_batch.push(value);
                }
                Outcome::Failure(failure) => {
                    counts.failure_count += 1;
                    failure_batch.push(failure);
                }
                Outcome::Voided => {
                    counts.voided_count += 1;
                }
            }

            if let Some(bar) = progress {
                bar.set_position(counts.attempted() as u64);
                bar.set_message(format!(
                    "ok={} fail={} void={}",
                    counts.success_count, counts.failure_count, counts.voided_count
                ));
            }

            if success_batch.len() >= self.write_batch_size {
                success_writer.append(&success_batch).await;
                success_batch.clear();
            }
            if failure_batch.len() >= self.write_batch_size {
                failure_writer.append(&failure_batch).await;
                failure_batch.clear();
            }
        }

        success_writer.append(&success_batch).await;
        failure_writer.append(&failure_batch).await;

        if let Some(bar) = progress {
            bar.finish();
        }

        counts
    }
}
