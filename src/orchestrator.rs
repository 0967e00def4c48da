//! Orchestrator (C7).
//!
//! Sequences the resume loader, task selector, and dispatcher, runs the
//! lifecycle hooks at the boundaries, and emits the final report. Owns the
//! Ctrl-C cancellation signal and fans it out to the dispatcher.

use crate::config::Config;
use crate::context::Context;
use crate::dispatcher::Dispatcher;
use crate::error::EngineError;
use crate::report::Report;
use crate::resume::load_processed_ids;
use crate::selector::select_tasks;
use crate::transform::{Lifecycle, Transform};
use crate::writer::BatchWriter;
use indicatif::ProgressBar;
use serde_json::Map;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

pub struct Orchestrator<T: Transform + 'static> {
    config: Config,
    transform: Arc<T>,
    lifecycle: Option<Arc<dyn Lifecycle>>,
}

impl<T: Transform + 'static> Orchestrator<T> {
    pub fn new(config: Config, transform: Arc<T>, lifecycle: Option<Arc<dyn Lifecycle>>) -> Self {
        Self {
            config,
            transform,
            lifecycle,
        }
    }

    pub async fn run(&self) -> Result<Report, EngineError> {
        ensure_parent_dir(&self.config.output_file)?;
        ensure_parent_dir(&self.config.error_file)?;

        let processed_ids = load_processed_ids(
            &self.config.output_file,
            &self.config.id_key,
            self.config.rerun_key.as_deref(),
        )
        .await
        .map_err(|err| EngineError::Startup(format!("failed to load resume state: {err}")))?;

        let tasks = match select_tasks(&self.config.input_file, &self.config.id_key, &processed_ids).await {
            Ok(tasks) => tasks,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::InputNotFound(self.config.input_file.clone()));
            }
            Err(err) => return Err(EngineError::Startup(err.to_string())),
        };

        let start = Instant::now();

        if tasks.is_empty() {
            tracing::info!("no tasks selected; nothing to do");
            return Ok(Report {
                duration: start.elapsed(),
                attempted: 0,
                success_count: 0,
                failure_count: 0,
                voided_count: 0,
                output_file: self.config.output_file.clone(),
                error_file: self.config.error_file.clone(),
            });
        }

        let startup = match &self.lifecycle {
            Some(hooks) => hooks.on_startup().await,
            None => Ok(Map::new()),
        };

        let (extra, startup_err) = match startup {
            Ok(extra) => (extra, None),
            Err(err) => (Map::new(), Some(err)),
        };

        let session = reqwest::Client::new();
        let ctx = Arc::new(Context::new(session, extra));

        if let Some(err) = startup_err {
            if let Some(hooks) = &self.lifecycle {
                hooks.on_shutdown(ctx).await;
            }
            return Err(err);
        }

        let success_writer = BatchWriter::open(&self.config.output_file)
            .await
            .map_err(|source| EngineError::OutputDir {
                path: self.config.output_file.display().to_string(),
                source,
            })?;
        let failure_writer = BatchWriter::open(&self.config.error_file)
            .await
            .map_err(|source| EngineError::OutputDir {
                path: self.config.error_file.display().to_string(),
                source,
            })?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("cancellation signal received; finishing in-flight work and flushing");
                let _ = cancel_tx.send(true);
            }
        });

        let dispatcher = Dispatcher::new(
            self.transform.clone(),
            crate::retry::RetryPolicy::new(
                self.config.max_retries,
                self.config.retry_initial_delay,
                self.config.retry_backoff_factor,
            ),
            Arc::new(crate::rate_limiter::RateLimiter::new(self.config.requests_per_minute)),
            self.config.max_concurrency,
            self.config.write_batch_size,
        );

        let progress = if atty_stdout() {
            Some(ProgressBar::new(tasks.len() as u64))
        } else {
            None
        };

        let counts = dispatcher
            .run(
                tasks,
                ctx.clone(),
                &success_writer,
                &failure_writer,
                cancel_rx,
                progress.as_ref(),
            )
            .await;

        if let Some(hooks) = &self.lifecycle {
            hooks.on_shutdown(ctx).await;
        }

        let report = Report {
            duration: start.elapsed(),
            attempted: counts.attempted(),
            success_count: counts.success_count,
            failure_count: counts.failure_count,
            voided_count: counts.voided_count,
            output_file: self.config.output_file.clone(),
            error_file: self.config.error_file.clone(),
        };
        report.log_summary();
        Ok(report)
    }
}

fn ensure_parent_dir(path: &std::path::Path) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| EngineError::OutputDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }
    Ok(())
}

fn atty_stdout() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use crate::error::TransformError;
    use crate::record::Record;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::io::AsyncWriteExt;

    struct EchoTransform;

    #[async_trait]
    impl Transform for EchoTransform {
        async fn call(&self, record: Record, _ctx: Arc<Context>) -> Result<Option<Value>, TransformError> {
            Ok(Some(Value::Object(record)))
        }
    }

    fn config_for(dir: &std::path::Path) -> Config {
        Config {
            input_file: dir.join("in.jsonl"),
            output_file: dir.join("out.jsonl"),
            error_file: dir.join("err.jsonl"),
            log_file: dir.join("run.log"),
            id_key: "id".to_string(),
            rerun_key: None,
            max_concurrency: 4,
            requests_per_minute: 0,
            write_batch_size: 10,
            max_retries: 0,
            retry_initial_delay: 0.01,
            retry_backoff_factor: 2.0,
            log_level: LogLevel::Info,
        }
    }

    #[tokio::test]
    async fn empty_input_produces_a_clean_zero_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        tokio::fs::File::create(&config.input_file).await.unwrap();

        let orchestrator = Orchestrator::new(config, Arc::new(EchoTransform), None);
        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.attempted, 0);
    }

    #[tokio::test]
    async fn missing_input_file_is_a_terminal_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        let orchestrator = Orchestrator::new(config, Arc::new(EchoTransform), None);
        let result = orchestrator.run().await;

        assert!(matches!(result, Err(EngineError::InputNotFound(_))));
    }

    #[tokio::test]
    async fn end_to_end_run_writes_success_records() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        let mut file = tokio::fs::File::create(&config.input_file).await.unwrap();
        file.write_all(b"{\"id\": \"a\"}\n{\"id\": \"b\"}\n").await.unwrap();

        let orchestrator = Orchestrator::new(config.clone(), Arc::new(EchoTransform), None);
        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.success_count, 2);
        let contents = tokio::fs::read_to_string(&config.output_file).await.unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn resumed_run_skips_previously_succeeded_ids() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        let mut input = tokio::fs::File::create(&config.input_file).await.unwrap();
        input.write_all(b"{\"id\": \"a\"}\n{\"id\": \"b\"}\n").await.unwrap();

        let mut output = tokio::fs::File::create(&config.output_file).await.unwrap();
        output.write_all(json!({"id": "a"}).to_string().as_bytes()).await.unwrap();
        output.write_all(b"\n").await.unwrap();

        let orchestrator = Orchestrator::new(config.clone(), Arc::new(EchoTransform), None);
        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.success_count, 1);
        let contents = tokio::fs::read_to_string(&config.output_file).await.unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
