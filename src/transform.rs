//! The user transformation contract and lifecycle hooks — the engine's one
//! external collaborator boundary — plus a reference HTTP-backed
//! implementation so the engine is runnable end to end.

use crate::context::Context;
use crate::error::{EngineError, TransformError};
use crate::record::Record;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// The user-supplied transformation applied to every selected record.
///
/// `Ok(Some(value))` is a success, recorded verbatim in the success file.
/// `Ok(None)` voids the record (neither success nor failure). `Err` signals
/// a retryable failure; after the configured retries are exhausted it
/// becomes a failure record.
///
/// Implementations must tolerate being invoked concurrently up to
/// `max_concurrency` times.
#[async_trait]
pub trait Transform: Send + Sync {
    async fn call(&self, record: Record, ctx: Arc<Context>) -> Result<Option<Value>, TransformError>;
}

/// Optional startup/shutdown hooks around a run.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Runs once before dispatch begins. Its return value seeds
    /// `Context::extra`. An error here aborts the run before any task is
    /// dispatched.
    async fn on_startup(&self) -> Result<Map<String, Value>, EngineError> {
        Ok(Map::new())
    }

    /// Runs once after dispatch completes (or is cancelled), with whatever
    /// context exists at that point. Errors are logged and swallowed.
    async fn on_shutdown(&self, _ctx: Arc<Context>) {}
}

/// Reference `Transform`: POSTs the record as JSON to a configured endpoint
/// and maps the response to the engine's success/void/retry outcomes.
///
/// Per the engine's contract, it supplies its own per-request timeout —
/// the engine itself imposes none.
pub struct HttpTransform {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransform {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Transform for HttpTransform {
    async fn call(&self, record: Record, _ctx: Arc<Context>) -> Result<Option<Value>, TransformError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&record)
            .send()
            .await?;

        let status = resp.status();

        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransformError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value = resp.json::<Value>().await?;
        Ok(Some(value))
    }
}
