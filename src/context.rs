//! The shared context passed to every `Transform` invocation and to the
//! shutdown hook.
//!
//! Concrete rather than duck-typed: a typed `session` field for the shared
//! network handle, plus an open extension map for whatever a startup hook
//! wants to stash. Built once in the orchestrator before dispatch begins and
//! read-only for the remainder of the run.

use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct Context {
    /// Shared HTTP client, constructed once per run and reused by every task.
    pub session: reqwest::Client,
    /// Open extension map populated by `Lifecycle::on_startup`.
    pub extra: Map<String, Value>,
}

impl Context {
    pub fn new(session: reqwest::Client, extra: Map<String, Value>) -> Self {
        Self { session, extra }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
