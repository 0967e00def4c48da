//! batch-engine
//!
//! An execution engine for concurrent, rate-limited, resumable batch
//! processing of line-delimited JSON. The transformation applied to each
//! record is supplied by the caller (the `Transform` trait); this crate
//! owns concurrency, rate limiting, retry with backoff and jitter, resume
//! state, and batched durable writes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use batch_engine::{Config, Orchestrator, HttpTransform};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_from_path("config.json")?;
//!     let transform = Arc::new(HttpTransform::new("https://api.example.com/run", Duration::from_secs(30))?);
//!     let orchestrator = Orchestrator::new(config, transform, None);
//!     let report = orchestrator.run().await?;
//!     report.log_summary();
//!     Ok(())
//! }
//! ```

mod config;
mod context;
mod dispatcher;
mod error;
mod logging;
mod orchestrator;
mod rate_limiter;
mod record;
mod report;
mod resume;
mod retry;
mod selector;
mod transform;
mod writer;

pub use config::{Config, LogLevel};
pub use context::Context;
pub use dispatcher::{DispatchCounts, Dispatcher};
pub use error::{ConfigError, EngineError, TransformError};
pub use orchestrator::Orchestrator;
pub use rate_limiter::RateLimiter;
pub use record::{extract_id, FailureRecord, Record, MISSING_ID_SENTINEL};
pub use report::Report;
pub use resume::load_processed_ids;
pub use retry::RetryPolicy;
pub use selector::{select_tasks, SelectedTask};
pub use transform::{HttpTransform, Lifecycle, Transform};
pub use writer::BatchWriter;
pub use logging::init as init_logging;
