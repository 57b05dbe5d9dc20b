//! # hn-autoconfig
//!
//! Runs the external tuner against a materialized scenario and evaluates
//! the candidates it sends back.
//!
//! The tuner's target runner posts each candidate to the callback server
//! (`POST /execute`). Requests are authenticated with the run's integration
//! secret, decoded into a [`RuntimeConfiguration`](hn_types::RuntimeConfiguration),
//! appended to the historic log and executed on the blocking pool with a
//! fresh [`ExecutionContext`](hn_engine::ExecutionContext).

pub mod decoder;
pub mod history;
pub mod instances;
pub mod orchestrator;
pub mod secret;
pub mod server;
pub mod tuner;

pub use decoder::{authenticate, decode, decode_request, ExecuteRequest};
pub use history::HistoricLog;
pub use instances::{CacheStats, InstanceCache};
pub use orchestrator::{
    EvaluationOutcome, Orchestrator, OrchestratorBuilder, RunReport, RunState,
};
pub use secret::IntegrationSecret;
pub use server::router;
pub use tuner::{RunningTuner, TunerProcess};
