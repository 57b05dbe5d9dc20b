//! # hn-engine
//!
//! Execution context for a single algorithm run: a cooperative time budget,
//! the objective value trace used for area-under-curve scoring, and the
//! seeded random stream. Each concurrent evaluation owns its own context.

pub mod context;
pub mod curve;
pub mod execution;
pub mod problem;
pub mod random;
pub mod time;

pub use context::ExecutionContext;
pub use curve::{MetricKind, ObjectiveCurve, ObjectiveSample};
pub use execution::{execute, Execution, ExecutionSettings};
pub use problem::{
    AcceptAllValidator, Algorithm, AlgorithmGenerator, Instance, InstanceLoader, Solution,
    SolutionValidator, ValidationResult,
};
pub use random::{ContextRng, RandomProvider};
pub use time::TimeBudget;
