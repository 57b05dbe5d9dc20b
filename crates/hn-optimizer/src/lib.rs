//! # hn-optimizer
//!
//! Everything the external tuner needs before the first evaluation.
//!
//! Derives the hierarchical parameter space from a component catalog, sizes
//! the experiment budget and tuner parallelism, and materializes the scenario
//! files (parameters, scenario, forbidden combinations, target runner).

mod budget;
mod scenario;
mod space;

pub use budget::{parallelism, parallelism_with, ExperimentBudget, FIXED_EXPERIMENTS};
pub use scenario::{
    substitute, MaterializedScenario, ScenarioFile, ScenarioMaterializer, ScenarioValues,
    CALLBACK_URL, INSTANCES_PATH, INTEGRATION_KEY, MAX_EXPERIMENTS, MIDDLEWARE_RUNNER, PARALLEL,
    SEED, TARGET_RUNNER,
};
pub use space::{
    to_param_file_lines, ChoiceOption, ComponentCatalog, ComponentSpec, ParamSpec, ParameterNode,
    ParameterSpace, RangeDomain,
};
