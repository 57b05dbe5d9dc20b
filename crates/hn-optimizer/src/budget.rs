//! Tuning budget and tuner parallelism.

use serde::{Deserialize, Serialize};

use hn_types::{AutoconfigConfig, HnError, HnResult};

/// Experiment budget used when the parameter file is supplied by hand.
pub const FIXED_EXPERIMENTS: u64 = 10_000;

/// How many candidate evaluations the tuner may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentBudget {
    /// Scaled with the size of a derived parameter space.
    Derived {
        parameter_count: usize,
        experiments: u64,
    },
    Fixed(u64),
}

impl ExperimentBudget {
    /// Budget for a run. In autoconfig mode it is
    /// `max(minimum, experiments_per_parameter * parameter_count)`.
    pub fn for_run(config: &AutoconfigConfig, parameter_count: usize) -> HnResult<Self> {
        if !config.autoconfig {
            return Ok(Self::Fixed(FIXED_EXPERIMENTS));
        }
        if parameter_count == 0 {
            return Err(HnError::EmptySearchSpace {
                max_depth: config.tree_depth,
            });
        }
        let scaled = config
            .experiments_per_parameter
            .saturating_mul(parameter_count as u64);
        Ok(Self::Derived {
            parameter_count,
            experiments: scaled.max(config.minimum_number_of_experiments),
        })
    }

    pub fn experiments(&self) -> u64 {
        match self {
            Self::Derived { experiments, .. } => *experiments,
            Self::Fixed(experiments) => *experiments,
        }
    }
}

/// Number of evaluations the tuner runs concurrently.
pub fn parallelism(config: &AutoconfigConfig) -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    parallelism_with(config, available)
}

/// [`parallelism`] against a given number of execution units.
pub fn parallelism_with(config: &AutoconfigConfig, available: usize) -> usize {
    if !config.parallel_executor {
        return 1;
    }
    if config.n_workers >= 1 {
        return config.n_workers as usize;
    }
    (available / 2).max(1)
}
