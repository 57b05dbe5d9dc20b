//! Plug-in points between the framework and problem specific code.

use std::fmt;

use hn_types::{AlgorithmConfiguration, HnResult, IllegalAlgorithmConfig, ValidationFailure};

use crate::context::ExecutionContext;

/// A benchmark instance.
pub trait Instance: Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// A solution produced by an algorithm.
pub trait Solution: Send + 'static {
    fn objective(&self) -> f64;
}

/// An executable algorithm for instances `I` producing solutions `S`.
///
/// Implementations must draw randomness from `ctx.rng()`, poll
/// `ctx.time_is_up()` and report improvements with `ctx.report_objective`.
pub trait Algorithm<I: Instance, S: Solution>: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn run(&self, instance: &I, ctx: &mut ExecutionContext) -> S;
}

/// Loads an instance from its path.
pub trait InstanceLoader<I: Instance>: Send + Sync {
    fn load(&self, path: &str) -> HnResult<I>;
}

/// Turns a candidate configuration into an algorithm.
pub trait AlgorithmGenerator<I: Instance, S: Solution>: Send + Sync {
    fn build(
        &self,
        config: &AlgorithmConfiguration,
    ) -> Result<Box<dyn Algorithm<I, S>>, IllegalAlgorithmConfig>;
}

/// Checks solution correctness.
pub trait SolutionValidator<I: Instance, S: Solution>: Send + Sync {
    fn validate(&self, instance: &I, solution: &S) -> ValidationResult;
}

/// Outcome of a [`SolutionValidator`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    reasons: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            reasons: vec![reason.into()],
        }
    }

    /// Add a failure reason when `condition` does not hold.
    pub fn check(mut self, condition: bool, reason: impl Into<String>) -> Self {
        if !condition {
            self.reasons.push(reason.into());
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn into_result(self, instance: &str) -> Result<(), ValidationFailure> {
        if self.reasons.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure {
                instance: instance.to_string(),
                reasons: self.reasons,
            })
        }
    }
}

/// Fallback used when no validator is registered. Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllValidator;

impl<I: Instance, S: Solution> SolutionValidator<I, S> for AcceptAllValidator {
    fn validate(&self, _instance: &I, _solution: &S) -> ValidationResult {
        ValidationResult::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_result_collects_reasons() {
        let result = ValidationResult::ok()
            .check(true, "never reported")
            .check(false, "weights exceed capacity");
        assert!(!result.is_valid());
        assert_eq!(result.reasons(), ["weights exceed capacity".to_string()]);

        let failure = result.into_result("inst-1").unwrap_err();
        assert_eq!(failure.instance, "inst-1");
    }

    #[test]
    fn ok_result_converts_to_ok() {
        assert!(ValidationResult::ok().into_result("x").is_ok());
        assert!(ValidationResult::fail("bad").into_result("x").is_err());
    }
}
