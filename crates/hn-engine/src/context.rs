//! State owned by a single algorithm execution.

use rand::Rng;

use hn_types::{ObjectiveDirection, RandomKind};

use crate::curve::ObjectiveCurve;
use crate::random::{ContextRng, RandomProvider};
use crate::time::TimeBudget;

/// Time budget, objective trace and random stream of one evaluation.
///
/// Every concurrent evaluation owns its own context; nothing in here is
/// shared between threads.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    time: TimeBudget,
    curve: ObjectiveCurve,
    random: RandomProvider,
}

impl ExecutionContext {
    pub fn new(direction: ObjectiveDirection, random_kind: RandomKind, seed: u64) -> Self {
        Self {
            time: TimeBudget::new(),
            curve: ObjectiveCurve::new(direction),
            random: RandomProvider::new(random_kind, seed),
        }
    }

    /// The only random source algorithm code should use.
    pub fn rng(&mut self) -> &mut ContextRng {
        self.random.rng()
    }

    /// Uniform index in `0..len`. Panics on `len == 0`, like `random_range`.
    pub fn random_index(&mut self, len: usize) -> usize {
        self.random.rng().random_range(0..len)
    }

    /// Algorithms should stop as soon as this returns `true`.
    pub fn time_is_up(&self) -> bool {
        self.time.time_is_up()
    }

    /// Report the objective value of the current solution.
    pub fn report_objective(&mut self, value: f64) {
        self.curve.record(value);
    }

    pub fn time(&self) -> &TimeBudget {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut TimeBudget {
        &mut self.time
    }

    pub fn curve(&self) -> &ObjectiveCurve {
        &self.curve
    }

    pub fn curve_mut(&mut self) -> &mut ObjectiveCurve {
        &mut self.curve
    }

    pub fn random(&self) -> &RandomProvider {
        &self.random
    }

    pub fn random_mut(&mut self) -> &mut RandomProvider {
        &mut self.random
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::MetricKind;

    #[test]
    fn reports_are_ignored_until_curve_enabled() {
        let mut ctx = ExecutionContext::new(ObjectiveDirection::Minimize, RandomKind::ChaCha8, 3);
        ctx.report_objective(5.0);
        assert!(ctx.curve().samples(MetricKind::BestObjective).is_empty());

        ctx.curve_mut().enable();
        ctx.report_objective(5.0);
        assert_eq!(ctx.curve().best_value(), Some(5.0));
    }

    #[test]
    fn contexts_with_same_seed_agree() {
        let mut a = ExecutionContext::new(ObjectiveDirection::Minimize, RandomKind::ChaCha12, 11);
        let mut b = ExecutionContext::new(ObjectiveDirection::Minimize, RandomKind::ChaCha12, 11);
        let xs: Vec<usize> = (0..10).map(|_| a.random_index(100)).collect();
        let ys: Vec<usize> = (0..10).map(|_| b.random_index(100)).collect();
        assert_eq!(xs, ys);
    }
}
