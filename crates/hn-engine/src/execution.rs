//! Timed single execution of an algorithm.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use hn_types::RandomKind;

use crate::context::ExecutionContext;
use crate::problem::{Algorithm, Instance, Solution};

/// How to prepare the context before running.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSettings {
    pub seed: u64,
    pub random_kind: RandomKind,
    /// Cooperative time limit, `None` runs unbounded.
    pub time_budget: Option<Duration>,
    /// Enable and reset the objective curve before running.
    pub record_curve: bool,
    /// Tolerated overrun before a warning is logged.
    pub extra_grace: Duration,
}

/// Result of [`execute`].
#[derive(Debug)]
pub struct Execution<S> {
    pub solution: S,
    pub elapsed: Duration,
    pub overrun: bool,
}

/// Reseed, arm the time budget, run the algorithm to completion and disarm.
///
/// The objective curve stays in `ctx` so the caller can score it.
pub fn execute<I, S>(
    algorithm: &dyn Algorithm<I, S>,
    instance: &I,
    ctx: &mut ExecutionContext,
    settings: &ExecutionSettings,
) -> Execution<S>
where
    I: Instance,
    S: Solution,
{
    ctx.random_mut().reseed(settings.random_kind, settings.seed);
    if settings.record_curve {
        ctx.curve_mut().enable();
        ctx.curve_mut().reset();
    } else {
        ctx.curve_mut().disable();
    }
    if let Some(budget) = settings.time_budget {
        ctx.time_mut().start(budget);
    }

    let start = Instant::now();
    let solution = algorithm.run(instance, ctx);
    let elapsed = start.elapsed();

    let overrun = ctx.time().overrun_exceeds(settings.extra_grace);
    if overrun {
        warn!(
            "Algorithm takes too long to stop after time is up in instance {}. Algorithm: {:?}",
            instance.id(),
            algorithm
        );
    }
    ctx.time_mut().remove();

    debug!(
        "{} finished on {} in {:.3}s with objective {}",
        algorithm.name(),
        instance.id(),
        elapsed.as_secs_f64(),
        solution.objective()
    );

    Execution {
        solution,
        elapsed,
        overrun,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::MetricKind;
    use hn_types::ObjectiveDirection;
    use rand::Rng;

    struct Dummy;

    impl Instance for Dummy {
        fn id(&self) -> &str {
            "dummy"
        }
    }

    struct Value(f64);

    impl Solution for Value {
        fn objective(&self) -> f64 {
            self.0
        }
    }

    /// Draws three random values and reports a decreasing objective.
    #[derive(Debug)]
    struct Countdown;

    impl Algorithm<Dummy, Value> for Countdown {
        fn name(&self) -> &str {
            "countdown"
        }

        fn run(&self, _instance: &Dummy, ctx: &mut ExecutionContext) -> Value {
            let mut total = 0.0;
            for step in (1..=3).rev() {
                total += ctx.rng().random_range(0.0..1.0);
                ctx.report_objective(step as f64);
            }
            Value(total)
        }
    }

    /// Ignores the time budget entirely.
    #[derive(Debug)]
    struct Sleeper;

    impl Algorithm<Dummy, Value> for Sleeper {
        fn name(&self) -> &str {
            "sleeper"
        }

        fn run(&self, _instance: &Dummy, _ctx: &mut ExecutionContext) -> Value {
            std::thread::sleep(Duration::from_millis(30));
            Value(0.0)
        }
    }

    fn settings(seed: u64) -> ExecutionSettings {
        ExecutionSettings {
            seed,
            random_kind: RandomKind::ChaCha8,
            time_budget: Some(Duration::from_secs(5)),
            record_curve: true,
            extra_grace: Duration::from_secs(1),
        }
    }

    #[test]
    fn same_seed_reproduces_solution() {
        let mut ctx_a = ExecutionContext::new(ObjectiveDirection::Minimize, RandomKind::ChaCha8, 0);
        let mut ctx_b = ExecutionContext::new(ObjectiveDirection::Minimize, RandomKind::ChaCha8, 99);
        let a = execute::<Dummy, Value>(&Countdown, &Dummy, &mut ctx_a, &settings(42));
        let b = execute::<Dummy, Value>(&Countdown, &Dummy, &mut ctx_b, &settings(42));
        assert_eq!(a.solution.objective(), b.solution.objective());
        assert!(!a.overrun);
    }

    #[test]
    fn curve_is_recorded_and_budget_removed() {
        let mut ctx = ExecutionContext::new(ObjectiveDirection::Minimize, RandomKind::ChaCha8, 0);
        execute::<Dummy, Value>(&Countdown, &Dummy, &mut ctx, &settings(1));
        assert_eq!(ctx.curve().samples(MetricKind::BestObjective).len(), 3);
        assert_eq!(ctx.curve().best_value(), Some(1.0));
        assert!(!ctx.time().is_active());
    }

    #[test]
    fn curve_disabled_without_recording() {
        let mut ctx = ExecutionContext::new(ObjectiveDirection::Minimize, RandomKind::ChaCha8, 0);
        let mut s = settings(1);
        s.record_curve = false;
        s.time_budget = None;
        execute::<Dummy, Value>(&Countdown, &Dummy, &mut ctx, &s);
        assert!(ctx.curve().samples(MetricKind::CurrentObjective).is_empty());
    }

    #[test]
    fn overrun_is_detected_not_interrupted() {
        let mut ctx = ExecutionContext::new(ObjectiveDirection::Minimize, RandomKind::ChaCha8, 0);
        let s = ExecutionSettings {
            time_budget: Some(Duration::ZERO),
            extra_grace: Duration::from_millis(1),
            ..settings(1)
        };
        let execution = execute::<Dummy, Value>(&Sleeper, &Dummy, &mut ctx, &s);
        assert!(execution.overrun);
        assert!(execution.elapsed >= Duration::from_millis(30));
    }
}
