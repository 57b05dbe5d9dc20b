//! Autoconfiguration run: scenario materialization, tuner supervision and
//! candidate evaluation.

use std::any::type_name;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use hn_engine::{
    execute, AcceptAllValidator, AlgorithmGenerator, ExecutionContext, ExecutionSettings,
    Instance, InstanceLoader, MetricKind, Solution, SolutionValidator,
};
use hn_optimizer::{
    parallelism, ComponentCatalog, ExperimentBudget, ParameterSpace, ScenarioMaterializer,
    ScenarioValues,
};
use hn_types::{
    config_error, internal_error, AutoconfigConfig, HnError, HnResult, RuntimeConfiguration,
    TunerError,
};

use crate::decoder::{decode_request, ExecuteRequest};
use crate::history::HistoricLog;
use crate::instances::InstanceCache;
use crate::secret::IntegrationSecret;
use crate::server;
use crate::tuner::TunerProcess;

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Lifecycle of an orchestrator. A run moves strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    MaterializingScenario,
    TunerRunning,
    Finished,
    Failed,
}

/// Result of evaluating one candidate, as reported back to the tuner.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Scored { score: f64, elapsed: Duration },
    /// The generator could not build the candidate.
    Rejected { reason: String },
}

impl EvaluationOutcome {
    /// `"<score> <elapsedSeconds>"`, or `"Inf 0"` for a rejected candidate.
    pub fn to_wire(&self) -> String {
        match self {
            Self::Scored { score, elapsed } => {
                format!("{} {}", format_score(*score), elapsed.as_secs_f64())
            }
            Self::Rejected { .. } => "Inf 0".to_string(),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

fn format_score(score: f64) -> String {
    if score.is_nan() || score == f64::INFINITY {
        "Inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{score:?}")
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub state: RunState,
    pub evaluations: usize,
    pub rejected: u64,
    pub elapsed: Duration,
    pub max_experiments: u64,
    pub parallelism: usize,
    pub working_dir: PathBuf,
}

/// Collects the plug-in collaborators of an [`Orchestrator`].
pub struct OrchestratorBuilder<I: Instance, S: Solution> {
    config: AutoconfigConfig,
    experiment: String,
    generator: Option<(Arc<dyn AlgorithmGenerator<I, S>>, &'static str)>,
    loader: Option<(Arc<dyn InstanceLoader<I>>, &'static str)>,
    validator: Option<(Arc<dyn SolutionValidator<I, S>>, &'static str)>,
    catalog: Option<ComponentCatalog>,
    secret: Option<IntegrationSecret>,
}

impl<I: Instance, S: Solution> OrchestratorBuilder<I, S> {
    pub fn new(config: AutoconfigConfig) -> Self {
        Self {
            config,
            experiment: "default".to_string(),
            generator: None,
            loader: None,
            validator: None,
            catalog: None,
            secret: None,
        }
    }

    pub fn generator<G: AlgorithmGenerator<I, S> + 'static>(mut self, generator: G) -> Self {
        self.generator = Some((Arc::new(generator), type_name::<G>()));
        self
    }

    pub fn instance_loader<L: InstanceLoader<I> + 'static>(mut self, loader: L) -> Self {
        self.loader = Some((Arc::new(loader), type_name::<L>()));
        self
    }

    pub fn validator<V: SolutionValidator<I, S> + 'static>(mut self, validator: V) -> Self {
        self.validator = Some((Arc::new(validator), type_name::<V>()));
        self
    }

    /// Components the parameter space is derived from in autoconfig mode.
    pub fn catalog(mut self, catalog: ComponentCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Experiment whose instance directory is handed to the tuner.
    pub fn experiment(mut self, name: impl Into<String>) -> Self {
        self.experiment = name.into();
        self
    }

    /// Use a known secret instead of a generated one.
    pub fn secret(mut self, secret: IntegrationSecret) -> Self {
        self.secret = Some(secret);
        self
    }

    pub fn build(self) -> HnResult<Arc<Orchestrator<I, S>>> {
        self.config.validate()?;

        let (generator, generator_name) = self
            .generator
            .ok_or_else(|| config_error!("no algorithm generator registered"))?;
        let (loader, loader_name) = self
            .loader
            .ok_or_else(|| config_error!("no instance loader registered"))?;
        let (validator, validator_name) = match self.validator {
            Some(validator) => validator,
            None => {
                warn!("No solution validator registered, solutions will not be checked");
                let validator: Arc<dyn SolutionValidator<I, S>> = Arc::new(AcceptAllValidator);
                (validator, type_name::<AcceptAllValidator>())
            }
        };
        if self.config.autoconfig && self.catalog.is_none() {
            return Err(config_error!(
                "autoconfig mode needs a component catalog to derive parameters from"
            ));
        }
        if self.config.instances_path(&self.experiment).is_none() {
            return Err(config_error!(
                "no instance directory for experiment {} and no default",
                self.experiment
            ));
        }

        info!(
            "Collaborators: generator={}, loader={}, validator={}",
            generator_name, loader_name, validator_name
        );

        Ok(Arc::new(Orchestrator {
            run_id: Uuid::new_v4(),
            config: self.config,
            experiment: self.experiment,
            secret: self.secret.unwrap_or_else(IntegrationSecret::generate),
            generator,
            validator,
            instances: InstanceCache::new(loader),
            history: HistoricLog::new(),
            catalog: self.catalog,
            state: RwLock::new(RunState::Idle),
            rejected: AtomicU64::new(0),
            fatal: Mutex::new(None),
            abort: Notify::new(),
        }))
    }
}

/// Drives one autoconfiguration run and evaluates the tuner's candidates.
pub struct Orchestrator<I: Instance, S: Solution> {
    run_id: Uuid,
    config: AutoconfigConfig,
    experiment: String,
    secret: IntegrationSecret,
    generator: Arc<dyn AlgorithmGenerator<I, S>>,
    validator: Arc<dyn SolutionValidator<I, S>>,
    instances: InstanceCache<I>,
    history: HistoricLog,
    catalog: Option<ComponentCatalog>,
    state: RwLock<RunState>,
    rejected: AtomicU64,
    /// First fatal evaluation error, aborts the tuner.
    fatal: Mutex<Option<String>>,
    abort: Notify,
}

impl<I: Instance, S: Solution> fmt::Debug for Orchestrator<I, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("run_id", &self.run_id)
            .field("state", &self.state())
            .field("experiment", &self.experiment)
            .field("evaluations", &self.history.len())
            .finish_non_exhaustive()
    }
}

/// Everything decided while materializing the scenario.
struct RunPlan {
    budget: ExperimentBudget,
    parallelism: usize,
}

impl<I: Instance, S: Solution> Orchestrator<I, S> {
    pub fn builder(config: AutoconfigConfig) -> OrchestratorBuilder<I, S> {
        OrchestratorBuilder::new(config)
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &AutoconfigConfig {
        &self.config
    }

    pub fn secret(&self) -> &IntegrationSecret {
        &self.secret
    }

    pub fn history(&self) -> &HistoricLog {
        &self.history
    }

    pub fn instance_cache(&self) -> &InstanceCache<I> {
        &self.instances
    }

    pub fn state(&self) -> RunState {
        *self.state.read()
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    fn transition(&self, next: RunState) {
        let mut state = self.state.write();
        debug!("Run {}: {:?} -> {:?}", self.run_id, *state, next);
        *state = next;
    }

    /// Run the tuner to completion, serving its callbacks meanwhile.
    pub async fn run(self: &Arc<Self>) -> HnResult<RunReport> {
        {
            let mut state = self.state.write();
            if *state != RunState::Idle {
                return Err(config_error!("run {} already started ({:?})", self.run_id, *state));
            }
            debug!("Run {}: {:?} -> {:?}", self.run_id, *state, RunState::MaterializingScenario);
            *state = RunState::MaterializingScenario;
        }
        let started = Instant::now();
        info!("Starting autoconfiguration run {}", self.run_id);

        match self.run_to_completion().await {
            Ok(plan) => {
                self.transition(RunState::Finished);
                let report = self.report(&plan, started.elapsed());
                info!(
                    "Run {} finished in {:.1}s: {} evaluations, {} rejected",
                    self.run_id,
                    report.elapsed.as_secs_f64(),
                    report.evaluations,
                    report.rejected
                );
                Ok(report)
            }
            Err(e) => {
                self.transition(RunState::Failed);
                error!("Run {} failed after {:.1}s: {}", self.run_id, started.elapsed().as_secs_f64(), e);
                Err(e)
            }
        }
    }

    async fn run_to_completion(self: &Arc<Self>) -> HnResult<RunPlan> {
        let listener = TcpListener::bind(&self.config.callback_addr).await?;
        let callback_url = format!("http://{}", listener.local_addr()?);
        let plan = self.materialize(&callback_url)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = server::router(Arc::clone(self));
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });
        info!("Callback server listening on {}", callback_url);

        self.transition(RunState::TunerRunning);
        let outcome = self.supervise_tuner().await;

        let _ = shutdown_tx.send(());
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Callback server stopped with error: {}", e),
            Err(e) => warn!("Callback server task failed: {}", e),
        }
        outcome.map(|()| plan)
    }

    fn materialize(&self, callback_url: &str) -> HnResult<RunPlan> {
        let space = match (&self.catalog, self.config.autoconfig) {
            (Some(catalog), true) => Some(ParameterSpace::derive(
                catalog,
                self.config.tree_depth,
                self.config.max_derivation_repetition,
            )?),
            _ => None,
        };
        let parameter_count = space.as_ref().map_or(0, ParameterSpace::parameter_count);
        let budget = ExperimentBudget::for_run(&self.config, parameter_count)?;
        let parallelism = parallelism(&self.config);
        let instances_path = self
            .config
            .instances_path(&self.experiment)
            .ok_or_else(|| config_error!("no instance directory for {}", self.experiment))?;

        info!(
            "Scenario: {} parameters, {} experiments, parallelism {}",
            parameter_count,
            budget.experiments(),
            parallelism
        );

        let values = ScenarioValues {
            integration_key: self.secret.expose().to_string(),
            instances_path: instances_path.to_string(),
            parallel: parallelism,
            max_experiments: budget.experiments(),
            seed: self.config.seed,
            callback_url: callback_url.to_string(),
        };
        ScenarioMaterializer::new(self.config.templates.clone(), &self.config.working_dir)
            .materialize_all(&values, space.as_ref())?;

        Ok(RunPlan {
            budget,
            parallelism,
        })
    }

    async fn supervise_tuner(&self) -> HnResult<()> {
        let mut tuner = TunerProcess::new(self.config.tuner.clone(), &self.config.working_dir).spawn()?;
        tokio::select! {
            status = tuner.wait() => {
                status?;
                Ok(())
            }
            _ = self.abort.notified() => {
                tuner.kill().await;
                let message = self
                    .fatal
                    .lock()
                    .clone()
                    .unwrap_or_else(|| "aborted".to_string());
                Err(TunerError::Aborted { message }.into())
            }
        }
    }

    fn report(&self, plan: &RunPlan, elapsed: Duration) -> RunReport {
        RunReport {
            run_id: self.run_id,
            state: self.state(),
            evaluations: self.history.len(),
            rejected: self.rejected_count(),
            elapsed,
            max_experiments: plan.budget.experiments(),
            parallelism: plan.parallelism,
            working_dir: self.config.working_dir.clone(),
        }
    }

    /// Serve one tuner callback: authenticate, decode and evaluate on the
    /// blocking pool. Fatal evaluation errors abort the run.
    pub async fn handle(self: Arc<Self>, request: ExecuteRequest) -> HnResult<EvaluationOutcome> {
        let runtime = decode_request(&request, &self.secret).inspect_err(|e| {
            warn!("Rejected callback: {}", e);
        })?;

        let orchestrator = Arc::clone(&self);
        let result = tokio::task::spawn_blocking(move || orchestrator.evaluate(runtime))
            .await
            .map_err(|e| internal_error!("evaluation task failed: {}", e))
            .and_then(|result| result);

        if let Err(e) = &result {
            if e.is_fatal() {
                self.abort_run(e);
            }
        }
        result
    }

    fn abort_run(&self, error: &HnError) {
        error!("Fatal evaluation error, aborting run: {}", error);
        let mut fatal = self.fatal.lock();
        if fatal.is_none() {
            *fatal = Some(error.to_string());
        }
        self.abort.notify_one();
    }

    /// Evaluate a decoded candidate. Blocks for the whole algorithm run.
    pub fn evaluate(&self, runtime: RuntimeConfiguration) -> HnResult<EvaluationOutcome> {
        let runtime = self.history.append(runtime);
        let instance = self.instances.get(&runtime.instance_path)?;

        let algorithm = match self.generator.build(&runtime.algorithm) {
            Ok(algorithm) => algorithm,
            Err(illegal) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                debug!("Candidate {} rejected: {}", runtime.candidate_id, illegal);
                return Ok(EvaluationOutcome::Rejected {
                    reason: illegal.reason,
                });
            }
        };

        let mut ctx = ExecutionContext::new(
            self.config.direction,
            self.config.random_type,
            runtime.seed,
        );
        let settings = ExecutionSettings {
            seed: runtime.seed,
            random_kind: self.config.random_type,
            time_budget: Some(Duration::from_millis(self.config.execution_budget_millis())),
            record_curve: self.config.autoconfig,
            extra_grace: Duration::from_secs(self.config.extra_grace_seconds),
        };
        let execution = execute(algorithm.as_ref(), instance.as_ref(), &mut ctx, &settings);

        self.validator
            .validate(&instance, &execution.solution)
            .into_result(instance.id())?;

        let score = self.score(&ctx, &execution.solution);
        debug!(
            "Candidate {} on {} (seed {}): score {} in {:.3}s",
            runtime.candidate_id,
            instance.id(),
            runtime.seed,
            score,
            execution.elapsed.as_secs_f64()
        );
        Ok(EvaluationOutcome::Scored {
            score,
            elapsed: execution.elapsed,
        })
    }

    /// Area under the best-objective curve in autoconfig mode, the final
    /// objective otherwise. Always in minimization convention.
    fn score(&self, ctx: &ExecutionContext, solution: &S) -> f64 {
        let direction = self.config.direction;
        if !self.config.autoconfig {
            return direction.to_minimization(solution.objective());
        }
        let from = self.config.ignore_initial_millis * NANOS_PER_MILLI;
        let to = from + self.config.interval_duration_millis * NANOS_PER_MILLI;
        match ctx.curve().area_under_curve(MetricKind::BestObjective, from, to) {
            Some(area) => direction.to_minimization(area),
            // Nothing reported: worst possible score in either direction.
            None => f64::INFINITY,
        }
    }
}
