//! Autoconfiguration settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config_error;
use crate::errors::HnResult;

/// Whether the problem objective is maximized or minimized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectiveDirection {
    Maximize,
    #[default]
    Minimize,
}

impl ObjectiveDirection {
    pub fn is_maximizing(self) -> bool {
        matches!(self, Self::Maximize)
    }

    /// True when `candidate` strictly improves on `incumbent`.
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Maximize => candidate > incumbent,
            Self::Minimize => candidate < incumbent,
        }
    }

    /// Worst possible objective value.
    pub fn worst(self) -> f64 {
        match self {
            Self::Maximize => f64::NEG_INFINITY,
            Self::Minimize => f64::INFINITY,
        }
    }

    /// Translate a score to the minimization convention used by the tuner.
    pub fn to_minimization(self, score: f64) -> f64 {
        match self {
            Self::Maximize => -score,
            Self::Minimize => score,
        }
    }
}

/// Pseudo random generator family used for algorithm executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RandomKind {
    #[default]
    ChaCha8,
    ChaCha12,
    ChaCha20,
}

/// Where scenario templates are read from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path")]
pub enum TemplateSource {
    /// Templates bundled with the binary. Does not provide a parameter file.
    #[default]
    Embedded,
    /// A user directory holding `scenario.txt`, `forbidden.txt`,
    /// `middleware.sh` and optionally `parameters.txt`.
    Directory(PathBuf),
}

/// External tuner invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for TunerCommand {
    fn default() -> Self {
        Self {
            program: "irace".to_string(),
            args: vec!["--scenario".to_string(), "scenario.txt".to_string()],
        }
    }
}

/// Top-level configuration for an autoconfiguration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoconfigConfig {
    /// Global seed handed to the tuner.
    pub seed: u64,

    pub random_type: RandomKind,

    /// Allow the tuner to evaluate several candidates at once.
    pub parallel_executor: bool,

    /// Number of parallel workers, values below 1 mean "half of the cores".
    pub n_workers: i32,

    /// Derive the parameter space and experiment budget from the component
    /// catalog instead of using a user supplied parameter file.
    pub autoconfig: bool,

    /// Maximum nesting of component choices in the derived parameter tree.
    pub tree_depth: usize,

    /// How many times the same component kind may repeat along a derivation.
    pub max_derivation_repetition: usize,

    pub ignore_initial_millis: u64,

    pub interval_duration_millis: u64,

    pub experiments_per_parameter: u64,

    pub minimum_number_of_experiments: u64,

    /// Overrun tolerated after the time budget before logging a warning.
    pub extra_grace_seconds: u64,

    /// Instance directories per experiment, `"default"` is the fallback.
    pub instances: BTreeMap<String, String>,

    /// Directory receiving the materialized scenario files.
    pub working_dir: PathBuf,

    pub templates: TemplateSource,

    /// Address the callback endpoint binds to.
    pub callback_addr: String,

    pub tuner: TunerCommand,

    pub direction: ObjectiveDirection,
}

impl Default for AutoconfigConfig {
    fn default() -> Self {
        let mut instances = BTreeMap::new();
        instances.insert("default".to_string(), "instances".to_string());
        Self {
            seed: 1234,
            random_type: RandomKind::default(),
            parallel_executor: false,
            n_workers: -1,
            autoconfig: false,
            tree_depth: 4,
            max_derivation_repetition: 2,
            ignore_initial_millis: 10_000,
            interval_duration_millis: 50_000,
            experiments_per_parameter: 200,
            minimum_number_of_experiments: 10_000,
            extra_grace_seconds: 10,
            instances,
            working_dir: PathBuf::from("."),
            templates: TemplateSource::default(),
            callback_addr: "127.0.0.1:0".to_string(),
            tuner: TunerCommand::default(),
            direction: ObjectiveDirection::default(),
        }
    }
}

impl AutoconfigConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> HnResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `HONE_*` environment overrides.
    pub fn with_env_overrides(mut self) -> HnResult<Self> {
        if let Ok(addr) = std::env::var("HONE_CALLBACK_ADDR") {
            self.callback_addr = addr;
        }
        if let Ok(seed) = std::env::var("HONE_SEED") {
            self.seed = seed
                .parse()
                .map_err(|_| config_error!("HONE_SEED is not a valid seed: {seed}"))?;
        }
        if let Ok(workers) = std::env::var("HONE_WORKERS") {
            self.n_workers = workers
                .parse()
                .map_err(|_| config_error!("HONE_WORKERS is not a valid number: {workers}"))?;
            self.parallel_executor = true;
        }
        Ok(self)
    }

    pub fn validate(&self) -> HnResult<()> {
        if self.autoconfig && self.tree_depth == 0 {
            return Err(config_error!("tree_depth must be at least 1"));
        }
        if self.autoconfig && self.interval_duration_millis == 0 {
            return Err(config_error!("interval_duration_millis must be positive"));
        }
        if self.tuner.program.trim().is_empty() {
            return Err(config_error!("tuner program must not be empty"));
        }
        Ok(())
    }

    /// Instance directory for an experiment, falling back to `"default"`.
    pub fn instances_path(&self, experiment: &str) -> Option<&str> {
        self.instances
            .get(experiment)
            .or_else(|| self.instances.get("default"))
            .map(String::as_str)
    }

    /// Wall clock budget of one candidate evaluation in milliseconds.
    pub fn execution_budget_millis(&self) -> u64 {
        self.ignore_initial_millis + self.interval_duration_millis
    }

    pub fn with_autoconfig(mut self, enabled: bool) -> Self {
        self.autoconfig = enabled;
        self
    }

    pub fn with_parallelism(mut self, parallel: bool, workers: i32) -> Self {
        self.parallel_executor = parallel;
        self.n_workers = workers;
        self
    }

    pub fn with_time_window(mut self, ignore_initial_millis: u64, interval_millis: u64) -> Self {
        self.ignore_initial_millis = ignore_initial_millis;
        self.interval_duration_millis = interval_millis;
        self
    }

    pub fn with_direction(mut self, direction: ObjectiveDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_instances(mut self, experiment: &str, path: impl Into<String>) -> Self {
        self.instances.insert(experiment.to_string(), path.into());
        self
    }

    pub fn with_tuner(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.tuner = TunerCommand {
            program: program.into(),
            args,
        };
        self
    }

    pub fn with_templates(mut self, source: TemplateSource) -> Self {
        self.templates = source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HnError;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = AutoconfigConfig::default();
        assert_eq!(config.seed, 1234);
        assert_eq!(config.tree_depth, 4);
        assert_eq!(config.experiments_per_parameter, 200);
        assert_eq!(config.minimum_number_of_experiments, 10_000);
        assert_eq!(config.execution_budget_millis(), 60_000);
        assert_eq!(config.instances_path("autoconfig"), Some("instances"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"autoconfig": true, "n_workers": 4, "instances": {{"autoconfig": "data/train"}},
               "templates": {{"kind": "Directory", "path": "irace"}}, "direction": "Maximize"}}"#
        )
        .unwrap();

        let config = AutoconfigConfig::from_file(file.path()).unwrap();
        assert!(config.autoconfig);
        assert_eq!(config.n_workers, 4);
        assert_eq!(config.seed, 1234);
        assert_eq!(config.instances_path("autoconfig"), Some("data/train"));
        assert_eq!(config.instances_path("other"), None);
        assert_eq!(config.templates, TemplateSource::Directory(PathBuf::from("irace")));
        assert!(config.direction.is_maximizing());
    }

    #[test]
    fn rejects_zero_depth_in_autoconfig_mode() {
        let mut config = AutoconfigConfig::default().with_autoconfig(true);
        config.tree_depth = 0;
        assert!(matches!(config.validate(), Err(HnError::Config(_))));
    }

    #[test]
    fn empty_tuner_program_is_a_config_error() {
        let config = AutoconfigConfig::default().with_tuner("  ", Vec::new());
        match config.validate() {
            Err(HnError::Config(message)) => assert!(message.contains("tuner program")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn objective_direction_helpers() {
        assert_eq!(ObjectiveDirection::Maximize.to_minimization(50.0), -50.0);
        assert_eq!(ObjectiveDirection::Minimize.to_minimization(50.0), 50.0);
        assert!(ObjectiveDirection::Minimize.improves(1.0, 2.0));
        assert!(ObjectiveDirection::Maximize.improves(2.0, 1.0));
        assert!(!ObjectiveDirection::Maximize.improves(1.0, 1.0));
        assert_eq!(ObjectiveDirection::Minimize.worst(), f64::INFINITY);
        assert_eq!(
            ObjectiveDirection::Maximize.to_minimization(ObjectiveDirection::Maximize.worst()),
            f64::INFINITY
        );
    }
}
