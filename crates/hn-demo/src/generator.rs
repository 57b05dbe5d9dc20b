//! Component catalog and algorithm generator for number partitioning.

use hn_engine::{Algorithm, AlgorithmGenerator};
use hn_optimizer::{ComponentCatalog, ComponentSpec};
use hn_types::{AlgorithmConfiguration, IllegalAlgorithmConfig};

use crate::algorithms::{Constructive, Improver, Multistart, Strategy};
use crate::model::{Partition, PartitionInstance};

pub const ROOT: &str = "algorithm";

/// Every component the tuner may combine.
pub fn catalog() -> ComponentCatalog {
    ComponentCatalog::new(ROOT, "Algorithm")
        .register(
            "Algorithm",
            ComponentSpec::new("multistart")
                .with_log_int("iterations", 1, 200)
                .with_component("constructive", "Constructive")
                .with_component("improver", "Improver"),
        )
        .register("Constructive", ComponentSpec::new("random"))
        .register("Constructive", ComponentSpec::new("greedy"))
        .register(
            "Constructive",
            ComponentSpec::new("grasp").with_real("alpha", 0.0, 1.0),
        )
        .register("Improver", ComponentSpec::new("none"))
        .register(
            "Improver",
            ComponentSpec::new("ls").with_choice("strategy", &["first", "best"]),
        )
        .register(
            "Improver",
            ComponentSpec::new("ils")
                .with_log_int("strength", 1, 16)
                .with_component("inner", "Improver"),
        )
}

/// Builds a [`Multistart`] from the dotted parameter names of [`catalog`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionGenerator;

impl AlgorithmGenerator<PartitionInstance, Partition> for PartitionGenerator {
    fn build(
        &self,
        config: &AlgorithmConfiguration,
    ) -> Result<Box<dyn Algorithm<PartitionInstance, Partition>>, IllegalAlgorithmConfig> {
        match required(config, ROOT)? {
            "multistart" => {
                let prefix = format!("{ROOT}.multistart");
                let iterations = int(config, &format!("{prefix}.iterations"))?;
                Ok(Box::new(Multistart {
                    iterations: usize::try_from(iterations).map_err(|_| {
                        IllegalAlgorithmConfig::new(format!("negative iterations {iterations}"))
                    })?,
                    constructive: constructive(config, &format!("{prefix}.constructive"))?,
                    improver: improver(config, &format!("{prefix}.improver"))?,
                }))
            }
            other => Err(unknown(ROOT, other)),
        }
    }
}

fn constructive(
    config: &AlgorithmConfiguration,
    key: &str,
) -> Result<Constructive, IllegalAlgorithmConfig> {
    match required(config, key)? {
        "random" => Ok(Constructive::Random),
        "greedy" => Ok(Constructive::Greedy),
        "grasp" => {
            let alpha_key = format!("{key}.grasp.alpha");
            let alpha = config
                .value_as_double(&alpha_key)
                .map_err(|e| IllegalAlgorithmConfig::new(e.to_string()))?
                .ok_or_else(|| missing(&alpha_key))?;
            if !(0.0..=1.0).contains(&alpha) {
                return Err(IllegalAlgorithmConfig::new(format!(
                    "{alpha_key} must be in [0, 1], got {alpha}"
                )));
            }
            Ok(Constructive::Grasp { alpha })
        }
        other => Err(unknown(key, other)),
    }
}

fn improver(config: &AlgorithmConfiguration, key: &str) -> Result<Improver, IllegalAlgorithmConfig> {
    match required(config, key)? {
        "none" => Ok(Improver::None),
        "ls" => {
            let strategy_key = format!("{key}.ls.strategy");
            let strategy = match required(config, &strategy_key)? {
                "first" => Strategy::FirstImprovement,
                "best" => Strategy::BestImprovement,
                other => return Err(unknown(&strategy_key, other)),
            };
            Ok(Improver::LocalSearch(strategy))
        }
        "ils" => {
            let strength = int(config, &format!("{key}.ils.strength"))?;
            if strength < 1 {
                return Err(IllegalAlgorithmConfig::new(format!(
                    "ILS strength must be positive, got {strength}"
                )));
            }
            Ok(Improver::IteratedLocalSearch {
                strength: strength as usize,
                inner: Box::new(improver(config, &format!("{key}.ils.inner"))?),
            })
        }
        other => Err(unknown(key, other)),
    }
}

fn required<'a>(
    config: &'a AlgorithmConfiguration,
    key: &str,
) -> Result<&'a str, IllegalAlgorithmConfig> {
    config.value(key).ok_or_else(|| missing(key))
}

fn int(config: &AlgorithmConfiguration, key: &str) -> Result<i64, IllegalAlgorithmConfig> {
    config
        .value_as_int(key)
        .map_err(|e| IllegalAlgorithmConfig::new(e.to_string()))?
        .ok_or_else(|| missing(key))
}

fn missing(key: &str) -> IllegalAlgorithmConfig {
    IllegalAlgorithmConfig::new(format!("missing parameter {key}"))
}

fn unknown(key: &str, value: &str) -> IllegalAlgorithmConfig {
    IllegalAlgorithmConfig::new(format!("unknown value {value:?} for {key}"))
}
