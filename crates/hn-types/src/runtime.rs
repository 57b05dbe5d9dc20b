//! One evaluated tuner candidate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parameters::AlgorithmConfiguration;

/// A candidate evaluation request as decoded from a tuner callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfiguration {
    /// Tuner-assigned candidate identifier.
    pub candidate_id: String,
    /// Tuner-assigned instance identifier.
    pub instance_id: String,
    /// Seed for this single evaluation.
    pub seed: u64,
    /// Path (or name) of the instance to solve.
    pub instance_path: String,
    pub algorithm: AlgorithmConfiguration,
    pub received_at: DateTime<Utc>,
}

impl RuntimeConfiguration {
    pub fn new(
        candidate_id: impl Into<String>,
        instance_id: impl Into<String>,
        seed: u64,
        instance_path: impl Into<String>,
        algorithm: AlgorithmConfiguration,
    ) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            instance_id: instance_id.into(),
            seed,
            instance_path: instance_path.into(),
            algorithm,
            received_at: Utc::now(),
        }
    }
}

impl fmt::Display for RuntimeConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidate={} instance_id={} seed={} instance={} [{}]",
            self.candidate_id, self.instance_id, self.seed, self.instance_path, self.algorithm
        )
    }
}
