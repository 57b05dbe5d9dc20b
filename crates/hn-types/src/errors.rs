use thiserror::Error;

/// Main error type for the Hone system
#[derive(Error, Debug)]
pub enum HnError {
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Callback error: {0}")]
    Callback(#[from] CallbackError),

    #[error("Illegal algorithm configuration: {0}")]
    IllegalAlgorithmConfig(#[from] IllegalAlgorithmConfig),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("Tuner error: {0}")]
    Tuner(#[from] TunerError),

    #[error("Empty search space: no tunable parameter within tree depth {max_depth}")]
    EmptySearchSpace { max_depth: usize },

    #[error("Scenario file {path}: {source}")]
    Scenario {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HnError {
    /// Errors that abort the whole autoconfiguration run instead of a single
    /// candidate.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            HnError::Callback(_) | HnError::IllegalAlgorithmConfig(_) | HnError::Parameter(_)
        )
    }
}

/// Errors raised while parsing `key=value` algorithm parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("Malformed algorithm parameter, expected key=value: {token}")]
    MalformedParameter { token: String },

    #[error("Duplicated parameter key: {key}")]
    DuplicateParameter { key: String },

    #[error("Parameter {key} has value {value:?}, which is not a valid {expected}")]
    TypeMismatch {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Errors that reject a single tuner callback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    #[error("Invalid integration key")]
    AuthError,

    #[error("Malformed callback payload: {message}")]
    MalformedCallback { message: String },
}

/// A candidate configuration that cannot be turned into a runnable algorithm
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct IllegalAlgorithmConfig {
    pub reason: String,
}

impl IllegalAlgorithmConfig {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A produced solution failed the user supplied correctness checks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("solution for instance {instance} is not valid: {}", .reasons.join("; "))]
pub struct ValidationFailure {
    pub instance: String,
    pub reasons: Vec<String>,
}

/// Errors related to the external tuner process
#[derive(Error, Debug)]
pub enum TunerError {
    #[error("Failed to launch tuner {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tuner exited unsuccessfully: {status}")]
    Failed { status: String },

    #[error("Tuner aborted: {message}")]
    Aborted { message: String },
}

/// Result type alias for Hone operations
pub type HnResult<T> = Result<T, HnError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::HnError::Config(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::HnError::Internal(format!($($arg)*))
    };
}
