//! Tuning scenario materialization.
//!
//! Templates contain `__NAME__` placeholders which are replaced with the
//! values of one run before the files are written to the working directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use hn_types::{HnError, HnResult, TemplateSource};

use crate::space::ParameterSpace;

pub const INTEGRATION_KEY: &str = "__INTEGRATION_KEY__";
pub const INSTANCES_PATH: &str = "__INSTANCES_PATH__";
pub const TARGET_RUNNER: &str = "__TARGET_RUNNER__";
pub const PARALLEL: &str = "__PARALLEL__";
pub const MAX_EXPERIMENTS: &str = "__MAX_EXPERIMENTS__";
pub const SEED: &str = "__SEED__";
pub const CALLBACK_URL: &str = "__CALLBACK_URL__";

/// Target runner path written into the scenario, relative to its directory.
pub const MIDDLEWARE_RUNNER: &str = "./middleware.sh";

/// Files making up a tuning scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioFile {
    Parameters,
    Scenario,
    Forbidden,
    Middleware,
}

impl ScenarioFile {
    pub const ALL: [ScenarioFile; 4] = [
        ScenarioFile::Parameters,
        ScenarioFile::Scenario,
        ScenarioFile::Forbidden,
        ScenarioFile::Middleware,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Parameters => "parameters.txt",
            Self::Scenario => "scenario.txt",
            Self::Forbidden => "forbidden.txt",
            Self::Middleware => "middleware.sh",
        }
    }

    pub fn is_executable(self) -> bool {
        matches!(self, Self::Middleware)
    }

    /// Built-in template. The parameter file has none: it is either derived
    /// or provided in a template directory.
    fn embedded(self) -> Option<&'static str> {
        match self {
            Self::Parameters => None,
            Self::Scenario => Some(include_str!("../templates/scenario.txt")),
            Self::Forbidden => Some(include_str!("../templates/forbidden.txt")),
            Self::Middleware => Some(include_str!("../templates/middleware.sh")),
        }
    }
}

/// Values substituted into the templates of one run.
#[derive(Clone, PartialEq)]
pub struct ScenarioValues {
    pub integration_key: String,
    pub instances_path: String,
    pub parallel: usize,
    pub max_experiments: u64,
    pub seed: u64,
    pub callback_url: String,
}

impl ScenarioValues {
    pub fn substitutions(&self) -> Vec<(&'static str, String)> {
        vec![
            (INTEGRATION_KEY, self.integration_key.clone()),
            (INSTANCES_PATH, self.instances_path.clone()),
            (TARGET_RUNNER, MIDDLEWARE_RUNNER.to_string()),
            (PARALLEL, self.parallel.to_string()),
            (MAX_EXPERIMENTS, self.max_experiments.to_string()),
            (SEED, self.seed.to_string()),
            (CALLBACK_URL, self.callback_url.clone()),
        ]
    }
}

impl fmt::Debug for ScenarioValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioValues")
            .field("integration_key", &"<redacted>")
            .field("instances_path", &self.instances_path)
            .field("parallel", &self.parallel)
            .field("max_experiments", &self.max_experiments)
            .field("seed", &self.seed)
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

/// Replace every occurrence of each placeholder.
pub fn substitute(template: &str, substitutions: &[(&str, String)]) -> String {
    substitutions
        .iter()
        .fold(template.to_string(), |text, (placeholder, value)| {
            text.replace(placeholder, value)
        })
}

/// Paths written by [`ScenarioMaterializer::materialize_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedScenario {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

impl MaterializedScenario {
    pub fn path(&self, file: ScenarioFile) -> PathBuf {
        self.dir.join(file.file_name())
    }
}

/// Writes scenario files from a template source into a directory.
#[derive(Debug, Clone)]
pub struct ScenarioMaterializer {
    source: TemplateSource,
    dest: PathBuf,
}

impl ScenarioMaterializer {
    pub fn new(source: TemplateSource, dest: impl Into<PathBuf>) -> Self {
        Self {
            source,
            dest: dest.into(),
        }
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn read_template(&self, file: ScenarioFile) -> HnResult<String> {
        match &self.source {
            TemplateSource::Embedded => file.embedded().map(str::to_string).ok_or_else(|| {
                HnError::Scenario {
                    path: file.file_name().to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "no built-in template, configure a template directory",
                    ),
                }
            }),
            TemplateSource::Directory(dir) => {
                let path = dir.join(file.file_name());
                fs::read_to_string(&path).map_err(|source| HnError::Scenario {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }

    /// Render one template and write it to the destination directory.
    pub fn materialize(&self, file: ScenarioFile, values: &ScenarioValues) -> HnResult<PathBuf> {
        let template = self.read_template(file)?;
        let contents = substitute(&template, &values.substitutions());
        self.write(file, &contents)
    }

    /// Write derived parameter declarations as the parameter file.
    pub fn write_parameters(&self, lines: &[String]) -> HnResult<PathBuf> {
        let mut contents = lines.join("\n");
        contents.push('\n');
        self.write(ScenarioFile::Parameters, &contents)
    }

    /// Write the complete scenario. With a derived space the parameter file
    /// comes from it, otherwise from the template source.
    pub fn materialize_all(
        &self,
        values: &ScenarioValues,
        derived: Option<&ParameterSpace>,
    ) -> HnResult<MaterializedScenario> {
        if let TemplateSource::Directory(dir) = &self.source {
            if dir == &self.dest {
                return Err(HnError::Config(format!(
                    "template directory {} must differ from the working directory",
                    dir.display()
                )));
            }
        }
        fs::create_dir_all(&self.dest).map_err(|source| HnError::Scenario {
            path: self.dest.display().to_string(),
            source,
        })?;

        let mut files = Vec::with_capacity(ScenarioFile::ALL.len());
        for file in ScenarioFile::ALL {
            let path = match (file, derived) {
                (ScenarioFile::Parameters, Some(space)) => self.write_parameters(space.lines())?,
                _ => self.materialize(file, values)?,
            };
            files.push(path);
        }

        info!(
            "Scenario written to {} ({} parameters file)",
            self.dest.display(),
            if derived.is_some() { "derived" } else { "fixed" }
        );
        Ok(MaterializedScenario {
            dir: self.dest.clone(),
            files,
        })
    }

    fn write(&self, file: ScenarioFile, contents: &str) -> HnResult<PathBuf> {
        let path = self.dest.join(file.file_name());
        let io_error = |source: std::io::Error| HnError::Scenario {
            path: path.display().to_string(),
            source,
        };
        fs::write(&path, contents).map_err(io_error)?;
        if file.is_executable() {
            mark_executable(&path).map_err(io_error)?;
        }
        debug!("Wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
