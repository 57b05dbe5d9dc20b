//! External tuner subprocess.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tracing::{info, warn};

use hn_types::{TunerCommand, TunerError};

/// A tuner run in a materialized scenario directory.
#[derive(Debug, Clone)]
pub struct TunerProcess {
    command: TunerCommand,
    working_dir: PathBuf,
}

impl TunerProcess {
    pub fn new(command: TunerCommand, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            command,
            working_dir: working_dir.into(),
        }
    }

    /// Start the tuner. The child is killed if the handle is dropped.
    pub fn spawn(&self) -> Result<RunningTuner, TunerError> {
        info!(
            "Launching tuner: {} {} in {}",
            self.command.program,
            self.command.args.join(" "),
            self.working_dir.display()
        );
        let child = Command::new(&self.command.program)
            .args(&self.command.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TunerError::Launch {
                program: self.command.program.clone(),
                source,
            })?;
        Ok(RunningTuner { child })
    }
}

#[derive(Debug)]
pub struct RunningTuner {
    child: Child,
}

impl RunningTuner {
    /// Wait for the tuner to exit. A non-zero exit status is an error.
    pub async fn wait(&mut self) -> Result<ExitStatus, TunerError> {
        let status = self.child.wait().await.map_err(|e| TunerError::Failed {
            status: format!("wait failed: {e}"),
        })?;
        if status.success() {
            info!("Tuner finished: {}", status);
            Ok(status)
        } else {
            warn!("Tuner exited unsuccessfully: {}", status);
            Err(TunerError::Failed {
                status: status.to_string(),
            })
        }
    }

    pub async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            warn!("Failed to kill tuner: {}", e);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn process(program: &str, args: &[&str]) -> TunerProcess {
        let command = TunerCommand {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        };
        TunerProcess::new(command, std::env::temp_dir())
    }

    #[tokio::test]
    async fn successful_exit() {
        let mut tuner = process("true", &[]).spawn().unwrap();
        assert!(tuner.wait().await.unwrap().success());
    }

    #[tokio::test]
    async fn failing_exit_is_an_error() {
        let mut tuner = process("sh", &["-c", "exit 3"]).spawn().unwrap();
        assert!(matches!(tuner.wait().await, Err(TunerError::Failed { .. })));
    }

    #[tokio::test]
    async fn missing_program_fails_to_launch() {
        let err = process("hone-no-such-tuner", &[]).spawn().unwrap_err();
        assert!(matches!(err, TunerError::Launch { .. }));
    }

    #[tokio::test]
    async fn kill_stops_long_running_tuner() {
        let mut tuner = process("sleep", &["30"]).spawn().unwrap();
        tuner.kill().await;
        assert!(tuner.wait().await.is_err());
    }
}
