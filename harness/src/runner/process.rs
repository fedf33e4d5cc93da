use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

use super::{EtlParameters, EtlRunner};
use crate::error::{ErrorKind, HarnessResult};
use crate::harness_error;

/// Runs ETL packages by spawning an external engine executable.
///
/// The engine is invoked as
/// `<program> [fixed args...] --package <path> --parameter <name>=<value>...`
/// and its exit status becomes the overall outcome: success maps to
/// `Ok(true)`, any other status to `Ok(false)`. Failing to spawn the program
/// at all surfaces as [`ErrorKind::RunnerSpawnFailed`].
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> ProcessRunner {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Adds a fixed argument placed before the package and parameters.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl EtlRunner for ProcessRunner {
    async fn run(&self, package: &Path, parameters: &EtlParameters) -> HarnessResult<bool> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command.arg("--package").arg(package);
        for (name, value) in parameters.iter() {
            command.arg("--parameter").arg(format!("{name}={value}"));
        }

        debug!(
            program = %self.program.display(),
            package = %package.display(),
            "invoking the ETL engine"
        );

        let output = command.output().await.map_err(|err| {
            harness_error!(
                ErrorKind::RunnerSpawnFailed,
                "failed to spawn the ETL engine",
                self.program.display(),
                source: err
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                status = %output.status,
                stderr = %stderr.trim_end(),
                "the ETL engine reported failure"
            );
        }

        Ok(output.status.success())
    }
}
