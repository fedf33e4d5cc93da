//! The contract between the harness and ETL engines.
//!
//! An engine is anything that can execute an ETL package identified by a
//! file path, given named string parameters. The harness only needs the
//! overall boolean outcome; no partial-progress reporting is part of the
//! contract.

mod copy;
mod process;

pub use copy::CopyRunner;
pub use process::ProcessRunner;

use std::future::Future;
use std::path::Path;

use crate::bail;
use crate::error::{ErrorKind, HarnessResult};

/// Name of the parameter carrying the source database connection string.
pub const SOURCE_CONNECTION_STRING: &str = "Source_ConnectionString";

/// Name of the parameter carrying the destination database connection string.
pub const DEST_CONNECTION_STRING: &str = "Dest_ConnectionString";

/// Named string parameters passed to an ETL package invocation.
///
/// Parameters keep their insertion order, so engine invocations are
/// reproducible across runs.
#[derive(Debug, Clone, Default)]
pub struct EtlParameters {
    parameters: Vec<(String, String)>,
}

impl EtlParameters {
    pub fn new() -> EtlParameters {
        Self::default()
    }

    /// Sets a parameter, replacing any previous value under the same name.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();

        match self.parameters.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.parameters.push((name.to_owned(), value)),
        }

        self
    }

    /// Sets the [`SOURCE_CONNECTION_STRING`] parameter.
    pub fn with_source_connection_string(self, value: impl Into<String>) -> Self {
        self.with(SOURCE_CONNECTION_STRING, value)
    }

    /// Sets the [`DEST_CONNECTION_STRING`] parameter.
    pub fn with_dest_connection_string(self, value: impl Into<String>) -> Self {
        self.with(DEST_CONNECTION_STRING, value)
    }

    /// Returns the value of a parameter, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the value of a parameter, failing with
    /// [`ErrorKind::MissingParameter`] when it is not set.
    pub fn require(&self, name: &str) -> HarnessResult<&str> {
        match self.get(name) {
            Some(value) => Ok(value),
            None => bail!(
                ErrorKind::MissingParameter,
                "a required runner parameter is missing",
                name
            ),
        }
    }

    /// Iterates over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// The narrow contract an ETL engine must satisfy.
pub trait EtlRunner {
    /// Runs the package at `package` with the given parameters.
    ///
    /// `Ok(true)` and `Ok(false)` report the overall outcome of a completed
    /// engine run; `Err` means the engine could not be invoked or crashed.
    fn run(
        &self,
        package: &Path,
        parameters: &EtlParameters,
    ) -> impl Future<Output = HarnessResult<bool>> + Send;
}

/// Runs the package and requires engine success.
///
/// Converts a completed-but-failed run (`Ok(false)`) into
/// [`ErrorKind::RunnerFailed`], for tests that treat engine failure as a
/// test failure.
pub async fn run_to_success<R>(
    runner: &R,
    package: &Path,
    parameters: &EtlParameters,
) -> HarnessResult<()>
where
    R: EtlRunner,
{
    let succeeded = runner.run(package, parameters).await?;

    if !succeeded {
        bail!(
            ErrorKind::RunnerFailed,
            "the ETL package reported failure",
            package.display()
        );
    }

    Ok(())
}
