use std::path::Path;
use std::str::FromStr;

use futures::TryStreamExt;
use postgres::types::TableName;
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolCopyExt};
use tracing::{debug, warn};

use super::{DEST_CONNECTION_STRING, EtlParameters, EtlRunner, SOURCE_CONNECTION_STRING};
use crate::error::{ErrorKind, HarnessResult};
use crate::harness_error;

/// The work a copy package describes.
#[derive(Debug, Clone, Deserialize)]
struct CopyPackage {
    /// Tables to copy, bare or schema-qualified. Each must exist with a
    /// compatible schema on both sides.
    tables: Vec<String>,
}

/// A built-in engine that copies whole tables between two databases.
///
/// Stands in for an external engine wherever tests need a real data movement
/// step: the package is a JSON descriptor listing tables, and each table is
/// streamed from the source database into the destination with `COPY`.
///
/// A run that connects but fails mid-copy is a completed, failed engine run
/// and reports `Ok(false)`; an unreadable package or missing parameter means
/// the engine never started and surfaces as an error.
#[derive(Debug, Clone, Default)]
pub struct CopyRunner;

impl CopyRunner {
    pub fn new() -> CopyRunner {
        Self
    }
}

impl EtlRunner for CopyRunner {
    async fn run(&self, package: &Path, parameters: &EtlParameters) -> HarnessResult<bool> {
        let package = load_package(package).await?;

        let source = connect(parameters.require(SOURCE_CONNECTION_STRING)?).await?;
        let dest = connect(parameters.require(DEST_CONNECTION_STRING)?).await?;

        for table in &package.tables {
            let table: TableName = table.as_str().into();

            match copy_table(&source, &dest, &table).await {
                Ok(rows) => debug!(table = %table, rows, "copied table"),
                Err(err) => {
                    warn!(table = %table, error = %err, "table copy failed");
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

/// Reads and parses the JSON package descriptor.
async fn load_package(path: &Path) -> HarnessResult<CopyPackage> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
        harness_error!(
            ErrorKind::InvalidPackage,
            "failed to read the package descriptor",
            path.display(),
            source: err
        )
    })?;

    serde_json::from_str(&raw).map_err(|err| {
        harness_error!(
            ErrorKind::InvalidPackage,
            "the package descriptor is not valid JSON",
            path.display(),
            source: err
        )
    })
}

/// Connects a pool from a connection string parameter.
async fn connect(connection_string: &str) -> HarnessResult<PgPool> {
    let options = PgConnectOptions::from_str(connection_string).map_err(|err| {
        harness_error!(
            ErrorKind::ConfigError,
            "invalid connection string for the copy engine",
            source: err
        )
    })?;

    PgPool::connect_with(options).await.map_err(|err| {
        harness_error!(
            ErrorKind::ServerConnectionFailed,
            "the copy engine failed to connect to a database",
            source: err
        )
    })
}

/// Streams one table from `source` into `dest`, returning the row count.
async fn copy_table(source: &PgPool, dest: &PgPool, table: &TableName) -> Result<u64, sqlx::Error> {
    let identifier = table.as_quoted_identifier();

    let mut out = source
        .copy_out_raw(&format!("copy {identifier} to stdout"))
        .await?;
    let mut into = dest
        .copy_in_raw(&format!("copy {identifier} from stdin"))
        .await?;

    while let Some(chunk) = out.try_next().await? {
        into.send(chunk).await?;
    }

    into.finish().await
}
