//! Ephemeral database provisioning.
//!
//! [`TestServer`] points at a Postgres server; every call to
//! [`TestServer::create_database`] provisions a database with a freshly
//! generated unique name and hands back a [`TestDatabase`] that owns it.
//! Databases are dropped again through [`TestDatabase::dispose`], or as a
//! fallback when the handle goes out of scope, so a failing test never leaks
//! server-visible state.

use std::path::Path;

use config::shared::PgConnectionConfig;
use postgres::sqlx::{
    connect_to_database, connect_to_server, create_database, drop_database_if_exists,
    terminate_database_backends,
};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ErrorKind, HarnessResult};
use crate::harness_error;

/// Prefix applied to every provisioned database name.
///
/// Generated names look like `harness_c4f0552f6e154131b7922ab924f4cc4f`, so
/// leftovers from crashed runs are recognizable on the server.
const DATABASE_NAME_PREFIX: &str = "harness";

/// Generates a globally unique database name.
fn generate_database_name() -> String {
    format!("{DATABASE_NAME_PREFIX}_{}", Uuid::new_v4().simple())
}

/// Drops the database named in `config`, terminating lingering backends first.
async fn drop_database(config: &PgConnectionConfig) -> Result<(), sqlx::Error> {
    let mut connection = connect_to_server(config).await?;

    terminate_database_backends(&mut connection, &config.name).await?;
    drop_database_if_exists(&mut connection, &config.name).await?;

    Ok(())
}

/// A Postgres server on which ephemeral databases can be provisioned.
///
/// The database name in the wrapped configuration is ignored; each
/// provisioned database gets its own generated name.
#[derive(Debug, Clone)]
pub struct TestServer {
    config: PgConnectionConfig,
}

impl TestServer {
    pub fn new(config: PgConnectionConfig) -> TestServer {
        Self { config }
    }

    /// Returns the server-level connection configuration.
    pub fn config(&self) -> &PgConnectionConfig {
        &self.config
    }

    /// Provisions a new database with a unique name and connects a pool to it.
    ///
    /// Fails with [`ErrorKind::ServerConnectionFailed`] when the server is
    /// unreachable and [`ErrorKind::DatabaseCreationFailed`] when the server
    /// rejects the creation.
    pub async fn create_database(&self) -> HarnessResult<TestDatabase> {
        let config = self.config.for_database(&generate_database_name());

        let mut connection = connect_to_server(&config).await.map_err(|err| {
            harness_error!(
                ErrorKind::ServerConnectionFailed,
                "failed to connect to the Postgres server",
                format!("{}:{}", config.host, config.port),
                source: err
            )
        })?;

        create_database(&mut connection, &config.name)
            .await
            .map_err(|err| {
                harness_error!(
                    ErrorKind::DatabaseCreationFailed,
                    "failed to create the database",
                    config.name.clone(),
                    source: err
                )
            })?;

        let pool = connect_to_database(&config, 1, 5).await.map_err(|err| {
            harness_error!(
                ErrorKind::ServerConnectionFailed,
                "failed to connect to the newly created database",
                config.name.clone(),
                source: err
            )
        })?;

        debug!(database = %config.name, "created test database");

        Ok(TestDatabase {
            config,
            pool,
            disposed: false,
        })
    }
}

/// A uniquely named database owned by a single test.
///
/// The handle exposes the connection configuration for adaptation into
/// runner parameters, a pool for seeding and assertions, and the disposal
/// operation. Disposal also runs from [`Drop`] when it was not called
/// explicitly, so cleanup happens on every exit path.
#[derive(Debug)]
pub struct TestDatabase {
    config: PgConnectionConfig,
    pool: PgPool,
    disposed: bool,
}

impl TestDatabase {
    /// Returns the generated name of this database.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the connection configuration pointing at this database.
    pub fn config(&self) -> &PgConnectionConfig {
        &self.config
    }

    /// Returns the pool connected to this database.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the SQL script at `path` against this database.
    ///
    /// The script is executed as a single batch: statements run in order and
    /// the first failure aborts the batch, so a broken script never leaves a
    /// partially applied schema behind.
    pub async fn execute_script(&self, path: impl AsRef<Path>) -> HarnessResult<()> {
        let path = path.as_ref();

        let script = tokio::fs::read_to_string(path).await.map_err(|err| {
            harness_error!(
                ErrorKind::SchemaScriptUnreadable,
                "failed to read the schema script",
                path.display(),
                source: err
            )
        })?;

        sqlx::raw_sql(&script)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                harness_error!(
                    ErrorKind::SchemaScriptFailed,
                    "a schema script statement failed",
                    path.display(),
                    source: err
                )
            })?;

        debug!(database = %self.config.name, script = %path.display(), "executed schema script");

        Ok(())
    }

    /// Runs ad-hoc SQL against this database, e.g. to seed rows.
    pub async fn run_sql(&self, sql: &str) -> HarnessResult<()> {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                harness_error!(
                    ErrorKind::QueryFailed,
                    "failed to execute SQL against the database",
                    self.config.name.clone(),
                    source: err
                )
            })?;

        Ok(())
    }

    /// Drops this database on the server.
    ///
    /// Idempotent: calling it again after a successful disposal is a no-op,
    /// and dropping a database that no longer exists is not an error.
    pub async fn dispose(&mut self) -> HarnessResult<()> {
        if self.disposed {
            return Ok(());
        }

        // Release our own connections gracefully before terminating whatever
        // other sessions are still attached.
        self.pool.close().await;

        drop_database(&self.config).await.map_err(|err| {
            harness_error!(
                ErrorKind::DatabaseDropFailed,
                "failed to drop the database",
                self.config.name.clone(),
                source: err
            )
        })?;

        self.disposed = true;

        debug!(database = %self.config.name, "dropped test database");

        Ok(())
    }
}

impl Drop for TestDatabase {
    /// Best-effort disposal for handles that were not disposed explicitly.
    ///
    /// Runs on a dedicated thread with its own runtime, so cleanup still
    /// completes while the caller's stack unwinds from a failed assertion.
    /// Failures are logged, never raised: teardown must not mask the error
    /// that unwound the stack.
    fn drop(&mut self) {
        if self.disposed {
            return;
        }

        let config = self.config.clone();

        let teardown = std::thread::Builder::new()
            .name("database-teardown".to_owned())
            .spawn(move || -> Result<(), sqlx::Error> {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(sqlx::Error::Io)?;

                runtime.block_on(drop_database(&config))
            });

        match teardown.map(|handle| handle.join()) {
            Ok(Ok(Ok(()))) => {
                debug!(database = %self.config.name, "dropped test database during teardown");
            }
            Ok(Ok(Err(err))) => {
                warn!(database = %self.config.name, error = %err, "failed to drop test database during teardown");
            }
            Ok(Err(_)) => {
                warn!(database = %self.config.name, "database teardown thread panicked");
            }
            Err(err) => {
                warn!(database = %self.config.name, error = %err, "failed to start the database teardown thread");
            }
        }
    }
}
