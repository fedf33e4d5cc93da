use config::shared::{IntoConnectOptions, PgConnectionConfig};
use pg_escape::{quote_identifier, quote_literal};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, Executor, PgConnection, PgPool};

/// Opens a single server-level connection, without selecting a database.
///
/// Administrative statements like `create database` and `drop database` must
/// run outside the database they target, so they go through this connection.
pub async fn connect_to_server(config: &PgConnectionConfig) -> Result<PgConnection, sqlx::Error> {
    PgConnection::connect_with(&config.without_db()).await
}

/// Connects a pool to the database named in `config`.
pub async fn connect_to_database(
    config: &PgConnectionConfig,
    min_connections: u32,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let options = config.with_db();

    let pool = PgPoolOptions::new()
        .min_connections(min_connections)
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Creates a database with the given name.
///
/// Fails if a database with that name already exists.
pub async fn create_database(
    connection: &mut PgConnection,
    name: &str,
) -> Result<(), sqlx::Error> {
    connection
        .execute(&*format!("create database {};", quote_identifier(name)))
        .await?;

    Ok(())
}

/// Returns whether a database with the given name exists on the server.
pub async fn database_exists(
    connection: &mut PgConnection,
    name: &str,
) -> Result<bool, sqlx::Error> {
    let exists: bool =
        sqlx::query_scalar("select exists (select 1 from pg_database where datname = $1)")
            .bind(name)
            .fetch_one(connection)
            .await?;

    Ok(exists)
}

/// Forcefully terminates all other connections to the given database.
///
/// Postgres refuses to drop a database while sessions are attached to it, so
/// this must run before [`drop_database_if_exists`] when pools may still hold
/// idle connections.
pub async fn terminate_database_backends(
    connection: &mut PgConnection,
    name: &str,
) -> Result<(), sqlx::Error> {
    connection
        .execute(&*format!(
            r#"
            select pg_terminate_backend(pg_stat_activity.pid)
            from pg_stat_activity
            where pg_stat_activity.datname = {}
            and pid <> pg_backend_pid();"#,
            quote_literal(name)
        ))
        .await?;

    Ok(())
}

/// Drops the given database if it exists.
///
/// Dropping a database that is already gone is not an error.
pub async fn drop_database_if_exists(
    connection: &mut PgConnection,
    name: &str,
) -> Result<(), sqlx::Error> {
    connection
        .execute(&*format!(
            "drop database if exists {};",
            quote_identifier(name)
        ))
        .await?;

    Ok(())
}
