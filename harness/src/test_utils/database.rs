use config::shared::{PgConnectionConfig, TlsConfig};

use crate::database::{TestDatabase, TestServer};

/// Builds connection parameters for the local test Postgres server.
///
/// Configuration is read from environment variables:
/// - `TESTS_DATABASE_HOST`: Postgres server hostname (required)
/// - `TESTS_DATABASE_PORT`: Postgres server port (required)
/// - `TESTS_DATABASE_USERNAME`: Database user (required)
/// - `TESTS_DATABASE_PASSWORD`: Database password (optional)
fn local_server_config() -> PgConnectionConfig {
    PgConnectionConfig {
        host: std::env::var("TESTS_DATABASE_HOST").expect("TESTS_DATABASE_HOST must be set"),
        port: std::env::var("TESTS_DATABASE_PORT")
            .expect("TESTS_DATABASE_PORT must be set")
            .parse()
            .expect("TESTS_DATABASE_PORT must be a valid port number"),
        // The name is unused at the server level; every provisioned database
        // gets its own generated name.
        name: String::new(),
        username: std::env::var("TESTS_DATABASE_USERNAME")
            .expect("TESTS_DATABASE_USERNAME must be set"),
        password: std::env::var("TESTS_DATABASE_PASSWORD")
            .ok()
            .map(Into::into),
        tls: TlsConfig::disabled(),
    }
}

/// Returns a [`TestServer`] pointing at the local test Postgres instance.
pub fn local_test_server() -> TestServer {
    TestServer::new(local_server_config())
}

/// Provisions a new uniquely named database on the local test server.
///
/// # Panics
///
/// Panics if the server is unreachable or the database cannot be created.
pub async fn spawn_database() -> TestDatabase {
    local_test_server()
        .create_database()
        .await
        .expect("Failed to create test database")
}
