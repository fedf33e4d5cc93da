use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::SerializableSecretString;
use crate::shared::ValidationError;

/// Static PostgreSQL connection options that ensure sane defaults.
///
/// These options are applied to all PostgreSQL connections so that value
/// formatting is identical across sessions. In particular
/// `extra_float_digits=3` guarantees that floating point values round-trip
/// through their text representation without loss, which row comparisons
/// rely on.
pub struct DefaultPgConnectionOptions;

impl DefaultPgConnectionOptions {
    /// Returns the options as a string suitable for the `options` parameter
    /// of a libpq-style conninfo string.
    ///
    /// Returns a space-separated list of `-c key=value` pairs.
    pub fn to_options_string() -> String {
        "-c datestyle=ISO -c intervalstyle=postgres -c extra_float_digits=3 -c client_encoding=UTF8"
            .to_string()
    }

    /// Returns the options as key-value pairs suitable for sqlx.
    pub fn to_key_value_pairs() -> Vec<(String, String)> {
        vec![
            ("datestyle".to_string(), "ISO".to_string()),
            ("intervalstyle".to_string(), "postgres".to_string()),
            ("extra_float_digits".to_string(), "3".to_string()),
            ("client_encoding".to_string(), "UTF8".to_string()),
        ]
    }
}

/// Configuration for connecting to a Postgres database.
///
/// This struct holds all necessary connection parameters and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PgConnectionConfig {
    /// Hostname or IP address of the Postgres server.
    pub host: String,
    /// Port number on which the Postgres server is listening.
    pub port: u16,
    /// Name of the Postgres database to connect to.
    pub name: String,
    /// Username for authenticating with the Postgres server.
    pub username: String,
    /// Password for the specified user. This field is sensitive and redacted in debug output.
    pub password: Option<SerializableSecretString>,
    /// TLS configuration for secure connections.
    pub tls: TlsConfig,
}

impl PgConnectionConfig {
    /// Returns a copy of this configuration pointing at a different database
    /// on the same server.
    pub fn for_database(&self, name: &str) -> PgConnectionConfig {
        let mut config = self.clone();
        config.name = name.to_owned();

        config
    }
}

/// TLS settings for secure Postgres connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TlsConfig {
    /// PEM-encoded trusted root certificates. Sensitive and redacted in debug output.
    pub trusted_root_certs: String,
    /// Whether TLS is enabled for the connection.
    pub enabled: bool,
}

impl TlsConfig {
    /// A disabled TLS configuration, used for local test servers.
    pub fn disabled() -> TlsConfig {
        TlsConfig {
            trusted_root_certs: String::new(),
            enabled: false,
        }
    }

    /// Validates the [`TlsConfig`].
    ///
    /// If [`TlsConfig::enabled`] is true, this method checks that [`TlsConfig::trusted_root_certs`] is not empty.
    ///
    /// Returns [`ValidationError::MissingTrustedRootCerts`] if TLS is enabled but no certificates are provided.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.trusted_root_certs.is_empty() {
            return Err(ValidationError::MissingTrustedRootCerts);
        }

        Ok(())
    }
}

/// A trait which converts the implementation into driver-specific connect
/// options.
///
/// Connection parameters are centralized in [`PgConnectionConfig`]; this
/// trait splits them into the two shapes consumers need: server-level
/// options for administrative operations and database-level options for
/// ordinary queries.
pub trait IntoConnectOptions<Output> {
    /// Creates connection options for connecting to the PostgreSQL server without
    /// specifying a database.
    ///
    /// Useful for administrative operations that must be performed before
    /// connecting to a specific database, like database creation and removal.
    fn without_db(&self) -> Output;

    /// Creates connection options for connecting to a specific database.
    ///
    /// Returns [`Output`] configured with all connection parameters including
    /// the database name from this instance.
    fn with_db(&self) -> Output;
}

impl IntoConnectOptions<PgConnectOptions> for PgConnectionConfig {
    fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.tls.enabled {
            PgSslMode::VerifyFull
        } else {
            PgSslMode::Prefer
        };
        let mut options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .username(&self.username)
            .port(self.port)
            .ssl_mode(ssl_mode)
            .ssl_root_cert_from_pem(self.tls.trusted_root_certs.clone().into_bytes())
            .options(DefaultPgConnectionOptions::to_key_value_pairs());

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        options
    }

    fn with_db(&self) -> PgConnectOptions {
        let options: PgConnectOptions = self.without_db();
        options.database(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PgConnectionConfig {
        PgConnectionConfig {
            host: "localhost".to_string(),
            port: 5430,
            name: "orders".to_string(),
            username: "postgres".to_string(),
            password: None,
            tls: TlsConfig::disabled(),
        }
    }

    #[test]
    fn test_options_string_format() {
        let options_string = DefaultPgConnectionOptions::to_options_string();

        assert_eq!(
            options_string,
            "-c datestyle=ISO -c intervalstyle=postgres -c extra_float_digits=3 -c client_encoding=UTF8"
        );
    }

    #[test]
    fn test_key_value_pairs() {
        let pairs = DefaultPgConnectionOptions::to_key_value_pairs();

        assert_eq!(pairs.len(), 4);
        assert!(pairs.contains(&("datestyle".to_string(), "ISO".to_string())));
        assert!(pairs.contains(&("intervalstyle".to_string(), "postgres".to_string())));
        assert!(pairs.contains(&("extra_float_digits".to_string(), "3".to_string())));
        assert!(pairs.contains(&("client_encoding".to_string(), "UTF8".to_string())));
    }

    #[test]
    fn test_connect_options_database_selection() {
        let config = test_config();

        let without_db: PgConnectOptions = config.without_db();
        assert_eq!(without_db.get_host(), "localhost");
        assert_eq!(without_db.get_port(), 5430);
        assert_eq!(without_db.get_database(), None);

        let with_db: PgConnectOptions = config.with_db();
        assert_eq!(with_db.get_database(), Some("orders"));
    }

    #[test]
    fn test_for_database_changes_only_the_name() {
        let config = test_config().for_database("other");

        assert_eq!(config.name, "other");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5430);
    }

    #[test]
    fn test_tls_validation_requires_certs() {
        let tls = TlsConfig {
            trusted_root_certs: String::new(),
            enabled: true,
        };

        assert!(tls.validate().is_err());
        assert!(TlsConfig::disabled().validate().is_ok());
    }
}
