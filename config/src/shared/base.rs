use thiserror::Error;

/// Errors raised when a configuration fails validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates were supplied.
    #[error("trusted root certificates must be provided when TLS is enabled")]
    MissingTrustedRootCerts,
}
