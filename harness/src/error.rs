//! Error types and result definitions for harness operations.
//!
//! Provides a single error type with classification and captured callsite
//! metadata for every fallible harness operation. Tests match on the
//! [`ErrorKind`] and read the detail for diagnostics.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for harness operations using [`HarnessError`] as the error type.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Main error type for harness operations.
///
/// Carries an [`ErrorKind`] for classification, a static description, an
/// optional dynamic detail (table names, counts, paths), an optional source
/// error, and the callsite the error was created at.
#[derive(Debug, Clone)]
pub struct HarnessError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

/// Specific categories of errors that can occur during harness operations.
///
/// Error kinds are organized by functional area and failure mode, so tests
/// can assert on the precise failure they provoked.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Provisioning Errors
    ServerConnectionFailed,
    DatabaseCreationFailed,
    DatabaseDropFailed,

    // Schema & Query Errors
    SchemaScriptUnreadable,
    SchemaScriptFailed,
    QueryFailed,

    // Runner Errors
    MissingParameter,
    InvalidPackage,
    RunnerSpawnFailed,
    RunnerFailed,

    // Assertion Errors
    AssertionFailed,

    // General Errors
    ConfigError,
    Unknown,
}

impl HarnessError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// The stored source is preserved across clones and exposed via [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Creates a [`HarnessError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
    ) -> Self {
        HarnessError {
            kind,
            description,
            detail,
            source: None,
            location: Location::caller(),
        }
    }
}

/// Compares errors by kind only.
///
/// Detail, source and location are diagnostic payload and intentionally do
/// not participate in equality, so tests can compare against a bare kind.
impl PartialEq for HarnessError {
    fn eq(&self, other: &HarnessError) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )?;

        if let Some(detail) = self.detail.as_deref() {
            write!(f, "\n  Detail: {detail}")?;
        }

        Ok(())
    }
}

impl error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source as &(dyn error::Error + 'static))
    }
}

/// Creates a [`HarnessError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for HarnessError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> HarnessError {
        HarnessError::from_components(kind, Cow::Borrowed(desc), None)
    }
}

/// Creates a [`HarnessError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for HarnessError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> HarnessError {
        HarnessError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()))
    }
}
