//! Error types for the registry crate.

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while loading, querying, or saving the registry.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("Error while {action}: {source}")]
    #[diagnostic(code(depot_registry::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(
        code(depot_registry::parse),
        help("The registry file is not valid TOML or does not match the expected shape")
    )]
    ParseError(#[from] Box<toml::de::Error>),

    #[error("Unsupported schema_version {found} (supported: {supported:?})")]
    #[diagnostic(
        code(depot_registry::unsupported_schema),
        help("Upgrade this tool, or migrate the registry to a supported schema version")
    )]
    UnsupportedSchemaVersion { found: i64, supported: Vec<i64> },

    #[error("Package '{name}' not found in registry")]
    #[diagnostic(
        code(depot_registry::package_not_found),
        help("Run without a package filter to list the known packages")
    )]
    PackageNotFound { name: String },

    #[error("'{name}' is a reserved registry key, not a package")]
    #[diagnostic(code(depot_registry::reserved_name))]
    ReservedName { name: String },

    #[error("Unknown install template '{name}' (known: {known})")]
    #[diagnostic(code(depot_registry::unknown_install_template))]
    UnknownInstallTemplate { name: String, known: String },

    #[error("Invalid install_config for template '{template}': {source}")]
    #[diagnostic(code(depot_registry::invalid_install_config))]
    InvalidInstallConfig {
        template: String,
        source: Box<toml::de::Error>,
    },

    #[error("{0}")]
    #[diagnostic(code(depot_registry::custom))]
    Custom(String),
}

/// A specialized Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

impl From<toml::de::Error> for RegistryError {
    fn from(err: toml::de::Error) -> Self {
        Self::ParseError(Box::new(err))
    }
}

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    /// Adds context to an error, describing what action was being performed.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            RegistryError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
