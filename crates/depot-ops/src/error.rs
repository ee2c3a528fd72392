use depot_dl::DownloadError;
use depot_registry::RegistryError;
use depot_utils::error::HashError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum OpsError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    #[diagnostic(code(depot_ops::hash))]
    Hash(#[from] HashError),

    #[error(transparent)]
    #[diagnostic(code(depot_ops::io))]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    #[diagnostic(code(depot_ops::json))]
    Json(#[from] serde_json::Error),

    #[error("Unknown platform id '{platform}' in package '{package}'")]
    #[diagnostic(
        code(depot_ops::unknown_platform),
        help("Platform ids follow the <host> or <host>-<arch> convention")
    )]
    UnknownPlatform { package: String, platform: String },

    #[error("Package '{package}' has no install template")]
    #[diagnostic(
        code(depot_ops::missing_install),
        help("Set `install` (and `install_config`) on the package entry")
    )]
    MissingInstallSpec { package: String },
}

pub type Result<T> = std::result::Result<T, OpsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_platform_display() {
        let err = OpsError::UnknownPlatform {
            package: "clangd".to_string(),
            platform: "beos-ppc".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("beos-ppc"));
        assert!(msg.contains("clangd"));
    }

    #[test]
    fn test_missing_install_display() {
        let err = OpsError::MissingInstallSpec {
            package: "ninja".to_string(),
        };
        assert!(format!("{}", err).contains("ninja"));
    }
}
