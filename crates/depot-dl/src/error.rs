use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DownloadError {
    #[error(transparent)]
    #[diagnostic(
        code(depot_dl::network),
        help("Check your internet connection or try again later")
    )]
    Network(#[from] Box<ureq::Error>),

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(depot_dl::http_error))]
    HttpError { status: u16, url: String },

    #[error(transparent)]
    #[diagnostic(code(depot_dl::io))]
    Io(#[from] std::io::Error),

    #[error("Invalid response from server")]
    #[diagnostic(code(depot_dl::invalid_response))]
    InvalidResponse,

    #[error("Package '{package}' has no '{field}' for version {version}")]
    #[diagnostic(
        code(depot_dl::missing_field),
        help("Add the field to the package entry or to the applicable source override")
    )]
    MissingField {
        package: String,
        field: &'static str,
        version: String,
    },

    #[error("Unknown provider type '{kind}' (known: {known})")]
    #[diagnostic(code(depot_dl::unknown_provider))]
    UnknownProvider { kind: String, known: String },

    #[error("Cannot build a matching pattern from tag template '{pattern}'")]
    #[diagnostic(
        code(depot_dl::invalid_tag_pattern),
        help("Tag templates should contain exactly one version placeholder")
    )]
    InvalidTagPattern { pattern: String },
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl From<ureq::Error> for DownloadError {
    fn from(e: ureq::Error) -> Self {
        Self::Network(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = DownloadError::HttpError {
            status: 404,
            url: "https://example.com/notfound".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("HTTP 404"));
        assert!(msg.contains("https://example.com/notfound"));
    }

    #[test]
    fn test_missing_field_display() {
        let err = DownloadError::MissingField {
            package: "clangd".to_string(),
            field: "repo",
            version: "19.1.2".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("clangd"));
        assert!(msg.contains("repo"));
        assert!(msg.contains("19.1.2"));
    }

    #[test]
    fn test_unknown_provider_display() {
        let err = DownloadError::UnknownProvider {
            kind: "ftp".to_string(),
            known: "direct, github".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("ftp"));
        assert!(msg.contains("github"));
    }

    #[test]
    fn test_from_ureq_error() {
        let ureq_err = ureq::Error::ConnectionFailed;
        let download_err: DownloadError = ureq_err.into();

        match download_err {
            DownloadError::Network(_) => (),
            _ => panic!("Expected Network error variant"),
        }
    }
}
