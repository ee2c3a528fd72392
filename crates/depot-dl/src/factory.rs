//! Compile-time provider registry keyed by the package `type` field.

use depot_registry::PackageConfig;

use crate::{
    direct::DirectProvider,
    error::{DownloadError, Result},
    github::GithubProvider,
    traits::Provider,
};

type ProviderCtor = fn(&str, PackageConfig) -> Box<dyn Provider>;

static PROVIDERS: &[(&str, ProviderCtor)] = &[
    ("direct", |package, config| {
        Box::new(DirectProvider::new(package, config))
    }),
    ("github", |package, config| {
        Box::new(GithubProvider::new(package, config))
    }),
];

/// Constructs the provider handling `kind` for one package.
///
/// # Errors
///
/// [`DownloadError::UnknownProvider`] when no provider is registered for
/// the kind, listing the registered ones.
pub fn create_provider(
    kind: &str,
    package: &str,
    config: PackageConfig,
) -> Result<Box<dyn Provider>> {
    PROVIDERS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, ctor)| ctor(package, config))
        .ok_or_else(|| DownloadError::UnknownProvider {
            kind: kind.to_string(),
            known: known_kinds().join(", "),
        })
}

/// The provider kinds this build understands, in registration order.
pub fn known_kinds() -> Vec<&'static str> {
    PROVIDERS.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> PackageConfig {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_create_known_providers() {
        let cfg = config(r#"type = "github""#);
        let provider = create_provider("github", "tool", cfg).unwrap();
        assert!(provider.describe_source().starts_with("github:"));

        let cfg = config(r#"type = "direct""#);
        let provider = create_provider("direct", "tool", cfg).unwrap();
        assert!(provider.describe_source().starts_with("direct:"));
    }

    #[test]
    fn test_unknown_kind_lists_known() {
        let cfg = config(r#"type = "ftp""#);
        let err = match create_provider("ftp", "tool", cfg) {
            Err(err) => err,
            Ok(_) => panic!("'ftp' should not resolve to a provider"),
        };
        match err {
            DownloadError::UnknownProvider { kind, known } => {
                assert_eq!(kind, "ftp");
                assert_eq!(known, "direct, github");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_known_kinds() {
        assert_eq!(known_kinds(), vec!["direct", "github"]);
    }
}
