//! Provider construction seam.
//!
//! Operations take the provider constructor as a parameter so tests can
//! substitute stubs for the network-backed implementations.

use depot_dl::{create_provider, Provider};
use depot_registry::PackageConfig;

/// Builds the provider for one named package.
pub type ProviderFactory<'a> =
    &'a dyn Fn(&str, PackageConfig) -> depot_dl::error::Result<Box<dyn Provider>>;

/// The production factory: dispatch on the package's `type` field.
pub fn default_factory(
    package: &str,
    config: PackageConfig,
) -> depot_dl::error::Result<Box<dyn Provider>> {
    let kind = config.kind.clone();
    create_provider(&kind, package, config)
}
