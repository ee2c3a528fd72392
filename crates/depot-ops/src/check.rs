//! Link reachability and upstream update checking.

use depot_dl::DiscoveredVersion;
use depot_registry::Registry;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    provider::{default_factory, ProviderFactory},
};

/// One checked (package, version, platform) link.
#[derive(Debug, Clone, Serialize)]
pub struct LinkResult {
    pub package: String,
    pub version: String,
    pub platform: String,
    pub url: String,

    #[serde(flatten)]
    pub check: depot_dl::LinkCheck,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LinkSummary {
    pub total: usize,
    pub ok: usize,
    pub fail: usize,

    /// Packages skipped because they are disabled.
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub results: Vec<LinkResult>,
    pub summary: LinkSummary,
}

impl LinkReport {
    pub fn all_ok(&self) -> bool {
        self.summary.fail == 0
    }
}

/// Checks every resolvable download link of the selected packages.
///
/// Per-link failures (network errors included) are folded into the report;
/// only registry lookups and provider configuration errors abort the run.
pub fn check_links(registry: &Registry, filter: Option<&str>) -> Result<LinkReport> {
    check_links_with(registry, filter, &default_factory)
}

pub fn check_links_with(
    registry: &Registry,
    filter: Option<&str>,
    factory: ProviderFactory,
) -> Result<LinkReport> {
    let mut results = Vec::new();
    let mut summary = LinkSummary::default();

    for name in registry.filter(filter)? {
        let config = registry.package_config(&name)?;
        if config.disabled {
            debug!("Skipping disabled package '{name}'");
            summary.skipped += 1;
            continue;
        }

        let provider = factory(&name, config.clone())?;
        let assets = provider.resolve_urls()?;
        info!("Checking {} links for '{name}'", assets.len());

        for asset in assets {
            let check = provider.check_link(&asset);
            if !check.is_ok() {
                warn!(
                    "Broken link for {} {} ({}): {}",
                    asset.package,
                    asset.version,
                    asset.platform,
                    check.error.as_deref().unwrap_or("unknown failure")
                );
            }

            summary.total += 1;
            if check.is_ok() {
                summary.ok += 1;
            } else {
                summary.fail += 1;
            }

            results.push(LinkResult {
                package: asset.package,
                version: asset.version,
                platform: asset.platform,
                url: asset.url,
                check,
            });
        }
    }

    Ok(LinkReport { results, summary })
}

/// Pending upstream versions for one package.
#[derive(Debug, Clone, Serialize)]
pub struct PackageUpdates {
    pub package: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_latest: Option<String>,

    /// Provenance of the discovery ("kind:identifier").
    pub source: String,

    pub new_versions: Vec<DiscoveredVersion>,
}

/// A package whose upstream could not be queried.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateFailure {
    pub package: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub updates: Vec<PackageUpdates>,
    pub has_updates: bool,
    pub failures: Vec<UpdateFailure>,
}

/// Discovers upstream versions newer than the registered set.
///
/// A package whose upstream cannot be queried is recorded under `failures`
/// and the sweep continues with the rest.
pub fn check_updates(registry: &Registry, filter: Option<&str>) -> Result<UpdateReport> {
    check_updates_with(registry, filter, &default_factory)
}

pub fn check_updates_with(
    registry: &Registry,
    filter: Option<&str>,
    factory: ProviderFactory,
) -> Result<UpdateReport> {
    let mut updates = Vec::new();
    let mut failures = Vec::new();

    for name in registry.filter(filter)? {
        let config = registry.package_config(&name)?;
        if config.disabled {
            debug!("Skipping disabled package '{name}'");
            continue;
        }

        let provider = factory(&name, config.clone())?;
        let discovered = match provider.discover_versions() {
            Ok(discovered) => discovered,
            Err(err) => {
                warn!("Discovery failed for '{name}': {err}");
                failures.push(UpdateFailure {
                    package: name.clone(),
                    error: err.to_string(),
                });
                continue;
            }
        };
        let new_versions: Vec<_> = discovered
            .into_iter()
            .filter(|discovered| discovered.is_new)
            .collect();

        if new_versions.is_empty() {
            debug!("'{name}' is up to date");
            continue;
        }

        info!("'{name}' has {} new upstream versions", new_versions.len());
        updates.push(PackageUpdates {
            package: name.clone(),
            current_latest: config.current_latest().map(String::from),
            source: provider.describe_source(),
            new_versions,
        });
    }

    let has_updates = !updates.is_empty();
    Ok(UpdateReport {
        updates,
        has_updates,
        failures,
    })
}
