//! Discover, download, hash, and merge new package versions.

use std::collections::BTreeMap;

use depot_dl::download_to;
use depot_registry::{HashPolicy, Registry};
use depot_utils::hash::calculate_checksum;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::{OpsError, Result},
    provider::{default_factory, ProviderFactory},
};

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Update to this exact version instead of discovering.
    pub target_version: Option<String>,

    /// Re-fetch and re-hash even when the target is already registered.
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Success,
    UpToDate,
    Skipped,
    Error,
}

/// Outcome of one package update attempt. Nothing is written back to the
/// registry until [`apply_update`] is called with a successful outcome.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub package: String,
    pub status: UpdateStatus,

    /// Newly collected versions, newest first.
    pub versions: Vec<String>,

    /// Version to platform-id to freshly computed content hash.
    pub hashes: BTreeMap<String, BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UpdateOutcome {
    fn terminal(package: &str, status: UpdateStatus, reason: impl Into<String>) -> Self {
        Self {
            package: package.to_string(),
            status,
            versions: Vec::new(),
            hashes: BTreeMap::new(),
            reason: Some(reason.into()),
        }
    }
}

/// Runs the update pipeline for one package: pick target versions, download
/// every applicable asset into a scratch directory, hash the contents, and
/// return the collected data.
///
/// All-or-nothing: a single failed download or hash turns the whole outcome
/// into [`UpdateStatus::Error`] and no data is returned for merging.
pub fn update_package(
    registry: &Registry,
    name: &str,
    options: &UpdateOptions,
) -> Result<UpdateOutcome> {
    update_package_with(registry, name, options, &default_factory)
}

pub fn update_package_with(
    registry: &Registry,
    name: &str,
    options: &UpdateOptions,
    factory: ProviderFactory,
) -> Result<UpdateOutcome> {
    let config = registry.package_config(name)?;

    if config.disabled {
        return Ok(UpdateOutcome::terminal(
            name,
            UpdateStatus::Skipped,
            "package is disabled",
        ));
    }

    let targets = match &options.target_version {
        Some(target) => {
            if config.versions.contains(target) && !options.force {
                return Ok(UpdateOutcome::terminal(
                    name,
                    UpdateStatus::Skipped,
                    format!("version {target} is already registered"),
                ));
            }
            vec![target.clone()]
        }
        None => {
            let provider = factory(name, config.clone())?;
            let new: Vec<String> = provider
                .discover_versions()?
                .into_iter()
                .filter(|discovered| discovered.is_new)
                .map(|discovered| discovered.version)
                .collect();

            if new.is_empty() {
                return Ok(UpdateOutcome::terminal(
                    name,
                    UpdateStatus::UpToDate,
                    "no new upstream versions",
                ));
            }
            new
        }
    };

    info!("Updating '{name}' with versions: {}", targets.join(", "));

    let mut hashes: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    if config.hash_policy == HashPolicy::Sha256 {
        // Resolve URLs through a copy of the package scoped to the targets.
        let mut scoped = config.clone();
        scoped.versions = targets.clone();
        let provider = factory(name, scoped)?;
        let assets = provider.resolve_urls()?;

        let scratch = tempfile::tempdir()?;
        for asset in &assets {
            let path = scratch
                .path()
                .join(format!("{}-{}", asset.version, asset.asset_name));

            debug!("Fetching {} for hashing", asset.url);
            let fetched: Result<String> = download_to(&asset.url, &path)
                .map_err(OpsError::from)
                .and_then(|_| calculate_checksum(&path).map_err(OpsError::from));

            match fetched {
                Ok(checksum) => {
                    hashes
                        .entry(asset.version.clone())
                        .or_default()
                        .insert(asset.platform.clone(), checksum);
                }
                Err(err) => {
                    warn!(
                        "Aborting update of '{name}': {} ({}) failed: {err}",
                        asset.version, asset.platform
                    );
                    return Ok(UpdateOutcome::terminal(
                        name,
                        UpdateStatus::Error,
                        format!(
                            "download failed for {} ({}): {err}",
                            asset.version, asset.platform
                        ),
                    ));
                }
            }
        }
    }

    Ok(UpdateOutcome {
        package: name.to_string(),
        status: UpdateStatus::Success,
        versions: targets,
        hashes,
        reason: None,
    })
}

/// Merges a successful outcome into the in-memory registry: new versions
/// are inserted at the front (head stays the latest) and hashes are
/// deep-merged per version. The caller persists with `Registry::save`.
pub fn apply_update(registry: &mut Registry, outcome: &UpdateOutcome) -> Result<()> {
    debug_assert_eq!(outcome.status, UpdateStatus::Success);
    let name = &outcome.package;
    let config = registry.package_config(name)?;
    let mut config = config.clone();

    for version in outcome.versions.iter().rev() {
        if !config.versions.contains(version) {
            config.versions.insert(0, version.clone());
        }
    }
    for (version, platforms) in &outcome.hashes {
        let slot = config.hashes.entry(version.clone()).or_default();
        for (platform, checksum) in platforms {
            slot.insert(platform.clone(), checksum.clone());
        }
    }

    registry.packages.insert(name.clone(), config);
    Ok(())
}
