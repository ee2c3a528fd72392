//! Per-package configuration as stored in the registry file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Install template names with a typed options struct.
pub const KNOWN_INSTALL_TEMPLATES: &[&str] = &["archive", "binary", "script"];

/// How downloaded artifacts are hashed during updates.
///
/// `None` opts the package out of content hashing entirely: the updater
/// downloads nothing and the generator emits a placeholder hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashPolicy {
    #[default]
    Sha256,
    None,
}

/// A fallback tag pattern, or the explicit sentinel disabling an inherited
/// one (`fallback_tag_pattern = false` in a source override).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagFallback {
    Pattern(String),
    Disabled(bool),
}

impl TagFallback {
    /// The pattern string, or `None` when this is the disable sentinel.
    pub fn as_pattern(&self) -> Option<&str> {
        match self {
            TagFallback::Pattern(pattern) => Some(pattern),
            TagFallback::Disabled(_) => None,
        }
    }
}

/// A sparse source override applying to versions at or above a threshold.
///
/// Overrides are merged in declared order; any field left unset inherits
/// from the previously resolved value, not from the package defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOverride {
    /// Versions satisfying `version >= version_ge` pick up this override.
    pub version_ge: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_tag_pattern: Option<TagFallback>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Replacement asset-template map for releases hosted here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<BTreeMap<String, String>>,

    /// Marks this override's repository as a discovery source.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub discover_from: bool,
}

/// Delegated discovery definition for direct-CDN packages that have no
/// listing API of their own, pointed at a release-hosting companion repo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCheck {
    #[serde(rename = "type", default = "default_update_check_kind")]
    pub kind: String,

    pub repo: String,
    pub tag_pattern: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_tag_pattern: Option<String>,
}

fn default_update_check_kind() -> String {
    "github".to_string()
}

/// Install-template dispatch: the `install` discriminator in the registry
/// selects the strategy, `install_config` carries its typed options.
#[derive(Debug, Clone, PartialEq)]
pub enum InstallSpec {
    /// Unpack the downloaded archive into the install prefix.
    Archive(ArchiveInstall),
    /// Install a single downloaded binary.
    Binary(BinaryInstall),
    /// Run a custom install snippet.
    Script(ScriptInstall),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveInstall {
    /// Leading path components to strip while unpacking.
    #[serde(default)]
    pub strip_dirs: u32,

    /// Subdirectory of the archive to install, when not the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryInstall {
    /// Installed filename; defaults to the package name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default = "default_binary_mode")]
    pub mode: String,
}

fn default_binary_mode() -> String {
    "0755".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptInstall {
    pub run: String,
}

/// One package entry in the registry.
///
/// `versions` is ordered with the head as the current latest; consumers
/// read `versions[0]` as "latest" and the updater only ever inserts at the
/// front. `assets` maps platform-ids to filename templates expanded with
/// `%(version)` / `%(mapped_version)` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Provider kind discriminator ("github", "direct").
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_tag_pattern: Option<TagFallback>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_check: Option<UpdateCheck>,

    /// Known versions, head = latest. Load-bearing ordering.
    #[serde(default)]
    pub versions: Vec<String>,

    /// Platform-id to asset filename template.
    #[serde(default)]
    pub assets: BTreeMap<String, String>,

    /// Semantic version to vendor release name; identity when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_map: Option<BTreeMap<String, String>>,

    /// Version to platform-ids omitted for that version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusions: Option<BTreeMap<String, Vec<String>>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_overrides: Vec<SourceOverride>,

    /// Free descriptive text carried into the generated descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,

    /// Install template name; resolved to [`InstallSpec`] on demand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_config: Option<toml::Table>,

    #[serde(default, skip_serializing_if = "is_default_hash_policy")]
    pub hash_policy: HashPolicy,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_prereleases: bool,

    /// Version to platform-id to content hash.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hashes: BTreeMap<String, BTreeMap<String, String>>,
}

fn is_default_hash_policy(policy: &HashPolicy) -> bool {
    *policy == HashPolicy::Sha256
}

impl PackageConfig {
    /// Whether the (version, platform) pair is listed in `exclusions`.
    pub fn is_excluded(&self, version: &str, platform: &str) -> bool {
        self.exclusions
            .as_ref()
            .and_then(|map| map.get(version))
            .is_some_and(|platforms| platforms.iter().any(|p| p == platform))
    }

    /// The current latest version (`versions[0]`), if any are registered.
    pub fn current_latest(&self) -> Option<&str> {
        self.versions.first().map(String::as_str)
    }

    /// The recorded hash for a (version, platform) pair.
    pub fn hash_for(&self, version: &str, platform: &str) -> Option<&str> {
        self.hashes
            .get(version)
            .and_then(|platforms| platforms.get(platform))
            .map(String::as_str)
    }

    /// Resolves the `install` / `install_config` pair into the typed
    /// [`InstallSpec`] sum type.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::UnknownInstallTemplate`] for an unrecognized
    ///   template name.
    /// * [`RegistryError::InvalidInstallConfig`] when `install_config`
    ///   does not match the template's options shape.
    pub fn install_spec(&self) -> Result<Option<InstallSpec>> {
        let Some(name) = self.install.as_deref() else {
            return Ok(None);
        };

        let config = toml::Value::Table(self.install_config.clone().unwrap_or_default());
        let invalid = |err: toml::de::Error| {
            RegistryError::InvalidInstallConfig {
                template: name.to_string(),
                source: Box::new(err),
            }
        };

        let spec = match name {
            "archive" => InstallSpec::Archive(config.try_into().map_err(invalid)?),
            "binary" => InstallSpec::Binary(config.try_into().map_err(invalid)?),
            "script" => InstallSpec::Script(config.try_into().map_err(invalid)?),
            other => {
                return Err(RegistryError::UnknownInstallTemplate {
                    name: other.to_string(),
                    known: KNOWN_INSTALL_TEMPLATES.join(", "),
                })
            }
        };

        Ok(Some(spec))
    }
}
