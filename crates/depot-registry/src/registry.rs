//! Loading and querying the registry file.

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{ErrorContext, RegistryError, Result},
    package::PackageConfig,
    serialize,
};

/// Reserved top-level key carrying registry-wide metadata; never a package.
pub const META_KEY: &str = "meta";

/// Schema versions this build knows how to load.
pub const SUPPORTED_SCHEMA_VERSIONS: &[i64] = &[1];

/// Registry-wide metadata under the reserved [`META_KEY`] table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    meta: RegistryMeta,

    #[serde(flatten)]
    packages: BTreeMap<String, PackageConfig>,
}

/// The loaded registry: ordered, versioned mapping from package name to
/// [`PackageConfig`].
///
/// Constructed by [`Registry::load`] and read-only for checking, validation,
/// and generation. The updater mutates an in-memory copy and reserializes
/// the whole file through [`Registry::save`]; the file is the single source
/// of truth, there is no separate persisted cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    pub meta: RegistryMeta,
    pub packages: BTreeMap<String, PackageConfig>,
}

impl Registry {
    /// Loads and validates the registry from `path`.
    ///
    /// Fails if the file is missing or unreadable, if it does not parse as
    /// TOML matching the expected shape, or if `schema_version` is present
    /// and outside [`SUPPORTED_SCHEMA_VERSIONS`]. No partially loaded
    /// registry is ever returned.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading registry file {}", path.display()))?;

        let file: RegistryFile = toml::from_str(&content)?;

        if let Some(found) = file.meta.schema_version {
            if !SUPPORTED_SCHEMA_VERSIONS.contains(&found) {
                return Err(RegistryError::UnsupportedSchemaVersion {
                    found,
                    supported: SUPPORTED_SCHEMA_VERSIONS.to_vec(),
                });
            }
        }

        debug!(
            "Loaded registry from {} ({} packages)",
            path.display(),
            file.packages.len()
        );

        Ok(Self {
            meta: file.meta,
            packages: file.packages,
        })
    }

    /// Sorted package names, excluding the reserved metadata key.
    pub fn package_names(&self) -> Vec<String> {
        self.packages.keys().cloned().collect()
    }

    /// Looks up one package.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::ReservedName`] for the metadata key.
    /// * [`RegistryError::PackageNotFound`] for unknown names.
    pub fn package_config(&self, name: &str) -> Result<&PackageConfig> {
        if name == META_KEY {
            return Err(RegistryError::ReservedName {
                name: name.to_string(),
            });
        }

        self.packages.get(name).ok_or_else(|| {
            RegistryError::PackageNotFound {
                name: name.to_string(),
            }
        })
    }

    /// Names selected by an optional package filter: `[name]` after an
    /// existence check, or all names when no filter is given.
    pub fn filter(&self, name: Option<&str>) -> Result<Vec<String>> {
        match name {
            Some(name) => {
                self.package_config(name)?;
                Ok(vec![name.to_string()])
            }
            None => Ok(self.package_names()),
        }
    }

    /// Renders the registry as deterministic TOML text.
    ///
    /// Re-running on an unchanged registry produces byte-identical output;
    /// key order is normalized but no data is dropped.
    pub fn serialize(&self) -> String {
        serialize::to_toml_string(self)
    }

    /// Reserializes the whole registry back to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.serialize())
            .with_context(|| format!("writing registry file {}", path.display()))?;
        debug!("Wrote registry to {}", path.display());
        Ok(())
    }
}
