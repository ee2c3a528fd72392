//! Per-version source resolution.
//!
//! A package's default source fields plus its ordered `source_overrides`
//! project, for any given version, into exactly one [`ResolvedSource`].
//! Overrides are merged in declared order and later matching entries take
//! precedence; the projection is recomputed on demand and never persisted.

use std::collections::BTreeMap;

use depot_utils::version::version_gte;

use crate::package::{PackageConfig, TagFallback};

/// The concrete source applying to one package version.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub repo: Option<String>,
    pub tag_pattern: Option<String>,
    pub fallback_tag_pattern: Option<String>,
    pub base_url: Option<String>,

    /// The asset-template map applying to this version.
    pub assets: BTreeMap<String, String>,
}

impl ResolvedSource {
    /// A short anchor string identifying where this source lives: the
    /// repository path for release-hosted sources, the base URL otherwise.
    pub fn location(&self) -> Option<&str> {
        self.repo
            .as_deref()
            .or(self.base_url.as_deref())
    }
}

/// Resolves the source descriptor applying to `version`.
///
/// Starts from the package defaults, then for each override in declared
/// order whose `version_ge` threshold the version satisfies, overwrites the
/// candidate with the fields that override supplies. The sparse merge means
/// an absent field keeps the previously resolved value, not the ultimate
/// default. A `fallback_tag_pattern` explicitly set to the disable sentinel
/// removes the inherited fallback.
pub fn resolve_source(config: &PackageConfig, version: &str) -> ResolvedSource {
    let mut resolved = ResolvedSource {
        repo: config.repo.clone(),
        tag_pattern: config.tag_pattern.clone(),
        fallback_tag_pattern: config
            .fallback_tag_pattern
            .as_ref()
            .and_then(|f| f.as_pattern())
            .map(String::from),
        base_url: config.base_url.clone(),
        assets: config.assets.clone(),
    };

    for entry in &config.source_overrides {
        if !version_gte(version, &entry.version_ge) {
            continue;
        }

        if let Some(ref repo) = entry.repo {
            resolved.repo = Some(repo.clone());
        }
        if let Some(ref tag_pattern) = entry.tag_pattern {
            resolved.tag_pattern = Some(tag_pattern.clone());
        }
        match entry.fallback_tag_pattern {
            Some(TagFallback::Pattern(ref pattern)) => {
                resolved.fallback_tag_pattern = Some(pattern.clone());
            }
            Some(TagFallback::Disabled(_)) => {
                resolved.fallback_tag_pattern = None;
            }
            None => {}
        }
        if let Some(ref base_url) = entry.base_url {
            resolved.base_url = Some(base_url.clone());
        }
        if let Some(ref assets) = entry.assets {
            resolved.assets = assets.clone();
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> PackageConfig {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_no_overrides_yields_defaults() {
        let cfg = config(
            r#"
                type = "github"
                repo = "org/tool"
                tag_pattern = "v%(version)"
                fallback_tag_pattern = "release-%(version)"

                [assets]
                linux-x86_64 = "tool-%(version).tar.gz"
            "#,
        );

        for version in ["0.1", "19.1.5", "999.0.0"] {
            let resolved = resolve_source(&cfg, version);
            assert_eq!(resolved.repo.as_deref(), Some("org/tool"));
            assert_eq!(resolved.tag_pattern.as_deref(), Some("v%(version)"));
            assert_eq!(
                resolved.fallback_tag_pattern.as_deref(),
                Some("release-%(version)")
            );
            assert_eq!(resolved.assets.len(), 1);
        }
    }

    #[test]
    fn test_threshold_boundary() {
        let cfg = config(
            r#"
                type = "github"
                repo = "R1"
                tag_pattern = "v%(version)"

                [[source_overrides]]
                version_ge = "20.0.0"
                repo = "R2"
            "#,
        );

        assert_eq!(
            resolve_source(&cfg, "19.1.5").repo.as_deref(),
            Some("R1")
        );
        // Threshold is satisfied at equality.
        assert_eq!(
            resolve_source(&cfg, "20.0.0").repo.as_deref(),
            Some("R2")
        );
        assert_eq!(
            resolve_source(&cfg, "21.1.0").repo.as_deref(),
            Some("R2")
        );
    }

    #[test]
    fn test_sparse_merge_keeps_previously_resolved_values() {
        let cfg = config(
            r#"
                type = "github"
                repo = "R1"
                tag_pattern = "v%(version)"

                [[source_overrides]]
                version_ge = "2.0"
                repo = "R2"
                tag_pattern = "t-%(version)"

                [[source_overrides]]
                version_ge = "3.0"
                repo = "R3"
            "#,
        );

        let resolved = resolve_source(&cfg, "3.5");
        // Later override wins for repo; its absent tag_pattern inherits the
        // 2.0 override's value, not the package default.
        assert_eq!(resolved.repo.as_deref(), Some("R3"));
        assert_eq!(resolved.tag_pattern.as_deref(), Some("t-%(version)"));
    }

    #[test]
    fn test_last_matching_override_wins() {
        let cfg = config(
            r#"
                type = "github"
                repo = "R1"

                [[source_overrides]]
                version_ge = "1.0"
                repo = "early"

                [[source_overrides]]
                version_ge = "1.0"
                repo = "late"
            "#,
        );

        assert_eq!(resolve_source(&cfg, "1.5").repo.as_deref(), Some("late"));
    }

    #[test]
    fn test_fallback_disable_sentinel_removes_inherited_fallback() {
        let cfg = config(
            r#"
                type = "github"
                repo = "R1"
                tag_pattern = "v%(version)"
                fallback_tag_pattern = "old-%(version)"

                [[source_overrides]]
                version_ge = "2.0"
                fallback_tag_pattern = false
            "#,
        );

        assert_eq!(
            resolve_source(&cfg, "1.0").fallback_tag_pattern.as_deref(),
            Some("old-%(version)")
        );
        assert_eq!(resolve_source(&cfg, "2.0").fallback_tag_pattern, None);
    }

    #[test]
    fn test_override_asset_map_replaces_wholesale() {
        let cfg = config(
            r#"
                type = "github"
                repo = "R1"

                [assets]
                linux-x86_64 = "old-%(version).tar.gz"
                windows-x86_64 = "old-%(version).zip"

                [[source_overrides]]
                version_ge = "2.0"

                [source_overrides.assets]
                linux-x86_64 = "new-%(version).tar.gz"
            "#,
        );

        let resolved = resolve_source(&cfg, "2.1");
        assert_eq!(resolved.assets.len(), 1);
        assert_eq!(
            resolved.assets.get("linux-x86_64").map(String::as_str),
            Some("new-%(version).tar.gz")
        );
        // windows-x86_64 simply yields no asset for versions >= 2.0.
        assert!(!resolved.assets.contains_key("windows-x86_64"));
    }

    #[test]
    fn test_location_anchor() {
        let cfg = config(
            r#"
                type = "direct"
                base_url = "https://cdn.example.com/tool"
            "#,
        );
        let resolved = resolve_source(&cfg, "1.0");
        assert_eq!(resolved.location(), Some("https://cdn.example.com/tool"));
    }
}
