//! Provider for plain HTTP(S) hosting without a release API.

use depot_registry::{resolve_source, PackageConfig, TagFallback, UpdateCheck};
use depot_utils::template::expand;
use tracing::debug;

use crate::{
    error::{DownloadError, Result},
    factory::create_provider,
    http::Http,
    traits::{DiscoveredVersion, LinkCheck, Provider, ResolvedAsset},
};

pub struct DirectProvider {
    package: String,
    config: PackageConfig,
}

impl DirectProvider {
    pub fn new(package: impl Into<String>, config: PackageConfig) -> Self {
        Self {
            package: package.into(),
            config,
        }
    }

    /// Builds a synthetic package configuration from the `update_check`
    /// block so discovery can be delegated to the named provider.
    fn delegate_config(&self, update_check: &UpdateCheck) -> PackageConfig {
        let mut delegated = self.config.clone();
        delegated.kind = update_check.kind.clone();
        delegated.repo = Some(update_check.repo.clone());
        delegated.tag_pattern = Some(update_check.tag_pattern.clone());
        delegated.fallback_tag_pattern = update_check
            .fallback_tag_pattern
            .clone()
            .map(TagFallback::Pattern);
        delegated.update_check = None;
        delegated.source_overrides = Vec::new();
        delegated
    }
}

impl Provider for DirectProvider {
    fn resolve_urls(&self) -> Result<Vec<ResolvedAsset>> {
        let version_map = self.config.version_map.as_ref();
        let mut assets = Vec::new();

        for version in &self.config.versions {
            let source = resolve_source(&self.config, version);
            let base_url = source.base_url.as_deref().ok_or_else(|| {
                DownloadError::MissingField {
                    package: self.package.clone(),
                    field: "base_url",
                    version: version.clone(),
                }
            })?;
            let base = expand(base_url, version, version_map);
            let base = base.trim_end_matches('/');

            for (platform, template) in &source.assets {
                if self.config.is_excluded(version, platform) {
                    continue;
                }

                let asset_name = expand(template, version, version_map);
                assets.push(ResolvedAsset {
                    package: self.package.clone(),
                    version: version.clone(),
                    platform: platform.clone(),
                    url: format!("{base}/{asset_name}"),
                    tag: None,
                    asset_name,
                });
            }
        }

        Ok(assets)
    }

    fn check_link(&self, asset: &ResolvedAsset) -> LinkCheck {
        match Http::head(&asset.url) {
            Ok(resp) if resp.status().is_success() => {
                return LinkCheck::ok(Some(resp.status().as_u16()));
            }
            Ok(resp) => {
                debug!(
                    "HEAD {} returned {}, retrying with ranged GET",
                    asset.url,
                    resp.status()
                );
            }
            Err(err) => {
                debug!("HEAD {} failed ({err}), retrying with ranged GET", asset.url);
            }
        }

        // Some hosts reject HEAD outright; a one-byte ranged GET settles it.
        match Http::get_range_probe(&asset.url) {
            Ok(resp) => {
                let status = resp.status().as_u16();
                if resp.status().is_success() {
                    LinkCheck::ok(Some(status))
                } else {
                    LinkCheck::fail(Some(status), format!("HTTP {status}: {}", asset.url))
                }
            }
            Err(err) => LinkCheck::fail(None, err.to_string()),
        }
    }

    fn discover_versions(&self) -> Result<Vec<DiscoveredVersion>> {
        let Some(update_check) = self.config.update_check.clone() else {
            debug!(
                "Package '{}' has no update_check block, skipping discovery",
                self.package
            );
            return Ok(Vec::new());
        };

        let delegated = self.delegate_config(&update_check);
        let provider = create_provider(&update_check.kind, &self.package, delegated)?;
        provider.discover_versions()
    }

    fn describe_source(&self) -> String {
        format!(
            "direct:{}",
            self.config.base_url.as_deref().unwrap_or("<unset>")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> PackageConfig {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_resolve_urls_joins_base_and_asset() {
        let cfg = config(
            r#"
                type = "direct"
                base_url = "https://cdn.example.com/tool/%(version)/"
                versions = ["3.1.0"]

                [assets]
                linux-x86_64 = "tool-%(version)-linux.tar.gz"
            "#,
        );
        let provider = DirectProvider::new("tool", cfg);
        let assets = provider.resolve_urls().unwrap();

        assert_eq!(assets.len(), 1);
        assert_eq!(
            assets[0].url,
            "https://cdn.example.com/tool/3.1.0/tool-3.1.0-linux.tar.gz"
        );
        assert!(assets[0].tag.is_none());
    }

    #[test]
    fn test_resolve_urls_missing_base_url() {
        let cfg = config(
            r#"
                type = "direct"
                versions = ["1.0"]

                [assets]
                linux-x86_64 = "a.tar.gz"
            "#,
        );
        let provider = DirectProvider::new("tool", cfg);
        assert!(matches!(
            provider.resolve_urls(),
            Err(DownloadError::MissingField {
                field: "base_url",
                ..
            })
        ));
    }

    #[test]
    fn test_discover_without_update_check_is_empty() {
        let cfg = config(
            r#"
                type = "direct"
                base_url = "https://cdn.example.com/tool"
            "#,
        );
        let provider = DirectProvider::new("tool", cfg);
        assert!(provider.discover_versions().unwrap().is_empty());
    }

    #[test]
    fn test_delegate_config_carries_update_check_fields() {
        let cfg = config(
            r#"
                type = "direct"
                base_url = "https://cdn.example.com/tool"

                [update_check]
                type = "github"
                repo = "org/tool"
                tag_pattern = "v%(version)"
            "#,
        );
        let provider = DirectProvider::new("tool", cfg);
        let update_check = provider.config.update_check.clone().unwrap();
        let delegated = provider.delegate_config(&update_check);

        assert_eq!(delegated.kind, "github");
        assert_eq!(delegated.repo.as_deref(), Some("org/tool"));
        assert_eq!(delegated.tag_pattern.as_deref(), Some("v%(version)"));
        assert!(delegated.update_check.is_none());
        assert!(delegated.source_overrides.is_empty());
    }

    #[test]
    fn test_describe_source() {
        let cfg = config(
            r#"
                type = "direct"
                base_url = "https://cdn.example.com/tool"
            "#,
        );
        let provider = DirectProvider::new("tool", cfg);
        assert_eq!(
            provider.describe_source(),
            "direct:https://cdn.example.com/tool"
        );
    }
}
