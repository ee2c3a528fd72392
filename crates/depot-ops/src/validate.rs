//! Registry / descriptor consistency checking.

use std::{collections::BTreeSet, fs, path::Path, sync::LazyLock};

use depot_registry::{resolve_source, Registry};
use regex::Regex;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::{error::Result, generate::descriptor_path};

static ADD_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"add_version\("([^"]+)""#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One consistency finding.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub package: String,
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    fn error(package: &str, message: impl Into<String>) -> Self {
        Self {
            package: package.to_string(),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(package: &str, message: impl Into<String>) -> Self {
        Self {
            package: package.to_string(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Whether any issue is severe enough to fail validation.
pub fn has_errors(issues: &[Issue]) -> bool {
    issues.iter().any(|issue| issue.severity == Severity::Error)
}

/// Cross-checks every registry package against its generated descriptor.
///
/// Findings accumulate; nothing short-circuits the run except a missing
/// descriptor, which stops further checks for that package only.
pub fn validate(registry: &Registry, descriptors_dir: &Path) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    for name in registry.package_names() {
        let config = registry.package_config(&name)?;
        let path = descriptor_path(descriptors_dir, &name);

        let Ok(content) = fs::read_to_string(&path) else {
            issues.push(Issue::error(
                &name,
                format!("descriptor missing at {}", path.display()),
            ));
            continue;
        };
        debug!("Validating '{name}' against {}", path.display());

        let descriptor_versions: BTreeSet<&str> = ADD_VERSION_RE
            .captures_iter(&content)
            .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
            .collect();

        for version in &config.versions {
            if !descriptor_versions.contains(version.as_str()) {
                issues.push(Issue::error(
                    &name,
                    format!("version {version} is registered but absent from the descriptor"),
                ));
            }
        }
        for version in &descriptor_versions {
            if !config.versions.iter().any(|v| v == version) {
                issues.push(Issue::warning(
                    &name,
                    format!("descriptor lists version {version} that is not registered"),
                ));
            }
        }

        // Each distinct source must leave a recognizable anchor in the text.
        let mut anchors = BTreeSet::new();
        for version in &config.versions {
            let source = resolve_source(config, version);
            if let Some(repo) = source.repo.as_deref() {
                anchors.insert(repo.to_string());
            } else if let Some(base_url) = source.base_url.as_deref() {
                let anchor = Url::parse(base_url)
                    .ok()
                    .and_then(|url| url.host_str().map(String::from))
                    .unwrap_or_else(|| base_url.to_string());
                anchors.insert(anchor);
            }
        }
        for anchor in anchors {
            if !content.contains(&anchor) {
                issues.push(Issue::warning(
                    &name,
                    format!("descriptor does not reference source '{anchor}'"),
                ));
            }
        }
    }

    Ok(issues)
}
