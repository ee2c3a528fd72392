//! Deterministic registry reserialization.
//!
//! The updater rewrites the whole registry file after merging new versions,
//! so the emitted text must be stable: packages in sorted name order, a
//! fixed field order within each package, sorted keys inside nested maps,
//! and `source_overrides` kept in declared order (the one ordering that is
//! load-bearing besides `versions`). The document is built programmatically
//! from the typed model rather than through per-field string emission, which
//! is what guarantees the round-trip property.

use toml_edit::{value, Array, ArrayOfTables, DocumentMut, InlineTable, Item, Table, Value};

use crate::{
    package::{HashPolicy, PackageConfig, SourceOverride, TagFallback, UpdateCheck},
    registry::{Registry, RegistryMeta, META_KEY},
};

/// Renders the registry as deterministic TOML text.
pub fn to_toml_string(registry: &Registry) -> String {
    let mut doc = DocumentMut::new();

    if registry.meta != RegistryMeta::default() {
        doc.insert(META_KEY, Item::Table(meta_table(&registry.meta)));
    }

    for (name, config) in &registry.packages {
        doc.insert(name, Item::Table(package_table(config)));
    }

    doc.to_string()
}

fn meta_table(meta: &RegistryMeta) -> Table {
    let mut table = Table::new();
    if let Some(schema_version) = meta.schema_version {
        table.insert("schema_version", value(schema_version));
    }
    if let Some(ref description) = meta.description {
        table.insert("description", value(description.as_str()));
    }
    table
}

fn package_table(config: &PackageConfig) -> Table {
    let mut table = Table::new();

    table.insert("type", value(config.kind.as_str()));
    if config.disabled {
        table.insert("disabled", value(true));
    }
    if let Some(ref repo) = config.repo {
        table.insert("repo", value(repo.as_str()));
    }
    if let Some(ref tag_pattern) = config.tag_pattern {
        table.insert("tag_pattern", value(tag_pattern.as_str()));
    }
    if let Some(ref fallback) = config.fallback_tag_pattern {
        table.insert("fallback_tag_pattern", value(fallback_value(fallback)));
    }
    if let Some(ref base_url) = config.base_url {
        table.insert("base_url", value(base_url.as_str()));
    }
    if let Some(ref metadata) = config.metadata {
        table.insert("metadata", value(metadata.as_str()));
    }
    if let Some(ref install) = config.install {
        table.insert("install", value(install.as_str()));
    }
    if let Some(ref install_config) = config.install_config {
        table.insert(
            "install_config",
            value(inline_table_from_toml(install_config)),
        );
    }
    if config.hash_policy == HashPolicy::None {
        table.insert("hash_policy", value("none"));
    }
    if config.include_prereleases {
        table.insert("include_prereleases", value(true));
    }

    if !config.versions.is_empty() {
        let versions: Array = config.versions.iter().map(String::as_str).collect();
        table.insert("versions", value(versions));
    }

    if let Some(ref update_check) = config.update_check {
        table.insert("update_check", Item::Table(update_check_table(update_check)));
    }

    if !config.assets.is_empty() {
        table.insert("assets", Item::Table(string_map_table(&config.assets)));
    }

    if let Some(ref version_map) = config.version_map {
        table.insert("version_map", Item::Table(string_map_table(version_map)));
    }

    if let Some(ref exclusions) = config.exclusions {
        let mut exclusions_table = Table::new();
        for (version, platforms) in exclusions {
            let platforms: Array = platforms.iter().map(String::as_str).collect();
            exclusions_table.insert(version, value(platforms));
        }
        table.insert("exclusions", Item::Table(exclusions_table));
    }

    if !config.source_overrides.is_empty() {
        let mut overrides = ArrayOfTables::new();
        for entry in &config.source_overrides {
            overrides.push(override_table(entry));
        }
        table.insert("source_overrides", Item::ArrayOfTables(overrides));
    }

    if !config.hashes.is_empty() {
        let mut hashes_table = Table::new();
        hashes_table.set_implicit(true);
        for (version, platforms) in &config.hashes {
            hashes_table.insert(version, Item::Table(string_map_table(platforms)));
        }
        table.insert("hashes", Item::Table(hashes_table));
    }

    table
}

fn update_check_table(check: &UpdateCheck) -> Table {
    let mut table = Table::new();
    table.insert("type", value(check.kind.as_str()));
    table.insert("repo", value(check.repo.as_str()));
    table.insert("tag_pattern", value(check.tag_pattern.as_str()));
    if let Some(ref fallback) = check.fallback_tag_pattern {
        table.insert("fallback_tag_pattern", value(fallback.as_str()));
    }
    table
}

fn override_table(entry: &SourceOverride) -> Table {
    let mut table = Table::new();
    table.insert("version_ge", value(entry.version_ge.as_str()));
    if let Some(ref repo) = entry.repo {
        table.insert("repo", value(repo.as_str()));
    }
    if let Some(ref tag_pattern) = entry.tag_pattern {
        table.insert("tag_pattern", value(tag_pattern.as_str()));
    }
    if let Some(ref fallback) = entry.fallback_tag_pattern {
        table.insert("fallback_tag_pattern", value(fallback_value(fallback)));
    }
    if let Some(ref base_url) = entry.base_url {
        table.insert("base_url", value(base_url.as_str()));
    }
    if entry.discover_from {
        table.insert("discover_from", value(true));
    }
    if let Some(ref assets) = entry.assets {
        table.insert("assets", Item::Table(string_map_table(assets)));
    }
    table
}

fn fallback_value(fallback: &TagFallback) -> Value {
    match fallback {
        TagFallback::Pattern(pattern) => Value::from(pattern.as_str()),
        TagFallback::Disabled(flag) => Value::from(*flag),
    }
}

fn string_map_table(map: &std::collections::BTreeMap<String, String>) -> Table {
    let mut table = Table::new();
    for (key, val) in map {
        table.insert(key, value(val.as_str()));
    }
    table
}

fn inline_table_from_toml(source: &toml::Table) -> InlineTable {
    let mut inline = InlineTable::new();
    for (key, val) in source {
        inline.insert(key, toml_value_to_edit(val));
    }
    inline.sort_values();
    inline
}

fn toml_value_to_edit(source: &toml::Value) -> Value {
    match source {
        toml::Value::String(s) => Value::from(s.as_str()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => Value::from(*f),
        toml::Value::Boolean(b) => Value::from(*b),
        toml::Value::Datetime(dt) => Value::from(dt.to_string()),
        toml::Value::Array(items) => {
            let array: Array = items.iter().map(toml_value_to_edit).collect();
            Value::Array(array)
        }
        toml::Value::Table(table) => Value::InlineTable(inline_table_from_toml(table)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> Registry {
        let toml = r#"
            [meta]
            schema_version = 1
            description = "toolchain artifacts"

            [clangd]
            type = "github"
            repo = "clangd/clangd"
            tag_pattern = "%(version)"
            fallback_tag_pattern = "snapshot_%(version)"
            versions = ["19.1.2", "18.1.3"]
            install = "archive"
            install_config = { strip_dirs = 1 }

            [clangd.assets]
            windows-x86_64 = "clangd-windows-%(version).zip"
            linux-x86_64 = "clangd-linux-%(version).zip"

            [clangd.version_map]
            "19.1.2" = "19.1.2-rel1"

            [clangd.exclusions]
            "18.1.3" = ["windows-x86_64"]

            [[clangd.source_overrides]]
            version_ge = "19.0.0"
            repo = "llvm/llvm-project"
            fallback_tag_pattern = false
            discover_from = true

            [clangd.hashes."19.1.2"]
            linux-x86_64 = "11aa"
            windows-x86_64 = "22bb"

            [ninja]
            type = "direct"
            base_url = "https://cdn.example.com/ninja"
            versions = ["1.12.1"]
            hash_policy = "none"

            [ninja.update_check]
            repo = "ninja-build/ninja"
            tag_pattern = "v%(version)"

            [ninja.assets]
            linux-x86_64 = "ninja-linux-%(version).zip"
        "#;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, toml.as_bytes()).unwrap();
        Registry::load(file.path()).unwrap()
    }

    #[test]
    fn test_round_trip_no_semantic_loss() {
        let registry = sample_registry();
        let text = to_toml_string(&registry);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, text.as_bytes()).unwrap();
        let reloaded = Registry::load(file.path()).unwrap();

        assert_eq!(registry, reloaded);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let registry = sample_registry();
        assert_eq!(to_toml_string(&registry), to_toml_string(&registry));

        // A re-serialized reload is byte-stable, not just value-stable.
        let text = to_toml_string(&registry);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, text.as_bytes()).unwrap();
        let reloaded = Registry::load(file.path()).unwrap();
        assert_eq!(text, to_toml_string(&reloaded));
    }

    #[test]
    fn test_disable_sentinel_survives_round_trip() {
        let registry = sample_registry();
        let text = to_toml_string(&registry);
        assert!(text.contains("fallback_tag_pattern = false"));
    }

    #[test]
    fn test_empty_meta_is_omitted() {
        let mut registry = sample_registry();
        registry.meta = RegistryMeta::default();
        let text = to_toml_string(&registry);
        assert!(!text.contains("[meta]"));
    }
}
