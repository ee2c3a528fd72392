//! Deterministic package descriptor generation.
//!
//! A descriptor is a Lua-flavored build recipe derived entirely from the
//! package's registry entry. Generation is pure: the same entry always
//! renders byte-identical text, so descriptors can be regenerated wholesale
//! and diffed.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use depot_registry::{
    resolve_source, HashPolicy, InstallSpec, PackageConfig, RegistryError, ResolvedSource,
};

use crate::{
    error::{OpsError, Result},
    platform::{self, Host, Platform},
};

/// Placeholder emitted when no content hash applies.
pub const HASH_PLACEHOLDER: &str = "SKIP";

const LEGACY_COMMENT: &str = "-- compatibility fallback for older releases";

/// The descriptor file location for a package:
/// `<dir>/<first-char>/<name>/package.lua`.
pub fn descriptor_path(dir: &Path, name: &str) -> PathBuf {
    let shard = name
        .chars()
        .next()
        .map(|c| c.to_ascii_lowercase().to_string())
        .unwrap_or_default();
    dir.join(shard).join(name).join("package.lua")
}

/// Renders the descriptor for one package entry.
///
/// # Errors
///
/// * [`OpsError::UnknownPlatform`] for a platform-id outside the known set.
/// * [`OpsError::MissingInstallSpec`] when the entry has no `install`.
/// * Configuration errors when a version resolves to no usable source.
pub fn generate(name: &str, config: &PackageConfig) -> Result<String> {
    let install = config
        .install_spec()?
        .ok_or_else(|| OpsError::MissingInstallSpec {
            package: name.to_string(),
        })?;

    let mut out = String::new();
    push_line(&mut out, 0, &format!("package(\"{}\")", lua_escape(name)));

    if let Some(metadata) = &config.metadata {
        push_line(
            &mut out,
            1,
            &format!("set_description(\"{}\")", lua_escape(metadata)),
        );
    }

    let grouped = platforms_by_host(name, config)?;
    if !grouped.is_empty() {
        out.push('\n');
        for (index, (host, platforms)) in grouped.iter().enumerate() {
            emit_host_branch(&mut out, name, config, index, *host, platforms)?;
        }
        push_line(&mut out, 1, "end");
    }

    out.push('\n');
    emit_install_block(&mut out, name, &install);

    Ok(out)
}

/// The union of platform-ids across the default assets and every
/// override's assets, grouped by host in fixed emission order.
fn platforms_by_host(
    name: &str,
    config: &PackageConfig,
) -> Result<Vec<(Host, Vec<Platform>)>> {
    let mut ids: BTreeSet<&str> = config.assets.keys().map(String::as_str).collect();
    for entry in &config.source_overrides {
        if let Some(assets) = &entry.assets {
            ids.extend(assets.keys().map(String::as_str));
        }
    }

    let mut platforms = Vec::new();
    for id in ids {
        platforms.push(platform::lookup(name, id)?);
    }

    let mut grouped = Vec::new();
    for host in Host::ALL {
        let mut members: Vec<Platform> = platforms
            .iter()
            .copied()
            .filter(|platform| platform.host == host)
            .collect();
        if members.is_empty() {
            continue;
        }
        // Arch-specific branches first, the agnostic default last.
        members.sort_by_key(|platform| (platform.arch.is_none(), platform.id));
        grouped.push((host, members));
    }

    Ok(grouped)
}

fn emit_host_branch(
    out: &mut String,
    name: &str,
    config: &PackageConfig,
    index: usize,
    host: Host,
    platforms: &[Platform],
) -> Result<()> {
    let keyword = if index == 0 { "if" } else { "elseif" };
    push_line(out, 1, &format!("{keyword} is_host(\"{}\") then", host.name()));

    let (specific, agnostic): (Vec<&Platform>, Vec<&Platform>) =
        platforms.iter().partition(|platform| platform.arch.is_some());

    if specific.is_empty() {
        for platform in &agnostic {
            emit_platform_body(out, name, config, platform.id, 2)?;
        }
    } else {
        for (index, platform) in specific.iter().enumerate() {
            let keyword = if index == 0 { "if" } else { "elseif" };
            let arch = platform.arch.unwrap_or_default();
            push_line(out, 2, &format!("{keyword} is_arch(\"{arch}\") then"));
            emit_platform_body(out, name, config, platform.id, 3)?;
        }
        if !agnostic.is_empty() {
            push_line(out, 2, "else");
            for platform in &agnostic {
                emit_platform_body(out, name, config, platform.id, 3)?;
            }
        }
        push_line(out, 2, "end");
    }

    Ok(())
}

/// Versions grouped by distinct resolved source, in first-appearance order
/// (head first). Each group emits its URL template once, then one
/// `add_version` per member.
fn emit_platform_body(
    out: &mut String,
    name: &str,
    config: &PackageConfig,
    platform_id: &str,
    indent: usize,
) -> Result<()> {
    let mut groups: Vec<(ResolvedSource, Vec<&str>)> = Vec::new();
    for version in &config.versions {
        if config.is_excluded(version, platform_id) {
            continue;
        }
        let source = resolve_source(config, version);
        match groups.iter_mut().find(|(existing, _)| *existing == source) {
            Some((_, members)) => members.push(version),
            None => groups.push((source, vec![version])),
        }
    }

    let mut emitted = 0;
    for (source, versions) in &groups {
        // This source hosts no asset for the platform.
        let Some(asset_template) = source.assets.get(platform_id) else {
            continue;
        };

        if emitted > 0 {
            push_line(out, indent, LEGACY_COMMENT);
        }
        emitted += 1;

        let asset = render_template(asset_template);
        if let Some(repo) = source.repo.as_deref() {
            let tag_template = source.tag_pattern.as_deref().ok_or_else(|| {
                RegistryError::Custom(format!(
                    "package '{name}' resolves no tag_pattern for version {}",
                    versions[0]
                ))
            })?;
            push_add_url(out, indent, repo, &render_template(tag_template), &asset);
            if let Some(fallback) = source.fallback_tag_pattern.as_deref() {
                push_add_url(out, indent, repo, &render_template(fallback), &asset);
            }
        } else if let Some(base_url) = source.base_url.as_deref() {
            let base = render_template(base_url);
            let base = base.trim_end_matches('/');
            push_line(
                out,
                indent,
                &format!("add_url(\"{}\")", lua_escape(&format!("{base}/{asset}"))),
            );
        } else {
            return Err(OpsError::Registry(RegistryError::Custom(format!(
                "package '{name}' resolves no source for version {}",
                versions[0]
            ))));
        }

        for version in versions {
            let hash = match config.hash_policy {
                HashPolicy::None => HASH_PLACEHOLDER,
                HashPolicy::Sha256 => config
                    .hash_for(version, platform_id)
                    .unwrap_or(HASH_PLACEHOLDER),
            };
            push_line(
                out,
                indent,
                &format!(
                    "add_version(\"{}\", \"{}\")",
                    lua_escape(version),
                    lua_escape(hash)
                ),
            );
        }
    }

    Ok(())
}

fn emit_install_block(out: &mut String, name: &str, install: &InstallSpec) {
    push_line(out, 1, "on_install(function (package)");
    match install {
        InstallSpec::Archive(opts) => {
            push_line(out, 2, "import(\"utils.archive\")");
            let mut options = format!("strip_dirs = {}", opts.strip_dirs);
            if let Some(subdir) = &opts.subdir {
                options.push_str(&format!(", subdir = \"{}\"", lua_escape(subdir)));
            }
            push_line(
                out,
                2,
                &format!(
                    "archive.extract(package:originfile(), package:installdir(), {{{options}}})"
                ),
            );
        }
        InstallSpec::Binary(opts) => {
            let target = opts.target.as_deref().unwrap_or(name);
            push_line(
                out,
                2,
                &format!(
                    "local target = path.join(package:installdir(), \"bin\", \"{}\")",
                    lua_escape(target)
                ),
            );
            push_line(out, 2, "os.cp(package:originfile(), target)");
            push_line(out, 2, &format!("os.chmod(target, \"{}\")", lua_escape(&opts.mode)));
        }
        InstallSpec::Script(opts) => {
            for line in opts.run.lines() {
                push_line(out, 2, line);
            }
        }
    }
    push_line(out, 1, "end)");
}

fn push_add_url(out: &mut String, indent: usize, repo: &str, tag: &str, asset: &str) {
    let url = format!("https://github.com/{repo}/releases/download/{tag}/{asset}");
    push_line(out, indent, &format!("add_url(\"{}\")", lua_escape(&url)));
}

/// Registry placeholders become the descriptor's own version placeholder.
fn render_template(template: &str) -> String {
    template
        .replace("%(version)", "$(version)")
        .replace("%(mapped_version)", "$(version)")
}

fn lua_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn push_line(out: &mut String, indent: usize, line: &str) {
    for _ in 0..indent {
        out.push_str("    ");
    }
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> PackageConfig {
        toml::from_str(toml).unwrap()
    }

    fn sample() -> PackageConfig {
        config(
            r#"
                type = "github"
                repo = "clangd/clangd"
                tag_pattern = "%(version)"
                versions = ["19.1.2", "18.1.3"]
                install = "archive"
                install_config = { strip_dirs = 1 }
                metadata = "clangd language server"

                [assets]
                windows-x86_64 = "clangd-windows-%(version).zip"
                linux-x86_64 = "clangd-linux-%(version).zip"
                macosx-universal = "clangd-mac-%(version).zip"

                [hashes."19.1.2"]
                windows-x86_64 = "aa11"
                linux-x86_64 = "bb22"
            "#,
        )
    }

    #[test]
    fn test_generate_is_deterministic() {
        let cfg = sample();
        let first = generate("clangd", &cfg).unwrap();
        let second = generate("clangd", &cfg).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_header_and_hosts() {
        let text = generate("clangd", &sample()).unwrap();
        assert!(text.starts_with("package(\"clangd\")\n"));
        assert!(text.contains("set_description(\"clangd language server\")"));

        // Hosts in fixed order, first `if`, later `elseif`.
        let windows = text.find("if is_host(\"windows\")").unwrap();
        let linux = text.find("elseif is_host(\"linux\")").unwrap();
        let macosx = text.find("elseif is_host(\"macosx\")").unwrap();
        assert!(windows < linux && linux < macosx);
    }

    #[test]
    fn test_generate_arch_dispatch() {
        let text = generate("clangd", &sample()).unwrap();
        assert!(text.contains("if is_arch(\"x64\") then"));
        assert!(text.contains("if is_arch(\"x86_64\") then"));
        // macosx-universal is architecture-agnostic: no arch condition.
        let macosx_branch = &text[text.find("elseif is_host(\"macosx\")").unwrap()..];
        assert!(!macosx_branch.contains("is_arch"));
    }

    #[test]
    fn test_generate_versions_and_hashes() {
        let text = generate("clangd", &sample()).unwrap();
        assert!(text.contains(
            "add_url(\"https://github.com/clangd/clangd/releases/download/$(version)/clangd-linux-$(version).zip\")"
        ));
        assert!(text.contains("add_version(\"19.1.2\", \"bb22\")"));
        // Unrecorded hashes fall back to the placeholder.
        assert!(text.contains("add_version(\"18.1.3\", \"SKIP\")"));
    }

    #[test]
    fn test_generate_source_groups_with_legacy_comment() {
        let cfg = config(
            r#"
                type = "github"
                repo = "clangd/clangd"
                tag_pattern = "%(version)"
                versions = ["19.1.2", "18.1.3"]
                install = "archive"
                install_config = {}

                [assets]
                linux-x86_64 = "clangd-linux-%(version).zip"

                [[source_overrides]]
                version_ge = "19.0.0"
                repo = "llvm/llvm-project"
                tag_pattern = "llvmorg-%(version)"
            "#,
        );
        let text = generate("clangd", &cfg).unwrap();

        let new_url = text
            .find("https://github.com/llvm/llvm-project/releases/download/llvmorg-$(version)/")
            .unwrap();
        let comment = text.find(LEGACY_COMMENT).unwrap();
        let old_url = text
            .find("https://github.com/clangd/clangd/releases/download/$(version)/")
            .unwrap();
        assert!(new_url < comment && comment < old_url);
    }

    #[test]
    fn test_generate_respects_exclusions() {
        let cfg = config(
            r#"
                type = "github"
                repo = "a/b"
                tag_pattern = "v%(version)"
                versions = ["2.0", "1.0"]
                install = "archive"
                install_config = {}

                [assets]
                linux-x86_64 = "t-linux-%(version).zip"
                windows-x86_64 = "t-windows-%(version).zip"

                [exclusions]
                "1.0" = ["windows-x86_64"]
            "#,
        );
        let text = generate("tool", &cfg).unwrap();

        let windows_branch =
            &text[text.find("is_host(\"windows\")").unwrap()..text.find("is_host(\"linux\")").unwrap()];
        assert!(windows_branch.contains("add_version(\"2.0\""));
        assert!(!windows_branch.contains("add_version(\"1.0\""));

        let linux_branch = &text[text.find("is_host(\"linux\")").unwrap()..];
        assert!(linux_branch.contains("add_version(\"1.0\""));
    }

    #[test]
    fn test_generate_hash_policy_none() {
        let cfg = config(
            r#"
                type = "direct"
                base_url = "https://cdn.example.com/ninja/v%(version)"
                versions = ["1.12.1"]
                hash_policy = "none"
                install = "binary"
                install_config = { target = "ninja" }

                [assets]
                linux-x86_64 = "ninja-linux.zip"
            "#,
        );
        let text = generate("ninja", &cfg).unwrap();
        assert!(text.contains(
            "add_url(\"https://cdn.example.com/ninja/v$(version)/ninja-linux.zip\")"
        ));
        assert!(text.contains("add_version(\"1.12.1\", \"SKIP\")"));
    }

    #[test]
    fn test_generate_install_blocks() {
        let archive = generate("clangd", &sample()).unwrap();
        assert!(archive.contains("on_install(function (package)"));
        assert!(archive.contains(
            "archive.extract(package:originfile(), package:installdir(), {strip_dirs = 1})"
        ));

        let cfg = config(
            r#"
                type = "github"
                repo = "a/b"
                tag_pattern = "v%(version)"
                versions = ["1.0"]
                install = "binary"
                install_config = { mode = "0755" }

                [assets]
                linux-x86_64 = "tool"
            "#,
        );
        let binary = generate("tool", &cfg).unwrap();
        assert!(binary.contains(
            "local target = path.join(package:installdir(), \"bin\", \"tool\")"
        ));
        assert!(binary.contains("os.chmod(target, \"0755\")"));

        let cfg = config(
            r#"
                type = "github"
                repo = "a/b"
                tag_pattern = "v%(version)"
                versions = ["1.0"]
                install = "script"
                install_config = { run = "os.exec(\"./setup.sh\")" }

                [assets]
                linux-x86_64 = "tool.tar.gz"
            "#,
        );
        let script = generate("tool", &cfg).unwrap();
        assert!(script.contains("os.exec(\"./setup.sh\")"));
    }

    #[test]
    fn test_generate_without_install_fails() {
        let cfg = config(
            r#"
                type = "github"
                repo = "a/b"
                tag_pattern = "v%(version)"
                versions = ["1.0"]

                [assets]
                linux-x86_64 = "tool.tar.gz"
            "#,
        );
        assert!(matches!(
            generate("tool", &cfg),
            Err(OpsError::MissingInstallSpec { .. })
        ));
    }

    #[test]
    fn test_generate_unknown_platform_fails() {
        let cfg = config(
            r#"
                type = "github"
                repo = "a/b"
                tag_pattern = "v%(version)"
                versions = ["1.0"]
                install = "archive"
                install_config = {}

                [assets]
                beos-ppc = "tool.tar.gz"
            "#,
        );
        assert!(matches!(
            generate("tool", &cfg),
            Err(OpsError::UnknownPlatform { .. })
        ));
    }

    #[test]
    fn test_descriptor_path_convention() {
        let path = descriptor_path(Path::new("/packages"), "clangd");
        assert_eq!(
            path,
            Path::new("/packages").join("c").join("clangd").join("package.lua")
        );
    }
}
