use std::{fs, path::Path, time::Duration};

use clap::Parser;
use cli::{Args, Commands};
use depot_dl::http::configure_http_client;
use depot_ops::{
    apply_update, check_links, check_updates, descriptor_path, generate, has_errors,
    update_package, validate, OpsError, Result as OpsResult, UpdateOptions, UpdateStatus,
};
use depot_registry::Registry;
use logging::setup_logging;
use nu_ansi_term::Color::{Green, Red, Yellow};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use utils::{Colored, COLOR};

mod cli;
mod logging;
mod utils;

fn write_report<T: Serialize>(path: Option<&Path>, value: &T) -> OpsResult<()> {
    if let Some(path) = path {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json).map_err(OpsError::Io)?;
        info!("Wrote report to {}", path.display());
    }
    Ok(())
}

fn report_issues(issues: &[depot_ops::Issue]) {
    for issue in issues {
        match issue.severity {
            depot_ops::Severity::Error => {
                error!("{}: {}", issue.package, issue.message);
            }
            depot_ops::Severity::Warning => {
                warn!("{}: {}", issue.package, issue.message);
            }
        }
    }
}

fn generate_descriptors(
    registry: &Registry,
    package: Option<&str>,
    packages_dir: &Path,
    dry_run: bool,
) -> OpsResult<usize> {
    let mut changed = 0;

    for name in registry.filter(package)? {
        let config = registry.package_config(&name)?;
        let text = generate(&name, config)?;
        let path = descriptor_path(packages_dir, &name);

        if fs::read_to_string(&path).is_ok_and(|existing| existing == text) {
            debug!("'{name}' descriptor is up to date");
            continue;
        }

        changed += 1;
        if dry_run {
            info!("Would update {}", path.display());
            continue;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(OpsError::Io)?;
        }
        fs::write(&path, text).map_err(OpsError::Io)?;
        info!("Wrote {}", path.display());
    }

    Ok(changed)
}

fn handle_cli() -> OpsResult<i32> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        let mut color = COLOR.write().unwrap();
        *color = false;
    }

    let user_agent = args.user_agent.clone();
    let timeout = args.timeout;
    configure_http_client(|config| {
        if let Some(user_agent) = user_agent {
            config.user_agent = Some(user_agent);
        }
        if let Some(secs) = timeout {
            config.timeout = Some(Duration::from_secs(secs));
        }
    });

    match args.command {
        Commands::CheckLinks { package, output } => {
            let registry = Registry::load(&args.registry)?;
            let report = check_links(&registry, package.as_deref())?;
            write_report(output.as_deref(), &report)?;

            let summary = report.summary;
            if report.all_ok() {
                info!(
                    "{} All {} links ok ({} packages skipped)",
                    Colored(Green, "✓"),
                    summary.ok,
                    summary.skipped
                );
                Ok(0)
            } else {
                for result in report.results.iter().filter(|r| !r.check.is_ok()) {
                    error!(
                        "{} {} {} ({}): {}",
                        Colored(Red, "✗"),
                        result.package,
                        result.version,
                        result.platform,
                        result.check.error.as_deref().unwrap_or("unreachable")
                    );
                }
                error!("{} of {} links failed", summary.fail, summary.total);
                Ok(1)
            }
        }
        Commands::CheckUpdates { package, output } => {
            let registry = Registry::load(&args.registry)?;
            let report = check_updates(&registry, package.as_deref())?;
            write_report(output.as_deref(), &report)?;

            for failure in &report.failures {
                warn!(
                    "{} {}: discovery failed: {}",
                    Colored(Yellow, "!"),
                    failure.package,
                    failure.error
                );
            }

            if !report.has_updates {
                info!("{} Everything is up to date", Colored(Green, "✓"));
                return Ok(0);
            }

            for updates in &report.updates {
                info!(
                    "{} {} ({} -> {}) from {}",
                    Colored(Yellow, "↑"),
                    updates.package,
                    updates.current_latest.as_deref().unwrap_or("none"),
                    updates
                        .new_versions
                        .iter()
                        .map(|v| v.version.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    updates.source
                );
            }
            Ok(0)
        }
        Commands::Validate {
            packages_dir,
            output,
        } => {
            let registry = Registry::load(&args.registry)?;
            let issues = validate(&registry, &packages_dir)?;
            write_report(output.as_deref(), &issues)?;
            report_issues(&issues);

            if has_errors(&issues) {
                Ok(1)
            } else {
                info!(
                    "{} {} packages validated",
                    Colored(Green, "✓"),
                    registry.package_names().len()
                );
                Ok(0)
            }
        }
        Commands::Generate {
            package,
            dry_run,
            packages_dir,
        } => {
            let registry = Registry::load(&args.registry)?;
            let changed =
                generate_descriptors(&registry, package.as_deref(), &packages_dir, dry_run)?;
            if changed == 0 {
                info!("{} All descriptors are up to date", Colored(Green, "✓"));
            } else if dry_run {
                info!("{changed} descriptors would change");
            }
            Ok(0)
        }
        Commands::UpdatePackage {
            package,
            target_version,
            force,
            packages_dir,
            output,
        } => {
            let mut registry = Registry::load(&args.registry)?;
            let options = UpdateOptions {
                target_version,
                force,
            };
            let outcome = update_package(&registry, &package, &options)?;
            write_report(output.as_deref(), &outcome)?;

            match outcome.status {
                UpdateStatus::Skipped | UpdateStatus::UpToDate => {
                    info!(
                        "{} {package}: {}",
                        Colored(Green, "✓"),
                        outcome.reason.as_deref().unwrap_or("nothing to do")
                    );
                    Ok(0)
                }
                UpdateStatus::Error => {
                    error!(
                        "{package}: {}",
                        outcome.reason.as_deref().unwrap_or("update failed")
                    );
                    Ok(1)
                }
                UpdateStatus::Success => {
                    apply_update(&mut registry, &outcome)?;
                    registry.save(&args.registry)?;
                    info!(
                        "{} {package} updated with: {}",
                        Colored(Green, "✓"),
                        outcome.versions.join(", ")
                    );

                    generate_descriptors(&registry, Some(&package), &packages_dir, false)?;

                    let issues: Vec<_> = validate(&registry, &packages_dir)?
                        .into_iter()
                        .filter(|issue| issue.package == package)
                        .collect();
                    report_issues(&issues);
                    if has_errors(&issues) {
                        error!("{package}: post-update validation failed");
                        Ok(1)
                    } else {
                        Ok(0)
                    }
                }
            }
        }
    }
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    let code = match handle_cli() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            1
        }
    };
    std::process::exit(code);
}
