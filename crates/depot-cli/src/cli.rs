use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to the registry file
    #[arg(short, long, global = true, default_value = "registry.toml", value_hint = ValueHint::FilePath)]
    pub registry: PathBuf,

    /// Set user agent
    #[arg(required = false, long, short = 'A', global = true)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds
    #[arg(required = false, long, short = 'T', global = true)]
    pub timeout: Option<u64>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify that every download link still resolves upstream
    #[clap(name = "check-links", visible_alias = "cl")]
    CheckLinks {
        /// Restrict the check to one package
        #[arg(required = false, short, long)]
        package: Option<String>,

        /// Write the JSON report to a file
        #[arg(required = false, short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Discover upstream versions newer than the registered set
    #[clap(name = "check-updates", visible_alias = "cu")]
    CheckUpdates {
        /// Restrict discovery to one package
        #[arg(required = false, short, long)]
        package: Option<String>,

        /// Write the JSON report to a file
        #[arg(required = false, short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Cross-check generated descriptors against the registry
    Validate {
        /// Directory holding the generated descriptors
        #[arg(short = 'd', long, default_value = "packages", value_hint = ValueHint::DirPath)]
        packages_dir: PathBuf,

        /// Write the JSON report to a file
        #[arg(required = false, short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Regenerate package descriptors from the registry
    Generate {
        /// Restrict generation to one package
        #[arg(required = false, short, long)]
        package: Option<String>,

        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Directory holding the generated descriptors
        #[arg(short = 'd', long, default_value = "packages", value_hint = ValueHint::DirPath)]
        packages_dir: PathBuf,
    },

    /// Discover, download, hash, and merge new versions of one package
    #[clap(name = "update-package", visible_alias = "up")]
    UpdatePackage {
        /// Package to update
        #[arg(short, long)]
        package: String,

        /// Update to this exact version instead of discovering
        #[arg(required = false, long)]
        target_version: Option<String>,

        /// Re-fetch even when the target version is already registered
        #[arg(required = false, short, long)]
        force: bool,

        /// Directory holding the generated descriptors
        #[arg(short = 'd', long, default_value = "packages", value_hint = ValueHint::DirPath)]
        packages_dir: PathBuf,

        /// Write the JSON outcome to a file
        #[arg(required = false, short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
}
