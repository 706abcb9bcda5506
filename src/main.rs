use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pbxpatch::config::PatchConfig;
use pbxpatch::manifest::{ManifestPatcher, PathRewrite, SectionState};
use pbxpatch::{PathStyle, Project};

#[derive(Parser)]
#[command(name = "pbxpatch")]
#[command(about = "Register source files in Xcode project manifests")]
struct Cli {
    /// Config file (default: <config dir>/pbxpatch/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to project.pbxproj (falls back to PBXPATCH_MANIFEST)
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Backup is written to <manifest>.<suffix>
    #[arg(long, global = true)]
    backup_suffix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register files that exist on disk but are missing from the manifest
    Add {
        /// Files to register (default: `files` from the config)
        files: Vec<String>,

        /// Also add each file to the group mirroring its directory
        #[arg(long)]
        groups: bool,

        /// Path written into file references: as-given or file-name (with --groups, always the file name)
        #[arg(long, value_parser = parse_path_style)]
        path_style: Option<PathStyle>,

        /// Identifier of the sources build phase, if the project has several
        #[arg(long)]
        build_phase: Option<String>,

        /// Print what would be registered without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Rewrite the paths of registered file references
    Rewrite {
        /// Path (or path prefix) to replace
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Replacement path (or prefix)
        #[arg(long, requires = "from")]
        to: Option<String>,

        /// Treat --from/--to as path prefixes
        #[arg(long)]
        prefix: bool,

        /// Print the changes without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Put the backup back over the manifest
    Restore,
    /// Show the state of the sections pbxpatch edits
    Sections,
    /// Write the effective settings to the config file
    Init,
}

fn parse_path_style(s: &str) -> Result<PathStyle, String> {
    PathStyle::from_str(s).ok_or_else(|| format!("expected as-given or file-name, got {s}"))
}

/// Initialize tracing on stderr so stdout only carries command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "pbxpatch=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_project(config: &PatchConfig) -> anyhow::Result<Project> {
    Ok(Project::open(config.manifest_path()?).with_backup_suffix(config.backup_suffix.clone()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = match &cli.config {
        Some(path) => PatchConfig::load_from(path)?,
        None => PatchConfig::load(),
    };
    if let Some(manifest) = cli.manifest {
        config.manifest = Some(manifest);
    }
    if let Some(suffix) = cli.backup_suffix {
        config.backup_suffix = suffix;
    }

    match cli.command {
        Commands::Add {
            files,
            groups,
            path_style,
            build_phase,
            dry_run,
        } => {
            if !files.is_empty() {
                config.files = files;
            }
            if groups {
                config.register_groups = true;
            }
            if let Some(style) = path_style {
                config.path_style = style;
            }
            if build_phase.is_some() {
                config.build_phase = build_phase;
            }

            let project = open_project(&config)?;
            let files = config.logical_files()?;
            if files.is_empty() {
                bail!("No files to register");
            }
            let mut patcher = ManifestPatcher::new(config.patch_options()?);

            let patched = if dry_run {
                project.preview(&mut patcher, &files)?
            } else {
                let registration = project
                    .register(&mut patcher, &files)
                    .with_context(|| format!("Failed to patch {}", project.path().display()))?;
                println!("Backup written to {}", registration.commit.backup.display());
                registration.patched
            };

            let verb = if dry_run { "would add" } else { "added" };
            for registered in &patched.registered {
                println!(
                    "{verb} {} (file {}, build {})",
                    registered.path, registered.reference, registered.membership
                );
            }
            for group in &patched.groups {
                println!("{verb} group {} ({})", group.path, group.group);
            }
        }
        Commands::Rewrite {
            from,
            to,
            prefix,
            dry_run,
        } => {
            let project = open_project(&config)?;
            let rules = match (from, to) {
                (Some(from), Some(to)) if prefix => vec![PathRewrite::Prefix { from, to }],
                (Some(from), Some(to)) => vec![PathRewrite::Exact { from, to }],
                _ => config.rewrites.clone(),
            };
            if rules.is_empty() {
                bail!("No rewrite rules: pass --from/--to or set `rewrites` in the config");
            }

            let rewritten = if dry_run {
                project.preview_rewrite(&rules)?
            } else {
                let (rewritten, commit) = project
                    .rewrite(&rules)
                    .with_context(|| format!("Failed to rewrite {}", project.path().display()))?;
                if let Some(commit) = commit {
                    println!("Backup written to {}", commit.backup.display());
                }
                rewritten
            };

            for change in &rewritten.changes {
                println!("{} {} -> {}", change.reference, change.from, change.to);
            }
            if rewritten.changes.is_empty() {
                println!("No file reference paths matched");
            }
        }
        Commands::Restore => {
            let project = open_project(&config)?;
            let backup = project.restore()?;
            println!(
                "Restored {} from {}",
                project.path().display(),
                backup.display()
            );
        }
        Commands::Sections => {
            let project = open_project(&config)?;
            for (kind, state) in project.sections()? {
                let state = match state {
                    SectionState::Located { entries } => format!("{entries} entries"),
                    SectionState::Missing => "missing".to_string(),
                    SectionState::Ambiguous { count } => format!("ambiguous ({count} markers)"),
                    SectionState::OutOfOrder => "end marker before begin marker".to_string(),
                };
                println!("{:<22} {}", kind.name(), state);
            }
            let others = project.other_sections()?;
            if !others.is_empty() {
                println!("untouched: {}", others.join(", "));
            }
        }
        Commands::Init => {
            let path = match &cli.config {
                Some(path) => {
                    config.save_to(path)?;
                    path.clone()
                }
                None => config.save()?,
            };
            println!("Config written to {}", path.display());
        }
    }

    Ok(())
}
