use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::LevelFilter;
use lv_helper_patch::{
    patch, target_patterns, BuildEnv, FileOutcome, HookConfig, Overrides, Patcher, RuleStatus,
};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lv-helper-patch")]
#[command(about = "Rename the conflicting lv_tick_get_cb in LilyGo's LV_Helper_v9.cpp", long_about = None)]
#[command(version)]
struct Cli {
    /// PlatformIO project root (auto-detected from platformio.ini if not specified)
    #[arg(short, long, global = true)]
    project_dir: Option<PathBuf>,

    /// Dependency cache directory (default: $PLATFORMIO_LIBDEPS_DIR or .pio/libdeps)
    #[arg(long, global = true)]
    libdeps_dir: Option<PathBuf>,

    /// Build output directory (default: $PLATFORMIO_BUILD_DIR or .pio/build)
    #[arg(long, global = true)]
    build_dir: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch every LV_Helper_v9.cpp found (the default)
    Apply {
        /// Dry run - report what would be patched without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Report whether each LV_Helper_v9.cpp is patched, without modifying files
    Status {
        /// Exit with status 1 if any file still needs patching
        #[arg(long)]
        check: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = env::current_dir().context("failed to determine current directory")?;
    let overrides = Overrides {
        project_dir: cli.project_dir,
        libdeps_dir: cli.libdeps_dir,
        build_dir: cli.build_dir,
    };
    let config = HookConfig::resolve(overrides, &BuildEnv::from_env(), &cwd);

    match cli.command.unwrap_or(Commands::Apply {
        dry_run: false,
        diff: false,
    }) {
        Commands::Apply { dry_run, diff } => cmd_apply(&config, dry_run, diff),
        Commands::Status { check } => cmd_status(&config, check),
    }
}

/// Logs go to stderr; stdout carries only the `[patch]` notices.
fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn cmd_apply(config: &HookConfig, dry_run: bool, show_diff: bool) -> Result<()> {
    let patterns = target_patterns(&config.libdeps_dir, &config.build_dir);

    // Plain hook run: one runner invocation per tree, notices on stdout.
    if !dry_run && !show_diff {
        for pattern in patterns {
            patch([&pattern])
                .with_context(|| format!("failed to patch files matching {pattern}"))?;
        }
        return Ok(());
    }

    let patcher = Patcher::default().dry_run(dry_run);
    let stdout = io::stdout();
    let mut notices = stdout.lock();

    for pattern in patterns {
        let report = patcher
            .patch_pattern(&pattern, &mut notices)
            .with_context(|| format!("failed to patch files matching {pattern}"))?;

        if show_diff {
            for outcome in &report.outcomes {
                if let FileOutcome::Patched {
                    file,
                    original,
                    patched,
                } = outcome
                {
                    display_diff(file, original, patched);
                }
            }
        }
    }

    Ok(())
}

fn cmd_status(config: &HookConfig, check: bool) -> Result<()> {
    let patcher = Patcher::default();

    println!("{}", "LV_Helper_v9.cpp Status".bold());
    println!("Project: {}", config.project_dir.display());
    println!();

    let mut unpatched = 0;
    let mut total = 0;

    for pattern in target_patterns(&config.libdeps_dir, &config.build_dir) {
        let statuses = patcher
            .status(&pattern)
            .with_context(|| format!("failed to inspect files matching {pattern}"))?;

        for (file, status) in statuses {
            total += 1;
            match status {
                RuleStatus::Patched => {
                    println!("{} {}", "✓ patched   ".green(), file.display());
                }
                RuleStatus::Unpatched => {
                    println!("{} {}", "⊙ unpatched ".yellow(), file.display());
                    unpatched += 1;
                }
                RuleStatus::Unaffected => {
                    println!("{} {}", "⊘ unaffected".cyan(), file.display());
                }
            }
        }
    }

    if total == 0 {
        println!("{}", "No LV_Helper_v9.cpp found".dimmed());
    }

    if check && unpatched > 0 {
        eprintln!(
            "{}",
            format!("{unpatched} file(s) still need patching").red()
        );
        std::process::exit(1);
    }

    Ok(())
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => continue,
        };
        print!("{}", sign);
    }
}
