use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use classflow_fix::backup::{self, BackupError, RestoreResult, Transaction};
use classflow_fix::config::{apply_target, load, PatchConfig};
use classflow_fix::locate::{locate, LocateError, Located};
use classflow_fix::report;
use classflow_fix::safety::WorkspaceGuard;
use colored::Colorize;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Environment variable naming the frontend directory when `--dir` is absent.
const DIR_ENV: &str = "CLASSFLOW_FRONTEND_DIR";

#[derive(Parser)]
#[command(name = "classflow-fix")]
#[command(
    about = "Wire the assignments and grades tabs into the ClassFlow frontend",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Default)]
struct TargetArgs {
    /// Frontend directory holding app.js (defaults to the current directory)
    #[arg(short = 'C', long)]
    dir: Option<PathBuf>,

    /// Patch config to use instead of the built-in one
    #[arg(short, long)]
    patches: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch files in place, keeping .backup copies (default)
    Apply {
        #[command(flatten)]
        target: TargetArgs,

        /// Dry run - show what would change without touching files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Report which patches would apply, without touching files
    Status {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Move .backup files back over the patched files
    Restore {
        #[command(flatten)]
        target: TargetArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Apply {
        target: TargetArgs::default(),
        dry_run: false,
        diff: false,
    });

    match command {
        Commands::Apply {
            target,
            dry_run,
            diff,
        } => cmd_apply(target, dry_run, diff),

        Commands::Status { target } => cmd_status(target),

        Commands::Restore { target } => cmd_restore(target),
    }
}

/// Resolve the frontend directory.
///
/// Priority order:
/// 1. Explicit --dir flag
/// 2. CLASSFLOW_FRONTEND_DIR environment variable
/// 3. Current directory
fn resolve_dir(cli_dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_dir {
        return Ok(path);
    }

    if let Ok(env_path) = env::var(DIR_ENV) {
        let path = PathBuf::from(&env_path);
        if path.is_dir() {
            return Ok(path);
        }
        eprintln!(
            "{}",
            format!("Warning: {DIR_ENV} is set but is not a directory: {env_path}").yellow()
        );
    }

    env::current_dir().context("cannot determine the current directory")
}

/// Load the patch config and guard for `target`.
fn prepare(target: TargetArgs) -> Result<(PatchConfig, WorkspaceGuard)> {
    let config = load(target.patches.as_deref())?;
    let dir = resolve_dir(target.dir)?;
    let guard = WorkspaceGuard::new(&dir)
        .with_context(|| format!("cannot open directory {}", dir.display()))?;
    Ok((config, guard))
}

/// Run the precondition check, exiting with status 1 when the primary file
/// is missing.
fn locate_or_exit<'a>(guard: &WorkspaceGuard, config: &'a PatchConfig) -> Result<Located<'a>> {
    match locate(guard, config) {
        Ok(located) => {
            for missing in &located.missing {
                report::missing_secondary(&missing.file, &located.primary.target.file);
            }
            Ok(located)
        }
        Err(LocateError::MissingPrimary { .. }) => {
            let file = config.primary().map(|t| t.file.as_str()).unwrap_or("app.js");
            report::missing_primary(file);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_apply(target: TargetArgs, dry_run: bool, show_diff: bool) -> Result<()> {
    let (config, guard) = prepare(target)?;
    report::banner(&config.meta);

    let located = locate_or_exit(&guard, &config)?;

    // 1. Patch every present target in memory
    let mut outputs = Vec::new();
    for found in located.present() {
        let original = fs::read_to_string(&found.path)
            .with_context(|| format!("failed to read {}", found.path.display()))?;

        report::patching(&found.target.file);
        let patched = apply_target(found.target, &original)?;
        for (patch_id, result) in &patched.results {
            report::patch_result(patch_id, result);
        }
        report::patched(&found.target.file, patched.changed());

        if show_diff && patched.changed() {
            report::display_diff(&found.path, &original, &patched.text);
        }

        outputs.push((found, patched));
    }

    if dry_run {
        report::dry_run();
        return Ok(());
    }

    // 2. Stage all writes, then back up and swap in one go
    let mut tx = Transaction::new();
    for (found, patched) in &outputs {
        if let Err(err) = tx.stage(&found.path, &patched.text) {
            return fail_backup(err);
        }
    }

    report::backing_up();
    let committed = match tx.commit() {
        Ok(committed) => committed,
        Err(err) => return fail_backup(err),
    };

    let files: Vec<&str> = outputs
        .iter()
        .map(|(found, _)| found.target.file.as_str())
        .collect();

    for file in &files {
        report::backed_up(&format!("{file}{}", backup::BACKUP_SUFFIX));
    }
    for (file, done) in files.iter().zip(&committed) {
        report::written(file, done.bytes);
    }

    report::summary(&config.meta, &files);
    Ok(())
}

fn fail_backup(err: BackupError) -> Result<()> {
    if let BackupError::BackupExists { backup } = &err {
        report::backup_exists(backup);
        std::process::exit(1);
    }
    Err(err.into())
}

fn cmd_status(target: TargetArgs) -> Result<()> {
    let (config, guard) = prepare(target)?;

    println!("{}", "Patch Status Report".bold());
    println!("Directory: {}", guard.workspace_root().display());

    let located = locate_or_exit(&guard, &config)?;

    for found in located.present() {
        let original = fs::read_to_string(&found.path)
            .with_context(|| format!("failed to read {}", found.path.display()))?;

        report::patching(&found.target.file);
        let patched = apply_target(found.target, &original)?;
        for (patch, (patch_id, result)) in found.target.patches.iter().zip(&patched.results) {
            report::patch_result(patch_id, result);
            if let Some(description) = &patch.description {
                report::patch_description(description);
            }
        }

        let backup = backup::backup_path(&found.path);
        if backup.exists() {
            println!("   {}", format!("backup present: {}", backup.display()).dimmed());
        }
    }

    Ok(())
}

fn cmd_restore(target: TargetArgs) -> Result<()> {
    let (config, guard) = prepare(target)?;

    let mut restored = 0;
    for def in &config.targets {
        let path = guard.resolve(&def.file);
        let backup = backup::backup_path(&path);
        if backup.exists() {
            guard.validate_path(&backup)?;
        }

        match backup::restore(&path)? {
            RestoreResult::Restored { .. } => {
                report::restored(&def.file);
                restored += 1;
            }
            RestoreResult::NoBackup { .. } => report::no_backup(&def.file),
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} restored", format!("{restored}").green());

    Ok(())
}
