use super::{colorize_outcome, display_path, json_pretty, EXIT_DRIFT, EXIT_SUCCESS};
use clap::Args;
use manisync_core::{ConfigFile, SyncConfig, SyncReport, Synchronizer};
use manisync_schema::TablePath;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Args)]
pub struct SyncArgs {
    /// Fields of the package table to copy from the root manifest.
    #[arg(value_name = "KEYS")]
    pub keys: Vec<String>,

    /// Root manifest to copy from [default: <SEARCH_ROOT>/<MANIFEST_NAME>].
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Directory searched recursively for target manifests [default: .].
    #[arg(short = 'C', long)]
    pub search_root: Option<PathBuf>,

    /// File name of the root manifest [default: Cargo.toml].
    #[arg(long)]
    pub manifest_name: Option<String>,

    /// Dotted path of the table holding the fields [default: package].
    #[arg(long)]
    pub table: Option<String>,

    /// Directory name to skip while searching (repeatable).
    #[arg(long = "exclude", value_name = "DIR")]
    pub exclude: Vec<String>,

    /// Follow symbolic links while searching.
    #[arg(long, default_value_t = false)]
    pub follow_links: bool,

    /// Configuration file [default: <SEARCH_ROOT>/manisync.toml if present].
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report what would change without writing any file.
    #[arg(short = 'n', long, default_value_t = false)]
    pub dry_run: bool,

    /// Exit non-zero if any manifest is out of sync. Implies --dry-run.
    #[arg(long, default_value_t = false)]
    pub check: bool,
}

/// Layer defaults, the config file, and command-line arguments, in that order.
pub fn build_config(args: &SyncArgs) -> Result<SyncConfig, String> {
    let mut config = SyncConfig::default();
    if let Some(dir) = &args.search_root {
        config.search_root.clone_from(dir);
    }

    let file = match &args.config {
        Some(path) => {
            let base = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
            Some((ConfigFile::load(path).map_err(|e| e.to_string())?, base))
        }
        None => ConfigFile::discover(&config.search_root)
            .map_err(|e| e.to_string())?
            .map(|f| (f, config.search_root.clone())),
    };
    if let Some((file, base)) = file {
        config.apply_file(file, &base);
    }

    if !args.keys.is_empty() {
        config.keys.clone_from(&args.keys);
    }
    if let Some(root) = &args.root {
        config.root = Some(root.clone());
    }
    if let Some(name) = &args.manifest_name {
        config.manifest_name.clone_from(name);
    }
    if let Some(table) = &args.table {
        config.table =
            TablePath::parse(table).map_err(|e| format!("config error: --table: {e}"))?;
    }
    if !args.exclude.is_empty() {
        config.exclude.clone_from(&args.exclude);
    }
    config.follow_links |= args.follow_links;
    config.dry_run = args.dry_run || args.check;

    Ok(config)
}

pub fn run(args: &SyncArgs, json: bool) -> Result<u8, String> {
    let config = build_config(args)?;
    debug!("effective config: {config:?}");
    let search_root = config.search_root.clone();
    let report = Synchronizer::new(config)
        .run()
        .map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        print_report(&report, &search_root);
    }

    if args.check && report.has_drift() {
        if !json {
            eprintln!(
                "{} manifest(s) out of sync (run without --check to update)",
                report.pending()
            );
        }
        return Ok(EXIT_DRIFT);
    }
    Ok(EXIT_SUCCESS)
}

fn print_report(report: &SyncReport, search_root: &Path) {
    for target in &report.targets {
        let shown = display_path(&target.path, search_root);
        if target.changed_keys.is_empty() {
            println!("{} {shown}", colorize_outcome(target.outcome));
        } else {
            println!(
                "{} {shown} ({})",
                colorize_outcome(target.outcome),
                target.changed_keys.join(", ")
            );
        }
    }

    let summary = if report.dry_run {
        format!(
            "{} would update, {} unchanged",
            report.pending(),
            report.unchanged()
        )
    } else {
        format!("{} updated, {} unchanged", report.updated(), report.unchanged())
    };
    println!(
        "synced {} from {}: {summary}",
        report.keys.join(", "),
        report.root.display()
    );
}
