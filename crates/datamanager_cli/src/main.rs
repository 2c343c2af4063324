//! `datamanager` command line: lists managed files and backups of a catalog.

use clap::{Args, Parser, Subcommand};
use datamanager_core::{
    init_logging, CatalogConfig, ConfigOverrides, DataManager, Id, ListBackupsOptions,
    ListFilesOptions, ListingController, Presentation,
};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "datamanager")]
#[command(about = "Query a catalog of managed files, fingerprints and backups")]
struct Cli {
    /// Catalog database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for log files; logging is off when unset
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List managed files sorted by path
    ListFiles(ListFilesArgs),
    /// List backups sorted by label
    ListBackups(ListBackupsArgs),
}

#[derive(Args, Debug)]
struct ListFilesArgs {
    /// Render at most this many files
    #[arg(long)]
    max: Option<u32>,

    /// Only files whose whole path matches
    #[arg(long)]
    regex: Option<String>,

    /// Only files owning this fingerprint value
    #[arg(long)]
    fingerprint: Option<String>,

    /// Only files missing from disk
    #[arg(long)]
    missing: bool,

    /// Also render the fingerprint history
    #[arg(long)]
    fingerprints: bool,
}

#[derive(Args, Debug)]
struct ListBackupsArgs {
    #[arg(long)]
    label: Option<String>,

    #[arg(long)]
    volume_id: Option<Id>,

    /// Only backups containing this managed file
    #[arg(long)]
    file_id: Option<Id>,

    /// Also render the member files
    #[arg(long)]
    files: bool,
}

struct TerminalPresentation;

impl Presentation for TerminalPresentation {
    fn output(&mut self, line: &str) {
        println!("{line}");
    }

    fn notify_error(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_exit module=cli status=error error={message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = CatalogConfig::resolve(ConfigOverrides {
        db_path: cli.db,
        log_level: cli.log_level,
        log_dir: cli.log_dir,
    })
    .map_err(|err| report(err.to_string()))?;

    if let Some(settings) = config.log_settings() {
        init_logging(&settings).map_err(report)?;
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        datamanager_core::core_version()
    );

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            report(format!(
                "cannot create catalog directory `{}`: {err}",
                parent.display()
            ))
        })?;
    }
    let manager = DataManager::open(&config.db_path).map_err(|err| report(err.to_string()))?;
    let mut controller = ListingController::new(manager, TerminalPresentation);

    // The controller already printed any error through the presentation.
    let listed = match cli.command {
        Command::ListFiles(args) => controller.list_files(&ListFilesOptions {
            render_fingerprints: args.fingerprints,
            max: args.max,
            regex: args.regex,
            fingerprint: args.fingerprint,
            missing_only: args.missing,
        }),
        Command::ListBackups(args) => controller.list_backups(&ListBackupsOptions {
            label: args.label,
            volume_id: args.volume_id,
            file_id: args.file_id,
            render_files: args.files,
        }),
    };
    listed.map(|_| ()).map_err(|err| err.to_string())
}

fn report(message: String) -> String {
    eprintln!("{message}");
    message
}
