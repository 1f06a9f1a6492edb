//! snapvault - Main entry point
//!
//! CLI surface over the backup, restore, and retention services.

use anyhow::Result;
use clap::{Parser, Subcommand};
use snapvault::backup::BackupService;
use snapvault::catalog::{Catalog, CatalogStore};
use snapvault::restore::RestoreService;
use snapvault::utils::format_size;
use snapvault::{scheduler, utils, Config};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a backup of the content tree and config files
    Create {
        /// Description stored in the backup metadata
        #[arg(short, long, default_value = "Manual backup")]
        description: String,
    },
    /// List all backups, newest first
    List,
    /// Restore a backup over the current content
    Restore {
        /// Backup identifier, as shown by `list`
        id: String,

        /// Skip the interactive confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete backups beyond the retention limit
    Cleanup,
    /// Back up now, then repeat on the configured interval
    Start,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    utils::logger::init(cli.log_level.as_deref().unwrap_or("info"))?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Create { description } => {
            BackupService::new(&config).create(&description)?;
        }
        Command::List => {
            let catalog = CatalogStore::new(&config.backup_dir).list()?;
            print_catalog(&catalog);
        }
        Command::Restore { id, yes } => {
            let restored = RestoreService::new(&config).restore(&id, |entry| {
                if yes {
                    return true;
                }
                prompt_confirmation(&entry.record.name)
            })?;
            if !restored {
                println!("Restore cancelled.");
            }
        }
        Command::Cleanup => {
            let deleted = BackupService::new(&config).cleanup()?;
            println!("Removed {deleted} old backup(s).");
        }
        Command::Start => {
            scheduler::run(&config)?;
        }
    }

    Ok(())
}

fn prompt_confirmation(name: &str) -> bool {
    print!("Restore backup '{name}'? This will overwrite the current content! (y/n): ");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}

fn print_catalog(catalog: &Catalog) {
    if catalog.entries.is_empty() {
        println!("No backups found.");
        return;
    }

    let name_width = catalog
        .entries
        .iter()
        .map(|e| e.record.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!(
        "{:<name_width$}  {:<19}  {:>10}  {:>6}  {}",
        "NAME", "CREATED", "SIZE", "FILES", "DESCRIPTION"
    );
    for entry in &catalog.entries {
        let created = entry.record.datetime.get(..19).unwrap_or(&entry.record.datetime);
        println!(
            "{:<name_width$}  {:<19}  {:>10}  {:>6}  {}",
            entry.record.name,
            created,
            format_size(entry.size_on_disk),
            entry.record.file_count,
            entry.record.description
        );
    }

    if !catalog.skipped.is_empty() {
        println!(
            "({} entr{} skipped; see warnings above)",
            catalog.skipped.len(),
            if catalog.skipped.len() == 1 { "y" } else { "ies" }
        );
    }
}
