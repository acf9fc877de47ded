use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use kek_etl::Config;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "kek-archive", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/kek-archive/kek.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Import every historical revision of the archive
    ///
    /// Walks the git history of the data directory and imports each commit
    /// as one snapshot, oldest first:
    ///
    /// - Revisions already imported are skipped, so re-running is safe
    /// - Each revision is imported in one transaction; a revision that fails
    ///   is rolled back and the run continues with the next one
    /// - Revisions whose files cannot be checked out are skipped
    ///
    /// Revisions are checked out into a private scratch directory; the
    /// repository's working tree is never touched. Press Ctrl-C to stop after
    /// the revision currently being imported.
    ///
    /// Exits with status 1 when the database cannot be opened or no revision
    /// matches the selection.
    History {
        /// Repository holding the archive (default: from config, or ".")
        #[arg(long)]
        repo: Option<PathBuf>,

        /// Import only the N most recent revisions
        #[arg(long, short = 'n')]
        commits: Option<usize>,

        /// Only revisions on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Only revisions on or before this date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,

        /// Read at most N documents of each type per revision
        #[arg(long)]
        sample: Option<usize>,
    },
    /// Import one data directory into the current tables (no snapshot)
    Import {
        /// Directory containing media/ and shareholders/ (default: the
        /// repository's working copy)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Read at most N documents of each type
        #[arg(long)]
        sample: Option<usize>,
    },
    /// List imported snapshots
    Snapshots,
    /// Show row counts per table
    Status,
    /// Export the ownership graph in Graphviz DOT format
    Graph {
        /// Use the state recorded in this snapshot instead of the latest
        #[arg(long)]
        snapshot: Option<i64>,

        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// Show who ultimately owns a media outlet or shareholder
    Owners {
        /// Squuid of the media outlet or shareholder
        squuid: String,

        /// Use the state recorded in this snapshot instead of the latest
        #[arg(long)]
        snapshot: Option<i64>,
    },
    /// Print the operator/owner tree of a media outlet or shareholder
    ///
    /// By default the tree walks upward to operators and owners. With --down
    /// it walks to the holdings instead. Entities already shown once are
    /// marked with "..." and not expanded again.
    Tree {
        /// Squuid of the media outlet or shareholder
        squuid: String,

        /// Walk to holdings instead of owners
        #[arg(long)]
        down: bool,

        /// Use the state recorded in this snapshot instead of the latest
        #[arg(long)]
        snapshot: Option<i64>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Create a config file with commented defaults
    Init,
    /// Print an example config file
    Example,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Load the configuration and make sure the database directory exists.
fn load_config(db: Option<PathBuf>) -> Result<Config> {
    let config = match db {
        Some(path) => Config::load_with_db_path(path)?,
        None => Config::load()?,
    };

    // Ensure database directory exists
    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let db = cli.db;

    match cli.command {
        Commands::Config { command } => {
            match command {
                ConfigCommand::Show => commands::config::show_config()?,
                ConfigCommand::Path => commands::config::show_path(),
                ConfigCommand::Init => commands::config::init_config()?,
                ConfigCommand::Example => commands::config::show_example(),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::History {
            repo,
            commits,
            since,
            until,
            sample,
        } => commands::run_history(
            &load_config(db)?,
            &commands::HistoryArgs {
                repo,
                commits,
                since,
                until,
                sample,
            },
        ),
        Commands::Import { data_dir, sample } => {
            commands::run_import(&load_config(db)?, data_dir, sample)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Snapshots => {
            commands::list_snapshots(&load_config(db)?)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => {
            commands::show_status(&load_config(db)?)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Graph { snapshot, out } => {
            commands::export_graph(&load_config(db)?, snapshot, out)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Owners { squuid, snapshot } => {
            commands::show_owners(&load_config(db)?, &squuid, snapshot)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tree {
            squuid,
            down,
            snapshot,
        } => {
            commands::show_tree(&load_config(db)?, &squuid, down, snapshot)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_commands_do_not_touch_the_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("nested").join("kek.db");
        let cli = Cli::try_parse_from([
            "kek-archive",
            "--db",
            db.to_str().unwrap(),
            "config",
            "example",
        ])
        .unwrap();

        assert_eq!(run(cli).unwrap(), ExitCode::SUCCESS);
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn test_tree_arguments() {
        let cli =
            Cli::try_parse_from(["kek-archive", "tree", "M", "--down", "--snapshot", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Tree {
                ref squuid,
                down: true,
                snapshot: Some(3),
            } if squuid == "M"
        ));
    }
}
