//! CLI for streakwatch: scan, track and summarise outcome streaks.

mod commands;
mod http_store;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use streakwatch_core::{DisplayFilter, TrackingScope};

use commands::StoreArgs;

#[derive(Parser)]
#[command(name = "streakwatch")]
#[command(about = "streakwatch: streak detection over aligned outcome blocks")]
#[command(version = streakwatch_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a blocks file once and print the current streaks per rule
    Scan {
        /// JSON array of blocks
        #[arg(long)]
        blocks: PathBuf,

        /// JSON array of sampling rules
        #[arg(long)]
        rules: PathBuf,

        /// JSON array of watched patterns, shown regardless of threshold
        #[arg(long)]
        watch: Option<PathBuf>,

        /// Only show one class: all, odd, even, big, small
        #[arg(long, default_value = "all")]
        filter: DisplayFilter,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay blocks through the change-detecting tracker and persist records
    Track {
        /// JSON array of blocks
        #[arg(long)]
        blocks: PathBuf,

        /// JSON array of sampling rules
        #[arg(long)]
        rules: PathBuf,

        /// JSON array of watched patterns
        #[arg(long)]
        watch: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,

        /// Display filter: all, odd, even, big, small
        #[arg(long, default_value = "all")]
        filter: DisplayFilter,

        /// What gets recorded: above-threshold (ignores the filter) or display-filtered
        #[arg(long, default_value = "above-threshold")]
        scope: TrackingScope,

        /// Quiet period before a change is written, in milliseconds
        #[arg(long, default_value = "2000")]
        save_delay_ms: u64,

        /// Switch tracking back on if the stored state has it off
        #[arg(long)]
        start: bool,

        /// Keep re-reading the blocks file until Ctrl+C
        #[arg(long)]
        follow: bool,

        /// Poll interval for --follow, in milliseconds
        #[arg(long, default_value = "1000")]
        poll_ms: u64,

        /// Number of newest blocks kept for scanning
        #[arg(long, default_value_t = commands::track::DEFAULT_WINDOW)]
        window: usize,
    },

    /// Show statistics over stored streak records
    Stats {
        #[command(flatten)]
        store: StoreArgs,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,

        /// Number of longest streaks to list
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Delete all stored streak records
    Clear {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Run the HTTP persistence endpoint
    Server {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port
        #[arg(long, default_value = "8088")]
        port: u16,

        /// Snapshot file the server mirrors to
        #[arg(long, default_value = "streaks.json")]
        data: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan {
            blocks,
            rules,
            watch,
            filter,
            json,
        } => commands::scan::run(&blocks, &rules, watch.as_deref(), filter, json),
        Commands::Track {
            blocks,
            rules,
            watch,
            store,
            filter,
            scope,
            save_delay_ms,
            start,
            follow,
            poll_ms,
            window,
        } => commands::track::run(commands::track::TrackCommandConfig {
            blocks_path: &blocks,
            rules_path: &rules,
            watch_path: watch.as_deref(),
            store: &store,
            filter,
            scope,
            save_delay: Duration::from_millis(save_delay_ms),
            start,
            follow,
            poll: Duration::from_millis(poll_ms.max(1)),
            window,
        }),
        Commands::Stats { store, json, top } => commands::stats::run(&store, json, top),
        Commands::Clear { store } => commands::clear::run(&store),
        Commands::Server { host, port, data } => commands::server::run(&host, port, &data),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use streakwatch_core::OutcomeClass;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_track_parses_filter_and_scope() {
        let cli = Cli::try_parse_from([
            "streakwatch",
            "track",
            "--blocks",
            "b.json",
            "--rules",
            "r.json",
            "--filter",
            "ODD",
            "--scope",
            "display-filtered",
            "--remote",
            "http://localhost:8088",
        ])
        .unwrap();
        match cli.command {
            Commands::Track {
                filter,
                scope,
                store,
                window,
                ..
            } => {
                assert_eq!(filter, DisplayFilter::Only(OutcomeClass::Odd));
                assert_eq!(scope, TrackingScope::DisplayFiltered);
                assert_eq!(store.remote.as_deref(), Some("http://localhost:8088"));
                assert_eq!(window, commands::track::DEFAULT_WINDOW);
            }
            _ => panic!("expected track"),
        }
    }

    #[test]
    fn test_track_window_flag() {
        let cli = Cli::try_parse_from([
            "streakwatch",
            "track",
            "--blocks",
            "b.json",
            "--rules",
            "r.json",
            "--window",
            "50",
        ])
        .unwrap();
        match cli.command {
            Commands::Track { window, .. } => assert_eq!(window, 50),
            _ => panic!("expected track"),
        }
    }

    #[test]
    fn test_store_and_remote_conflict() {
        let parsed = Cli::try_parse_from([
            "streakwatch",
            "stats",
            "--store",
            "s.json",
            "--remote",
            "http://localhost:8088",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let parsed = Cli::try_parse_from([
            "streakwatch",
            "scan",
            "--blocks",
            "b.json",
            "--rules",
            "r.json",
            "--filter",
            "purple",
        ]);
        assert!(parsed.is_err());
    }
}
