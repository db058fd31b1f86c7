//! CLI argument definitions for TaskTimer.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TaskTimer - task/board management backend.
#[derive(Parser, Debug)]
#[command(name = "tasktimer")]
#[command(author, version, about = "Task/board management backend with ordered columns", long_about = None)]
pub struct Cli {
    /// Path to the SQLite database. Defaults to the platform data
    /// directory. Can also be set via TASKTIMER_DB.
    #[arg(short = 'd', long = "db", global = true, env = "TASKTIMER_DB")]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1", env = "TASKTIMER_HOST")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value_t = 8000, env = "TASKTIMER_PORT")]
        port: u16,
    },
}

/// Resolve the database path: explicit flag/env wins, otherwise the
/// platform data directory (`~/.local/share/tasktimer/tasktimer.db` on
/// Linux).
pub fn resolve_db_path(explicit: Option<PathBuf>) -> PathBuf {
    match explicit {
        Some(path) => path,
        None => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tasktimer")
            .join("tasktimer.db"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_db_path_wins() {
        let path = resolve_db_path(Some(PathBuf::from("/tmp/custom.db")));
        assert_eq!(path, PathBuf::from("/tmp/custom.db"));
    }

    #[test]
    fn test_default_db_path_is_namespaced() {
        let path = resolve_db_path(None);
        assert!(path.ends_with("tasktimer/tasktimer.db"));
    }
}
