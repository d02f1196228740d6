//! Command-line surface.
//!
//! Every global flag falls back to the matching `MEMO_*` variable.

use clap::{Parser, Subcommand};
use memo_core::config::{ENV_BACKEND, ENV_DIR, ENV_LEGACY_FILE};
use memo_core::{BackendKind, StoreConfig};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "memo", about = "Ordered memo list stored as front-matter records", version)]
pub struct Cli {
    /// Storage location. Prompted for on stdin when absent.
    #[arg(long, global = true, env = ENV_DIR)]
    pub dir: Option<PathBuf>,

    /// Storage medium: directory or sqlite.
    #[arg(long, global = true, env = ENV_BACKEND, default_value = "directory")]
    pub backend: BackendKind,

    /// Legacy flat-list JSON file to import from.
    #[arg(long = "legacy-file", global = true, env = ENV_LEGACY_FILE)]
    pub legacy_file: Option<PathBuf>,

    /// Absolute directory for log files; logging is off without it.
    #[arg(long = "log-dir", global = true, env = "MEMO_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print memos in display order.
    List,
    /// Print one memo.
    Show { id: String },
    /// Append a memo.
    Add {
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Change title and/or body of a memo.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
    },
    /// Delete a memo. The last memo cannot be deleted.
    Delete { id: String },
    /// Move the memo at index FROM to index TO.
    Move { from: usize, to: usize },
    /// Import the legacy flat list into the storage location.
    ImportLegacy,
}

impl Cli {
    /// Store configuration described by the flags.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            backend: self.backend,
            location: self.dir.clone(),
            legacy_path: self.legacy_file.clone(),
            ..StoreConfig::default()
        }
    }

    /// Whether the command only reads memos.
    pub fn is_read_only(&self) -> bool {
        matches!(self.command, Command::List | Command::Show { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use memo_core::BackendKind;
    use std::path::PathBuf;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "memo", "move", "0", "2", "--dir", "/tmp/memos", "--backend", "sqlite",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Move { from: 0, to: 2 }));
        let config = cli.store_config();
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.location, Some(PathBuf::from("/tmp/memos")));
        assert!(!cli.is_read_only());
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["memo", "list", "--backend", "cloud"]).is_err());
    }

    #[test]
    fn edit_fields_are_optional() {
        let cli = Cli::try_parse_from(["memo", "edit", "abc", "--body", "new body"]).unwrap();
        match cli.command {
            Command::Edit { id, title, body } => {
                assert_eq!(id, "abc");
                assert_eq!(title, None);
                assert_eq!(body.as_deref(), Some("new body"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
