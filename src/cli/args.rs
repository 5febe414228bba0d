//! CLI argument definitions using clap
//!
//! Commands:
//! - docstore --file <path> find
//! - docstore --file <path> find-one --filter <json>
//! - docstore --file <path> get <id>
//! - docstore --file <path> create --data <json>
//! - docstore --file <path> update <id> --data <json>
//! - docstore --file <path> delete <id>
//!
//! `--config <path>` may replace `--file`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docstore - documents in a single JSON file
#[derive(Parser, Debug)]
#[command(name = "docstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Backing JSON file
    #[arg(long, global = true, conflicts_with = "config")]
    pub file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every document
    Find,

    /// Print the first document matching a filter
    FindOne {
        /// JSON filter object, e.g. '{"$or": [{"email": "a@x"}]}'
        #[arg(long, default_value = "{}")]
        filter: String,
    },

    /// Print the document with an identifier
    Get {
        id: String,
    },

    /// Insert a document and print it with its new identifier
    Create {
        /// JSON object without `_id`
        #[arg(long)]
        data: String,
    },

    /// Overwrite fields on a document
    Update {
        id: String,

        /// JSON object of fields to set
        #[arg(long)]
        data: String,
    },

    /// Remove a document and print it
    Delete {
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update() {
        let cli = Cli::try_parse_from([
            "docstore", "--file", "db.json", "update", "abc", "--data", r#"{"a":1}"#,
        ])
        .unwrap();

        assert_eq!(cli.file, Some(PathBuf::from("db.json")));
        match cli.command {
            Command::Update { id, data } => {
                assert_eq!(id, "abc");
                assert_eq!(data, r#"{"a":1}"#);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["docstore", "find", "--config", "docstore.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("docstore.json")));
        assert!(matches!(cli.command, Command::Find));
    }

    #[test]
    fn test_file_conflicts_with_config() {
        let result = Cli::try_parse_from(["docstore", "--file", "a", "--config", "b", "find"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_find_one_defaults_to_empty_filter() {
        let cli = Cli::try_parse_from(["docstore", "--file", "a", "find-one"]).unwrap();
        assert!(matches!(cli.command, Command::FindOne { filter } if filter == "{}"));
    }
}
