//! CLI command implementations
//!
//! Each invocation opens the collection, runs one operation on a
//! current-thread runtime and prints the result.

use std::path::Path;

use serde_json::Value;

use crate::collection::{Collection, Document, Filter};
use crate::config::StoreConfig;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{parse_object_arg, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let output = run_command(&cli).await?;
        write_response(output)
    })
}

/// Run `cli.command` and return the JSON to print
pub async fn run_command(cli: &Cli) -> CliResult<Value> {
    let config = resolve_config(cli.file.as_deref(), cli.config.as_deref())?;
    let collection = Collection::from_config(&config)?;
    execute(&collection, &cli.command).await
}

/// `--file` wins over `--config`; one of them is required.
fn resolve_config(file: Option<&Path>, config: Option<&Path>) -> CliResult<StoreConfig> {
    match (file, config) {
        (Some(file), _) => Ok(StoreConfig::new(file)),
        (None, Some(config)) => Ok(StoreConfig::load(config)?),
        (None, None) => Err(CliError::config_error(
            "either --file or --config is required",
        )),
    }
}

async fn execute(collection: &Collection, command: &Command) -> CliResult<Value> {
    let output = match command {
        Command::Find => serde_json::to_value(collection.find().await?)?,
        Command::FindOne { filter } => {
            let filter = Filter::from_value(parse_object_arg("--filter", filter)?)?;
            serde_json::to_value(collection.find_one(&filter).await?)?
        }
        Command::Get { id } => serde_json::to_value(collection.find_by_id(id).await?)?,
        Command::Create { data } => {
            let document = Document::from_value(parse_object_arg("--data", data)?)?;
            serde_json::to_value(collection.create(document).await?)?
        }
        Command::Update { id, data } => {
            let partial = match parse_object_arg("--data", data)? {
                Value::Object(partial) => partial,
                _ => return Err(CliError::invalid_input("--data must be a JSON object")),
            };
            serde_json::to_value(collection.find_by_id_and_update(id, partial).await?)?
        }
        Command::Delete { id } => {
            serde_json::to_value(collection.find_by_id_and_delete(id).await?)?
        }
    };
    Ok(output)
}
