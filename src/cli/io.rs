//! JSON output for the CLI
//!
//! - One JSON object per invocation on stdout
//! - UTF-8 only

use std::io::{self, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Parse a JSON object argument such as `--data` or `--filter`
pub fn parse_object_arg(flag: &str, raw: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CliError::invalid_input(format!("{} is not valid JSON: {}", flag, e)))?;

    if !value.is_object() {
        return Err(CliError::invalid_input(format!(
            "{} must be a JSON object",
            flag
        )));
    }

    Ok(value)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object_arg() {
        assert_eq!(parse_object_arg("--data", r#"{"a":1}"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_parse_object_arg_rejects_non_objects() {
        let err = parse_object_arg("--data", "[1]").unwrap_err();
        assert_eq!(err.code_str(), "DOCSTORE_CLI_INVALID_INPUT");

        let err = parse_object_arg("--filter", "{oops").unwrap_err();
        assert!(err.message().starts_with("--filter is not valid JSON"));
    }
}
