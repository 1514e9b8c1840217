//! CLI response formatting and output.
//!
//! Provides JSON envelope, plain-text printing, and exit code mapping.

use serde::Serialize;
use stackdeploy::error::Hint;
use stackdeploy::{Error, ErrorCode, Result};

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<Hint>>,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize response".to_string()))
        })
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code.as_str().to_string(),
                message: err.message.clone(),
                details: err.details.clone(),
                hints: if err.hints.is_empty() {
                    None
                } else {
                    Some(err.hints.clone())
                },
            }),
        }
    }
}

fn write_stdout(payload: &str) -> Result<()> {
    use std::io::{self, Write};

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", payload) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(()); // Exit gracefully on SIGPIPE
        }
        return Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        ));
    }
    Ok(())
}

pub fn print_json_result<T: Serialize>(result: &Result<T>) -> Result<()> {
    let payload = match result {
        Ok(data) => CliResponse::success(data).to_json()?,
        Err(err) => CliResponse::<()>::from_error(err).to_json()?,
    };
    write_stdout(&payload)
}

/// Print a single plain-text line (the final result of a plain run).
pub fn print_line(line: &str) -> Result<()> {
    write_stdout(line)
}

/// Human-readable error on stderr.
pub fn print_error(err: &Error) {
    eprintln!("Error: {}", err.message);

    if let Some(command) = err.details.get("command").and_then(|c| c.as_str()) {
        eprintln!("  command: {}", command);
    }
    if let Some(stderr) = err.details.get("stderr").and_then(|s| s.as_str()) {
        eprintln!("  {}", stderr);
    }
    for hint in &err.hints {
        eprintln!("Hint: {}", hint.message);
    }
}

/// Exit code for a failed run. Step failures propagate the tool's own code.
pub fn exit_code_for_error(err: &Error) -> i32 {
    match err.code {
        ErrorCode::ConfigInvalidJson
        | ErrorCode::ConfigInvalidValue
        | ErrorCode::ValidationMissingArgument => 2,

        ErrorCode::DeployStepFailed => err
            .tool_exit_code()
            .filter(|code| *code > 0)
            .unwrap_or(1),

        ErrorCode::InternalIoError | ErrorCode::InternalJsonError => 1,
    }
}

pub fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
