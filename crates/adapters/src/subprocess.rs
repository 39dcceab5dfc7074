// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared subprocess plumbing for the command-backed adapters.

use crate::AdapterError;
use std::process::Output;

/// Keep at most the last `max` bytes of stderr for error messages.
fn stderr_tail(stderr: &[u8], max: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.len() <= max {
        return trimmed.to_string();
    }
    let start = trimmed.len() - max;
    // Avoid splitting a UTF-8 sequence
    let start = (start..trimmed.len())
        .find(|i| trimmed.is_char_boundary(*i))
        .unwrap_or(trimmed.len());
    format!("...{}", &trimmed[start..])
}

/// Map a non-zero exit into [`AdapterError::Subprocess`] carrying the
/// stderr tail.
pub(crate) fn check_status(program: &str, output: &Output) -> Result<(), AdapterError> {
    if output.status.success() {
        return Ok(());
    }
    Err(AdapterError::Subprocess {
        program: program.to_string(),
        status: output.status.code(),
        stderr: stderr_tail(&output.stderr, 2048),
    })
}

/// Split a configured command line into program and arguments.
pub(crate) fn split_command(cmd: &str) -> Result<(String, Vec<String>), AdapterError> {
    let mut parts = cmd.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .ok_or_else(|| AdapterError::Config("empty command line".to_string()))?;
    Ok((program, parts.collect()))
}
