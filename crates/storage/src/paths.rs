// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State directory resolution.

use std::path::PathBuf;

/// Resolve the durable state directory:
/// `CMV_STATE_DIR` > `XDG_STATE_HOME/cmv` > `~/.local/state/cmv`.
pub fn state_dir() -> Result<PathBuf, NoStateDir> {
    if let Ok(dir) = std::env::var("CMV_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("cmv"));
    }
    let home = std::env::var("HOME").map_err(|_| NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/cmv"))
}

/// No `CMV_STATE_DIR`, `XDG_STATE_HOME`, or `HOME` in the environment.
#[derive(Debug, thiserror::Error)]
#[error("cannot resolve state directory: set CMV_STATE_DIR or HOME")]
pub struct NoStateDir;
