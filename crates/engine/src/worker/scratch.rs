// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job scratch directories, removed on every exit path via Drop.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub(crate) struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub(crate) fn create(path: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    /// Create with permissions forced to 0o777 regardless of umask.
    /// The diarization container runs as a different uid and must be able
    /// to write its output here.
    #[cfg(unix)]
    pub(crate) fn create_world_writable(path: PathBuf) -> io::Result<Self> {
        use std::os::unix::fs::PermissionsExt;
        let dir = Self::create(path)?;
        fs::set_permissions(&dir.path, fs::Permissions::from_mode(0o777))?;
        Ok(dir)
    }

    #[cfg(not(unix))]
    pub(crate) fn create_world_writable(path: PathBuf) -> io::Result<Self> {
        Self::create(path)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove scratch dir");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_dir_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("diarize_m1_1000");
        {
            let scratch = ScratchDir::create(path.clone()).unwrap();
            fs::write(scratch.path().join("audio.m4a"), b"x").unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn world_writable_ignores_umask() {
        use std::os::unix::fs::PermissionsExt;
        let root = tempfile::tempdir().unwrap();
        let scratch =
            ScratchDir::create_world_writable(root.path().join("diarize_m1_1000")).unwrap();
        let mode = fs::metadata(scratch.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o777);
    }
}
