// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Staging of passwords into files for the Signing Tool.
//!
//! Passwords are handed to the Signing Tool as `file:<path>` references so
//! they never appear in a process argument list. Staged files belong to a
//! [`StagedSecrets`] guard and are deleted when the guard is dropped, on
//! every exit path.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::hierarchy::NodeKind;

/// What a staged secret is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPurpose {
    /// Private key password of the node itself.
    Password,

    /// PKCS#12 bundle password of the node itself.
    PfxPassword,

    /// Private key password of the node's chain link.
    ChainPassword,
}

impl SecretPurpose {
    /// Identifier used in staged file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::PfxPassword => "pfx-password",
            Self::ChainPassword => "chain-password",
        }
    }
}

/// File name of a staged secret.
pub fn secret_file_name(kind: NodeKind, name: &str, purpose: SecretPurpose) -> String {
    format!("{}_{}_{}.txt", kind.as_str(), name, purpose.as_str())
}

/// Reference to a staged secret, rendered as `file:<path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    path: PathBuf,
}

impl SecretRef {
    /// Path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Command-line argument telling the Signing Tool to read the file.
    pub fn argument(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

impl std::fmt::Display for SecretRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file:{}", self.path.display())
    }
}

/// Writes secrets under a working directory.
#[derive(Debug, Clone)]
pub struct SecretStager {
    dir: PathBuf,
    write: bool,
}

impl SecretStager {
    /// Create a stager writing into `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write: true,
        }
    }

    /// Create a stager that computes references without touching the disk.
    pub fn planning(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write: false,
        }
    }

    /// Start staging secrets for one node.
    pub fn begin(&self, kind: NodeKind, name: &str) -> StagedSecrets {
        StagedSecrets {
            dir: self.dir.clone(),
            kind,
            name: name.to_string(),
            write: self.write,
            files: Vec::new(),
        }
    }
}

/// Secrets staged for one node; deleted on drop.
#[derive(Debug)]
pub struct StagedSecrets {
    dir: PathBuf,
    kind: NodeKind,
    name: String,
    write: bool,
    files: Vec<PathBuf>,
}

impl StagedSecrets {
    /// Write a secret to its file and return a reference to it.
    pub fn stage(&mut self, purpose: SecretPurpose, secret: &str) -> Result<SecretRef> {
        let path = self
            .dir
            .join(secret_file_name(self.kind, &self.name, purpose));

        if !self.write {
            return Ok(SecretRef { path });
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        // Track before writing so a partial write is still cleaned up.
        self.files.push(path.clone());
        let mut file = options.open(&path)?;
        file.write_all(secret.as_bytes())?;
        file.flush()?;

        debug!("Staged {} secret at {}", purpose.as_str(), path.display());
        Ok(SecretRef { path })
    }

    /// Paths of every file staged so far.
    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }

    /// Delete every staged file now.
    pub fn cleanup(&mut self) {
        for path in self.files.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Removed staged secret {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove staged secret {}: {}", path.display(), e),
            }
        }
    }
}

impl Drop for StagedSecrets {
    fn drop(&mut self) {
        self.cleanup();
    }
}
