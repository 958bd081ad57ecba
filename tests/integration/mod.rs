//! Integration test utilities and helpers
//!
//! Provides a Signing Tool that records every invocation along with the
//! secrets it was handed, and a scratch directory for hierarchy documents.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use pki_hierarchy::signing::{IntermediateRequest, LeafRequest, RootRequest};
use pki_hierarchy::{GeneratorConfig, HierarchyError, NodeKind, Result, SigningTool};
use tempfile::TempDir;

/// One recorded Signing Tool call.
#[derive(Debug, Clone)]
pub struct Call {
    pub kind: NodeKind,
    pub name: String,
    pub arguments: Vec<String>,
    /// Contents of the staged password file at call time.
    pub password: String,
    /// Contents of the staged chain password file, for intermediates and leaves.
    pub chain_password: Option<String>,
    /// Paths of every staged file referenced by the call.
    pub staged: Vec<PathBuf>,
}

/// Signing Tool that records calls and can be told to fail.
#[derive(Default)]
pub struct RecordingSigningTool {
    calls: RefCell<Vec<Call>>,
    fail_on: Option<String>,
}

impl RecordingSigningTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with a non-zero exit when asked to generate `name`.
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.name.clone()).collect()
    }

    fn record(&self, call: Call) -> Result<()> {
        let fail = self.fail_on.as_deref() == Some(call.name.as_str());
        self.calls.borrow_mut().push(call);
        if fail {
            return Err(HierarchyError::tool_exit("recording-tool", Some(1)));
        }
        Ok(())
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("staged secret readable during the call")
}

impl SigningTool for RecordingSigningTool {
    fn generate_root(&self, request: &RootRequest) -> Result<()> {
        self.record(Call {
            kind: NodeKind::Root,
            name: request.name.clone(),
            arguments: request.arguments(),
            password: read(request.password.path()),
            chain_password: None,
            staged: vec![
                request.password.path().to_path_buf(),
                request.pfx_password.path().to_path_buf(),
            ],
        })
    }

    fn generate_intermediate(&self, request: &IntermediateRequest) -> Result<()> {
        self.record(Call {
            kind: NodeKind::Intermediate,
            name: request.name.clone(),
            arguments: request.arguments(),
            password: read(request.password.path()),
            chain_password: Some(read(request.chain.password.path())),
            staged: vec![
                request.password.path().to_path_buf(),
                request.pfx_password.path().to_path_buf(),
                request.chain.password.path().to_path_buf(),
            ],
        })
    }

    fn generate_leaf(&self, request: &LeafRequest) -> Result<()> {
        self.record(Call {
            kind: NodeKind::Leaf,
            name: request.name.clone(),
            arguments: request.arguments(),
            password: read(request.password.path()),
            chain_password: Some(read(request.chain.password.path())),
            staged: vec![
                request.password.path().to_path_buf(),
                request.pfx_password.path().to_path_buf(),
                request.chain.password.path().to_path_buf(),
            ],
        })
    }
}

/// Scratch directory holding hierarchy documents and a working directory.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a document relative to the fixture root.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create fixture dir");
        }
        std::fs::write(&path, contents).expect("Failed to write fixture");
        path
    }

    pub fn working_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig::builder()
            .working_dir(self.working_dir())
            .scripts_dir(self.dir.path().join("ssl"))
            .build()
            .expect("Valid config")
    }

    /// Files currently present in the working directory.
    pub fn working_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.working_dir()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
