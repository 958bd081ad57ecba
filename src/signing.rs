// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Signing Tool abstraction.
//!
//! Key generation, signing and PKCS#12 packaging are performed by an external
//! Signing Tool. This module defines the capability as a trait with one
//! method per node kind, so hierarchy resolution can run against a real
//! script set ([`ScriptSigningTool`]), a recorder that only describes what
//! would run ([`DryRunSigningTool`]), or a test double.
//!
//! # Command Contract
//!
//! ```text
//! generate-root-ca.sh NAME file:PW file:PFX TRUST SKIP_DH HAS_EXT VALIDITY KEYSIZE
//! generate-intermediate-ca.sh CHAIN_IS_ROOT CHAIN file:CHAIN_PW NAME file:PW file:PFX TRUST SKIP_DH KEEP_CSR VALIDITY KEYSIZE
//! generate-certs-v2.sh CHAIN_IS_ROOT CHAIN file:CHAIN_PW NAME file:PW file:PFX SKIP_DH KEEP_CSR VALIDITY KEYSIZE
//! ```
//!
//! Flags are `YES` or `NO`. The exit status is the only success signal.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{HierarchyError, Result};
use crate::hierarchy::NodeKind;
use crate::secrets::SecretRef;

/// Script generating root certificate authorities.
pub const ROOT_SCRIPT: &str = "generate-root-ca.sh";

/// Script generating intermediate certificate authorities.
pub const INTERMEDIATE_SCRIPT: &str = "generate-intermediate-ca.sh";

/// Script generating leaf certificates.
pub const LEAF_SCRIPT: &str = "generate-certs-v2.sh";

/// Format a flag the way the Signing Tool expects it.
pub fn yes_no(flag: bool) -> &'static str {
    if flag { "YES" } else { "NO" }
}

/// The authority that signs a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    /// Chain link name.
    pub name: String,

    /// Reference to the chain link's staged key password.
    pub password: SecretRef,

    /// The chain link is a root authority.
    pub is_root: bool,
}

/// Parameters for generating a root certificate authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootRequest {
    /// Certificate name.
    pub name: String,
    /// Staged key password.
    pub password: SecretRef,
    /// Staged PKCS#12 password.
    pub pfx_password: SecretRef,
    /// Insert into the system trust store.
    pub insert_into_trust_store: bool,
    /// Generate Diffie-Hellman parameters.
    pub generate_dh_parameters: bool,
    /// Use the generated policy file.
    pub has_extension_file: bool,
    /// Validity period in days.
    pub validity_days: i64,
    /// RSA key size in bits.
    pub key_size: u32,
}

impl RootRequest {
    /// Positional arguments for [`ROOT_SCRIPT`].
    pub fn arguments(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.password.argument(),
            self.pfx_password.argument(),
            yes_no(self.insert_into_trust_store).to_string(),
            yes_no(!self.generate_dh_parameters).to_string(),
            yes_no(self.has_extension_file).to_string(),
            self.validity_days.to_string(),
            self.key_size.to_string(),
        ]
    }
}

/// Parameters for generating an intermediate certificate authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateRequest {
    /// Certificate name.
    pub name: String,
    /// Staged key password.
    pub password: SecretRef,
    /// Staged PKCS#12 password.
    pub pfx_password: SecretRef,
    /// Signing authority.
    pub chain: ChainLink,
    /// Insert into the system trust store.
    pub insert_into_trust_store: bool,
    /// Generate Diffie-Hellman parameters.
    pub generate_dh_parameters: bool,
    /// Keep the certificate signing request.
    pub keep_csr: bool,
    /// Validity period in days.
    pub validity_days: i64,
    /// RSA key size in bits.
    pub key_size: u32,
}

impl IntermediateRequest {
    /// Positional arguments for [`INTERMEDIATE_SCRIPT`].
    pub fn arguments(&self) -> Vec<String> {
        vec![
            yes_no(self.chain.is_root).to_string(),
            self.chain.name.clone(),
            self.chain.password.argument(),
            self.name.clone(),
            self.password.argument(),
            self.pfx_password.argument(),
            yes_no(self.insert_into_trust_store).to_string(),
            yes_no(!self.generate_dh_parameters).to_string(),
            yes_no(self.keep_csr).to_string(),
            self.validity_days.to_string(),
            self.key_size.to_string(),
        ]
    }
}

/// Parameters for generating a leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafRequest {
    /// Certificate name.
    pub name: String,
    /// Staged key password.
    pub password: SecretRef,
    /// Staged PKCS#12 password.
    pub pfx_password: SecretRef,
    /// Issuing authority.
    pub chain: ChainLink,
    /// Generate Diffie-Hellman parameters.
    pub generate_dh_parameters: bool,
    /// Keep the certificate signing request.
    pub keep_csr: bool,
    /// Validity period in days.
    pub validity_days: i64,
    /// RSA key size in bits.
    pub key_size: u32,
}

impl LeafRequest {
    /// Positional arguments for [`LEAF_SCRIPT`].
    pub fn arguments(&self) -> Vec<String> {
        vec![
            yes_no(self.chain.is_root).to_string(),
            self.chain.name.clone(),
            self.chain.password.argument(),
            self.name.clone(),
            self.password.argument(),
            self.pfx_password.argument(),
            yes_no(!self.generate_dh_parameters).to_string(),
            yes_no(self.keep_csr).to_string(),
            self.validity_days.to_string(),
            self.key_size.to_string(),
        ]
    }
}

/// Capability that performs the actual certificate generation.
pub trait SigningTool {
    /// Generate a root certificate authority.
    fn generate_root(&self, request: &RootRequest) -> Result<()>;

    /// Generate an intermediate certificate authority.
    fn generate_intermediate(&self, request: &IntermediateRequest) -> Result<()>;

    /// Generate a leaf certificate.
    fn generate_leaf(&self, request: &LeafRequest) -> Result<()>;
}

/// Signing Tool backed by the shell script set.
#[derive(Debug, Clone)]
pub struct ScriptSigningTool {
    scripts_dir: PathBuf,
}

impl ScriptSigningTool {
    /// Create a tool running scripts from `scripts_dir`.
    pub fn new(scripts_dir: impl AsRef<Path>) -> Self {
        Self {
            scripts_dir: scripts_dir.as_ref().to_path_buf(),
        }
    }

    /// Check that all three scripts are present.
    pub fn verify_available(&self) -> Result<()> {
        for script in [ROOT_SCRIPT, INTERMEDIATE_SCRIPT, LEAF_SCRIPT] {
            let path = self.scripts_dir.join(script);
            if !path.is_file() {
                return Err(HierarchyError::signing_tool(format!(
                    "Script {} not found in {}",
                    script,
                    self.scripts_dir.display()
                )));
            }
        }
        Ok(())
    }

    fn execute(&self, script: &str, arguments: &[String]) -> Result<()> {
        let path = self.scripts_dir.join(script);
        debug!("Executing {} {}", path.display(), arguments.join(" "));

        let status = Command::new(&path).args(arguments).status().map_err(|e| {
            HierarchyError::signing_tool(format!("Failed to execute {}: {e}", path.display()))
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(HierarchyError::tool_exit(script, status.code()))
        }
    }
}

impl SigningTool for ScriptSigningTool {
    fn generate_root(&self, request: &RootRequest) -> Result<()> {
        self.execute(ROOT_SCRIPT, &request.arguments())
    }

    fn generate_intermediate(&self, request: &IntermediateRequest) -> Result<()> {
        self.execute(INTERMEDIATE_SCRIPT, &request.arguments())
    }

    fn generate_leaf(&self, request: &LeafRequest) -> Result<()> {
        self.execute(LEAF_SCRIPT, &request.arguments())
    }
}

/// A Signing Tool invocation, as it would be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Kind of node generated.
    pub kind: NodeKind,
    /// Node name.
    pub name: String,
    /// Script that would run.
    pub script: &'static str,
    /// Positional arguments.
    pub arguments: Vec<String>,
}

impl ToolInvocation {
    /// Render as a single command line.
    pub fn command_line(&self) -> String {
        let mut line = self.script.to_string();
        for argument in &self.arguments {
            line.push(' ');
            line.push_str(argument);
        }
        line
    }
}

/// Signing Tool that records invocations instead of running them.
#[derive(Debug, Default)]
pub struct DryRunSigningTool {
    invocations: RefCell<Vec<ToolInvocation>>,
}

impl DryRunSigningTool {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded invocations in execution order.
    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.borrow().clone()
    }

    fn record(&self, kind: NodeKind, name: &str, script: &'static str, arguments: Vec<String>) {
        let invocation = ToolInvocation {
            kind,
            name: name.to_string(),
            script,
            arguments,
        };
        info!("Would run: {}", invocation.command_line());
        self.invocations.borrow_mut().push(invocation);
    }
}

impl SigningTool for DryRunSigningTool {
    fn generate_root(&self, request: &RootRequest) -> Result<()> {
        self.record(NodeKind::Root, &request.name, ROOT_SCRIPT, request.arguments());
        Ok(())
    }

    fn generate_intermediate(&self, request: &IntermediateRequest) -> Result<()> {
        self.record(
            NodeKind::Intermediate,
            &request.name,
            INTERMEDIATE_SCRIPT,
            request.arguments(),
        );
        Ok(())
    }

    fn generate_leaf(&self, request: &LeafRequest) -> Result<()> {
        self.record(NodeKind::Leaf, &request.name, LEAF_SCRIPT, request.arguments());
        Ok(())
    }
}
