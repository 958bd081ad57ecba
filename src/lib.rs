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

//! # pki-hierarchy
//!
//! Generates a PKI certificate hierarchy (root certificate authorities,
//! intermediate certificate authorities and leaf certificates) from a single
//! declarative JSON or YAML document.
//!
//! The crate does not perform cryptography itself. It resolves the order in
//! which certificates must be generated, validates every node, synthesizes
//! OpenSSL request policy files and drives an external Signing Tool, passing
//! passwords through short-lived files instead of the command line.
//!
//! ## Features
//!
//! - **Split documents**: nodes can be declared by `$ref` in separate files
//! - **Environment expressions**: `${{ env.NAME }}` for names and passwords
//! - **Dependency resolution**: chain links are generated before the
//!   certificates they sign, exactly once per run
//! - **Early failure**: validation, missing chain links and cycles are
//!   reported before anything is written
//! - **Pluggable Signing Tool**: script-backed, dry-run or custom
//!
//! ## Quick Start
//!
//! ```no_run
//! use pki_hierarchy::{GeneratorConfig, HierarchyResolver, ScriptSigningTool};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GeneratorConfig::builder()
//!         .working_dir("./bin")
//!         .scripts_dir("./ssl")
//!         .build()?;
//!
//!     let tool = ScriptSigningTool::new(&config.scripts_dir);
//!     tool.verify_available()?;
//!
//!     let report = HierarchyResolver::new(&config, &tool).run("hierarchy.yaml")?;
//!     for node in &report.generated {
//!         println!("{} {}", node.kind, node.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Validating Without Generating
//!
//! ```no_run
//! use pki_hierarchy::hierarchy::load_hierarchy;
//! use pki_hierarchy::resolver::prepare;
//! use pki_hierarchy::validation::Validator;
//! use pki_hierarchy::config::PasswordPolicy;
//!
//! # fn example() -> pki_hierarchy::Result<()> {
//! let path = std::path::absolute("hierarchy.json")?;
//! let spec = load_hierarchy(&path)?;
//! let hierarchy = prepare(spec, &path, &Validator::new(PasswordPolicy::Relaxed))?;
//! println!("{} nodes are valid", hierarchy.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod logging;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod secrets;
pub mod signing;
pub mod validation;

// Re-export main types at crate root for convenience
pub use config::{GeneratorConfig, GeneratorConfigBuilder, PasswordPolicy};
pub use error::{HierarchyError, Result};
pub use hierarchy::{
    HierarchySpec, IntermediateAuthority, LeafCertificate, NodeKind, RootAuthority,
};
pub use resolver::{HierarchyResolver, PreparedHierarchy, RunReport};
pub use signing::{DryRunSigningTool, ScriptSigningTool, SigningTool};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
