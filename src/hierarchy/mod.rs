// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Hierarchy document model, loading and field expansion.
//!
//! # Example Document
//!
//! ```yaml
//! root_ca:
//!   - name: acme-root
//!     password: ${{ env.ROOT_PASSWORD }}
//!     pfx_password: ${{ env.ROOT_PFX_PASSWORD }}
//!     config:
//!       common_name: ACME Root CA
//!
//! intermediate_ca:
//!   - $ref: ./intermediates/ops.yaml
//!
//! leaf_certificate:
//!   - name: web
//!     ca_name: ops
//!     ca_password: ${{ env.OPS_PASSWORD }}
//!     password: ${{ env.WEB_PASSWORD }}
//!     pfx_password: ${{ env.WEB_PFX_PASSWORD }}
//!     config:
//!       common_name: web.example.com
//!       subject_alternative_name:
//!         dns_names: [web.example.com]
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use pki_hierarchy::hierarchy::load_hierarchy;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = load_hierarchy("/etc/pki/hierarchy.yaml")?;
//! println!("{} nodes declared", spec.len());
//! # Ok(())
//! # }
//! ```

mod expand;
mod loader;
mod spec;

pub use expand::{
    Expansion, parse_env_expression, replace_env, resolve_env_expression,
    resolve_env_expression_with,
};
pub use loader::{DocumentFormat, load_hierarchy, resolve_reference, resolve_reference_path};
pub use spec::*;
