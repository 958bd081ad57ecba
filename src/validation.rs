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

//! Field validation for hierarchy nodes.
//!
//! Every node is checked before anything is generated for it:
//!
//! - names match `^[A-Za-z0-9_-]{1,64}$`
//! - passwords are non-empty and meet the configured minimum length
//! - a node names itself as its chain link only when that chain link is a root
//! - key sizes are 1024, 2048 or 4096 bits
//! - validity periods are not negative
//!
//! # Example
//!
//! ```
//! use pki_hierarchy::validation::{Validator, validate_name};
//! use pki_hierarchy::config::PasswordPolicy;
//!
//! assert!(validate_name("name", "root-ca_01").is_ok());
//! assert!(validate_name("name", "root ca").is_err());
//!
//! let validator = Validator::new(PasswordPolicy::Strict);
//! assert!(validator.validate_password("password", "short").is_err());
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::config::PasswordPolicy;
use crate::error::{HierarchyError, Result};
use crate::hierarchy::{IntermediateAuthority, LeafCertificate, RootAuthority};

/// Key sizes accepted by the Signing Tool.
pub const ALLOWED_KEY_SIZES: [u32; 3] = [1024, 2048, 4096];

/// Maximum length of a certificate name.
pub const MAX_NAME_LENGTH: usize = 64;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("certificate name pattern is valid")
});

/// Check a certificate name.
pub fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(HierarchyError::validation(format!("{field} cannot be empty")));
    }

    if !NAME_PATTERN.is_match(value) {
        return Err(HierarchyError::validation(format!(
            "{field} '{value}' must match ^[A-Za-z0-9_-]{{1,{MAX_NAME_LENGTH}}}$"
        )));
    }

    Ok(())
}

/// Check a password against a minimum length.
pub fn validate_password(field: &str, value: &str, min_length: usize) -> Result<()> {
    if value.is_empty() {
        return Err(HierarchyError::validation(format!("{field} is empty")));
    }

    if value.chars().count() < min_length {
        return Err(HierarchyError::validation(format!(
            "{field} is less than {min_length} characters"
        )));
    }

    Ok(())
}

/// Check an RSA key size.
pub fn validate_key_size(key_size: u32) -> Result<()> {
    if ALLOWED_KEY_SIZES.contains(&key_size) {
        Ok(())
    } else {
        Err(HierarchyError::validation(format!(
            "key size {key_size} is not one of 1024, 2048, 4096"
        )))
    }
}

/// Check a validity period.
pub fn validate_validity_days(days: i64) -> Result<()> {
    if days < 0 {
        return Err(HierarchyError::validation(format!(
            "validity days must not be negative (got {days})"
        )));
    }
    Ok(())
}

/// Check that a node does not name itself as its own chain link.
///
/// Naming itself is allowed only when the chain link is a root authority,
/// since roots and their subordinates live in separate namespaces.
pub fn validate_chain_link(name: &str, chain_name: &str, chain_is_root: bool) -> Result<()> {
    if name == chain_name && !chain_is_root {
        return Err(HierarchyError::validation(format!(
            "'{name}' cannot be its own chain link unless the chain link is a root authority"
        )));
    }
    Ok(())
}

/// Node validator parameterized by a password policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    policy: PasswordPolicy,
}

impl Validator {
    /// Create a validator for the given password policy.
    pub fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    /// Check a password against this validator's policy.
    pub fn validate_password(&self, field: &str, value: &str) -> Result<()> {
        validate_password(field, value, self.policy.min_length())
    }

    /// Validate a root certificate authority.
    pub fn validate_root(&self, root: &RootAuthority) -> Result<()> {
        validate_name("root certificate authority name", &root.name)?;
        let label = format!("root certificate authority '{}'", root.name);
        self.validate_password(&format!("{label} password"), &root.password)?;
        self.validate_password(&format!("{label} pfx password"), &root.pfx_password)?;
        validate_key_size(root.key_size)?;
        validate_validity_days(root.validity_days)?;
        Ok(())
    }

    /// Validate an intermediate certificate authority.
    pub fn validate_intermediate(&self, int: &IntermediateAuthority) -> Result<()> {
        validate_name("intermediate certificate authority name", &int.name)?;
        let label = format!("intermediate certificate authority '{}'", int.name);
        validate_name(&format!("{label} chain name"), &int.chain_name)?;
        validate_chain_link(&int.name, &int.chain_name, int.chain_is_root)?;
        self.validate_password(&format!("{label} chain password"), &int.chain_password)?;
        self.validate_password(&format!("{label} password"), &int.password)?;
        self.validate_password(&format!("{label} pfx password"), &int.pfx_password)?;
        validate_key_size(int.key_size)?;
        validate_validity_days(int.validity_days)?;
        Ok(())
    }

    /// Validate a leaf certificate.
    pub fn validate_leaf(&self, leaf: &LeafCertificate) -> Result<()> {
        validate_name("leaf certificate name", &leaf.name)?;
        let label = format!("leaf certificate '{}'", leaf.name);
        validate_name(&format!("{label} chain name"), &leaf.chain_name)?;
        validate_chain_link(&leaf.name, &leaf.chain_name, leaf.chain_is_root)?;
        self.validate_password(&format!("{label} chain password"), &leaf.chain_password)?;
        self.validate_password(&format!("{label} password"), &leaf.password)?;
        self.validate_password(&format!("{label} pfx password"), &leaf.pfx_password)?;
        validate_key_size(leaf.key_size)?;
        validate_validity_days(leaf.validity_days)?;
        Ok(())
    }
}
