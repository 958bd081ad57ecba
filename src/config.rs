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

//! Run configuration for the hierarchy generator.
//!
//! This module provides the settings that are not part of the hierarchy
//! document itself: where generated artifacts live, where the Signing Tool
//! scripts are found, and which password policy applies.

use std::path::{Path, PathBuf};

use crate::error::{HierarchyError, Result};

/// Default working directory for policy files and staged secrets.
pub const DEFAULT_WORKING_DIR: &str = "./bin";

/// Default directory holding the Signing Tool scripts.
pub const DEFAULT_SCRIPTS_DIR: &str = "./ssl";

/// Minimum password length under [`PasswordPolicy::Strict`].
pub const STRICT_MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum password length under [`PasswordPolicy::Relaxed`].
pub const RELAXED_MIN_PASSWORD_LENGTH: usize = 4;

/// Password strength policy applied to every password field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PasswordPolicy {
    /// At least 8 characters.
    #[default]
    Strict,

    /// At least 4 characters.
    Relaxed,

    /// Caller-supplied minimum length.
    Custom(usize),
}

impl PasswordPolicy {
    /// Minimum number of characters a password must have.
    pub fn min_length(&self) -> usize {
        match self {
            Self::Strict => STRICT_MIN_PASSWORD_LENGTH,
            Self::Relaxed => RELAXED_MIN_PASSWORD_LENGTH,
            Self::Custom(len) => *len,
        }
    }

    /// Parse a policy name ("strict" or "relaxed").
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "relaxed" => Some(Self::Relaxed),
            _ => None,
        }
    }
}

/// Configuration for a generation run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Directory that receives policy files and staged secret files.
    pub working_dir: PathBuf,

    /// Directory containing the Signing Tool scripts.
    pub scripts_dir: PathBuf,

    /// Password policy applied during validation.
    pub password_policy: PasswordPolicy,

    /// Create the working directory if it does not exist.
    pub create_working_dir: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            scripts_dir: PathBuf::from(DEFAULT_SCRIPTS_DIR),
            password_policy: PasswordPolicy::default(),
            create_working_dir: true,
        }
    }
}

impl GeneratorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::new()
    }

    /// Minimum password length for this run.
    pub fn min_password_length(&self) -> usize {
        self.password_policy.min_length()
    }

    /// Make sure the working directory exists.
    pub fn prepare_working_dir(&self) -> Result<()> {
        if self.working_dir.is_dir() {
            return Ok(());
        }

        if self.working_dir.exists() {
            return Err(HierarchyError::config(format!(
                "Working directory {} is not a directory",
                self.working_dir.display()
            )));
        }

        if !self.create_working_dir {
            return Err(HierarchyError::config(format!(
                "Working directory {} does not exist",
                self.working_dir.display()
            )));
        }

        tracing::debug!("Creating working directory {}", self.working_dir.display());
        std::fs::create_dir_all(&self.working_dir)?;
        Ok(())
    }
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug, Default)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.working_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the Signing Tool scripts directory.
    pub fn scripts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.scripts_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the password policy.
    pub fn password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.config.password_policy = policy;
        self
    }

    /// Enable or disable working directory creation.
    pub fn create_working_dir(mut self, create: bool) -> Self {
        self.config.create_working_dir = create;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<GeneratorConfig> {
        if self.config.working_dir.as_os_str().is_empty() {
            return Err(HierarchyError::config("working directory must not be empty"));
        }

        if let PasswordPolicy::Custom(0) = self.config.password_policy {
            return Err(HierarchyError::config(
                "minimum password length must be at least 1",
            ));
        }

        Ok(self.config)
    }
}
