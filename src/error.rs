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

//! Error types for hierarchy generation.
//!
//! Every failure in a run is fatal: loading, reference resolution, validation,
//! dependency resolution and Signing Tool execution all surface as a
//! [`HierarchyError`] that aborts the run.

use thiserror::Error;

/// Result type alias using [`HierarchyError`].
pub type Result<T> = std::result::Result<T, HierarchyError>;

/// Errors that can occur while resolving and generating a PKI hierarchy.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// Configuration document could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File extension does not select a supported document format.
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// A `$ref` reference could not be resolved.
    #[error("Reference error: {0}")]
    Reference(String),

    /// A node failed field validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Certificate field configuration cannot be turned into a policy file.
    #[error("Policy error: {0}")]
    Policy(String),

    /// A declared chain link does not exist.
    #[error("Dependency error: {0}")]
    Dependency(String),

    /// Chain links form a cycle.
    #[error("Dependency cycle detected: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// The Signing Tool is unavailable or could not be started.
    #[error("Signing tool error: {0}")]
    SigningTool(String),

    /// The Signing Tool exited unsuccessfully.
    #[error("Signing tool {script} failed with {}", exit_description(.code))]
    ToolExit {
        /// Script that was executed.
        script: String,
        /// Process exit code, if any.
        code: Option<i32>,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl HierarchyError {
    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Create a reference error with the given message.
    pub fn reference(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }

    /// Create a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a policy error with the given message.
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::Policy(msg.into())
    }

    /// Create a dependency error with the given message.
    pub fn dependency(msg: impl Into<String>) -> Self {
        Self::Dependency(msg.into())
    }

    /// Create a signing tool error with the given message.
    pub fn signing_tool(msg: impl Into<String>) -> Self {
        Self::SigningTool(msg.into())
    }

    /// Create a tool exit error.
    pub fn tool_exit(script: impl Into<String>, code: Option<i32>) -> Self {
        Self::ToolExit {
            script: script.into(),
            code,
        }
    }
}
