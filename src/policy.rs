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

//! Signing-policy file synthesis.
//!
//! Turns a node's certificate field configuration into an OpenSSL-style
//! request configuration: a `[req]` header, the distinguished name section
//! and the extension section, plus a subject alternative name section for
//! leaf certificates.
//!
//! Authorities and leaves follow different rules:
//!
//! | Extension | Authority default | Leaf default |
//! |---|---|---|
//! | `keyUsage` | `keyCertSign, cRLSign` | `digitalSignature, keyEncipherment` |
//! | `basicConstraints` | forced `CA:TRUE` | forced `CA:FALSE`, `CA:TRUE` rejected |
//! | `extendedKeyUsage` | none | `serverAuth, clientAuth` |
//!
//! # Example
//!
//! ```
//! use pki_hierarchy::hierarchy::BaseCertificateConfiguration;
//! use pki_hierarchy::policy::render_ca_policy;
//!
//! let config = BaseCertificateConfiguration {
//!     common_name: "ACME Root CA".to_string(),
//!     ..Default::default()
//! };
//! let policy = render_ca_policy(&config).unwrap();
//! assert!(policy.contains("keyUsage = keyCertSign, cRLSign\n"));
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{HierarchyError, Result};
use crate::hierarchy::{
    BaseCertificateConfiguration, LeafCertificateConfiguration, NodeKind,
    SubjectAlternativeNameConfiguration,
};

const CA_DEFAULT_KEY_USAGE: [&str; 2] = ["keyCertSign", "cRLSign"];
const LEAF_DEFAULT_KEY_USAGE: [&str; 2] = ["digitalSignature", "keyEncipherment"];
const LEAF_DEFAULT_EXTENDED_KEY_USAGE: [&str; 2] = ["serverAuth", "clientAuth"];

const REQ_HEADER: &str = "[req]
distinguished_name = issued_to_name
req_extensions = config_extensions
prompt = no

[issued_to_name]
";

const EXTENSIONS_HEADER: &str = "\n[config_extensions]\n";
const SAN_SECTION: &str = "subject_alt_names";

/// File name of the policy for a node.
///
/// Roots use `root-ca-<name>.conf`, intermediates `ca-<name>.conf` and
/// leaves `<name>.conf`.
pub fn policy_file_name(kind: NodeKind, name: &str) -> String {
    match kind {
        NodeKind::Root => format!("root-ca-{name}.conf"),
        NodeKind::Intermediate => format!("ca-{name}.conf"),
        NodeKind::Leaf => format!("{name}.conf"),
    }
}

/// Path of the policy for a node under the working directory.
pub fn policy_path(working_dir: &Path, kind: NodeKind, name: &str) -> PathBuf {
    working_dir.join(policy_file_name(kind, name))
}

/// Render the policy for a root or intermediate authority.
pub fn render_ca_policy(config: &BaseCertificateConfiguration) -> Result<String> {
    let mut out = render_distinguished_name(config)?;

    push_extension(
        &mut out,
        "keyUsage",
        config.critical_key_usage,
        &values_or_default(&config.key_usages, &CA_DEFAULT_KEY_USAGE),
    );

    let mut constraints = vec!["CA:TRUE".to_string()];
    constraints.extend(config.basic_constraints.iter().cloned());
    push_extension(
        &mut out,
        "basicConstraints",
        config.critical_basic_constraints,
        &constraints,
    );

    if !config.extended_key_usages.is_empty() {
        push_extension(
            &mut out,
            "extendedKeyUsage",
            config.critical_extended_key_usage,
            &config.extended_key_usages,
        );
    }

    push_optional_extensions(&mut out, config);
    Ok(out)
}

/// Render the policy for a leaf certificate.
///
/// # Errors
///
/// Fails if a declared basic constraint asks for `CA:TRUE`, in addition to
/// the distinguished name rules.
pub fn render_leaf_policy(config: &LeafCertificateConfiguration) -> Result<String> {
    let base = &config.base;
    if base.basic_constraints.iter().any(|c| requests_ca(c)) {
        return Err(HierarchyError::policy(
            "Basic constraints of a leaf certificate cannot contain CA:TRUE",
        ));
    }

    let mut out = render_distinguished_name(base)?;

    push_extension(
        &mut out,
        "keyUsage",
        base.critical_key_usage,
        &values_or_default(&base.key_usages, &LEAF_DEFAULT_KEY_USAGE),
    );

    let mut constraints = vec!["CA:FALSE".to_string()];
    constraints.extend(base.basic_constraints.iter().cloned());
    push_extension(
        &mut out,
        "basicConstraints",
        base.critical_basic_constraints,
        &constraints,
    );

    push_extension(
        &mut out,
        "extendedKeyUsage",
        base.critical_extended_key_usage,
        &values_or_default(&base.extended_key_usages, &LEAF_DEFAULT_EXTENDED_KEY_USAGE),
    );

    push_optional_extensions(&mut out, base);

    if let Some(san) = config.subject_alternative_name.as_ref()
        && !san.is_empty()
    {
        push_subject_alt_names(&mut out, san, config.critical_subject_alt_names);
    }

    Ok(out)
}

/// Outcome of a policy file write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyWrite {
    /// The file was created or rewritten.
    Written,

    /// An existing file was left untouched.
    Kept,
}

/// Write a policy file unless one already exists.
///
/// Existing files are rewritten only when `overwrite` is set.
pub fn write_policy_file(path: &Path, contents: &str, overwrite: bool) -> Result<PolicyWrite> {
    if path.exists() && !overwrite {
        debug!("Keeping existing policy file {}", path.display());
        return Ok(PolicyWrite::Kept);
    }

    std::fs::write(path, contents)?;
    debug!("Wrote policy file {}", path.display());
    Ok(PolicyWrite::Written)
}

fn render_distinguished_name(config: &BaseCertificateConfiguration) -> Result<String> {
    let mut out = String::from(REQ_HEADER);

    if !config.country.is_empty() {
        if config.country.chars().count() != 2 {
            return Err(HierarchyError::policy(format!(
                "The country code must be 2 characters (got '{}')",
                config.country
            )));
        }
        push_field(&mut out, "countryName", &config.country);
    }

    push_optional_field(&mut out, "stateOrProvinceName", &config.state);
    push_optional_field(&mut out, "localityName", &config.locality);
    push_optional_field(&mut out, "organizationName", &config.organization);
    push_optional_field(&mut out, "organizationalUnitName", &config.organizational_unit);

    if config.common_name.is_empty() {
        return Err(HierarchyError::policy("The common name is empty"));
    }
    push_field(&mut out, "commonName", &config.common_name);

    push_optional_field(&mut out, "emailAddress", &config.email);

    out.push_str(EXTENSIONS_HEADER);
    Ok(out)
}

fn push_optional_extensions(out: &mut String, config: &BaseCertificateConfiguration) {
    if !config.certificate_policies.is_empty() {
        push_extension(
            out,
            "certificatePolicies",
            config.critical_certificate_policies,
            &config.certificate_policies,
        );
    }

    if !config.name_constraints.is_empty() {
        push_extension(
            out,
            "nameConstraints",
            config.critical_name_constraints,
            &config.name_constraints,
        );
    }
}

fn push_subject_alt_names(
    out: &mut String,
    san: &SubjectAlternativeNameConfiguration,
    critical: bool,
) {
    let marker = format!("@{SAN_SECTION}");
    push_extension(out, "subjectAltName", critical, &[marker]);
    out.push_str(&format!("\n[{SAN_SECTION}]\n"));

    push_indexed(out, "DNS", &san.dns_names);
    push_indexed(out, "email", &san.email_addresses);
    push_indexed(out, "IP", &san.ip_addresses);
    push_indexed(out, "URI", &san.uris);
    push_indexed(out, "dirName", &san.directory_names);
    push_indexed(out, "RID", &san.registered_ids);
    push_indexed(out, "otherName", &san.other_names);
}

fn push_indexed(out: &mut String, prefix: &str, values: &[String]) {
    for (i, value) in values.iter().enumerate() {
        out.push_str(&format!("{prefix}.{i} = {value}\n"));
    }
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push_str(&format!("{key} = {value}\n"));
}

fn push_optional_field(out: &mut String, key: &str, value: &str) {
    if !value.is_empty() {
        push_field(out, key, value);
    }
}

fn push_extension<S: AsRef<str>>(out: &mut String, key: &str, critical: bool, values: &[S]) {
    let joined = values
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");

    if critical {
        out.push_str(&format!("{key} = critical, {joined}\n"));
    } else {
        out.push_str(&format!("{key} = {joined}\n"));
    }
}

fn values_or_default(values: &[String], default: &[&str]) -> Vec<String> {
    if values.is_empty() {
        default.iter().map(|v| v.to_string()).collect()
    } else {
        values.to_vec()
    }
}

fn requests_ca(constraint: &str) -> bool {
    let normalized: String = constraint
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    normalized.contains("CA:TRUE")
}
