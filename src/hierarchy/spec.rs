// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Hierarchy document schema.
//!
//! Every field accepts both the camelCase spelling used in JSON documents and
//! the snake_case spelling used in YAML documents.

use serde::{Deserialize, Serialize};

use super::expand::replace_env;

/// Default RSA key size in bits.
pub const DEFAULT_KEY_SIZE: u32 = 2048;

/// Default certificate validity in days.
pub const DEFAULT_VALIDITY_DAYS: i64 = 4086;

fn default_key_size() -> u32 {
    DEFAULT_KEY_SIZE
}

fn default_validity_days() -> i64 {
    DEFAULT_VALIDITY_DAYS
}

/// Kind of node in the certificate hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Self-signed root certificate authority.
    Root,

    /// Intermediate certificate authority.
    Intermediate,

    /// End-entity certificate.
    Leaf,
}

impl NodeKind {
    /// Short identifier used in artifact file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root-ca",
            Self::Intermediate => "intermediate-ca",
            Self::Leaf => "leaf",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Root => "root certificate authority",
            Self::Intermediate => "intermediate certificate authority",
            Self::Leaf => "leaf certificate",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Common behavior of root, intermediate and leaf nodes.
pub trait HierarchyNode {
    /// Kind of this node.
    const KIND: NodeKind;

    /// Node name.
    fn name(&self) -> &str;

    /// Non-empty `$ref` path, if the node is declared by reference.
    fn reference(&self) -> Option<&str>;

    /// Replace `${{ env.NAME }}` expressions in every name and secret field.
    fn expand_environment(&mut self);
}

/// Complete hierarchy document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HierarchySpec {
    /// Root certificate authorities.
    #[serde(rename = "rootCa", alias = "root_ca")]
    pub root_authorities: Vec<RootAuthority>,

    /// Intermediate certificate authorities.
    #[serde(rename = "intermediateCa", alias = "intermediate_ca")]
    pub intermediate_authorities: Vec<IntermediateAuthority>,

    /// Leaf certificates.
    #[serde(rename = "leafCertificate", alias = "leaf_certificate")]
    pub leaf_certificates: Vec<LeafCertificate>,
}

impl HierarchySpec {
    /// Returns true if the document declares no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.root_authorities.is_empty()
            && self.intermediate_authorities.is_empty()
            && self.leaf_certificates.is_empty()
    }

    /// Total number of declared nodes.
    pub fn len(&self) -> usize {
        self.root_authorities.len()
            + self.intermediate_authorities.len()
            + self.leaf_certificates.len()
    }
}

/// Self-signed root certificate authority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RootAuthority {
    /// Path of a document that declares this node.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Certificate name.
    pub name: String,

    /// Private key password.
    pub password: String,

    /// PKCS#12 bundle password.
    #[serde(rename = "pfxPassword", alias = "pfx_password")]
    pub pfx_password: String,

    /// RSA key size in bits.
    #[serde(rename = "keySize", alias = "key_size", default = "default_key_size")]
    pub key_size: u32,

    /// Validity period in days.
    #[serde(
        rename = "validityDays",
        alias = "validity_days",
        default = "default_validity_days"
    )]
    pub validity_days: i64,

    /// Generate from the policy file instead of prompting.
    #[serde(rename = "hasExtensionFile", alias = "has_extension_file")]
    pub has_extension_file: bool,

    /// Insert into the system trust store.
    #[serde(
        rename = "shouldInsertIntoTrustedStore",
        alias = "should_insert_into_trusted_store"
    )]
    pub insert_into_trust_store: bool,

    /// Generate Diffie-Hellman parameters.
    #[serde(rename = "generateDHParam", alias = "generate_dhparam")]
    pub generate_dh_parameters: bool,

    /// Rewrite an existing policy file.
    #[serde(rename = "overwriteConfig", alias = "overwrite_config")]
    pub overwrite_config: bool,

    /// Certificate fields for the policy file.
    pub config: Option<BaseCertificateConfiguration>,
}

impl Default for RootAuthority {
    fn default() -> Self {
        Self {
            reference: None,
            name: String::new(),
            password: String::new(),
            pfx_password: String::new(),
            key_size: DEFAULT_KEY_SIZE,
            validity_days: DEFAULT_VALIDITY_DAYS,
            has_extension_file: false,
            insert_into_trust_store: false,
            generate_dh_parameters: false,
            overwrite_config: false,
            config: None,
        }
    }
}

impl HierarchyNode for RootAuthority {
    const KIND: NodeKind = NodeKind::Root;

    fn name(&self) -> &str {
        &self.name
    }

    fn reference(&self) -> Option<&str> {
        non_empty(&self.reference)
    }

    fn expand_environment(&mut self) {
        self.name = replace_env(&self.name);
        self.password = replace_env(&self.password);
        self.pfx_password = replace_env(&self.pfx_password);
    }
}

/// Intermediate certificate authority signed by another authority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntermediateAuthority {
    /// Path of a document that declares this node.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Certificate name.
    pub name: String,

    /// Private key password.
    pub password: String,

    /// PKCS#12 bundle password.
    #[serde(rename = "pfxPassword", alias = "pfx_password")]
    pub pfx_password: String,

    /// Name of the authority that signs this one.
    #[serde(rename = "caChainName", alias = "ca_chain_name")]
    pub chain_name: String,

    /// Private key password of the signing authority.
    #[serde(rename = "caChainPassword", alias = "ca_chain_password")]
    pub chain_password: String,

    /// The signing authority is a root authority.
    #[serde(rename = "isLastChainRootCA", alias = "is_last_chain_root_ca")]
    pub chain_is_root: bool,

    /// RSA key size in bits.
    #[serde(rename = "keySize", alias = "key_size", default = "default_key_size")]
    pub key_size: u32,

    /// Validity period in days.
    #[serde(
        rename = "validityDays",
        alias = "validity_days",
        default = "default_validity_days"
    )]
    pub validity_days: i64,

    /// Insert into the system trust store.
    #[serde(
        rename = "shouldInsertIntoTrustedStore",
        alias = "should_insert_into_trusted_store"
    )]
    pub insert_into_trust_store: bool,

    /// Generate Diffie-Hellman parameters.
    #[serde(rename = "generateDHParam", alias = "generate_dhparam")]
    pub generate_dh_parameters: bool,

    /// Keep the certificate signing request.
    #[serde(
        rename = "keepCertificateRequestFile",
        alias = "keep_certificate_request_file"
    )]
    pub keep_csr: bool,

    /// Rewrite an existing policy file.
    #[serde(rename = "overwriteConfig", alias = "overwrite_config")]
    pub overwrite_config: bool,

    /// Certificate fields for the policy file.
    pub config: Option<BaseCertificateConfiguration>,
}

impl Default for IntermediateAuthority {
    fn default() -> Self {
        Self {
            reference: None,
            name: String::new(),
            password: String::new(),
            pfx_password: String::new(),
            chain_name: String::new(),
            chain_password: String::new(),
            chain_is_root: false,
            key_size: DEFAULT_KEY_SIZE,
            validity_days: DEFAULT_VALIDITY_DAYS,
            insert_into_trust_store: false,
            generate_dh_parameters: false,
            keep_csr: false,
            overwrite_config: false,
            config: None,
        }
    }
}

impl HierarchyNode for IntermediateAuthority {
    const KIND: NodeKind = NodeKind::Intermediate;

    fn name(&self) -> &str {
        &self.name
    }

    fn reference(&self) -> Option<&str> {
        non_empty(&self.reference)
    }

    fn expand_environment(&mut self) {
        self.name = replace_env(&self.name);
        self.password = replace_env(&self.password);
        self.pfx_password = replace_env(&self.pfx_password);
        self.chain_name = replace_env(&self.chain_name);
        self.chain_password = replace_env(&self.chain_password);
    }
}

/// End-entity certificate issued by an authority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LeafCertificate {
    /// Path of a document that declares this node.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Certificate name.
    pub name: String,

    /// Private key password.
    pub password: String,

    /// PKCS#12 bundle password.
    #[serde(rename = "pfxPassword", alias = "pfx_password")]
    pub pfx_password: String,

    /// Name of the issuing authority.
    #[serde(rename = "caName", alias = "ca_name")]
    pub chain_name: String,

    /// Private key password of the issuing authority.
    #[serde(rename = "caPassword", alias = "ca_password")]
    pub chain_password: String,

    /// The issuing authority is a root authority.
    #[serde(
        rename = "isLastChainRootCA",
        alias = "is_ca_root_ca",
        alias = "is_last_chain_root_ca"
    )]
    pub chain_is_root: bool,

    /// RSA key size in bits.
    #[serde(rename = "keySize", alias = "key_size", default = "default_key_size")]
    pub key_size: u32,

    /// Validity period in days.
    #[serde(
        rename = "validityDays",
        alias = "validity_days",
        default = "default_validity_days"
    )]
    pub validity_days: i64,

    /// Generate Diffie-Hellman parameters.
    #[serde(rename = "generateDHParam", alias = "generate_dhparam")]
    pub generate_dh_parameters: bool,

    /// Keep the certificate signing request.
    #[serde(
        rename = "keepCertificateRequestFile",
        alias = "keep_certificate_request_file"
    )]
    pub keep_csr: bool,

    /// Rewrite an existing policy file.
    #[serde(rename = "overwriteConfig", alias = "overwrite_config")]
    pub overwrite_config: bool,

    /// Certificate fields for the policy file.
    pub config: Option<LeafCertificateConfiguration>,
}

impl Default for LeafCertificate {
    fn default() -> Self {
        Self {
            reference: None,
            name: String::new(),
            password: String::new(),
            pfx_password: String::new(),
            chain_name: String::new(),
            chain_password: String::new(),
            chain_is_root: false,
            key_size: DEFAULT_KEY_SIZE,
            validity_days: DEFAULT_VALIDITY_DAYS,
            generate_dh_parameters: false,
            keep_csr: false,
            overwrite_config: false,
            config: None,
        }
    }
}

impl HierarchyNode for LeafCertificate {
    const KIND: NodeKind = NodeKind::Leaf;

    fn name(&self) -> &str {
        &self.name
    }

    fn reference(&self) -> Option<&str> {
        non_empty(&self.reference)
    }

    fn expand_environment(&mut self) {
        self.name = replace_env(&self.name);
        self.password = replace_env(&self.password);
        self.pfx_password = replace_env(&self.pfx_password);
        self.chain_name = replace_env(&self.chain_name);
        self.chain_password = replace_env(&self.chain_password);
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Distinguished name and extension fields shared by every certificate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BaseCertificateConfiguration {
    /// Country (C), two letters.
    pub country: String,

    /// State or province (ST).
    pub state: String,

    /// Locality (L).
    pub locality: String,

    /// Organization (O).
    pub organization: String,

    /// Organizational unit (OU).
    #[serde(rename = "organizationalUnit", alias = "organizational_unit")]
    pub organizational_unit: String,

    /// Common name (CN). Required.
    #[serde(rename = "commonName", alias = "common_name")]
    pub common_name: String,

    /// Email address.
    pub email: String,

    /// Mark basic constraints critical.
    #[serde(
        rename = "criticalBasicConstraints",
        alias = "critical_basic_constraints"
    )]
    pub critical_basic_constraints: bool,

    /// Mark key usage critical.
    #[serde(rename = "criticalKeyUsage", alias = "critical_key_usage")]
    pub critical_key_usage: bool,

    /// Mark extended key usage critical.
    #[serde(
        rename = "criticalExtendedKeyUsage",
        alias = "critical_extended_key_usage"
    )]
    pub critical_extended_key_usage: bool,

    /// Mark certificate policies critical.
    #[serde(
        rename = "criticalCertificatePolicies",
        alias = "critical_certificate_policies"
    )]
    pub critical_certificate_policies: bool,

    /// Mark name constraints critical.
    #[serde(rename = "criticalNameConstraints", alias = "critical_name_constraints")]
    pub critical_name_constraints: bool,

    /// Additional basic constraints (e.g. `pathlen:0`).
    #[serde(rename = "basicConstraints", alias = "basic_constraints")]
    pub basic_constraints: Vec<String>,

    /// Key usages.
    #[serde(rename = "keyUsages", alias = "key_usages")]
    pub key_usages: Vec<String>,

    /// Extended key usages.
    #[serde(rename = "extendedKeyUsages", alias = "extended_key_usages")]
    pub extended_key_usages: Vec<String>,

    /// Certificate policies.
    #[serde(rename = "certificatePolicies", alias = "certificate_policies")]
    pub certificate_policies: Vec<String>,

    /// Name constraints.
    #[serde(rename = "nameConstraints", alias = "name_constraints")]
    pub name_constraints: Vec<String>,
}

/// Leaf certificate fields: the base fields plus subject alternative names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LeafCertificateConfiguration {
    /// Shared distinguished name and extension fields.
    #[serde(flatten)]
    pub base: BaseCertificateConfiguration,

    /// Mark subject alternative names critical.
    #[serde(rename = "criticalSubjectAltNames", alias = "critical_subject_alt_names")]
    pub critical_subject_alt_names: bool,

    /// Subject alternative names.
    #[serde(rename = "subjectAlternativeName", alias = "subject_alternative_name")]
    pub subject_alternative_name: Option<SubjectAlternativeNameConfiguration>,
}

/// Subject alternative name lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SubjectAlternativeNameConfiguration {
    /// DNS names.
    #[serde(rename = "dnsNames", alias = "dns_names")]
    pub dns_names: Vec<String>,

    /// Email addresses.
    #[serde(rename = "emailAddresses", alias = "email_addresses")]
    pub email_addresses: Vec<String>,

    /// IP addresses.
    #[serde(rename = "ipAddresses", alias = "ip_addresses")]
    pub ip_addresses: Vec<String>,

    /// URIs.
    pub uris: Vec<String>,

    /// Directory name section references.
    #[serde(rename = "directoryNames", alias = "directory_names")]
    pub directory_names: Vec<String>,

    /// Registered IDs (OIDs).
    #[serde(rename = "registeredIDs", alias = "registered_ids")]
    pub registered_ids: Vec<String>,

    /// Other names (`OID;TYPE:value`).
    #[serde(rename = "otherNames", alias = "other_names")]
    pub other_names: Vec<String>,
}

impl SubjectAlternativeNameConfiguration {
    /// Returns true if no list holds an entry.
    pub fn is_empty(&self) -> bool {
        self.dns_names.is_empty()
            && self.email_addresses.is_empty()
            && self.ip_addresses.is_empty()
            && self.uris.is_empty()
            && self.directory_names.is_empty()
            && self.registered_ids.is_empty()
            && self.other_names.is_empty()
    }
}
