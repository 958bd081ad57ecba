// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Run-scoped registry of generated authorities.
//!
//! The registry is the only record of what a run has already produced. It is
//! consulted before generating any authority so each one is generated at
//! most once, and while resolving a chain link to decide whether its parent
//! still has to be generated. Roots and intermediates live in separate
//! namespaces: an intermediate may share its name with the root that signs it.

use std::collections::HashMap;

use crate::hierarchy::{IntermediateAuthority, NodeKind, RootAuthority};

/// Authority recorded in the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorityRecord {
    /// A generated root certificate authority.
    Root(RootAuthority),

    /// A generated intermediate certificate authority.
    Intermediate(IntermediateAuthority),
}

impl AuthorityRecord {
    /// Kind of the recorded authority.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Root(_) => NodeKind::Root,
            Self::Intermediate(_) => NodeKind::Intermediate,
        }
    }

    /// Name of the recorded authority.
    pub fn name(&self) -> &str {
        match self {
            Self::Root(root) => &root.name,
            Self::Intermediate(int) => &int.name,
        }
    }
}

/// Generated authorities, keyed by kind and name.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<(NodeKind, String), AuthorityRecord>,
    order: Vec<(NodeKind, String)>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if an authority of `kind` named `name` was generated.
    pub fn contains(&self, kind: NodeKind, name: &str) -> bool {
        self.entries.contains_key(&(kind, name.to_string()))
    }

    /// Look up a generated authority.
    pub fn get(&self, kind: NodeKind, name: &str) -> Option<&AuthorityRecord> {
        self.entries.get(&(kind, name.to_string()))
    }

    /// Record a generated root authority.
    ///
    /// Returns false, leaving the registry unchanged, if it was already recorded.
    pub fn record_root(&mut self, root: RootAuthority) -> bool {
        self.insert(AuthorityRecord::Root(root))
    }

    /// Record a generated intermediate authority.
    ///
    /// Returns false, leaving the registry unchanged, if it was already recorded.
    pub fn record_intermediate(&mut self, int: IntermediateAuthority) -> bool {
        self.insert(AuthorityRecord::Intermediate(int))
    }

    fn insert(&mut self, record: AuthorityRecord) -> bool {
        let key = (record.kind(), record.name().to_string());
        if self.entries.contains_key(&key) {
            return false;
        }
        self.order.push(key.clone());
        self.entries.insert(key, record);
        true
    }

    /// Number of recorded authorities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded authorities in generation order.
    pub fn iter(&self) -> impl Iterator<Item = &AuthorityRecord> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }
}
