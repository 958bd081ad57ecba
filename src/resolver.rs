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

//! Hierarchy resolution and generation.
//!
//! A run has two phases:
//!
//! 1. [`prepare`] resolves `$ref` references and environment expressions for
//!    every node, validates every node, renders every policy in memory and
//!    builds the [`DependencyGraph`]. Missing chain links and chain link
//!    cycles are reported here, before anything is written.
//! 2. [`HierarchyResolver::generate`] walks roots, then intermediates, then
//!    leaves. An intermediate or leaf whose chain link has not been generated
//!    yet generates that chain link first. The [`Registry`] guarantees that
//!    every authority is generated at most once.
//!
//! # Example
//!
//! ```no_run
//! use pki_hierarchy::config::GeneratorConfig;
//! use pki_hierarchy::resolver::HierarchyResolver;
//! use pki_hierarchy::signing::ScriptSigningTool;
//!
//! # fn example() -> pki_hierarchy::Result<()> {
//! let config = GeneratorConfig::default();
//! let tool = ScriptSigningTool::new(&config.scripts_dir);
//! tool.verify_available()?;
//!
//! let mut resolver = HierarchyResolver::new(&config, &tool);
//! let report = resolver.run("/etc/pki/hierarchy.yaml")?;
//! println!("Generated {} certificates", report.generated.len());
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::error::{HierarchyError, Result};
use crate::hierarchy::{
    HierarchyNode, HierarchySpec, IntermediateAuthority, LeafCertificate, NodeKind,
    RootAuthority, load_hierarchy, resolve_reference,
};
use crate::policy::{PolicyWrite, policy_path, render_ca_policy, render_leaf_policy, write_policy_file};
use crate::registry::Registry;
use crate::secrets::{SecretPurpose, SecretStager};
use crate::signing::{ChainLink, IntermediateRequest, LeafRequest, RootRequest, SigningTool};
use crate::validation::Validator;

/// A resolved and validated node with its rendered policy.
#[derive(Debug, Clone)]
pub struct Prepared<T> {
    /// The node after reference and environment resolution.
    pub node: T,

    /// Policy document, when the node declares a certificate configuration.
    pub policy: Option<String>,
}

/// Chain link relationships between nodes.
///
/// Parents are indices into the intermediate collection. Only the first
/// intermediate declared under a name can be a parent.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    intermediate_index: HashMap<String, usize>,
    intermediate_parents: Vec<Option<usize>>,
    leaf_parents: Vec<Option<usize>>,
}

impl DependencyGraph {
    /// Build the graph and check it.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::Dependency`] when a chain link that is not a
    /// root cannot be found among the intermediates, and
    /// [`HierarchyError::DependencyCycle`] when chain links loop.
    pub fn build<'a>(
        roots: impl IntoIterator<Item = &'a RootAuthority>,
        intermediates: impl IntoIterator<Item = &'a IntermediateAuthority>,
        leaves: impl IntoIterator<Item = &'a LeafCertificate>,
    ) -> Result<Self> {
        let root_names: HashSet<&str> = roots.into_iter().map(|r| r.name.as_str()).collect();
        let intermediates: Vec<&IntermediateAuthority> = intermediates.into_iter().collect();

        let mut intermediate_index = HashMap::new();
        for (index, int) in intermediates.iter().enumerate() {
            if intermediate_index.contains_key(&int.name) {
                warn!(
                    "Intermediate certificate authority {} is declared more than once; the first declaration wins",
                    int.name
                );
                continue;
            }
            intermediate_index.insert(int.name.clone(), index);
        }

        let mut graph = Self {
            intermediate_index,
            intermediate_parents: Vec::with_capacity(intermediates.len()),
            leaf_parents: Vec::new(),
        };

        for (index, int) in intermediates.iter().enumerate() {
            let parent = if graph.intermediate_index.get(&int.name) != Some(&index) {
                None
            } else {
                graph.chain_link(
                    NodeKind::Intermediate,
                    &int.name,
                    &int.chain_name,
                    int.chain_is_root,
                    &root_names,
                )?
            };
            graph.intermediate_parents.push(parent);
        }

        for leaf in leaves {
            let parent = graph.chain_link(
                NodeKind::Leaf,
                &leaf.name,
                &leaf.chain_name,
                leaf.chain_is_root,
                &root_names,
            )?;
            graph.leaf_parents.push(parent);
        }

        graph.detect_cycles(&intermediates)?;
        Ok(graph)
    }

    fn chain_link(
        &self,
        kind: NodeKind,
        name: &str,
        chain_name: &str,
        chain_is_root: bool,
        root_names: &HashSet<&str>,
    ) -> Result<Option<usize>> {
        if chain_is_root {
            if !root_names.contains(chain_name) {
                debug!(
                    "Root certificate authority {} of {} {} is not declared; expecting it from a previous run",
                    chain_name,
                    kind.description(),
                    name
                );
            }
            return Ok(None);
        }

        match self.intermediate_index.get(chain_name) {
            Some(&parent) => Ok(Some(parent)),
            None => Err(HierarchyError::dependency(format!(
                "chain link '{}' of {} '{}' is not declared among the intermediate certificate authorities",
                chain_name,
                kind.description(),
                name
            ))),
        }
    }

    fn detect_cycles(&self, intermediates: &[&IntermediateAuthority]) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.intermediate_parents.len()];
        for start in 0..marks.len() {
            let mut path: Vec<usize> = Vec::new();
            let mut current = Some(start);

            while let Some(index) = current {
                match marks[index] {
                    Mark::Done => break,
                    Mark::InProgress => {
                        let begin = path.iter().position(|&p| p == index).unwrap_or(0);
                        let mut cycle: Vec<String> = path[begin..]
                            .iter()
                            .map(|&p| intermediates[p].name.clone())
                            .collect();
                        cycle.push(intermediates[index].name.clone());
                        return Err(HierarchyError::DependencyCycle(cycle));
                    }
                    Mark::Unvisited => {
                        marks[index] = Mark::InProgress;
                        path.push(index);
                        current = self.intermediate_parents[index];
                    }
                }
            }

            for index in path {
                marks[index] = Mark::Done;
            }
        }

        Ok(())
    }

    /// Index of the intermediate that signs the intermediate at `index`.
    pub fn intermediate_parent(&self, index: usize) -> Option<usize> {
        self.intermediate_parents.get(index).copied().flatten()
    }

    /// Index of the intermediate that issues the leaf at `index`.
    pub fn leaf_parent(&self, index: usize) -> Option<usize> {
        self.leaf_parents.get(index).copied().flatten()
    }
}

/// A hierarchy ready for generation.
#[derive(Debug, Clone)]
pub struct PreparedHierarchy {
    /// Root certificate authorities in declaration order.
    pub roots: Vec<Prepared<RootAuthority>>,

    /// Intermediate certificate authorities in declaration order.
    pub intermediates: Vec<Prepared<IntermediateAuthority>>,

    /// Leaf certificates in declaration order.
    pub leaves: Vec<Prepared<LeafCertificate>>,

    /// Chain link relationships.
    pub graph: DependencyGraph,
}

impl PreparedHierarchy {
    /// Total number of declared nodes.
    pub fn len(&self) -> usize {
        self.roots.len() + self.intermediates.len() + self.leaves.len()
    }

    /// Returns true if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve, validate and render every node of a hierarchy.
///
/// `config_path` is the hierarchy document's path; relative `$ref` paths are
/// resolved against its directory. Nothing is written to disk.
pub fn prepare(
    spec: HierarchySpec,
    config_path: &Path,
    validator: &Validator,
) -> Result<PreparedHierarchy> {
    let mut roots = Vec::with_capacity(spec.root_authorities.len());
    for mut root in spec.root_authorities {
        resolve_node(&mut root, config_path)?;
        validator.validate_root(&root)?;
        let policy = root
            .config
            .as_ref()
            .map(render_ca_policy)
            .transpose()
            .map_err(|e| with_node_context(e, NodeKind::Root, &root.name))?;
        roots.push(Prepared { node: root, policy });
    }

    let mut intermediates = Vec::with_capacity(spec.intermediate_authorities.len());
    for mut int in spec.intermediate_authorities {
        resolve_node(&mut int, config_path)?;
        validator.validate_intermediate(&int)?;
        let policy = int
            .config
            .as_ref()
            .map(render_ca_policy)
            .transpose()
            .map_err(|e| with_node_context(e, NodeKind::Intermediate, &int.name))?;
        intermediates.push(Prepared { node: int, policy });
    }

    let mut leaves = Vec::with_capacity(spec.leaf_certificates.len());
    for mut leaf in spec.leaf_certificates {
        resolve_node(&mut leaf, config_path)?;
        validator.validate_leaf(&leaf)?;
        let policy = leaf
            .config
            .as_ref()
            .map(render_leaf_policy)
            .transpose()
            .map_err(|e| with_node_context(e, NodeKind::Leaf, &leaf.name))?;
        leaves.push(Prepared { node: leaf, policy });
    }

    let graph = DependencyGraph::build(
        roots.iter().map(|p| &p.node),
        intermediates.iter().map(|p| &p.node),
        leaves.iter().map(|p| &p.node),
    )?;

    Ok(PreparedHierarchy {
        roots,
        intermediates,
        leaves,
        graph,
    })
}

fn resolve_node<T>(node: &mut T, config_path: &Path) -> Result<()>
where
    T: HierarchyNode + Serialize + DeserializeOwned,
{
    resolve_reference(node, config_path)?;
    node.expand_environment();
    Ok(())
}

fn with_node_context(error: HierarchyError, kind: NodeKind, name: &str) -> HierarchyError {
    match error {
        HierarchyError::Policy(msg) => {
            HierarchyError::policy(format!("{} '{}': {msg}", kind.description(), name))
        }
        other => other,
    }
}

/// A node generated during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedNode {
    /// Kind of node.
    pub kind: NodeKind,
    /// Node name.
    pub name: String,
}

/// Outcome of a generation run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Generated nodes in generation order.
    pub generated: Vec<GeneratedNode>,

    /// Policy files written.
    pub policies_written: Vec<PathBuf>,

    /// Existing policy files left untouched.
    pub policies_kept: Vec<PathBuf>,
}

/// Walks a prepared hierarchy and drives the Signing Tool.
pub struct HierarchyResolver<'a, T: SigningTool + ?Sized> {
    config: &'a GeneratorConfig,
    tool: &'a T,
    validator: Validator,
    stager: SecretStager,
    write_policies: bool,
    registry: Registry,
    report: RunReport,
}

impl<'a, T: SigningTool + ?Sized> HierarchyResolver<'a, T> {
    /// Create a resolver that writes policies and stages secrets.
    pub fn new(config: &'a GeneratorConfig, tool: &'a T) -> Self {
        Self {
            config,
            tool,
            validator: Validator::new(config.password_policy),
            stager: SecretStager::new(&config.working_dir),
            write_policies: true,
            registry: Registry::new(),
            report: RunReport::default(),
        }
    }

    /// Create a resolver that never touches the disk.
    ///
    /// Secret references and policy paths are computed but nothing is
    /// written. Pair it with [`DryRunSigningTool`](crate::signing::DryRunSigningTool)
    /// to describe a run.
    pub fn planning(config: &'a GeneratorConfig, tool: &'a T) -> Self {
        Self {
            stager: SecretStager::planning(&config.working_dir),
            write_policies: false,
            ..Self::new(config, tool)
        }
    }

    /// Authorities generated so far.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Load, prepare and generate the hierarchy at `config_path`.
    pub fn run(&mut self, config_path: impl AsRef<Path>) -> Result<RunReport> {
        let config_path = std::path::absolute(config_path.as_ref())?;
        let spec = load_hierarchy(&config_path)?;
        let hierarchy = prepare(spec, &config_path, &self.validator)?;
        self.generate(&hierarchy)
    }

    /// Generate every node of a prepared hierarchy.
    pub fn generate(&mut self, hierarchy: &PreparedHierarchy) -> Result<RunReport> {
        if self.write_policies {
            self.config.prepare_working_dir()?;
        }

        for root in &hierarchy.roots {
            self.generate_root(root)?;
        }

        for index in 0..hierarchy.intermediates.len() {
            self.generate_intermediate(hierarchy, index)?;
        }

        let mut leaves = HashSet::new();
        for (index, leaf) in hierarchy.leaves.iter().enumerate() {
            if !leaves.insert(leaf.node.name.as_str()) {
                warn!(
                    "Leaf certificate {} is declared more than once; the first declaration wins",
                    leaf.node.name
                );
                continue;
            }
            self.generate_leaf(hierarchy, index)?;
        }

        info!(
            "Generated {} certificates ({} authorities)",
            self.report.generated.len(),
            self.registry.len()
        );
        Ok(std::mem::take(&mut self.report))
    }

    fn generate_root(&mut self, prepared: &Prepared<RootAuthority>) -> Result<()> {
        let root = &prepared.node;
        if self.registry.contains(NodeKind::Root, &root.name) {
            debug!("Root certificate authority {} already generated", root.name);
            return Ok(());
        }

        info!("Generating root certificate authority: {}", root.name);
        self.emit_policy(NodeKind::Root, &root.name, prepared, root.overwrite_config)?;

        let mut staged = self.stager.begin(NodeKind::Root, &root.name);
        let request = RootRequest {
            name: root.name.clone(),
            password: staged.stage(SecretPurpose::Password, &root.password)?,
            pfx_password: staged.stage(SecretPurpose::PfxPassword, &root.pfx_password)?,
            insert_into_trust_store: root.insert_into_trust_store,
            generate_dh_parameters: root.generate_dh_parameters,
            has_extension_file: root.has_extension_file,
            validity_days: root.validity_days,
            key_size: root.key_size,
        };
        self.tool.generate_root(&request)?;
        drop(staged);

        self.registry.record_root(root.clone());
        self.record(NodeKind::Root, &root.name);
        Ok(())
    }

    fn generate_intermediate(&mut self, hierarchy: &PreparedHierarchy, index: usize) -> Result<()> {
        let prepared = &hierarchy.intermediates[index];
        let int = &prepared.node;
        if self.registry.contains(NodeKind::Intermediate, &int.name) {
            debug!("Intermediate certificate authority {} already generated", int.name);
            return Ok(());
        }

        if !int.chain_is_root && !self.registry.contains(NodeKind::Intermediate, &int.chain_name) {
            let parent = hierarchy.graph.intermediate_parent(index).ok_or_else(|| {
                HierarchyError::dependency(format!(
                    "chain link '{}' of intermediate certificate authority '{}' is not declared",
                    int.chain_name, int.name
                ))
            })?;
            debug!("Resolving chain link {} of {} first", int.chain_name, int.name);
            self.generate_intermediate(hierarchy, parent)?;
        }

        info!("Generating intermediate certificate authority: {}", int.name);
        self.emit_policy(NodeKind::Intermediate, &int.name, prepared, int.overwrite_config)?;

        let mut staged = self.stager.begin(NodeKind::Intermediate, &int.name);
        let request = IntermediateRequest {
            name: int.name.clone(),
            password: staged.stage(SecretPurpose::Password, &int.password)?,
            pfx_password: staged.stage(SecretPurpose::PfxPassword, &int.pfx_password)?,
            chain: ChainLink {
                name: int.chain_name.clone(),
                password: staged.stage(SecretPurpose::ChainPassword, &int.chain_password)?,
                is_root: int.chain_is_root,
            },
            insert_into_trust_store: int.insert_into_trust_store,
            generate_dh_parameters: int.generate_dh_parameters,
            keep_csr: int.keep_csr,
            validity_days: int.validity_days,
            key_size: int.key_size,
        };
        self.tool.generate_intermediate(&request)?;
        drop(staged);

        self.registry.record_intermediate(int.clone());
        self.record(NodeKind::Intermediate, &int.name);
        Ok(())
    }

    fn generate_leaf(&mut self, hierarchy: &PreparedHierarchy, index: usize) -> Result<()> {
        let prepared = &hierarchy.leaves[index];
        let leaf = &prepared.node;

        if !leaf.chain_is_root && !self.registry.contains(NodeKind::Intermediate, &leaf.chain_name)
        {
            let parent = hierarchy.graph.leaf_parent(index).ok_or_else(|| {
                HierarchyError::dependency(format!(
                    "chain link '{}' of leaf certificate '{}' is not declared",
                    leaf.chain_name, leaf.name
                ))
            })?;
            debug!("Resolving chain link {} of {} first", leaf.chain_name, leaf.name);
            self.generate_intermediate(hierarchy, parent)?;
        }

        info!("Generating leaf certificate: {}", leaf.name);
        self.emit_policy(NodeKind::Leaf, &leaf.name, prepared, leaf.overwrite_config)?;

        let mut staged = self.stager.begin(NodeKind::Leaf, &leaf.name);
        let request = LeafRequest {
            name: leaf.name.clone(),
            password: staged.stage(SecretPurpose::Password, &leaf.password)?,
            pfx_password: staged.stage(SecretPurpose::PfxPassword, &leaf.pfx_password)?,
            chain: ChainLink {
                name: leaf.chain_name.clone(),
                password: staged.stage(SecretPurpose::ChainPassword, &leaf.chain_password)?,
                is_root: leaf.chain_is_root,
            },
            generate_dh_parameters: leaf.generate_dh_parameters,
            keep_csr: leaf.keep_csr,
            validity_days: leaf.validity_days,
            key_size: leaf.key_size,
        };
        self.tool.generate_leaf(&request)?;
        drop(staged);

        self.record(NodeKind::Leaf, &leaf.name);
        Ok(())
    }

    fn emit_policy<N>(
        &mut self,
        kind: NodeKind,
        name: &str,
        prepared: &Prepared<N>,
        overwrite: bool,
    ) -> Result<()> {
        let Some(policy) = prepared.policy.as_deref() else {
            return Ok(());
        };

        let path = policy_path(&self.config.working_dir, kind, name);
        if !self.write_policies {
            debug!("Would write policy file {}", path.display());
            return Ok(());
        }

        match write_policy_file(&path, policy, overwrite)? {
            PolicyWrite::Written => self.report.policies_written.push(path),
            PolicyWrite::Kept => self.report.policies_kept.push(path),
        }
        Ok(())
    }

    fn record(&mut self, kind: NodeKind, name: &str) {
        self.report.generated.push(GeneratedNode {
            kind,
            name: name.to_string(),
        });
    }
}
