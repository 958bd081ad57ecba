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

//! Integration tests for fatal conditions

use crate::integration::{Fixture, RecordingSigningTool};
use pki_hierarchy::{GeneratorConfig, HierarchyError, HierarchyResolver, PasswordPolicy};

#[test]
fn test_cycle_is_reported_before_generation() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "hierarchy.yaml",
        r#"
intermediate_ca:
  - name: east
    password: eastpassword
    pfx_password: eastpfxpassword
    ca_chain_name: west
    ca_chain_password: westpassword
  - name: west
    password: westpassword
    pfx_password: westpfxpassword
    ca_chain_name: east
    ca_chain_password: eastpassword
"#,
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    let err = HierarchyResolver::new(&config, &tool)
        .run(&path)
        .unwrap_err();

    match err {
        HierarchyError::DependencyCycle(cycle) => assert_eq!(cycle, ["east", "west", "east"]),
        other => panic!("Expected a dependency cycle, got: {other}"),
    }
    assert!(tool.calls().is_empty());
    assert!(!fixture.working_dir().exists());
}

#[test]
fn test_missing_parent_is_fatal() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "hierarchy.json",
        r#"{
            "leafCertificate": [{
                "name": "orphan",
                "password": "orphanpassword",
                "pfxPassword": "orphanpfxpassword",
                "caName": "nowhere",
                "caPassword": "nowherepassword"
            }]
        }"#,
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    let err = HierarchyResolver::new(&config, &tool)
        .run(&path)
        .unwrap_err();

    assert!(matches!(err, HierarchyError::Dependency(_)));
    assert!(err.to_string().contains("nowhere"));
    assert!(tool.calls().is_empty());
}

#[test]
fn test_tool_failure_aborts_run_and_removes_secrets() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "hierarchy.yaml",
        r#"
root_ca:
  - name: root
    password: rootpassword
    pfx_password: rootpfxpassword
intermediate_ca:
  - name: ops
    password: opspassword
    pfx_password: opspfxpassword
    ca_chain_name: root
    ca_chain_password: rootpassword
    is_last_chain_root_ca: true
leaf_certificate:
  - name: web
    password: webpassword
    pfx_password: webpfxpassword
    ca_name: ops
    ca_password: opspassword
"#,
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::failing_on("ops");

    let err = HierarchyResolver::new(&config, &tool)
        .run(&path)
        .unwrap_err();

    assert!(matches!(err, HierarchyError::ToolExit { code: Some(1), .. }));
    assert_eq!(tool.names(), ["root", "ops"]);
    assert!(fixture.working_files().is_empty());
}

#[test]
fn test_validation_failure_writes_nothing() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "hierarchy.yaml",
        r#"
root_ca:
  - name: root
    password: rootpassword
    pfx_password: rootpfxpassword
    config:
      common_name: Root
leaf_certificate:
  - name: bad name
    password: webpassword
    pfx_password: webpfxpassword
    ca_name: root
    ca_password: rootpassword
    is_ca_root_ca: true
"#,
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    let err = HierarchyResolver::new(&config, &tool)
        .run(&path)
        .unwrap_err();

    assert!(matches!(err, HierarchyError::Validation(_)));
    assert!(tool.calls().is_empty());
    assert!(!fixture.working_dir().exists());
}

#[test]
fn test_password_policies() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "hierarchy.json",
        r#"{ "rootCa": [{ "name": "root", "password": "abcd", "pfxPassword": "efgh" }] }"#,
    );
    let tool = RecordingSigningTool::new();

    let strict = fixture.config();
    let err = HierarchyResolver::new(&strict, &tool)
        .run(&path)
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Validation(_)));

    let relaxed = GeneratorConfig::builder()
        .working_dir(fixture.working_dir())
        .password_policy(PasswordPolicy::Relaxed)
        .build()
        .expect("Valid config");
    HierarchyResolver::new(&relaxed, &tool)
        .run(&path)
        .expect("Relaxed policy accepts 4 characters");
    assert_eq!(tool.names(), ["root"]);
}

#[test]
fn test_leaf_requesting_ca_is_rejected() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "hierarchy.yaml",
        r#"
leaf_certificate:
  - name: sneaky
    password: sneakypassword
    pfx_password: sneakypfxpassword
    ca_name: root
    ca_password: rootpassword
    is_last_chain_root_ca: true
    config:
      common_name: sneaky.example.com
      basic_constraints: ["ca:true", "pathlen:0"]
"#,
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    let err = HierarchyResolver::new(&config, &tool)
        .run(&path)
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Policy(_)));
    assert!(err.to_string().contains("sneaky"));
}

#[test]
fn test_unsupported_document_extension() {
    let fixture = Fixture::new();
    let path = fixture.write("hierarchy.toml", "[[root_ca]]\nname = \"root\"\n");
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    let err = HierarchyResolver::new(&config, &tool)
        .run(&path)
        .unwrap_err();
    assert!(matches!(err, HierarchyError::UnsupportedFormat(_)));
}
