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

//! Integration tests for chain link ordering and idempotence

use crate::integration::{Fixture, RecordingSigningTool};
use pki_hierarchy::{DryRunSigningTool, HierarchyError, HierarchyResolver, NodeKind};

const CHAIN_YAML: &str = r#"
root_ca:
  - name: R
    password: rootpassword
    pfx_password: rootpfxpassword
    key_size: 4096
    config:
      country: US
      common_name: Example Root
intermediate_ca:
  - name: B
    password: bpassword
    pfx_password: bpfxpassword
    ca_chain_name: A
    ca_chain_password: apassword
  - name: A
    password: apassword
    pfx_password: apfxpassword
    ca_chain_name: R
    ca_chain_password: rootpassword
    is_last_chain_root_ca: true
    config:
      common_name: Example Intermediate A
      key_usages: [keyCertSign, cRLSign, digitalSignature]
leaf_certificate:
  - name: web
    password: webpassword
    pfx_password: webpfxpassword
    ca_name: B
    ca_password: bpassword
    keep_certificate_request_file: true
    config:
      common_name: web.example.com
      subject_alternative_name:
        dns_names: [web.example.com, www.example.com]
        ip_addresses: [10.0.0.5]
"#;

#[test]
fn test_parent_generated_before_child() {
    let fixture = Fixture::new();
    let path = fixture.write("hierarchy.yaml", CHAIN_YAML);
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    let report = HierarchyResolver::new(&config, &tool)
        .run(&path)
        .expect("Generation failed");

    assert_eq!(tool.names(), ["R", "A", "B", "web"]);
    let kinds: Vec<NodeKind> = report.generated.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        [
            NodeKind::Root,
            NodeKind::Intermediate,
            NodeKind::Intermediate,
            NodeKind::Leaf
        ]
    );
}

#[test]
fn test_signing_arguments_and_secrets() {
    let fixture = Fixture::new();
    let path = fixture.write("hierarchy.yaml", CHAIN_YAML);
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    HierarchyResolver::new(&config, &tool)
        .run(&path)
        .expect("Generation failed");

    let calls = tool.calls();
    let root = &calls[0];
    assert_eq!(root.password, "rootpassword");
    assert_eq!(root.arguments[0], "R");
    assert!(root.arguments[1].starts_with("file:"));
    assert!(!root.arguments.iter().any(|a| a.contains("rootpassword")));
    assert_eq!(root.arguments.last().map(String::as_str), Some("4096"));

    let b = &calls[2];
    assert_eq!(b.chain_password.as_deref(), Some("apassword"));
    assert_eq!(&b.arguments[..2], ["NO", "A"]);

    let web = &calls[3];
    assert_eq!(web.arguments[0], "NO");
    assert_eq!(web.arguments[1], "B");
    // SKIP_DH KEEP_CSR VALIDITY KEYSIZE
    assert_eq!(&web.arguments[6..], ["YES", "YES", "4086", "2048"]);
}

#[test]
fn test_policy_files_and_secret_cleanup() {
    let fixture = Fixture::new();
    let path = fixture.write("hierarchy.yaml", CHAIN_YAML);
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    let report = HierarchyResolver::new(&config, &tool)
        .run(&path)
        .expect("Generation failed");

    assert_eq!(report.policies_written.len(), 3);
    assert_eq!(
        fixture.working_files(),
        ["ca-A.conf", "root-ca-R.conf", "web.conf"]
    );

    for call in tool.calls() {
        for staged in &call.staged {
            assert!(!staged.exists(), "{} left behind", staged.display());
        }
    }

    let web = std::fs::read_to_string(fixture.working_dir().join("web.conf")).unwrap();
    assert!(web.contains("basicConstraints = CA:FALSE\n"));
    assert!(web.contains("DNS.0 = web.example.com\nDNS.1 = www.example.com\n"));
    assert!(web.contains("IP.0 = 10.0.0.5\n"));

    let a = std::fs::read_to_string(fixture.working_dir().join("ca-A.conf")).unwrap();
    assert!(a.contains("keyUsage = keyCertSign, cRLSign, digitalSignature\n"));
}

#[test]
fn test_shared_chain_link_generated_once() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "hierarchy.json",
        r#"{
            "intermediateCa": [
                {
                    "name": "ops",
                    "password": "opspassword",
                    "pfxPassword": "opspfxpassword",
                    "caChainName": "legacy-root",
                    "caChainPassword": "legacypassword",
                    "isLastChainRootCA": true
                }
            ],
            "leafCertificate": [
                {
                    "name": "api",
                    "password": "apipassword",
                    "pfxPassword": "apipfxpassword",
                    "caName": "ops",
                    "caPassword": "opspassword"
                },
                {
                    "name": "mail",
                    "password": "mailpassword",
                    "pfxPassword": "mailpfxpassword",
                    "caName": "ops",
                    "caPassword": "opspassword"
                }
            ]
        }"#,
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    let mut resolver = HierarchyResolver::new(&config, &tool);
    resolver.run(&path).expect("Generation failed");

    assert_eq!(tool.names(), ["ops", "api", "mail"]);
    assert_eq!(resolver.registry().len(), 1);
    assert!(resolver.registry().contains(NodeKind::Intermediate, "ops"));
}

#[test]
fn test_environment_expressions() {
    // Cargo sets CARGO_PKG_NAME for the test process.
    let fixture = Fixture::new();
    let path = fixture.write(
        "hierarchy.yml",
        r#"
root_ca:
  - name: ${{ env.CARGO_PKG_NAME }}
    password: ${{ env.CARGO_PKG_NAME }}
    pfx_password: rootpfxpassword
"#,
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    HierarchyResolver::new(&config, &tool)
        .run(&path)
        .expect("Generation failed");

    let calls = tool.calls();
    assert_eq!(calls[0].name, env!("CARGO_PKG_NAME"));
    assert_eq!(calls[0].password, env!("CARGO_PKG_NAME"));
}

#[test]
fn test_unset_environment_variable_fails_validation() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "hierarchy.yml",
        r#"
root_ca:
  - name: root
    password: ${{ env.PKI_HIERARCHY_UNSET_ROOT_PASSWORD }}
    pfx_password: rootpfxpassword
"#,
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    let err = HierarchyResolver::new(&config, &tool)
        .run(&path)
        .unwrap_err();

    assert!(matches!(err, HierarchyError::Validation(_)));
    assert!(tool.calls().is_empty());
}

#[test]
fn test_planning_matches_generation_order() {
    let fixture = Fixture::new();
    let path = fixture.write("hierarchy.yaml", CHAIN_YAML);
    let config = fixture.config();
    let tool = DryRunSigningTool::new();

    HierarchyResolver::planning(&config, &tool)
        .run(&path)
        .expect("Planning failed");

    let names: Vec<String> = tool.invocations().into_iter().map(|i| i.name).collect();
    assert_eq!(names, ["R", "A", "B", "web"]);
    assert!(!fixture.working_dir().exists());
}
