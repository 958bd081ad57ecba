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

//! Integration tests for `$ref` documents

use crate::integration::{Fixture, RecordingSigningTool};
use pki_hierarchy::{DryRunSigningTool, HierarchyError, HierarchyResolver};

#[test]
fn test_json_document_with_yaml_references() {
    let fixture = Fixture::new();
    fixture.write(
        "pki/fragments/root.yaml",
        "name: corp-root\npassword: rootpassword\npfx_password: rootpfxpassword\n",
    );
    fixture.write(
        "pki/fragments/issuing.yml",
        concat!(
            "name: issuing\n",
            "password: issuingpassword\n",
            "pfx_password: issuingpfxpassword\n",
            "ca_chain_name: corp-root\n",
            "ca_chain_password: rootpassword\n",
            "is_last_chain_root_ca: true\n",
        ),
    );
    let path = fixture.write(
        "pki/hierarchy.json",
        r#"{
            "rootCa": [{ "$ref": "./fragments/root.yaml" }],
            "intermediateCa": [{ "$ref": "fragments/issuing.yml" }]
        }"#,
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    HierarchyResolver::new(&config, &tool)
        .run(&path)
        .expect("Generation failed");

    assert_eq!(tool.names(), ["corp-root", "issuing"]);
}

#[test]
fn test_yaml_document_with_json_reference() {
    let fixture = Fixture::new();
    let leaf = fixture.write(
        "shared/web.json",
        r#"{
            "name": "web",
            "password": "webpassword",
            "pfxPassword": "webpfxpassword",
            "caName": "web-root",
            "caPassword": "rootpassword",
            "isLastChainRootCA": true
        }"#,
    );
    let path = fixture.write(
        "conf/hierarchy.yaml",
        &format!("leaf_certificate:\n  - $ref: {}\n", leaf.display()),
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    HierarchyResolver::new(&config, &tool)
        .run(&path)
        .expect("Generation failed");

    assert_eq!(tool.names(), ["web"]);
}

#[test]
fn test_reference_merges_with_inline_fields() {
    let fixture = Fixture::new();
    fixture.write(
        "root.json",
        r#"{ "name": "referenced", "pfxPassword": "rootpfxpassword" }"#,
    );
    let path = fixture.write(
        "hierarchy.yaml",
        "root_ca:\n  - $ref: ./root.json\n    name: inline\n    password: inlinepassword\n",
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    HierarchyResolver::new(&config, &tool)
        .run(&path)
        .expect("Generation failed");

    let calls = tool.calls();
    assert_eq!(calls[0].name, "referenced");
    assert_eq!(calls[0].password, "inlinepassword");
}

#[test]
fn test_inline_secrets_complete_referenced_authority() {
    let fixture = Fixture::new();
    fixture.write(
        "ops.yaml",
        "name: ops\nca_chain_name: root\nis_last_chain_root_ca: true\nkey_size: 4096\n",
    );
    let path = fixture.write(
        "hierarchy.yaml",
        r#"
intermediate_ca:
  - $ref: ./ops.yaml
    password: opspassword
    pfx_password: opspfxpassword
    ca_chain_password: rootpassword
"#,
    );
    let config = fixture.config();

    let planner = DryRunSigningTool::new();
    HierarchyResolver::planning(&config, &planner)
        .run(&path)
        .expect("Planning failed");
    let names: Vec<String> = planner.invocations().into_iter().map(|i| i.name).collect();
    assert_eq!(names, ["ops"]);

    let tool = RecordingSigningTool::new();
    HierarchyResolver::new(&config, &tool)
        .run(&path)
        .expect("Generation failed");

    let calls = tool.calls();
    assert_eq!(calls[0].name, "ops");
    assert_eq!(calls[0].password, "opspassword");
    assert_eq!(calls[0].chain_password.as_deref(), Some("rootpassword"));
    assert_eq!(calls[0].arguments.last().map(String::as_str), Some("4096"));
}

#[test]
fn test_nested_reference_not_followed() {
    let fixture = Fixture::new();
    fixture.write(
        "second.json",
        r#"{ "name": "second", "password": "rootpassword", "pfxPassword": "rootpfxpassword" }"#,
    );
    fixture.write(
        "first.json",
        r#"{ "$ref": "./second.json", "name": "first", "password": "rootpassword", "pfxPassword": "rootpfxpassword" }"#,
    );
    let path = fixture.write("hierarchy.json", r#"{ "rootCa": [{ "$ref": "first.json" }] }"#);
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    HierarchyResolver::new(&config, &tool)
        .run(&path)
        .expect("Generation failed");

    assert_eq!(tool.names(), ["first"]);
}

#[test]
fn test_missing_reference_is_fatal() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "hierarchy.json",
        r#"{ "rootCa": [{ "$ref": "./missing.yaml" }] }"#,
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    let err = HierarchyResolver::new(&config, &tool)
        .run(&path)
        .unwrap_err();

    assert!(matches!(err, HierarchyError::Reference(_)));
    assert!(tool.calls().is_empty());
}

#[test]
fn test_reference_with_unsupported_extension() {
    let fixture = Fixture::new();
    fixture.write("root.toml", "name = \"root\"\n");
    let path = fixture.write(
        "hierarchy.json",
        r#"{ "rootCa": [{ "$ref": "root.toml" }] }"#,
    );
    let config = fixture.config();
    let tool = RecordingSigningTool::new();

    let err = HierarchyResolver::new(&config, &tool)
        .run(&path)
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Reference(_)));
}
