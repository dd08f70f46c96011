use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const MANIFEST: &str = r#"
version = "v1"

[plan]
namespace = "shop"

[shared]
vpc = "vpc-0a1b"

[[resources]]
id = "lb-sg"
kind = "security-group"
ingress = 2
egress = 1

[[resources]]
id = "app-sg"
kind = "security-group"
ingress = 1

[[resources.refs]]
target = "lb-sg"
direction = "ingress"

[resources.refs.attributes]
port = 8080

[[resources]]
id = "private-acl"
kind = "network-acl"
rules = 4
subnets = ["subnet-a", "subnet-b"]
"#;

fn stackpack(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stackpack"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run stackpack")
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn plan_prints_text_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "stackpack.toml", MANIFEST);

    let out = stackpack(&["plan", "--manifest", path.to_str().unwrap()]);
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("PHASE 1"));
    assert!(stdout.contains("app-sg/ingress-0"));
    assert!(stdout.contains("shop-refs"));
}

#[test]
fn plan_emits_json_with_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "stackpack.toml", MANIFEST);

    let out = stackpack(&[
        "plan",
        "--manifest",
        path.to_str().unwrap(),
        "--format",
        "json",
        "--namespace",
        "staging",
        "--resource-capacity",
        "5",
    ]);
    assert!(out.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(plan["namespace"], "staging");
    // 4 + 2 + 7 under a capacity of 5: the ACL splits into two fragments.
    let phase1 = plan["phase1"].as_array().unwrap();
    assert_eq!(phase1.len(), 4);
    assert_eq!(phase1[0]["name"], "staging-phase1-0");
    assert_eq!(phase1[0]["shared"]["vpc"], "vpc-0a1b");
    assert_eq!(plan["phase2"][0]["name"], "staging-refs");
}

#[test]
fn plan_rejects_non_positive_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "stackpack.toml", MANIFEST);

    let out = stackpack(&[
        "plan",
        "--manifest",
        path.to_str().unwrap(),
        "--edge-capacity",
        "-3",
    ]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("edge_capacity must be at least 1"));
}

#[test]
fn plan_succeeds_with_invalid_reference() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = "version = \"v1\"\n\
        [[resources]]\nid = \"a\"\nkind = \"generic\"\ncost = 1\n\
        [[resources.refs]]\ntarget = \"ghost\"\ndirection = \"egress\"\n";
    let path = write(dir.path(), "stackpack.toml", manifest);

    let out = stackpack(&["plan", "--manifest", path.to_str().unwrap(), "--format", "json"]);
    assert!(out.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(plan["phase1"].as_array().unwrap().is_empty());
    assert!(plan["phase2"].as_array().unwrap().is_empty());
    assert_eq!(plan["diagnostics"][0]["severity"], "warning");
}

#[test]
fn validate_reports_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "stackpack.toml", MANIFEST);

    let out = stackpack(&["validate", "--manifest", path.to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("3 resources, 1 references"));
}

#[test]
fn validate_rejects_duplicate_ids() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = "version = \"v1\"\n\
        [[resources]]\nid = \"a\"\nkind = \"generic\"\ncost = 1\n\
        [[resources]]\nid = \"a\"\nkind = \"generic\"\ncost = 2\n";
    let path = write(dir.path(), "stackpack.toml", manifest);

    let out = stackpack(&["validate", "--manifest", path.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("duplicate resource id: a"));
}
