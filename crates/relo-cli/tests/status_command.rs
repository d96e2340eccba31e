use std::fs;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn cli() -> Command {
    Command::cargo_bin("relo").unwrap()
}

#[test]
fn status_reports_managed_root_and_nested_projects() {
    let temp = TempDir::new().unwrap();
    let base = temp.path().canonicalize().unwrap();
    let registry = base.join("registry");
    let root = base.join("workspace");
    fs::create_dir_all(root.join("services/auth")).unwrap();
    for path in [root.clone(), root.join("services/auth")] {
        fs::create_dir_all(registry.join(relo::key::encode(&path))).unwrap();
    }

    cli()
        .arg("--registry")
        .arg(&registry)
        .arg("status")
        .arg(&root)
        .assert()
        .success()
        .stdout(contains("is a managed project"))
        .stdout(contains("Managed subprojects (1):"))
        .stdout(contains("services/auth"));
}

#[test]
fn status_of_unmanaged_directory_still_succeeds() {
    let temp = TempDir::new().unwrap();
    let base = temp.path().canonicalize().unwrap();
    let registry = base.join("registry");
    let root = base.join("plain");
    fs::create_dir_all(&root).unwrap();
    fs::create_dir_all(&registry).unwrap();

    cli()
        .arg("--registry")
        .arg(&registry)
        .arg("status")
        .arg(&root)
        .assert()
        .success()
        .stdout(contains("is not a managed project"))
        .stdout(contains("Managed subprojects (0):"));
}

#[test]
fn status_emits_json_when_requested() {
    let temp = TempDir::new().unwrap();
    let base = temp.path().canonicalize().unwrap();
    let registry = base.join("registry");
    let root = base.join("workspace");
    fs::create_dir_all(&root).unwrap();
    fs::create_dir_all(registry.join(relo::key::encode(&root))).unwrap();

    cli()
        .arg("--registry")
        .arg(&registry)
        .arg("--json")
        .arg("status")
        .arg(&root)
        .assert()
        .success()
        .stdout(contains("\"type\":\"status\""))
        .stdout(contains("\"managed\":true"));
}
