//! End-to-end engine behavior: discovery through commit or rollback.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;

use relo::{
    DirectoryRegistry, InMemoryRegistry, ProjectRegistry, RegistryEntry, ReloError,
    TransactionManager, TxState, key, plan_move, scan,
};

/// Registry wrapper that fails renames whose source key is on a deny
/// list, used to force mid-run and mid-rollback failures.
struct FailOnKey {
    inner: Arc<InMemoryRegistry>,
    deny: Vec<String>,
}

impl ProjectRegistry for FailOnKey {
    fn exists(&self, key: &str) -> Result<bool, ReloError> {
        self.inner.exists(key)
    }

    fn get(&self, key: &str) -> Result<RegistryEntry, ReloError> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, entry: RegistryEntry) -> Result<(), ReloError> {
        self.inner.put(key, entry)
    }

    fn delete(&self, key: &str) -> Result<(), ReloError> {
        self.inner.delete(key)
    }

    fn rename(&self, old_key: &str, new_key: &str) -> Result<(), ReloError> {
        if self.deny.iter().any(|denied| denied == old_key) {
            return Err(ReloError::Registry(format!(
                "simulated failure renaming {old_key}"
            )));
        }
        self.inner.rename(old_key, new_key)
    }
}

fn scaffold_tree(base: &Path) -> PathBuf {
    let root = base.join("proj");
    fs::create_dir_all(root.join("frontend")).unwrap();
    fs::create_dir_all(root.join("api/service")).unwrap();
    fs::write(root.join("frontend/index.html"), "<html></html>").unwrap();
    root
}

#[test]
fn move_with_nested_projects_commits_and_rewrites_all_keys() {
    let temp = tempfile::tempdir().unwrap();
    let base = temp.path().canonicalize().unwrap();
    let root = scaffold_tree(&base);

    let registry_dir = base.join("registry");
    let registry = Arc::new(DirectoryRegistry::new(&registry_dir));
    for path in [
        root.clone(),
        root.join("frontend"),
        root.join("api/service"),
    ] {
        fs::create_dir_all(registry_dir.join(key::encode(&path))).unwrap();
    }

    let outcome = scan(&root, true, &registry).unwrap();
    assert_eq!(outcome.projects.len(), 3);

    let destination = base.join("new/proj");
    let plan = plan_move(&outcome, &root, &destination).unwrap();
    assert_eq!(plan.operations.len(), 3);

    let manager = TransactionManager::new(registry.clone());
    let result = manager.execute(&plan, false).unwrap();

    assert_eq!(result.state, TxState::Committed);
    assert_eq!(result.applied.len(), 3);
    assert!(!root.exists());
    assert!(destination.join("frontend/index.html").is_file());
    assert!(destination.join("api/service").is_dir());
    for path in [
        destination.clone(),
        destination.join("frontend"),
        destination.join("api/service"),
    ] {
        assert!(registry.exists(&key::encode(&path)).unwrap(), "{path:?}");
    }
    assert!(!registry.exists(&key::encode(&root)).unwrap());
}

#[test]
fn induced_failure_rolls_back_filesystem_and_registry() {
    let temp = tempfile::tempdir().unwrap();
    let base = temp.path().canonicalize().unwrap();
    let root = scaffold_tree(&base);

    let inner = Arc::new(InMemoryRegistry::new());
    let project_paths = [
        root.clone(),
        root.join("frontend"),
        root.join("api/service"),
    ];
    for path in &project_paths {
        inner.insert(key::encode(path), json!({"path": path.display().to_string()}));
    }
    let original_keys = inner.keys();

    let registry = FailOnKey {
        inner: inner.clone(),
        // Second operation in root-first order.
        deny: vec![key::encode(&root.join("frontend"))],
    };

    let outcome = scan(&root, true, &registry).unwrap();
    let destination = base.join("moved/proj");
    let plan = plan_move(&outcome, &root, &destination).unwrap();

    let manager = TransactionManager::new(registry);
    let result = manager.execute(&plan, false).unwrap();

    assert_eq!(result.state, TxState::RolledBack);
    let failure = result.failure.expect("second operation should fail");
    assert_eq!(failure.operation_index, 1);
    assert!(result.rollback_errors.is_empty(), "{:?}", result.rollback_errors);

    // Filesystem restored.
    assert!(root.join("frontend/index.html").is_file());
    assert!(root.join("api/service").is_dir());
    assert!(!destination.exists());
    // Registry restored key-for-key.
    assert_eq!(inner.keys(), original_keys);
}

#[test]
fn rollback_removes_destination_parents_it_created() {
    let temp = tempfile::tempdir().unwrap();
    let base = temp.path().canonicalize().unwrap();
    let root = scaffold_tree(&base);

    let inner = Arc::new(InMemoryRegistry::new());
    inner.insert(key::encode(&root), json!({}));

    // The root registry rename fails right after the tree move, so the
    // only applied effect to undo is the move itself.
    let registry = FailOnKey {
        inner,
        deny: vec![key::encode(&root)],
    };

    let outcome = scan(&root, false, &registry).unwrap();
    let destination = base.join("deep/nested/proj");
    let plan = plan_move(&outcome, &root, &destination).unwrap();

    let manager = TransactionManager::new(registry);
    let result = manager.execute(&plan, false).unwrap();

    assert_eq!(result.state, TxState::RolledBack);
    assert!(result.rollback_errors.is_empty(), "{:?}", result.rollback_errors);
    assert!(root.join("frontend/index.html").is_file());
    // The ancestors fabricated for the destination are gone again.
    assert!(!base.join("deep").exists());
}

#[test]
fn failed_undo_is_reported_and_later_records_still_run() {
    let temp = tempfile::tempdir().unwrap();
    let base = temp.path().canonicalize().unwrap();
    let root = scaffold_tree(&base);

    let inner = Arc::new(InMemoryRegistry::new());
    for path in [
        root.clone(),
        root.join("frontend"),
        root.join("api/service"),
    ] {
        inner.insert(key::encode(&path), json!({}));
    }

    let destination = base.join("moved/proj");
    // The frontend rename fails mid-run; the root key rename has already
    // happened by then, and undoing it fails as well because the new root
    // key is also denied.
    let registry = FailOnKey {
        inner: inner.clone(),
        deny: vec![
            key::encode(&root.join("frontend")),
            key::encode(&destination),
        ],
    };

    let outcome = scan(&root, true, &registry).unwrap();
    let plan = plan_move(&outcome, &root, &destination).unwrap();

    let manager = TransactionManager::new(registry);
    let result = manager.execute(&plan, false).unwrap();

    assert_eq!(result.state, TxState::RolledBack);
    assert_eq!(result.rollback_errors.len(), 1, "{:?}", result.rollback_errors);
    assert!(result.rollback_errors[0].contains("failed to restore registry entry"));
    // The sweep kept going past the failed undo: the tree itself is back.
    assert!(root.join("frontend/index.html").is_file());
    assert!(!destination.exists());
    // The stuck key is the residue the caller is told to inspect.
    assert!(inner.exists(&key::encode(&destination)).unwrap());
    assert!(!inner.exists(&key::encode(&root)).unwrap());
}

#[test]
fn dry_run_previews_without_mutating_anything() {
    let temp = tempfile::tempdir().unwrap();
    let base = temp.path().canonicalize().unwrap();
    let root = scaffold_tree(&base);

    let registry = Arc::new(InMemoryRegistry::new());
    for path in [
        root.clone(),
        root.join("frontend"),
        root.join("api/service"),
    ] {
        registry.insert(key::encode(&path), json!({}));
    }
    let keys_before = registry.keys();

    let outcome = scan(&root, true, &registry).unwrap();
    let destination = base.join("elsewhere/proj");
    let plan = plan_move(&outcome, &root, &destination).unwrap();

    let manager = TransactionManager::new(registry.clone());
    let result = manager.execute(&plan, true).unwrap();

    assert_eq!(result.state, TxState::Committed);
    assert!(result.dry_run);
    assert_eq!(result.applied.len(), 3);
    assert!(root.is_dir());
    assert!(!destination.exists());
    assert_eq!(registry.keys(), keys_before);
}

#[test]
fn dry_run_and_real_run_share_the_validation_verdict() {
    let temp = tempfile::tempdir().unwrap();
    let base = temp.path().canonicalize().unwrap();
    let root = scaffold_tree(&base);
    let occupied = base.join("occupied");
    fs::create_dir_all(&occupied).unwrap();

    let registry = Arc::new(InMemoryRegistry::new());
    registry.insert(key::encode(&root), json!({}));

    let outcome = scan(&root, false, &registry).unwrap();
    let plan = plan_move(&outcome, &root, &occupied).unwrap();

    let manager = TransactionManager::new(registry.clone());
    let dry = manager.execute(&plan, true).unwrap();
    let real = manager.execute(&plan, false).unwrap();

    assert_eq!(dry.state, TxState::Aborted);
    assert_eq!(real.state, TxState::Aborted);
    assert_eq!(dry.validation_errors, real.validation_errors);
    assert!(!dry.validation_errors.is_empty());
    // Nothing touched either way.
    assert!(root.is_dir());
    assert!(registry.exists(&key::encode(&root)).unwrap());
}
