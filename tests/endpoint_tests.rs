//! Integration tests for endpoint probing: engine installation checks and
//! repository tail-hash compatibility, driven through a real filesystem
//! and a scripted engine executable.

mod common;

use common::TestHome;

const TAIL_HASH: &str = "e83c5163316f89bfbde7d9ab23ca2e25604af290";

#[cfg(unix)]
#[tokio::test]
async fn engine_probe_accepts_matching_version() {
    let home = TestHome::new();
    home.install_fake_engine("2.43.0", "");
    let root = home.create_sync_root("tree");
    let endpoint = home.endpoint(root.to_str().unwrap());

    assert!(endpoint.has_engine_installed().await.unwrap());
}

#[cfg(unix)]
#[tokio::test]
async fn engine_probe_rejects_version_mismatch() {
    let home = TestHome::new();
    home.install_fake_engine("2.30.1", "");
    let root = home.create_sync_root("tree");
    let endpoint = home.endpoint(root.to_str().unwrap());

    assert!(!endpoint.has_engine_installed().await.unwrap());
}

#[tokio::test]
async fn engine_probe_reports_absent_binary_without_error() {
    let home = TestHome::new();
    let root = home.create_sync_root("tree");
    let endpoint = home.endpoint(root.to_str().unwrap());

    assert!(!endpoint.has_engine_installed().await.unwrap());
}

#[cfg(unix)]
#[tokio::test]
async fn engine_probe_is_cached_until_reset() {
    let home = TestHome::new();
    let root = home.create_sync_root("tree");
    let endpoint = home.endpoint(root.to_str().unwrap());

    assert!(!endpoint.has_engine_installed().await.unwrap());

    // The engine appears after the first probe; the cached result stands
    // until the caller invalidates it.
    home.install_fake_engine("2.43.0", "");
    assert!(!endpoint.has_engine_installed().await.unwrap());

    endpoint.reset_engine_installed_cache();
    assert!(endpoint.has_engine_installed().await.unwrap());
}

#[tokio::test]
async fn tail_hash_is_empty_without_repository_marker() {
    let home = TestHome::new();
    let root = home.create_sync_root("tree");
    let endpoint = home.endpoint(root.to_str().unwrap());

    endpoint.refresh_tail_hash().await.unwrap();
    assert_eq!(endpoint.tail_hash(), "");
}

#[cfg(unix)]
#[tokio::test]
async fn tail_hash_reads_the_root_commit() {
    let home = TestHome::new();
    home.install_fake_engine("2.43.0", TAIL_HASH);
    let root = home.create_sync_root("tree");
    std::fs::create_dir(root.join(".git")).unwrap();
    let endpoint = home.endpoint(root.to_str().unwrap());

    endpoint.refresh_tail_hash().await.unwrap();
    assert_eq!(endpoint.tail_hash(), TAIL_HASH);
}

#[cfg(unix)]
#[tokio::test]
async fn endpoints_sharing_a_root_commit_are_compatible() {
    let home = TestHome::new();
    home.install_fake_engine("2.43.0", TAIL_HASH);

    let root_a = home.create_sync_root("tree-a");
    let root_b = home.create_sync_root("tree-b");
    let root_c = home.create_sync_root("tree-c");
    std::fs::create_dir(root_a.join(".git")).unwrap();
    std::fs::create_dir(root_b.join(".git")).unwrap();

    let a = home.endpoint(root_a.to_str().unwrap());
    let b = home.endpoint(root_b.to_str().unwrap());
    let c = home.endpoint(root_c.to_str().unwrap());
    a.refresh_tail_hash().await.unwrap();
    b.refresh_tail_hash().await.unwrap();
    c.refresh_tail_hash().await.unwrap();

    assert_eq!(a.tail_hash(), b.tail_hash());
    assert!(!a.tail_hash().is_empty());
    assert!(a.is_compatible_with(&b));

    // An endpoint with no repository yet cannot merge with one that has
    // history.
    assert_eq!(c.tail_hash(), "");
    assert!(!a.is_compatible_with(&c));
}

#[cfg(unix)]
#[tokio::test]
async fn engine_run_executes_in_the_sync_root() {
    let home = TestHome::new();
    home.install_fake_engine("2.43.0", TAIL_HASH);
    let root = home.create_sync_root("tree");
    let endpoint = home.endpoint(root.to_str().unwrap());

    let out = endpoint
        .engine_run(&["rev-list", "--max-parents=0", "HEAD"])
        .await
        .unwrap();
    assert!(out.success());
    assert_eq!(out.stdout.trim(), TAIL_HASH);
}

#[tokio::test]
async fn branch_names_differ_per_sync_root_on_one_host() {
    let home = TestHome::new();
    let a = home.endpoint(home.home().join("tree-a").to_str().unwrap());
    let b = home.endpoint(home.home().join("tree-b").to_str().unwrap());

    assert_ne!(a.branch_name(), b.branch_name());
    assert_eq!(a.branch_name(), a.branch_name());
}
