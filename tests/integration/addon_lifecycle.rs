//! End-to-End Addon Lifecycle Tests
//!
//! Addons discovered from a directory tree, state persisted to a JSON
//! activation store, and a second manager picking that state up again.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use addonmgr::addon::{
    ActivationStore, AddonError, AddonManager, AddonRegistry, AddonState, FileBasedDiscovery, HookCatalog,
    JsonFileActivationStore, Outcome,
};
use addonmgr::notifications::{ChannelSubscriber, LifecycleEvent};

fn write_manifest(root: &Path, dir: &str, content: &str) {
    let addon_dir = root.join(dir);
    fs::create_dir_all(&addon_dir).expect("Failed to create addon dir");
    fs::write(addon_dir.join("addon.yaml"), content).expect("Failed to write manifest");
}

fn create_addon_tree(root: &Path, core_version: &str) {
    write_manifest(root, "core", &format!("id: core\nname: Core\nversion: {}\n", core_version));
    write_manifest(
        root,
        "media",
        "id: media\nname: Media Library\nversion: 2.0.0\ndependencies:\n  core: '>=1.0.0'\n",
    );
    write_manifest(
        root,
        "blog",
        "id: blog\nname: Blog\nversion: 1.0.0\ndependencies:\n  core: ^1.0.0\n  media: ^2.0.0\n",
    );
}

fn open_manager(addons: &Path, store: &Path) -> AddonManager {
    let discovery = FileBasedDiscovery::new(addons).expect("Failed to open addon directory");
    let registry = AddonRegistry::discover(&discovery, &HookCatalog::with_logging_fallback())
        .expect("Failed to discover addons");
    let store = JsonFileActivationStore::open(store).expect("Failed to open store");
    AddonManager::new(Arc::new(registry), Arc::new(store))
}

#[test]
fn test_lifecycle_persists_across_managers() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let addons = temp_dir.path().join("addons");
    let store_path = temp_dir.path().join("state").join("activations.json");
    create_addon_tree(&addons, "1.3.0");

    {
        let manager = open_manager(&addons, &store_path);
        for id in ["core", "media", "blog"] {
            assert_eq!(manager.install(id).expect("install"), Outcome::Applied);
            assert_eq!(manager.activate(id).expect("activate"), Outcome::Applied);
        }
    }

    assert!(store_path.exists());
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&store_path).expect("Failed to read store")).expect("valid JSON");
    assert_eq!(json["addons"]["blog"]["installed_version"], "1.0.0");

    let manager = open_manager(&addons, &store_path);
    for id in ["core", "media", "blog"] {
        assert_eq!(manager.state(id).expect("state"), AddonState::Active);
    }
    assert_eq!(manager.start().expect("start"), vec!["core", "media", "blog"]);

    assert!(matches!(manager.deactivate("core"), Err(AddonError::HasDependents { .. })));
    manager.deactivate("blog").expect("deactivate blog");
    manager.uninstall("blog").expect("uninstall blog");
    assert_eq!(manager.state("blog").expect("state"), AddonState::Discovered);
    assert!(!manager.store().exists("blog").expect("exists"));
}

#[test]
fn test_update_after_new_version_is_deployed() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let addons = temp_dir.path().join("addons");
    let store_path = temp_dir.path().join("activations.json");
    create_addon_tree(&addons, "1.3.0");

    {
        let manager = open_manager(&addons, &store_path);
        manager.install("core").expect("install core");
        manager.install("blog").expect("install blog");
    }

    // New core release within blog's ^1.0.0 range
    create_addon_tree(&addons, "1.4.2");
    let manager = open_manager(&addons, &store_path);
    let (subscriber, events) = ChannelSubscriber::new("test");
    manager.subscribe(Arc::new(subscriber)).expect("subscribe");

    assert_eq!(manager.update("core").expect("update"), Outcome::Applied);
    assert_eq!(events.try_recv().expect("event"), LifecycleEvent::updated("core", "1.3.0", "1.4.2"));
    assert_eq!(manager.update("core").expect("update again"), Outcome::Unchanged);
    assert!(events.try_recv().is_err());

    // A breaking release is refused while blog is installed
    create_addon_tree(&addons, "2.0.0");
    let manager = open_manager(&addons, &store_path);
    assert!(matches!(
        manager.update("core"),
        Err(AddonError::DependencyUnsatisfied { .. })
    ));
    assert_eq!(
        manager.store().get("core").expect("get").expect("record").installed_version,
        "1.4.2"
    );
}

#[test]
fn test_corrupt_store_is_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store_path = temp_dir.path().join("activations.json");
    fs::write(&store_path, "{ definitely not json").expect("Failed to write store");

    assert!(matches!(
        JsonFileActivationStore::open(&store_path),
        Err(AddonError::Store { .. })
    ));
}

#[test]
fn test_rejected_manifests_do_not_block_others() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let addons = temp_dir.path().join("addons");
    create_addon_tree(&addons, "1.0.0");
    write_manifest(&addons, "loop-a", "id: loop-a\nname: A\nversion: 1.0.0\ndependencies:\n  loop-b: '*'\n");
    write_manifest(&addons, "loop-b", "id: loop-b\nname: B\nversion: 1.0.0\ndependencies:\n  loop-a: '*'\n");
    write_manifest(&addons, "zz-dup", "id: core\nname: Core Fork\nversion: 9.0.0\n");

    let discovery = FileBasedDiscovery::new(&addons).expect("Failed to open addon directory");
    let registry = AddonRegistry::discover(&discovery, &HookCatalog::with_logging_fallback())
        .expect("Failed to discover addons");

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.get("core").expect("core").version(), "1.0.0");
    assert_eq!(registry.rejections().len(), 3);
}
