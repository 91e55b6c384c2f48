//! Concurrency Tests
//!
//! Many threads driving one manager: idempotent transitions must run hooks
//! once, and operations on adjacent graph nodes must never interleave into a
//! state that violates the dependency invariants.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use addonmgr::addon::{
    AddonDescriptor, AddonHooks, AddonManager, AddonRegistry, HookCatalog, HookResult, MemoryActivationStore,
    Outcome, RawManifest, StaticDiscovery,
};

const THREADS: usize = 8;

/// Counts hook invocations across all addons
#[derive(Default)]
struct Counters {
    installs: AtomicUsize,
    boots: AtomicUsize,
}

struct CountingHooks {
    counters: Arc<Counters>,
}

impl AddonHooks for CountingHooks {
    fn install(&self) -> HookResult {
        self.counters.installs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn uninstall(&self) -> HookResult {
        Ok(())
    }

    fn activate(&self) -> HookResult {
        Ok(())
    }

    fn deactivate(&self) -> HookResult {
        Ok(())
    }

    fn register(&self) -> HookResult {
        Ok(())
    }

    fn boot(&self) -> HookResult {
        self.counters.boots.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn update(&self, _from_version: &str) -> HookResult {
        Ok(())
    }
}

fn counting_manager(manifests: Vec<RawManifest>) -> (Arc<AddonManager>, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let mut catalog = HookCatalog::new();
    let shared = counters.clone();
    catalog.set_fallback(move |_: &AddonDescriptor| {
        Arc::new(CountingHooks { counters: shared.clone() }) as Arc<dyn AddonHooks>
    });

    let registry = AddonRegistry::discover(&StaticDiscovery::new(manifests), &catalog)
        .expect("Failed to discover addons");
    let manager = AddonManager::new(Arc::new(registry), Arc::new(MemoryActivationStore::new()));
    (Arc::new(manager), counters)
}

#[test]
fn test_concurrent_install_and_activate_run_hooks_once() {
    let (manager, counters) = counting_manager(vec![RawManifest::new("search", "Search", "1.0.0")]);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let manager = manager.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let installed = manager.install("search").expect("install");
                let activated = manager.activate("search").expect("activate");
                (installed, activated)
            })
        })
        .collect();

    let outcomes: Vec<(Outcome, Outcome)> = handles.into_iter().map(|h| h.join().expect("thread")).collect();

    assert_eq!(outcomes.iter().filter(|(i, _)| *i == Outcome::Applied).count(), 1);
    assert_eq!(outcomes.iter().filter(|(_, a)| *a == Outcome::Applied).count(), 1);
    assert_eq!(counters.installs.load(Ordering::SeqCst), 1);
    assert_eq!(counters.boots.load(Ordering::SeqCst), 1);
}

#[test]
fn test_activate_dependent_races_deactivate_dependency() {
    for _ in 0..50 {
        let (manager, _) = counting_manager(vec![
            RawManifest::new("a", "A", "1.0.0"),
            RawManifest::new("b", "B", "1.0.0").with_dependency("a", "^1.0.0"),
        ]);
        manager.install("a").expect("install a");
        manager.activate("a").expect("activate a");
        manager.install("b").expect("install b");

        let barrier = Arc::new(Barrier::new(2));
        let activator = {
            let manager = manager.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                manager.activate("b").is_ok()
            })
        };
        let deactivator = {
            let manager = manager.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                manager.deactivate("a").is_ok()
            })
        };

        let b_activated = activator.join().expect("activator");
        let a_deactivated = deactivator.join().expect("deactivator");

        // Exactly one wins, and an active b always has an active a
        assert!(b_activated ^ a_deactivated);
        let store = manager.store();
        let a = store.get("a").expect("get a").expect("record a");
        let b = store.get("b").expect("get b").expect("record b");
        assert!(!b.is_active || a.is_active);
    }
}

#[test]
fn test_unrelated_addons_proceed_in_parallel() {
    let manifests: Vec<RawManifest> = (0..THREADS)
        .map(|i| RawManifest::new(format!("addon-{}", i), format!("Addon {}", i), "1.0.0".to_string()))
        .collect();
    let (manager, counters) = counting_manager(manifests);

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let manager = manager.clone();
            thread::spawn(move || {
                let id = format!("addon-{}", i);
                manager.install(&id).expect("install");
                manager.activate(&id).expect("activate");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    assert_eq!(counters.boots.load(Ordering::SeqCst), THREADS);
    assert_eq!(manager.store().all().expect("all").len(), THREADS);
}
