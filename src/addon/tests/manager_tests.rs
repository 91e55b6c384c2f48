//! Tests for the Addon Manager
//!
//! Lifecycle transitions, their guards, hook ordering and emitted events.

use std::sync::Arc;
use super::mock_addons::*;
use crate::addon::error::{AddonError, HookKind, Operation, UnsatisfiedReason};
use crate::addon::manager::{AddonState, Outcome};
use crate::addon::store::{ActivationRecord, ActivationStore, MemoryActivationStore};
use crate::notifications::LifecycleEvent;

fn shop_and_payments() -> Vec<crate::addon::RawManifest> {
    vec![
        addon("payments", "1.0.0", &[]),
        addon("shop", "2.1.0", &[("payments", ">=1.0.0")]),
    ]
}

#[test]
fn test_install_creates_inactive_record() {
    let bed = TestBed::new(shop_and_payments());

    assert_eq!(bed.manager.install("payments").unwrap(), Outcome::Applied);

    let record = bed.manager.store().get("payments").unwrap().unwrap();
    assert_eq!(record.installed_version, "1.0.0");
    assert!(!record.is_active);
    assert_eq!(bed.manager.state("payments").unwrap(), AddonState::Installed);
    assert_eq!(bed.calls(), vec!["payments:install"]);
    assert_eq!(bed.events(), vec![LifecycleEvent::installed("payments", "1.0.0")]);
}

#[test]
fn test_install_is_idempotent() {
    let bed = TestBed::new(shop_and_payments());

    bed.manager.install("payments").unwrap();
    assert_eq!(bed.manager.install("payments").unwrap(), Outcome::Unchanged);

    assert_eq!(bed.manager.store().all().unwrap().len(), 1);
    assert_eq!(bed.calls(), vec!["payments:install"]);
    assert_eq!(bed.events().len(), 1);
}

#[test]
fn test_unknown_addon_is_not_found() {
    let bed = TestBed::new(shop_and_payments());

    for result in [
        bed.manager.install("ghost"),
        bed.manager.activate("ghost"),
        bed.manager.uninstall("ghost"),
        bed.manager.update("ghost"),
    ] {
        assert!(matches!(result, Err(AddonError::NotFound { ref id, .. }) if id == "ghost"));
    }
    assert!(bed.manager.state("ghost").is_err());
}

#[test]
fn test_activate_requires_installation() {
    let bed = TestBed::new(shop_and_payments());

    let err = bed.manager.activate("payments").unwrap_err();
    assert!(matches!(err, AddonError::NotFound { operation: Operation::Activate, .. }));
    assert!(bed.calls().is_empty());
}

#[test]
fn test_activate_with_inactive_dependency_names_it() {
    let bed = TestBed::new(shop_and_payments());
    bed.manager.install("payments").unwrap();
    bed.manager.install("shop").unwrap();

    match bed.manager.activate("shop").unwrap_err() {
        AddonError::DependencyUnsatisfied { operation, id, dependency, reason, .. } => {
            assert_eq!(operation, Operation::Activate);
            assert_eq!(id, "shop");
            assert_eq!(dependency, "payments");
            assert_eq!(reason, UnsatisfiedReason::Inactive);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(bed.manager.state("shop").unwrap(), AddonState::Installed);
}

#[test]
fn test_activate_runs_hooks_in_order() {
    let bed = TestBed::new(shop_and_payments());
    bed.manager.install("payments").unwrap();
    bed.clear_calls();

    assert_eq!(bed.manager.activate("payments").unwrap(), Outcome::Applied);
    assert_eq!(bed.calls(), vec!["payments:activate", "payments:register", "payments:boot"]);

    assert_eq!(bed.manager.activate("payments").unwrap(), Outcome::Unchanged);
    assert_eq!(bed.calls().len(), 3);
    assert_eq!(bed.events().last(), Some(&LifecycleEvent::activated("payments")));
}

#[test]
fn test_uninstall_with_dependent_is_refused() {
    let bed = TestBed::new(shop_and_payments());
    bed.manager.install("payments").unwrap();
    bed.manager.install("shop").unwrap();

    match bed.manager.uninstall("payments").unwrap_err() {
        AddonError::HasDependents { blocking, .. } => assert_eq!(blocking, vec!["shop"]),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(bed.manager.store().exists("payments").unwrap());
}

#[test]
fn test_uninstall_active_addon_is_refused() {
    let bed = TestBed::new(vec![addon("seo", "1.0.0", &[])]);
    bed.enable(&["seo"]);

    assert!(matches!(
        bed.manager.uninstall("seo"),
        Err(AddonError::InvalidState { operation: Operation::Uninstall, .. })
    ));

    bed.manager.deactivate("seo").unwrap();
    assert_eq!(bed.manager.uninstall("seo").unwrap(), Outcome::Applied);
    assert_eq!(bed.manager.state("seo").unwrap(), AddonState::Discovered);
    assert_eq!(bed.events().last(), Some(&LifecycleEvent::uninstalled("seo")));
}

#[test]
fn test_uninstall_requires_installation() {
    let bed = TestBed::new(vec![addon("seo", "1.0.0", &[])]);
    assert!(matches!(
        bed.manager.uninstall("seo"),
        Err(AddonError::NotFound { operation: Operation::Uninstall, .. })
    ));
}

#[test]
fn test_deactivate_with_active_dependent_is_refused() {
    let bed = TestBed::new(shop_and_payments());
    bed.enable(&["payments", "shop"]);

    match bed.manager.deactivate("payments").unwrap_err() {
        AddonError::HasDependents { operation, blocking, .. } => {
            assert_eq!(operation, Operation::Deactivate);
            assert_eq!(blocking, vec!["shop"]);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(bed.manager.state("payments").unwrap(), AddonState::Active);
}

#[test]
fn test_deactivate_with_only_inactive_dependents() {
    let bed = TestBed::new(shop_and_payments());
    bed.enable(&["payments"]);
    bed.manager.install("shop").unwrap();

    assert_eq!(bed.manager.deactivate("payments").unwrap(), Outcome::Applied);
    assert_eq!(bed.manager.state("payments").unwrap(), AddonState::Installed);
    assert!(bed.calls().contains(&"payments:deactivate".to_string()));
}

#[test]
fn test_deactivate_inactive_addon_is_invalid() {
    let bed = TestBed::new(shop_and_payments());
    bed.manager.install("payments").unwrap();

    assert!(matches!(
        bed.manager.deactivate("payments"),
        Err(AddonError::InvalidState { operation: Operation::Deactivate, .. })
    ));
}

#[test]
fn test_full_lifecycle_scenario() {
    let bed = TestBed::new(vec![addon("a", "1.0.0", &[]), addon("b", "1.0.0", &[("a", "^1.0.0")])]);

    bed.manager.install("a").unwrap();
    bed.manager.activate("a").unwrap();
    bed.manager.install("b").unwrap();
    bed.manager.activate("b").unwrap();

    assert!(bed.manager.deactivate("a").is_err());
    bed.manager.deactivate("b").unwrap();
    bed.manager.deactivate("a").unwrap();

    // b is still installed, so a cannot go
    assert!(matches!(bed.manager.uninstall("a"), Err(AddonError::HasDependents { .. })));
    bed.manager.uninstall("b").unwrap();

    // b remains discoverable and keeps blocking uninstall of a
    assert!(matches!(bed.manager.uninstall("a"), Err(AddonError::HasDependents { .. })));

    let kinds: Vec<&str> = bed.events().iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "AddonInstalled",
            "AddonActivated",
            "AddonInstalled",
            "AddonActivated",
            "AddonDeactivated",
            "AddonDeactivated",
            "AddonUninstalled",
        ]
    );
}

#[test]
fn test_hook_failure_leaves_no_record() {
    let bed = TestBedBuilder::new(shop_and_payments())
        .failing("payments", HookKind::Install)
        .build();

    match bed.manager.install("payments").unwrap_err() {
        AddonError::HookFailed { operation, id, hook, source } => {
            assert_eq!(operation, Operation::Install);
            assert_eq!(id, "payments");
            assert_eq!(hook, HookKind::Install);
            assert!(source.to_string().contains("exploded"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!bed.manager.store().exists("payments").unwrap());
    assert!(bed.events().is_empty());
}

#[test]
fn test_boot_failure_keeps_addon_inactive() {
    let bed = TestBedBuilder::new(shop_and_payments())
        .failing("payments", HookKind::Boot)
        .build();
    bed.manager.install("payments").unwrap();

    assert!(matches!(
        bed.manager.activate("payments"),
        Err(AddonError::HookFailed { hook: HookKind::Boot, .. })
    ));
    assert_eq!(bed.manager.state("payments").unwrap(), AddonState::Installed);
}

#[test]
fn test_update_same_version_is_noop() {
    let bed = TestBed::new(shop_and_payments());
    bed.manager.install("payments").unwrap();
    let events_before = bed.events().len();

    assert_eq!(bed.manager.update("payments").unwrap(), Outcome::Unchanged);
    assert_eq!(bed.events().len(), events_before);
    assert!(!bed.calls().contains(&"payments:update".to_string()));
}

#[test]
fn test_update_moves_to_discovered_version() {
    let store: Arc<dyn ActivationStore> =
        Arc::new(MemoryActivationStore::with_records(vec![ActivationRecord::installed("payments", "0.9.0")]));
    let bed = TestBedBuilder::new(shop_and_payments()).with_store(store).build();

    assert_eq!(bed.manager.update("payments").unwrap(), Outcome::Applied);
    assert_eq!(bed.manager.store().get("payments").unwrap().unwrap().installed_version, "1.0.0");
    assert_eq!(bed.calls(), vec!["payments:update"]);
    assert_eq!(bed.events(), vec![LifecycleEvent::updated("payments", "0.9.0", "1.0.0")]);
}

#[test]
fn test_update_never_downgrades() {
    let store: Arc<dyn ActivationStore> =
        Arc::new(MemoryActivationStore::with_records(vec![ActivationRecord::installed("payments", "1.5.0")]));
    let bed = TestBedBuilder::new(shop_and_payments()).with_store(store).build();

    assert_eq!(bed.manager.update("payments").unwrap(), Outcome::Unchanged);
    assert_eq!(bed.manager.store().get("payments").unwrap().unwrap().installed_version, "1.5.0");
}

#[test]
fn test_update_refused_when_dependent_rejects_version() {
    let store: Arc<dyn ActivationStore> = Arc::new(MemoryActivationStore::with_records(vec![
        ActivationRecord::installed("core", "1.9.0"),
        ActivationRecord::installed("blog", "1.0.0"),
    ]));
    let bed = TestBedBuilder::new(vec![
        addon("core", "2.0.0", &[]),
        addon("blog", "1.0.0", &[("core", "^1.0.0")]),
    ])
    .with_store(store)
    .build();

    assert!(matches!(
        bed.manager.update("core"),
        Err(AddonError::DependencyUnsatisfied { operation: Operation::Update, .. })
    ));
    assert_eq!(bed.manager.store().get("core").unwrap().unwrap().installed_version, "1.9.0");
}

#[test]
fn test_startup_registers_all_before_booting() {
    let store: Arc<dyn ActivationStore> = Arc::new(MemoryActivationStore::with_records(
        ["core", "media", "blog", "idle"]
            .iter()
            .map(|id| {
                let mut record = ActivationRecord::installed(*id, "1.0.0");
                record.is_active = *id != "idle";
                record
            })
            .collect(),
    ));
    let bed = TestBedBuilder::new(vec![
        addon("blog", "1.0.0", &[("media", "*"), ("core", "*")]),
        addon("media", "1.0.0", &[("core", "*")]),
        addon("core", "1.0.0", &[]),
        addon("idle", "1.0.0", &[]),
    ])
    .with_store(store)
    .build();

    let booted = bed.manager.start().unwrap();
    assert_eq!(booted, vec!["core", "media", "blog"]);
    assert_eq!(
        bed.calls(),
        vec![
            "core:register",
            "media:register",
            "blog:register",
            "core:boot",
            "media:boot",
            "blog:boot",
        ]
    );

    assert!(matches!(bed.manager.start(), Err(AddonError::InvalidState { .. })));
}

#[test]
fn test_startup_skips_undiscovered_records() {
    let mut stale = ActivationRecord::installed("removed", "1.0.0");
    stale.is_active = true;
    let store: Arc<dyn ActivationStore> = Arc::new(MemoryActivationStore::with_records(vec![stale]));
    let bed = TestBedBuilder::new(vec![addon("seo", "1.0.0", &[])]).with_store(store).build();

    assert!(bed.manager.register_active().unwrap().is_empty());
    assert!(bed.manager.boot_active().unwrap().is_empty());
    assert!(bed.calls().is_empty());
}

#[test]
fn test_statuses_report_every_addon() {
    let bed = TestBed::new(shop_and_payments());
    bed.enable(&["payments"]);

    let statuses = bed.manager.statuses().unwrap();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].id, "payments");
    assert_eq!(statuses[0].state, AddonState::Active);
    assert_eq!(statuses[0].installed_version.as_deref(), Some("1.0.0"));
    assert_eq!(statuses[1].state, AddonState::Discovered);
    assert!(statuses[1].installed_version.is_none());
}
