//! Tests for manifest validation and load order

use beaver_domain::error::Error;
use beaver_infrastructure::di::{ManifestRegistry, PluginManifest};

fn names(registry: &ManifestRegistry) -> Vec<String> {
    registry
        .load_order()
        .unwrap()
        .iter()
        .map(|m| m.name().to_string())
        .collect()
}

#[test]
fn test_dependencies_come_first_and_ties_keep_declaration_order() {
    let mut registry = ManifestRegistry::new();
    registry
        .add_batch(vec![
            PluginManifest::new("sql-editor")
                .depends_on("connections")
                .depends_on("core"),
            PluginManifest::new("core"),
            PluginManifest::new("connections").depends_on("core"),
            PluginManifest::new("theme"),
        ])
        .unwrap();

    assert_eq!(
        names(&registry),
        vec!["core", "connections", "sql-editor", "theme"]
    );
}

#[test]
fn test_missing_dependency_is_rejected() {
    let mut registry = ManifestRegistry::new();

    let err = registry
        .add(PluginManifest::new("sql-editor").depends_on("connections"))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::MissingManifestDependency { ref manifest, ref dependency }
            if manifest == "sql-editor" && dependency == "connections"
    ));
    assert!(registry.is_empty());
}

#[test]
fn test_duplicate_name_is_rejected() {
    let mut registry = ManifestRegistry::new();
    registry.add(PluginManifest::new("core")).unwrap();

    let err = registry.add(PluginManifest::new("core")).unwrap_err();

    assert!(matches!(err, Error::DuplicateManifest { ref name } if name == "core"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_invalid_batch_stores_nothing() {
    let mut registry = ManifestRegistry::new();

    let err = registry
        .add_batch(vec![
            PluginManifest::new("a"),
            PluginManifest::new("b").depends_on("missing"),
        ])
        .unwrap_err();

    assert!(matches!(err, Error::MissingManifestDependency { .. }));
    assert!(!registry.contains("a"));
}

#[test]
fn test_cycle_is_detected_in_load_order() {
    let mut registry = ManifestRegistry::new();
    registry.add(PluginManifest::new("core")).unwrap();
    registry
        .add_batch(vec![
            PluginManifest::new("a").depends_on("b"),
            PluginManifest::new("b").depends_on("a"),
        ])
        .unwrap();

    let err = registry.load_order().unwrap_err();

    match err {
        Error::CyclicManifestDependency { manifests } => assert_eq!(manifests, vec!["a", "b"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let mut registry = ManifestRegistry::new();
    registry
        .add(PluginManifest::new("loop").depends_on("loop"))
        .unwrap();

    assert!(matches!(
        registry.load_order(),
        Err(Error::CyclicManifestDependency { .. })
    ));
}
