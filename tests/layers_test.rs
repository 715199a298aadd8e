//! Integration tests for layering files, inline documents and environment variables.
//!
//! Environment tests use prefixes unique to each test so they can run in parallel.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use conftree::application::{load_env, ApplicationError};
use conftree::{ConfigLayers, Source};

#[test]
fn given_defaults_file_and_env_when_building_then_later_sources_override() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.toml");
    fs::write(
        &file,
        r#"
name = "svc"

[db]
host = "db.internal"
port = 5432
"#,
    )
    .unwrap();
    std::env::set_var("CTLAYERS_DB__HOST", "localhost");

    // Act
    let tree = ConfigLayers::new()
        .with_defaults(json!({"db": {"host": "127.0.0.1", "pool": 4}, "name": "default"}))
        .with_file(&file)
        .with_env("CTLAYERS")
        .build()
        .unwrap();

    // Assert
    assert_eq!(
        tree.to_value(),
        json!({
            "name": "svc",
            "db": {"host": "localhost", "port": 5432, "pool": 4}
        })
    );

    // Cleanup
    std::env::remove_var("CTLAYERS_DB__HOST");
}

#[test]
fn given_prefixed_env_vars_when_loading_then_nested_lowercase_strings() {
    // Arrange
    std::env::set_var("CTENV_SERVER__PORT", "8080");
    std::env::set_var("CTENV_NAME", "svc");

    // Act
    let value = load_env("CTENV").unwrap();

    // Assert: no coercion, values stay strings
    assert_eq!(value, json!({"server": {"port": "8080"}, "name": "svc"}));

    // Cleanup
    std::env::remove_var("CTENV_SERVER__PORT");
    std::env::remove_var("CTENV_NAME");
}

#[test]
fn given_no_matching_env_vars_when_layering_then_tree_unchanged() {
    let tree = ConfigLayers::new()
        .with_defaults(json!({"a": 1}))
        .with_env("CTNOTHING_SET_FOR_THIS_PREFIX")
        .build()
        .unwrap();

    assert_eq!(tree.to_value(), json!({"a": 1}));
}

#[test]
fn given_json_file_with_dotted_keys_when_loading_then_keys_nested() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("flat.json");
    fs::write(&file, r#"{"server.port": 80, "server.host": "h"}"#).unwrap();

    let tree = Source::File(file).load().unwrap();

    assert_eq!(tree.to_value(), json!({"server": {"port": 80, "host": "h"}}));
}

#[test]
fn given_unreadable_file_when_building_then_operation_failed() {
    let result = ConfigLayers::new()
        .with_file("/nonexistent/conftree/app.toml")
        .build();

    assert!(matches!(
        result,
        Err(ApplicationError::OperationFailed { .. })
    ));
}

#[test]
fn given_invalid_toml_file_when_building_then_parse_error_names_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("broken.toml");
    fs::write(&file, "[db\nhost = 1").unwrap();

    let err = ConfigLayers::new().with_file(&file).build().unwrap_err();

    assert!(matches!(err, ApplicationError::Parse { .. }));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn given_conflicting_layers_when_building_with_report_then_conflict_per_layer() {
    let (tree, reports) = ConfigLayers::new()
        .with_json(r#"{"db": {"host": "a"}}"#)
        .with_toml("db = \"flat\"")
        .with_json(r#"{"db": {"port": 1}}"#)
        .build_with_report()
        .unwrap();

    assert_eq!(tree.to_value(), json!({"db": {"host": "a", "port": 1}}));
    assert_eq!(reports.len(), 3);
    assert!(reports[0].1.is_clean());
    assert_eq!(reports[1].1.conflicts, vec!["db"]);
    assert!(reports[2].1.is_clean());
}
