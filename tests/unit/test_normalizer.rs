use apidocs::core::collection::{load_normalized, normalize, CollectionDocument};
use apidocs::core::ErrorCategory;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn write_collection(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_raw_collection_is_serialized_compactly() {
    let dir = TempDir::new().unwrap();
    let path = write_collection(
        &dir,
        "collection.json",
        r#"{
    "info": { "name": "Shop" },
    "item": []
}"#,
    );

    let input = load_normalized(&path).await.unwrap();

    assert!(!input.was_enveloped);
    assert_eq!(input.text, r#"{"info":{"name":"Shop"},"item":[]}"#);
}

#[tokio::test]
async fn test_envelope_is_unwrapped_one_level() {
    let dir = TempDir::new().unwrap();
    let path = write_collection(
        &dir,
        "collection.json",
        r#"{"collection": {"info": {"name": "Shop"}, "item": []}}"#,
    );

    let input = load_normalized(&path).await.unwrap();

    assert!(input.was_enveloped);
    let value: Value = serde_json::from_str(&input.text).unwrap();
    assert_eq!(value, json!({"info": {"name": "Shop"}, "item": []}));
}

#[test]
fn test_nested_envelope_is_not_recursive() {
    let doc = CollectionDocument::from_value(json!({
        "collection": {"collection": {"info": {}}}
    }));
    assert!(doc.is_enveloped());
    assert_eq!(doc.into_inner(), json!({"collection": {"info": {}}}));
}

#[test]
fn test_string_value_passes_through() {
    let doc = CollectionDocument::from_value(json!({"collection": "{\"info\":{}}"}));
    let input = normalize(doc).unwrap();
    assert_eq!(input.text, "{\"info\":{}}");
    assert!(input.was_enveloped);
}

#[test]
fn test_key_order_is_preserved() {
    let doc = CollectionDocument::from_slice(br#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
    let input = normalize(doc).unwrap();
    assert_eq!(input.text, r#"{"zeta":1,"alpha":2,"mid":3}"#);
}

#[test]
fn test_non_object_documents_are_raw() {
    let doc = CollectionDocument::from_slice(b"[1, 2, 3]").unwrap();
    assert!(!doc.is_enveloped());
    assert_eq!(normalize(doc).unwrap().text, "[1,2,3]");
}

#[tokio::test]
async fn test_missing_file_is_fatal_parse_error() {
    let dir = TempDir::new().unwrap();
    let err = load_normalized(&dir.path().join("absent.json"))
        .await
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::ParseError);
    assert_eq!(err.code, "CONV-PARSE-001");
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_malformed_json_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_collection(&dir, "collection.json", "{\"info\": ");
    let err = load_normalized(&path).await.unwrap_err();
    assert_eq!(err.category, ErrorCategory::ParseError);
    assert_eq!(err.code, "CONV-PARSE-002");
}
