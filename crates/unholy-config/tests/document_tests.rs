//! Tests for the Unholyfile document store

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use toml_edit::value;
use unholy_config::{Error, document};

#[test]
fn test_edit_preserves_tail_byte_for_byte() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("demo.Unholyfile");
    fs::write(&path, "---\nrepository = \"x\"\n---\n#!/bin/sh\necho hi\n").unwrap();

    document::edit(&path, true, |doc| {
        doc["repository"] = value("y");
        Ok::<_, Error>(())
    })
    .unwrap();

    let (doc, tail) = document::read(&path).unwrap();
    assert_eq!(doc["repository"].as_str(), Some("y"));
    assert_eq!(tail, "#!/bin/sh\necho hi\n");
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "---\nrepository = \"y\"\n---\n#!/bin/sh\necho hi\n"
    );
}

#[test]
fn test_edit_preserves_comments_and_layout() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("demo.Unholyfile");
    let original = "---\n# where the code lives\nrepository = \"x\"\n\n[dev]\nvolume   =   \"ws\"  # aligned\n---\n";
    fs::write(&path, original).unwrap();

    document::edit(&path, false, |doc| {
        doc["context"] = value("remote");
        Ok::<_, Error>(())
    })
    .unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("# where the code lives\n"));
    assert!(written.contains("volume   =   \"ws\"  # aligned\n"));
    assert!(written.contains("context = \"remote\""));
}

#[test]
fn test_edit_script_only_file_prepends_headmatter() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Unholyfile");
    fs::write(&path, "#!/bin/sh\necho hi\n").unwrap();

    document::edit(&path, false, |doc| {
        doc["repository"] = value("x");
        Ok::<_, Error>(())
    })
    .unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "---\nrepository = \"x\"\n---\n#!/bin/sh\necho hi\n"
    );
}

#[test]
fn test_edit_creates_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("demo.Unholyfile");

    document::edit(&path, true, |doc| {
        doc["repository"] = value("x");
        Ok::<_, Error>(())
    })
    .unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "---\nrepository = \"x\"\n---\n"
    );
}

#[test]
fn test_edit_missing_file_without_create_is_not_found() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("demo.Unholyfile");

    let err = document::edit(&path, false, |_| Ok::<_, Error>(())).unwrap_err();

    assert!(matches!(err, Error::FileNotFound { .. }));
    assert!(!path.exists());
}

#[test]
fn test_edit_returns_closure_value() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("demo.Unholyfile");
    fs::write(&path, "---\nrepository = \"x\"\n---\n").unwrap();

    let previous = document::edit(&path, false, |doc| {
        let previous = doc["repository"].as_str().map(str::to_string);
        doc["repository"] = value("y");
        Ok::<_, Error>(previous)
    })
    .unwrap();

    assert_eq!(previous.as_deref(), Some("x"));
}

#[test]
fn test_edit_malformed_toml_is_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("demo.Unholyfile");
    fs::write(&path, "---\n[broken\n---\n").unwrap();

    let err = document::edit(&path, false, |_| Ok::<_, Error>(())).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn test_read_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = document::read(&temp.path().join("nope")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_nested_table_edit() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("demo.Unholyfile");

    document::edit(&path, true, |doc| {
        doc["repository"] = value("x");
        let dev = doc
            .entry("dev")
            .or_insert(toml_edit::table())
            .as_table_mut()
            .ok_or(Error::WrongType {
                key: "dev".into(),
                expected: "table",
                found: "value",
            })?;
        dev["volume"] = value("ws");
        Ok::<_, Error>(())
    })
    .unwrap();

    let (doc, _) = document::read(&path).unwrap();
    assert_eq!(doc["dev"]["volume"].as_str(), Some("ws"));
}
