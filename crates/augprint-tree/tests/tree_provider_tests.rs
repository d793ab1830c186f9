use std::fs;

use augprint_tree::{collect_entries, escape_label, pathx, MemTree, TreeError, TreeProvider};
use proptest::prelude::*;

#[test]
fn loads_files_from_disk_with_detected_grammar() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.env");
    fs::write(&path, "# app\nPORT=8080\nexport HOME=/srv\n").unwrap();
    let filename = path.to_string_lossy().into_owned();

    let mut tree = MemTree::new();
    let grammar = tree.load_file(&filename, None).unwrap();
    assert_eq!(grammar, "Shellvars");

    let entries = collect_entries(&tree, &filename).unwrap();
    let paths: Vec<_> = entries
        .iter()
        .map(|e| e.path.rsplit('/').next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(paths, ["#comment", "PORT", "HOME", "export"]);
    assert_eq!(entries[1].value.as_deref(), Some("8080"));
    assert_eq!(entries[3].value, None);
}

#[test]
fn missing_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let filename = dir.path().join("absent.env").to_string_lossy().into_owned();
    let err = MemTree::new().load_file(&filename, None).unwrap_err();
    assert!(matches!(err, TreeError::Io { .. }));
    assert!(err.is_load_error());
}

#[test]
fn explicit_grammar_overrides_detection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "first\nsecond\n").unwrap();
    let filename = path.to_string_lossy().into_owned();

    let mut tree = MemTree::new();
    assert!(matches!(
        tree.load_file(&filename, None),
        Err(TreeError::NoGrammar { .. })
    ));
    assert_eq!(tree.load_file(&filename, Some("Simplelines.lns")).unwrap(), "Simplelines");
    assert_eq!(collect_entries(&tree, &filename).unwrap().len(), 2);
}

fn label() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z#\\[\\]/=()!,| .\\\\-]{1,8}")
        .unwrap()
        .prop_filter("self and parent steps", |l| l != "." && l != "..")
}

proptest! {
    #[test]
    fn escaped_labels_parse_back(label in label()) {
        let path = pathx::parse(&format!("/files/{}", escape_label(&label))).unwrap();
        prop_assert_eq!(path.steps.len(), 2);
        prop_assert_eq!(&path.steps[1].test, &pathx::NameTest::Label(label));
    }

    #[test]
    fn set_then_get_returns_value(labels in proptest::collection::vec(label(), 1..4), value in ".{0,12}") {
        let path = labels
            .iter()
            .fold(String::from("/files"), |acc, l| format!("{acc}/{}", escape_label(l)));
        let mut tree = MemTree::new();
        prop_assert!(tree.set(&path, &value).unwrap());
        prop_assert!(!tree.set(&path, &value).unwrap());
        prop_assert_eq!(tree.get(&path).unwrap(), Some(value));
        prop_assert_eq!(tree.match_paths(&path).unwrap(), vec![path.clone()]);
    }
}
