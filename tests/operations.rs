//! Connector operations driven through named parameters.

use std::fs;

use fileconnect::connector::{
    CONTENT, DIR_PATTERN, ENCODING, FILE_LOCATION, FILE_PATTERN, NEW_FILE_LOCATION,
};
use fileconnect::{FileSystemManager, FsOptions, Operation, OperationResult, Parameters};
use tempfile::tempdir;

fn manager() -> FileSystemManager {
    FileSystemManager::new(FsOptions::default()).unwrap()
}

fn names(result: &OperationResult) -> Vec<&str> {
    result.entries.iter().map(|e| e.name.as_str()).collect()
}

fn at(source: &str) -> Parameters {
    Parameters::new().with(FILE_LOCATION, Some(source))
}

#[tokio::test]
async fn create_append_and_encoding() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("greeting.txt");
    let file = file.to_str().unwrap();
    let manager = manager();

    let created = Operation::Create
        .execute(&manager, &at(file).with(CONTENT, Some("café")))
        .await;
    assert!(created.success);
    let appended = Operation::Append
        .execute(
            &manager,
            &at(file)
                .with(CONTENT, Some(" crème"))
                .with(ENCODING, Some("ISO-8859-1")),
        )
        .await;
    assert!(appended.success);
    assert_eq!(fs::read(file).unwrap(), b"caf\xc3\xa9 cr\xe8me");

    let bad = Operation::Append
        .execute(&manager, &at(file).with(CONTENT, Some("x")).with(ENCODING, Some("bogus")))
        .await;
    assert!(!bad.success);
    assert!(bad.error.unwrap().contains("bogus"));

    let folder = dir.path().join("made/by/create");
    let made = Operation::Create
        .execute(&manager, &at(folder.to_str().unwrap()))
        .await;
    assert!(made.success);
    assert!(folder.is_dir());
}

#[tokio::test]
async fn copy_with_pattern_is_case_insensitive() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("in");
    fs::create_dir_all(src.join("sub/deeper")).unwrap();
    fs::write(src.join("A.CSV"), "a").unwrap();
    fs::write(src.join("b.txt"), "b").unwrap();
    fs::write(src.join("sub/c.csv"), "c").unwrap();
    fs::write(src.join("sub/deeper/d.csv"), "d").unwrap();
    let out = dir.path().join("out");

    let result = Operation::Copy
        .execute(
            &manager(),
            &at(src.to_str().unwrap())
                .with(NEW_FILE_LOCATION, out.to_str())
                .with(FILE_PATTERN, Some("*.csv")),
        )
        .await;
    assert!(result.success, "{:?}", result.error);
    assert!(result.skipped.is_empty());

    let mut copied: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    copied.sort();
    assert_eq!(copied, vec!["A.CSV", "c.csv"]);
}

#[tokio::test]
async fn move_file_then_delete_folder() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("data.bin");
    fs::write(&file, [1u8, 2, 3]).unwrap();
    let target = dir.path().join("moved");
    let manager = manager();

    let moved = Operation::Move
        .execute(
            &manager,
            &at(file.to_str().unwrap()).with(NEW_FILE_LOCATION, target.to_str()),
        )
        .await;
    assert!(moved.success, "{:?}", moved.error);
    assert!(!file.exists());
    assert_eq!(fs::read(target.join("data.bin")).unwrap(), [1, 2, 3]);

    let deleted = Operation::Delete
        .execute(&manager, &at(target.to_str().unwrap()))
        .await;
    assert!(deleted.success);
    assert!(!target.exists());

    let again = Operation::Delete
        .execute(&manager, &at(target.to_str().unwrap()))
        .await;
    assert!(!again.success);
}

#[tokio::test]
async fn search_lists_matching_children() {
    let manager = manager();
    for path in [
        "ram:///box/Invoice-01.PDF",
        "ram:///box/invoice-02.pdf",
        "ram:///box/readme.md",
        "ram:///box/Invoices/x.pdf",
    ] {
        let created = Operation::Create
            .execute(&manager, &at(path).with(CONTENT, Some("x")))
            .await;
        assert!(created.success);
    }

    let found = Operation::Search
        .execute(
            &manager,
            &at("ram:///box")
                .with(FILE_PATTERN, Some("invoice-??.pdf"))
                .with(DIR_PATTERN, Some("invoice*")),
        )
        .await;
    assert!(found.success);
    assert_eq!(
        names(&found),
        vec!["Invoice-01.PDF", "Invoices", "invoice-02.pdf"]
    );

    let without_patterns = Operation::Search.execute(&manager, &at("ram:///box")).await;
    assert!(!without_patterns.success);
    assert!(
        without_patterns
            .error
            .unwrap()
            .contains("filePattern or dirPattern")
    );
}

#[tokio::test]
async fn exist_on_local_and_unsupported_schemes() {
    let dir = tempdir().unwrap();
    let manager = manager();

    let here = Operation::Exist
        .execute(&manager, &at(dir.path().to_str().unwrap()))
        .await;
    assert_eq!((here.success, here.file_exist), (true, Some(true)));

    let gone = Operation::Exist
        .execute(&manager, &at(dir.path().join("gone").to_str().unwrap()))
        .await;
    assert_eq!(gone.file_exist, Some(false));

    let sftp = Operation::Exist.execute(&manager, &at("sftp://host/file")).await;
    assert!(!sftp.success);
    assert!(sftp.error.unwrap().contains("sftp"));
}
