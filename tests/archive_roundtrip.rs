//! End-to-end archive, list and unzip runs against the local file system.
//! Archives written here are read back with the `zip` crate as an
//! independent reader.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use fileconnect::connector::{FILE_LOCATION, NEW_FILE_LOCATION};
use fileconnect::{FileSystemManager, FsOptions, Operation, OperationResult, Parameters};
use tempfile::tempdir;

fn manager() -> FileSystemManager {
    FileSystemManager::new(FsOptions::default()).unwrap()
}

fn params(source: &Path, destination: Option<&Path>) -> Parameters {
    Parameters::new()
        .with(FILE_LOCATION, source.to_str())
        .with(NEW_FILE_LOCATION, destination.and_then(Path::to_str))
}

fn entry_names(result: &OperationResult) -> Vec<&str> {
    result.entries.iter().map(|e| e.name.as_str()).collect()
}

fn read_zip(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    let mut content = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        content.insert(entry.name().to_string(), data);
    }
    content
}

fn sample_tree(root: &Path) {
    fs::create_dir_all(root.join("notes")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("x.csv"), "id,value\n1,42\n").unwrap();
    fs::write(root.join("notes/y.csv"), "a,b\n".repeat(2000)).unwrap();
}

#[tokio::test]
async fn archive_folder_is_readable_by_zip_crate() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    sample_tree(&src);
    let out = dir.path().join("out.zip");

    let result = Operation::Archive
        .execute(&manager(), &params(&src, Some(&out)))
        .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(entry_names(&result), vec!["notes/y.csv", "x.csv"]);

    let content = read_zip(&out);
    assert_eq!(content.len(), 2);
    assert_eq!(content["x.csv"], b"id,value\n1,42\n");
    assert_eq!(content["notes/y.csv"], "a,b\n".repeat(2000).into_bytes());
}

#[tokio::test]
async fn archive_single_file_and_rerun_is_identical_in_content() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("report.txt");
    fs::write(&file, "quarterly numbers").unwrap();
    let out = dir.path().join("report.zip");
    let manager = manager();

    let first = Operation::Archive.execute(&manager, &params(&file, Some(&out))).await;
    assert!(first.success);
    let before = read_zip(&out);
    let second = Operation::Archive.execute(&manager, &params(&file, Some(&out))).await;
    assert!(second.success);

    assert_eq!(read_zip(&out), before);
    assert_eq!(
        before.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["report.txt"]
    );
}

#[tokio::test]
async fn archive_written_inside_source_skips_itself() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a.txt"), "alpha").unwrap();
    let out = src.join("zz.zip");
    let manager = manager();

    for _ in 0..2 {
        let result = Operation::Archive
            .execute(&manager, &params(&src, Some(&out)))
            .await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(entry_names(&result), vec!["a.txt"]);
        assert!(result.skipped.is_empty());
    }
    assert_eq!(
        read_zip(&out).into_keys().collect::<Vec<_>>(),
        vec!["a.txt".to_string()]
    );
}

#[tokio::test]
async fn archive_missing_source_fails_without_output() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.zip");
    let result = Operation::Archive
        .execute(&manager(), &params(&dir.path().join("absent"), Some(&out)))
        .await;
    assert!(!result.success);
    assert!(!out.exists());
}

#[tokio::test]
async fn list_unzip_and_archive_again() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    sample_tree(&src);
    let zip_path = dir.path().join("src.zip");
    let manager = manager();

    assert!(
        Operation::Archive
            .execute(&manager, &params(&src, Some(&zip_path)))
            .await
            .success
    );

    let listed = Operation::ListZip.execute(&manager, &params(&zip_path, None)).await;
    assert!(listed.success);
    assert_eq!(entry_names(&listed), vec!["notes/y.csv", "x.csv"]);

    let restored = dir.path().join("restored");
    let unzipped = Operation::Unzip
        .execute(&manager, &params(&zip_path, Some(&restored)))
        .await;
    assert!(unzipped.success, "{:?}", unzipped.error);
    assert_eq!(
        fs::read(restored.join("x.csv")).unwrap(),
        fs::read(src.join("x.csv")).unwrap()
    );
    assert_eq!(
        fs::read(restored.join("notes/y.csv")).unwrap(),
        fs::read(src.join("notes/y.csv")).unwrap()
    );

    let again = dir.path().join("again.zip");
    assert!(
        Operation::Archive
            .execute(&manager, &params(&restored, Some(&again)))
            .await
            .success
    );
    assert_eq!(read_zip(&again), read_zip(&zip_path));
}

#[tokio::test]
async fn unzip_reads_archives_from_other_writers() {
    use std::io::Write;

    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("foreign.zip");
    {
        let mut writer = zip::ZipWriter::new(fs::File::create(&zip_path).unwrap());
        let stored =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        writer.add_directory("docs/", stored).unwrap();
        writer.start_file("docs/a.txt", stored).unwrap();
        writer.write_all(b"stored text").unwrap();
        writer.start_file("b.txt", deflated).unwrap();
        writer.write_all(&b"deflated ".repeat(100)).unwrap();
        writer.finish().unwrap();
    }
    let manager = manager();

    let listed = Operation::ListZip.execute(&manager, &params(&zip_path, None)).await;
    assert_eq!(entry_names(&listed), vec!["docs/a.txt", "b.txt"]);

    let out = dir.path().join("out");
    let result = Operation::Unzip
        .execute(&manager, &params(&zip_path, Some(&out)))
        .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(entry_names(&result), vec!["docs", "docs/a.txt", "b.txt"]);
    assert_eq!(fs::read(out.join("docs/a.txt")).unwrap(), b"stored text");
    assert_eq!(fs::read(out.join("b.txt")).unwrap(), b"deflated ".repeat(100));
}

#[tokio::test]
async fn unzip_refuses_path_traversal() {
    use std::io::Write;

    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("evil.zip");
    {
        let mut writer = zip::ZipWriter::new(fs::File::create(&zip_path).unwrap());
        let options = zip::write::FileOptions::default();
        writer.start_file("fine.txt", options).unwrap();
        writer.write_all(b"ok").unwrap();
        writer.start_file("../evil.txt", options).unwrap();
        writer.write_all(b"gotcha").unwrap();
        writer.finish().unwrap();
    }

    let out = dir.path().join("jail/out");
    let result = Operation::Unzip
        .execute(&manager(), &params(&zip_path, Some(&out)))
        .await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("unsafe entry name"));
    assert!(!out.exists());
    assert!(!dir.path().join("jail/evil.txt").exists());
}
