use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let mut ops = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        ops,
        "{{\"op\":\"register\",\"user_id\":\"55555555-5555-5555-5555-555555555555\",\"kyc_level\":1}}"
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("vaspay"));
    cmd.arg(ops.path()).arg("--db-path").arg("some_db");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let mut ops = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        ops,
        "{{\"op\":\"register\",\"user_id\":\"55555555-5555-5555-5555-555555555555\",\"kyc_level\":1}}"
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("vaspay"));
    cmd.arg(ops.path()).arg("--db-path").arg(&db_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not());
}
