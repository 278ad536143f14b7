use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{FIRST_AIRLINE, OWNER, fund_row, id, operations_file};
use predicates::prelude::*;
use std::process::Command;

mod common;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let csv = operations_file(&[fund_row(1, "10")]).unwrap();

    let mut cmd = Command::new(cargo_bin!("flightsurety"));
    cmd.arg(csv.path())
        .arg("--owner")
        .arg(id(OWNER).to_string())
        .arg("--first-airline")
        .arg(id(FIRST_AIRLINE).to_string())
        .arg("--db-path")
        .arg("some_db");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."))
        .stdout(predicate::str::contains(format!("{},true,true,10,0", id(1))));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let csv = operations_file(&[fund_row(1, "10")]).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("flightsurety"));
    cmd.arg(csv.path())
        .arg("--owner")
        .arg(id(OWNER).to_string())
        .arg("--first-airline")
        .arg(id(FIRST_AIRLINE).to_string())
        .arg("--db-path")
        .arg(&db_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not());
}
