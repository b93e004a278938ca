//! CLI integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cmd() -> Command {
    Command::cargo_bin("photo-watermark").unwrap()
}

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Batch photo watermarking"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("template"));
}

#[test]
fn test_cli_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_invalid_command() {
    cmd().arg("invalid-command").assert().failure();
}

#[test]
fn test_template_lifecycle() {
    let store = tempdir().unwrap();
    let store_arg = store.path().to_str().unwrap().to_string();

    cmd()
        .args(["--store-dir", &store_arg, "template", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    cmd()
        .args([
            "--store-dir",
            &store_arg,
            "template",
            "save",
            "date-stamp",
            "--text",
            "2023-08-15",
            "--position",
            "bottom-left",
        ])
        .assert()
        .success();

    cmd()
        .args(["--store-dir", &store_arg, "template", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("date-stamp"));

    cmd()
        .args(["--store-dir", &store_arg, "template", "show", "date-stamp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"watermarkText\": \"2023-08-15\""))
        .stdout(predicate::str::contains("\"position\": \"bottomLeft\""));

    cmd()
        .args(["--store-dir", &store_arg, "template", "delete", "date-stamp"])
        .assert()
        .success();

    cmd()
        .args(["--store-dir", &store_arg, "template", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_export_refuses_source_directory() {
    let store = tempdir().unwrap();
    let photos = tempdir().unwrap();
    let input = photos.path().join("photo.png");
    image::DynamicImage::new_rgba8(16, 16)
        .save(&input)
        .unwrap();

    cmd()
        .args([
            "--store-dir",
            store.path().to_str().unwrap(),
            "export",
            input.to_str().unwrap(),
            "--output-dir",
            photos.path().to_str().unwrap(),
        ])
        .assert()
        .failure();
}

#[test]
fn test_export_writes_watermarked_file() {
    let store = tempdir().unwrap();
    let photos = tempdir().unwrap();
    let input = photos.path().join("IMG_1.png");
    image::DynamicImage::new_rgba8(64, 64)
        .save(&input)
        .unwrap();
    let out_dir = photos.path().join("exported");

    cmd()
        .args([
            "--store-dir",
            store.path().to_str().unwrap(),
            "export",
            input.to_str().unwrap(),
            "--output-dir",
            out_dir.to_str().unwrap(),
            "--text",
            "hello",
            "--suffix",
            "_wm",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("IMG_1_wm.png"));

    assert!(out_dir.join("IMG_1_wm.png").exists());
}
