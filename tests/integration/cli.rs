//! Tests of the `vsix-fetch` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

use super::common::{Gallery, file_names};

fn vsix_fetch(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vsix-fetch").unwrap();
    cmd.env("NO_COLOR", "1")
        .env("VSIX_FETCH_NO_PROGRESS", "1")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config)
        .arg("--platform")
        .arg("linux-x64");
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn test_downloads_extension_with_dependencies() {
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "linux-x64", &["p.b"], 1).await;
    gallery.publish("p.b", "2.0.0", "linux-x64", &[], 1).await;

    let temp = TempDir::new().unwrap();
    let config = gallery.write_config(temp.path());
    let out = temp.path().join("out");

    vsix_fetch(&config)
        .arg("--output")
        .arg(&out)
        .arg("p.a")
        .assert()
        .success()
        .stdout(predicate::str::contains("01-p-b-2.0.0.vsix"))
        .stdout(predicate::str::contains("Done:"));

    assert_eq!(file_names(&out), vec!["01-p-b-2.0.0.vsix", "02-p-a-1.0.0.vsix"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_accepts_marketplace_url() {
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "linux-x64", &[], 1).await;

    let temp = TempDir::new().unwrap();
    let config = gallery.write_config(temp.path());
    let out = temp.path().join("out");

    vsix_fetch(&config)
        .arg("--output")
        .arg(&out)
        .arg("https://marketplace.visualstudio.com/items?itemName=p.a")
        .assert()
        .success();

    assert_eq!(file_names(&out), vec!["01-p-a-1.0.0.vsix"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_prompts_for_extension_when_omitted() {
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "linux-x64", &[], 1).await;

    let temp = TempDir::new().unwrap();
    let config = gallery.write_config(temp.path());
    let out = temp.path().join("out");

    vsix_fetch(&config)
        .arg("--output")
        .arg(&out)
        .write_stdin("p.a\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Enter VS Marketplace URL"));

    assert_eq!(file_names(&out), vec!["01-p-a-1.0.0.vsix"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tree_does_not_download() {
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "linux-x64", &["p.b"], 1).await;
    gallery.publish("p.b", "2.0.0", "linux-x64", &[], 1).await;

    let temp = TempDir::new().unwrap();
    let config = gallery.write_config(temp.path());
    let out = temp.path().join("out");

    vsix_fetch(&config)
        .arg("--output")
        .arg(&out)
        .arg("--tree")
        .arg("p.a")
        .assert()
        .success()
        .stdout(predicate::str::contains("p.a@1.0.0\n└── p.b@2.0.0"))
        .stdout(predicate::str::contains("02-p-a-1.0.0.vsix"));

    assert!(!out.exists());
    assert!(gallery.package_downloads().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_deps_fetches_only_root() {
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "linux-x64", &["p.b"], 1).await;
    gallery.publish("p.b", "2.0.0", "linux-x64", &[], 0).await;

    let temp = TempDir::new().unwrap();
    let config = gallery.write_config(temp.path());
    let out = temp.path().join("out");

    vsix_fetch(&config).arg("--output").arg(&out).arg("--no-deps").arg("p.a").assert().success();

    assert_eq!(file_names(&out), vec!["01-p-a-1.0.0.vsix"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_root_for_other_platform_fails() {
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "darwin-arm64", &[], 1).await;

    let temp = TempDir::new().unwrap();
    let config = gallery.write_config(temp.path());

    vsix_fetch(&config)
        .arg("--output")
        .arg(temp.path().join("out"))
        .arg("p.a")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No package found for 'p.a' on platform 'linux-x64'"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_download_sets_exit_status() {
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "linux-x64", &["p.b"], 1).await;
    gallery.publish("p.b", "1.0.0", "linux-x64", &[], 1).await;
    gallery.break_package("p.b", "1.0.0", 503).await;

    let temp = TempDir::new().unwrap();
    let config = gallery.write_config(temp.path());
    let out = temp.path().join("out");

    vsix_fetch(&config)
        .arg("--output")
        .arg(&out)
        .arg("p.a")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Finished with errors"));

    assert_eq!(file_names(&out), vec!["02-p-a-1.0.0.vsix"]);
}

#[test]
fn test_invalid_reference() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    std::fs::write(&config, "").unwrap();

    vsix_fetch(&config)
        .arg("not-an-identifier")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid extension reference"));
}

#[test]
fn test_invalid_config_is_reported() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    std::fs::write(&config, "max_attempts = 0\n").unwrap();

    vsix_fetch(&config)
        .arg("a.b")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_attempts"));
}
