//! End-to-end runs of the library pipeline against a fake gallery.

use reqwest::Client;
use std::time::Duration;
use tempfile::TempDir;

use vsix_fetch::core::VsixError;
use vsix_fetch::fetcher::FetchConfig;
use vsix_fetch::marketplace::HttpMarketplace;
use vsix_fetch::pipeline::{Pipeline, PipelineOptions};

use super::common::{Gallery, file_names};

fn pipeline(gallery: &Gallery, dest: &std::path::Path) -> Pipeline<HttpMarketplace> {
    let client = Client::new();
    let marketplace = HttpMarketplace::new(client.clone(), gallery.endpoint(), "7.0-preview.1");
    let options = PipelineOptions {
        fetch: FetchConfig {
            max_attempts: 2,
            retry_delay: Duration::from_millis(10),
        },
        show_progress: false,
        ..PipelineOptions::new("linux-x64", dest)
    };
    Pipeline::new(marketplace, client, options)
}

#[tokio::test]
async fn test_diamond_is_downloaded_dependency_first() {
    // A -> [B, C]; B -> D; C -> D
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "linux-x64", &["p.b", "p.c"], 1).await;
    gallery.publish("p.b", "1.1.0", "linux-x64", &["p.d"], 1).await;
    gallery.publish("p.c", "1.2.0", "linux-x64", &["p.d"], 1).await;
    gallery.publish("p.d", "0.9.0", "linux-x64", &[], 1).await;

    let temp = TempDir::new().unwrap();
    let summary = pipeline(&gallery, temp.path()).run(&"p.a".parse().unwrap()).await.unwrap();

    assert!(!summary.has_failures());
    assert_eq!(
        file_names(temp.path()),
        vec![
            "01-p-d-0.9.0.vsix",
            "02-p-b-1.1.0.vsix",
            "03-p-c-1.2.0.vsix",
            "04-p-a-1.0.0.vsix",
        ]
    );
    assert_eq!(
        std::fs::read(temp.path().join("01-p-d-0.9.0.vsix")).unwrap(),
        Gallery::package_body("p.d", "0.9.0")
    );
}

#[tokio::test]
async fn test_rerun_skips_existing_packages() {
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "linux-x64", &["p.b"], 2).await;
    gallery.publish("p.b", "1.0.0", "linux-x64", &[], 2).await;

    let temp = TempDir::new().unwrap();
    let pipeline = pipeline(&gallery, temp.path());

    pipeline.run(&"p.a".parse().unwrap()).await.unwrap();
    assert_eq!(gallery.package_downloads().await.len(), 2);

    let summary = pipeline.run(&"p.a".parse().unwrap()).await.unwrap();
    assert!(!summary.has_failures());
    assert_eq!(gallery.package_downloads().await.len(), 2);
}

#[tokio::test]
async fn test_cycle_downloads_each_package_once() {
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "linux-x64", &["p.b"], 1).await;
    gallery.publish("p.b", "1.0.0", "linux-x64", &["p.a"], 1).await;

    let temp = TempDir::new().unwrap();
    let summary = pipeline(&gallery, temp.path()).run(&"p.a".parse().unwrap()).await.unwrap();

    assert!(summary.graph.has_cycles());
    assert_eq!(file_names(temp.path()), vec!["01-p-b-1.0.0.vsix", "02-p-a-1.0.0.vsix"]);
}

#[tokio::test]
async fn test_dependency_for_other_platform_is_skipped() {
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "linux-x64", &["p.win", "p.b"], 1).await;
    gallery.publish("p.win", "1.0.0", "win32-x64", &[], 1).await;
    gallery.publish("p.b", "1.0.0", "linux-x64", &[], 1).await;

    let temp = TempDir::new().unwrap();
    let summary = pipeline(&gallery, temp.path()).run(&"p.a".parse().unwrap()).await.unwrap();

    assert!(summary.has_failures());
    assert_eq!(summary.report.failures.len(), 1);
    assert_eq!(summary.report.failures[0].key, "p.win");
    assert!(matches!(summary.report.failures[0].error, VsixError::NotFoundForPlatform { .. }));
    assert_eq!(file_names(temp.path()), vec!["01-p-b-1.0.0.vsix", "02-p-a-1.0.0.vsix"]);
}

#[tokio::test]
async fn test_broken_download_is_recorded_and_run_continues() {
    let gallery = Gallery::start().await;
    gallery.publish("p.a", "1.0.0", "linux-x64", &["p.b", "p.c"], 1).await;
    gallery.publish("p.b", "1.0.0", "linux-x64", &[], 1).await;
    gallery.publish("p.c", "1.0.0", "linux-x64", &[], 1).await;
    gallery.break_package("p.b", "1.0.0", 500).await;

    let temp = TempDir::new().unwrap();
    let summary = pipeline(&gallery, temp.path()).run(&"p.a".parse().unwrap()).await.unwrap();

    assert!(summary.has_failures());
    let failed: Vec<&str> = summary.failed().map(|r| r.key.as_str()).collect();
    assert_eq!(failed, vec!["p.b"]);
    assert_eq!(file_names(temp.path()), vec!["02-p-c-1.0.0.vsix", "03-p-a-1.0.0.vsix"]);
    assert_eq!(summary.installable_paths().len(), 2);
}

#[tokio::test]
async fn test_unknown_root_is_fatal() {
    let gallery = Gallery::start().await;

    let temp = TempDir::new().unwrap();
    let result = pipeline(&gallery, temp.path()).run(&"nobody.home".parse().unwrap()).await;

    assert!(matches!(result, Err(VsixError::ExtensionNotFound { .. })));
    assert!(file_names(temp.path()).is_empty());
}
