//! Shared fixtures: a fake marketplace gallery served by `wiremock`.

use serde_json::json;
use std::path::{Path, PathBuf};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use vsix_fetch::constants::{MANIFEST_ASSET, VSIX_PACKAGE_ASSET};

const QUERY_PATH: &str = "/_apis/public/gallery/extensionquery";

/// A gallery that knows only the extensions explicitly published to it.
pub struct Gallery {
    pub server: MockServer,
}

impl Gallery {
    pub async fn start() -> Self {
        vsix_fetch::test_utils::init_test_logging(None);
        let server = MockServer::start().await;

        // Anything not published is an empty result set.
        Mock::given(method("POST"))
            .and(path(QUERY_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "results": [{ "extensions": [] }] })),
            )
            .with_priority(10)
            .mount(&server)
            .await;

        Self {
            server,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{QUERY_PATH}", self.server.uri())
    }

    /// Body served for the package of `key@version`.
    pub fn package_body(key: &str, version: &str) -> Vec<u8> {
        format!("vsix:{key}@{version}").into_bytes()
    }

    /// Publish `key` with one version for `platform`. The query must arrive
    /// exactly `expected_queries` times (checked when the server drops).
    pub async fn publish(
        &self,
        key: &str,
        version: &str,
        platform: &str,
        dependencies: &[&str],
        expected_queries: u64,
    ) {
        let base = format!("{}/files/{key}/{version}", self.server.uri());

        Mock::given(method("POST"))
            .and(path(QUERY_PATH))
            .and(body_partial_json(json!({
                "filters": [{ "criteria": [{ "filterType": 7, "value": key }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{ "extensions": [{ "versions": [{
                    "version": version,
                    "targetPlatform": platform,
                    "files": [
                        { "assetType": VSIX_PACKAGE_ASSET, "source": format!("{base}/package.vsix") },
                        { "assetType": MANIFEST_ASSET, "source": format!("{base}/package.json") }
                    ]
                }]}]}]
            })))
            .with_priority(1)
            .expect(expected_queries)
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/files/{key}/{version}/package.json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": key,
                "extensionDependencies": dependencies
            })))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/files/{key}/{version}/package.vsix")))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(Self::package_body(key, version)),
            )
            .mount(&self.server)
            .await;
    }

    /// Make every download of `key@version` fail with `status`.
    pub async fn break_package(&self, key: &str, version: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/files/{key}/{version}/package.vsix")))
            .respond_with(ResponseTemplate::new(status))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Package downloads received so far.
    pub async fn package_downloads(&self) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == "GET" && r.url.path().ends_with(".vsix"))
            .collect()
    }

    /// Write a config file pointing at this gallery with fast retries.
    pub fn write_config(&self, dir: &Path) -> PathBuf {
        let config = dir.join("config.toml");
        std::fs::write(
            &config,
            format!(
                "marketplace_url = \"{}\"\nmax_attempts = 2\nretry_delay_ms = 10\nrequest_timeout_secs = 10\n",
                self.endpoint()
            ),
        )
        .unwrap();
        config
    }
}

/// File names in `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(Result::ok).map(|e| e.file_name().to_string_lossy().into_owned()).collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
