//! Command-line tests for the `taxlookup` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURE: &str = include_str!("../../taxlookup-core/tests/fixtures/company_page.html");

fn taxlookup(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("taxlookup").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

/// Config file pointing at a local registry stand-in.
fn write_config(dir: &Path, base_url: &str) -> std::path::PathBuf {
    let path = dir.join("config.json");
    let config = serde_json::json!({
        "fetch": { "base_url": base_url, "timeout_secs": 5 }
    });
    fs::write(&path, config.to_string()).unwrap();
    path
}

#[test]
fn test_blank_query_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:1");

    taxlookup(&config)
        .args(["lookup", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Query must not be empty"));
}

#[test]
fn test_config_show_reads_given_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://registry.test");

    taxlookup(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://registry.test"))
        .stdout(predicate::str::contains("\"timeout_secs\": 5"));
}

#[test]
fn test_config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested").join("config.json");

    taxlookup(&config)
        .args(["config", "set", "fetch.connect_timeout_secs", "7"])
        .assert()
        .success();

    taxlookup(&config)
        .args(["config", "get", "fetch.connect_timeout_secs"])
        .assert()
        .success()
        .stdout(predicate::str::diff("7\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lookup_prints_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Search/"))
        .and(query_param("q", "0101234567"))
        .and(query_param("type", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FIXTURE))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    let assert = tokio::task::spawn_blocking(move || {
        taxlookup(&config)
            .args(["lookup", "0101234567"])
            .assert()
    })
    .await
    .unwrap();

    let output = assert.success().get_output().stdout.clone();
    let record: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(record["tax_id"], "0101234567");
    assert_eq!(record["name"], "CÔNG TY TNHH THƯƠNG MẠI ABC");
    assert_eq!(record["representative"], "NGUYỄN VĂN A");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lookup_server_error_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    let assert = tokio::task::spawn_blocking(move || {
        taxlookup(&config)
            .args(["lookup", "0101234567"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .failure()
        .stderr(predicate::str::contains("500"))
        .stdout(predicate::str::is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lookup_save_then_store_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FIXTURE))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());
    let store = dir.path().join("companies.json");

    let (config, store) = tokio::task::spawn_blocking(move || {
        taxlookup(&config)
            .args(["lookup", "0101234567", "--save", "--store"])
            .arg(&store)
            .assert()
            .success();

        // Served from the store: the registry mock expects a single request.
        taxlookup(&config)
            .args(["lookup", "0101234567", "--store"])
            .arg(&store)
            .assert()
            .success();

        (config, store)
    })
    .await
    .unwrap();

    taxlookup(&config)
        .args(["store", "--store"])
        .arg(&store)
        .args(["get", "0101234567", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NGUYỄN VĂN A"));

    taxlookup(&config)
        .args(["store", "--store"])
        .arg(&store)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("name,international_name"))
        .stdout(predicate::str::contains("0101234567"));
}

#[test]
fn test_store_get_unknown_tax_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:1");
    let store = dir.path().join("companies.json");
    fs::write(&store, "[]").unwrap();

    taxlookup(&config)
        .args(["store", "--store"])
        .arg(&store)
        .args(["get", "0101234567"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No record for 0101234567"));
}

#[test]
fn test_batch_writes_summary() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:1");

    let store = dir.path().join("companies.json");
    let record = serde_json::json!([{ "tax_id": "0101234567", "name": "CÔNG TY LƯU SẴN" }]);
    fs::write(&store, record.to_string()).unwrap();

    let queries = dir.path().join("queries.txt");
    fs::write(&queries, "# known\n0101234567\n").unwrap();
    let out = dir.path().join("out");

    taxlookup(&config)
        .arg("batch")
        .arg(&queries)
        .arg("--output-dir")
        .arg(&out)
        .arg("--summary")
        .arg("--store")
        .arg(&store)
        .assert()
        .success();

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("query,status,source,time_ms,name"));
    assert!(summary.contains("0101234567,ok,store,"));
    assert!(out.join("0001_0101234567.json").exists());
}
