//! Source API tests with mock sources.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use anisearch_core::Operation;
use common::{TestFixture, KNOWN_HASH};

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["server"]["port"], 3000);
    assert_eq!(response.body["gateway"]["cache_ttl_ms"], 60000);
    assert!(response.body["sources"]["enabled"].is_array());
}

#[tokio::test]
async fn test_list_sources_reports_liveness() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/sources").await;
    assert_status!(response, StatusCode::OK);

    let sources = response.body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0]["source"], "alpha");
    assert_eq!(sources[0]["ok"], true);
    assert_eq!(sources[1]["source"], "beta");
    assert_eq!(sources[1]["ok"], false);
    assert_eq!(response.body["nzb"]["source"], "mock_nzb");
    assert_eq!(response.body["nzb"]["ok"], true);
}

#[tokio::test]
async fn test_single_source_probe() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/sources/beta/test").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["source"], "beta");
    assert_eq!(response.body["ok"], false);

    let response = fixture.get("/api/v1/sources/nope/test").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_returns_canonical_results() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/sources/alpha/single",
            json!({
                "titles": ["Show", "Show Alt"],
                "episode": 1,
                "resolution": "1080",
                "exclusions": ["HEVC"]
            }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["source"], "alpha");
    assert_eq!(response.body["operation"], "single");

    let results = response.body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["hash"], KNOWN_HASH);
    assert_eq!(results[0]["accuracy"], "medium");
    assert!(results[0]["type"].is_null());

    let queries = fixture.alpha.recorded_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].0, Operation::Single);
    assert_eq!(queries[0].1.titles, vec!["Show", "Show Alt"]);
    assert_eq!(queries[0].1.episode, Some(1));
}

#[tokio::test]
async fn test_search_without_titles_is_bad_request() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/v1/sources/alpha/batch", json!({ "titles": [] }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("Invalid query"));
    assert!(fixture.alpha.recorded_queries().is_empty());
}

#[tokio::test]
async fn test_unsupported_operation_is_501() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/v1/sources/beta/single", json!({ "titles": ["Show"] }))
        .await;
    assert_status!(response, StatusCode::NOT_IMPLEMENTED);

    // The other operations still work
    let response = fixture
        .post("/api/v1/sources/beta/movie", json!({ "titles": ["Show"] }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(fixture.beta.recorded_queries().len(), 1);
}

#[tokio::test]
async fn test_unknown_source_or_operation_is_404() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/v1/sources/nope/single", json!({ "titles": ["Show"] }))
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = fixture
        .post("/api/v1/sources/alpha/season", json!({ "titles": ["Show"] }))
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(fixture.alpha.recorded_queries().is_empty());
}

#[tokio::test]
async fn test_nzb_lookup() {
    let fixture = TestFixture::new();

    let response = fixture.get(&format!("/api/v1/nzb/{}", KNOWN_HASH)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["hash"], KNOWN_HASH);
    assert_eq!(response.body["url"], "https://nzb.example/file.nzb");

    let response = fixture
        .get("/api/v1/nzb/0000000000000000000000000000000000000000")
        .await;
    assert_status!(response, StatusCode::OK);
    assert!(response.body["url"].is_null());
}

#[tokio::test]
async fn test_extensions_listing_and_static_files() {
    let fixture = TestFixture::new();
    let dir = fixture.extensions_dir.path();
    std::fs::write(dir.join("nyaasi.js"), "export default {}").unwrap();
    std::fs::create_dir(dir.join("animetosho")).unwrap();

    let response = fixture.get("/extensions/list").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["ok"], true);

    let files = response.body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["name"], "animetosho");
    assert_eq!(files[0]["isFile"], false);
    assert_eq!(files[1]["name"], "nyaasi.js");
    assert_eq!(files[1]["isFile"], true);
    assert_eq!(files[1]["size"], 17);

    let response = fixture.get("/extensions/nyaasi.js").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.text(), "export default {}");
}

#[tokio::test]
async fn test_extensions_listing_missing_directory() {
    let fixture = TestFixture::new();
    let dir = fixture.extensions_dir.path().to_path_buf();
    std::fs::remove_dir(&dir).unwrap();

    let response = fixture.get("/extensions/list").await;
    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["ok"], false);
    assert!(response.body["error"].is_string());
}
