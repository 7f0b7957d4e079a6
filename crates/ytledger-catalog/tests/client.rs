//! Integration tests for `YoutubeClient` using wiremock HTTP mocks.

use chrono::{TimeZone, Utc};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ytledger_catalog::{
    fetch_uploads_since, resolve_channel_id, CatalogError, CatalogService, YoutubeClient,
};

fn test_client(base_url: &str) -> YoutubeClient {
    YoutubeClient::with_base_url("test-key", 30, "ytledger-test", base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn channel_id_for_handle_returns_first_item() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("forHandle", "@creator"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "youtube#channelListResponse",
            "items": [{ "kind": "youtube#channel", "id": "UC_handle" }]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let id = client
        .channel_id_for_handle("@creator")
        .await
        .expect("lookup should succeed");
    assert_eq!(id.as_deref(), Some("UC_handle"));
}

#[tokio::test]
async fn resolver_falls_back_to_search_when_handle_is_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("forHandle", "@creator"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "youtube#channelListResponse",
            "pageInfo": { "totalResults": 0, "resultsPerPage": 5 }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "@creator"))
        .and(query_param("type", "channel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{ "id": { "kind": "youtube#channel", "channelId": "UC_search" } }]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let id = resolve_channel_id(&client, "@creator").await;
    assert_eq!(id.as_deref(), Some("UC_search"));
}

#[tokio::test]
async fn api_error_envelope_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota.",
                "errors": [{ "reason": "quotaExceeded" }]
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .uploads_playlist_id("UC1")
        .await
        .expect_err("403 should fail");
    match err {
        CatalogError::Api { status, message } => {
            assert_eq!(status, 403);
            assert!(message.contains("quota"), "unexpected message: {message}");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn resolver_treats_api_error_as_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    assert!(resolve_channel_id(&client, "@creator").await.is_none());
}

#[tokio::test]
async fn fetch_uploads_pages_until_cutoff_then_batches_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("id", "UC1"))
        .and(query_param("part", "contentDetails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{
                "id": "UC1",
                "contentDetails": { "relatedPlaylists": { "uploads": "UU1" } }
            }]
        })))
        .mount(&server)
        .await;

    // The second page would hold an older video; it must never be requested.
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("playlistId", "UU1"))
        .and(query_param("pageToken", "NEXT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{ "contentDetails": { "videoId": "v3", "videoPublishedAt": "2024-11-01T00:00:00Z" } }]
        })))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("playlistId", "UU1"))
        .and(query_param("maxResults", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nextPageToken": "NEXT",
            "items": [
                { "contentDetails": { "videoId": "v1", "videoPublishedAt": "2025-04-02T15:00:00Z" } },
                { "contentDetails": { "videoId": "v2", "videoPublishedAt": "2025-01-20T15:00:00Z" } },
                { "contentDetails": { "videoId": "v0", "videoPublishedAt": "2024-12-31T15:00:00Z" } }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "v1,v2"))
        .and(query_param("part", "snippet,statistics,contentDetails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "id": "v1",
                    "snippet": { "publishedAt": "2025-04-02T15:00:00Z", "title": "Long one" },
                    "statistics": { "viewCount": "1234" },
                    "contentDetails": { "duration": "PT12M3S" }
                },
                {
                    "id": "v2",
                    "snippet": { "publishedAt": "2025-01-20T15:00:00Z", "title": "Short one" },
                    "statistics": { "viewCount": "99" },
                    "contentDetails": { "duration": "PT59S" }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let cutoff = Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap();
    let videos = fetch_uploads_since(&client, "UC1", cutoff)
        .await
        .expect("fetch should succeed");

    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].id, "v1");
    assert_eq!(videos[0].view_count, 1234);
    assert_eq!(videos[0].duration_seconds, 723);
    assert_eq!(videos[1].title, "Short one");
    assert_eq!(videos[1].duration_seconds, 59);
}
