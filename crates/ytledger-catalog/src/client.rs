//! HTTP client for the `YouTube` Data API v3.
//!
//! Wraps `reqwest` with API-key handling, typed response deserialization and
//! error-envelope decoding. Requests are sent once: a failing call surfaces as
//! a [`CatalogError`] and the next scheduled run is the retry.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use ytledger_core::VideoRecord;

use crate::error::CatalogError;
use crate::service::{CatalogService, PlaylistEntry, PlaylistPage};
use crate::types::{
    ChannelContentItem, ChannelIdItem, ErrorResponse, ListResponse, PlaylistItem, SearchItem,
    VideoItem,
};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// Page size for playlist listing; also the API's per-call ID cap.
pub const PAGE_SIZE: u32 = 50;

/// Client for the `YouTube` Data API.
///
/// Use [`YoutubeClient::new`] for production or [`YoutubeClient::with_base_url`]
/// to point at a mock server in tests.
pub struct YoutubeClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl YoutubeClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, CatalogError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`CatalogError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `Url::join` appends the resource name
        // instead of replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| CatalogError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: parsed,
        })
    }

    /// Builds `<base>/<resource>?<params>&key=…` with percent-encoded values.
    fn build_url(&self, resource: &str, params: &[(&str, &str)]) -> Result<Url, CatalogError> {
        let mut url = self
            .base_url
            .join(resource)
            .map_err(|e| CatalogError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    /// Sends a GET and decodes the body as `T`.
    ///
    /// Non-2xx statuses are decoded from the API error envelope into
    /// [`CatalogError::Api`].
    async fn request_json<T: DeserializeOwned>(
        &self,
        url: Url,
        context: &str,
    ) -> Result<T, CatalogError> {
        // `without_url` keeps the API key out of logged errors.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| CatalogError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

impl CatalogService for YoutubeClient {
    async fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, CatalogError> {
        let url = self.build_url("channels", &[("part", "id"), ("forHandle", handle)])?;
        let list: ListResponse<ChannelIdItem> = self
            .request_json(url, &format!("channels(forHandle={handle})"))
            .await?;
        Ok(list.items.into_iter().next().map(|c| c.id))
    }

    async fn search_channel_id(&self, query: &str) -> Result<Option<String>, CatalogError> {
        let url = self.build_url(
            "search",
            &[
                ("part", "id"),
                ("q", query),
                ("type", "channel"),
                ("maxResults", "1"),
            ],
        )?;
        let list: ListResponse<SearchItem> = self
            .request_json(url, &format!("search(q={query})"))
            .await?;
        Ok(list.items.into_iter().find_map(|s| s.id.channel_id))
    }

    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<Option<String>, CatalogError> {
        let url = self.build_url("channels", &[("part", "contentDetails"), ("id", channel_id)])?;
        let list: ListResponse<ChannelContentItem> = self
            .request_json(url, &format!("channels(id={channel_id})"))
            .await?;
        Ok(list
            .items
            .into_iter()
            .find(|c| c.id == channel_id)
            .and_then(|c| c.content_details.related_playlists.uploads))
    }

    async fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistPage, CatalogError> {
        let max_results = PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        let url = self.build_url("playlistItems", &params)?;
        let list: ListResponse<PlaylistItem> = self
            .request_json(url, &format!("playlistItems(playlistId={playlist_id})"))
            .await?;

        Ok(PlaylistPage {
            entries: list
                .items
                .into_iter()
                .map(|item| PlaylistEntry {
                    video_id: item.content_details.video_id,
                    published_at: item.content_details.video_published_at,
                })
                .collect(),
            next_page_token: list.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn videos(&self, ids: &[String]) -> Result<Vec<VideoRecord>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids.join(",");
        let url = self.build_url(
            "videos",
            &[("part", "snippet,statistics,contentDetails"), ("id", joined.as_str())],
        )?;
        let list: ListResponse<VideoItem> = self
            .request_json(url, &format!("videos({} ids)", ids.len()))
            .await?;
        Ok(list.items.into_iter().map(VideoRecord::from).collect())
    }
}
