use std::future::Future;

use chrono::{DateTime, Utc};
use ytledger_core::VideoRecord;

use crate::error::CatalogError;

/// One entry of an uploads playlist page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub video_id: String,
    /// `None` for private or deleted uploads, which carry no publish time.
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistPage {
    pub entries: Vec<PlaylistEntry>,
    pub next_page_token: Option<String>,
}

/// The catalog primitives the sync job consumes.
///
/// Implemented over HTTP by [`crate::YoutubeClient`] and in memory by
/// [`crate::MemoryCatalog`].
pub trait CatalogService {
    /// Exact lookup of an `@handle`. `Ok(None)` when no channel owns it.
    fn channel_id_for_handle(
        &self,
        handle: &str,
    ) -> impl Future<Output = Result<Option<String>, CatalogError>> + Send;

    /// Generic channel-name search; returns the first hit.
    fn search_channel_id(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<String>, CatalogError>> + Send;

    /// The channel's canonical uploads playlist.
    fn uploads_playlist_id(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = Result<Option<String>, CatalogError>> + Send;

    /// One page (at most 50 entries) of a playlist, newest first.
    fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> impl Future<Output = Result<PlaylistPage, CatalogError>> + Send;

    /// Full metadata for at most 50 video IDs. Unknown IDs are omitted.
    fn videos(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<VideoRecord>, CatalogError>> + Send;
}
