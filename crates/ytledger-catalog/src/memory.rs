//! In-process [`CatalogService`] for dry runs and tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use ytledger_core::VideoRecord;

use crate::client::PAGE_SIZE;
use crate::error::CatalogError;
use crate::service::{CatalogService, PlaylistEntry, PlaylistPage};

/// Catalog operations that can be made to fail with [`MemoryCatalog::failing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOp {
    Handle,
    Search,
    Uploads,
    Playlist,
    Videos,
}

/// A fixed catalog held in memory.
///
/// Playlist pages are addressed by synthetic `page-N` tokens.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    handles: HashMap<String, String>,
    searches: HashMap<String, String>,
    uploads: HashMap<String, String>,
    playlists: HashMap<String, Vec<Vec<PlaylistEntry>>>,
    videos: HashMap<String, VideoRecord>,
    failing: HashSet<CatalogOp>,
    page_requests: AtomicUsize,
    video_requests: AtomicUsize,
}

impl MemoryCatalog {
    #[must_use]
    pub fn with_handle(mut self, handle: &str, channel_id: &str) -> Self {
        self.handles.insert(handle.to_owned(), channel_id.to_owned());
        self
    }

    #[must_use]
    pub fn with_search(mut self, query: &str, channel_id: &str) -> Self {
        self.searches.insert(query.to_owned(), channel_id.to_owned());
        self
    }

    #[must_use]
    pub fn with_channel(mut self, channel_id: &str, uploads_playlist_id: &str) -> Self {
        self.uploads
            .insert(channel_id.to_owned(), uploads_playlist_id.to_owned());
        self
    }

    #[must_use]
    pub fn with_playlist_pages(mut self, playlist_id: &str, pages: Vec<Vec<PlaylistEntry>>) -> Self {
        self.playlists.insert(playlist_id.to_owned(), pages);
        self
    }

    #[must_use]
    pub fn with_video(mut self, video: VideoRecord) -> Self {
        self.videos.insert(video.id.clone(), video);
        self
    }

    /// Registers `videos` as the channel's uploads, in the given order, split
    /// into pages of the real page size.
    #[must_use]
    pub fn with_channel_uploads(self, channel_id: &str, videos: Vec<VideoRecord>) -> Self {
        let playlist_id = format!("UU{channel_id}");
        let page_size = PAGE_SIZE as usize;
        let pages = videos
            .chunks(page_size)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|v| PlaylistEntry {
                        video_id: v.id.clone(),
                        published_at: Some(v.published_at),
                    })
                    .collect()
            })
            .collect();
        let mut catalog = self
            .with_channel(channel_id, &playlist_id)
            .with_playlist_pages(&playlist_id, pages);
        for video in videos {
            catalog = catalog.with_video(video);
        }
        catalog
    }

    #[must_use]
    pub fn failing(mut self, op: CatalogOp) -> Self {
        self.failing.insert(op);
        self
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    pub fn video_requests(&self) -> usize {
        self.video_requests.load(Ordering::SeqCst)
    }

    fn check(&self, op: CatalogOp) -> Result<(), CatalogError> {
        if self.failing.contains(&op) {
            return Err(CatalogError::Simulated(format!("{op:?}")));
        }
        Ok(())
    }
}

impl CatalogService for MemoryCatalog {
    async fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, CatalogError> {
        self.check(CatalogOp::Handle)?;
        Ok(self.handles.get(handle).cloned())
    }

    async fn search_channel_id(&self, query: &str) -> Result<Option<String>, CatalogError> {
        self.check(CatalogOp::Search)?;
        Ok(self.searches.get(query).cloned())
    }

    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<Option<String>, CatalogError> {
        self.check(CatalogOp::Uploads)?;
        Ok(self.uploads.get(channel_id).cloned())
    }

    async fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistPage, CatalogError> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        self.check(CatalogOp::Playlist)?;

        let Some(pages) = self.playlists.get(playlist_id) else {
            return Ok(PlaylistPage::default());
        };
        let index = match page_token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| CatalogError::Simulated(format!("unknown page token {token}")))?,
        };
        let entries = pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));
        Ok(PlaylistPage {
            entries,
            next_page_token,
        })
    }

    async fn videos(&self, ids: &[String]) -> Result<Vec<VideoRecord>, CatalogError> {
        self.video_requests.fetch_add(1, Ordering::SeqCst);
        self.check(CatalogOp::Videos)?;
        Ok(ids
            .iter()
            .filter_map(|id| self.videos.get(id).cloned())
            .collect())
    }
}
