//! Video catalog access: the [`CatalogService`] seam, a `YouTube` Data API
//! client implementing it, channel resolution, and the upload fetcher.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod memory;
pub mod resolver;
pub mod service;
pub mod types;

pub use client::YoutubeClient;
pub use error::CatalogError;
pub use fetcher::{fetch_uploads_since, year_start_cutoff, MAX_PAGES, VIDEO_BATCH_SIZE};
pub use memory::{CatalogOp, MemoryCatalog};
pub use resolver::{resolve_channel_id, HANDLE_SIGIL};
pub use service::{CatalogService, PlaylistEntry, PlaylistPage};
