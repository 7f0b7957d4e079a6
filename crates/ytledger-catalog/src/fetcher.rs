//! Upload catalog pagination bounded by a publish-date cutoff.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Utc};
use ytledger_core::VideoRecord;

use crate::error::CatalogError;
use crate::service::CatalogService;

/// Maximum number of playlist pages walked in one run. Guards against a
/// service that keeps handing back page tokens.
pub const MAX_PAGES: usize = 200;

/// IDs per metadata lookup; the API rejects more than 50.
pub const VIDEO_BATCH_SIZE: usize = 50;

/// Start of the calendar year containing `now`, in the ledger's time zone.
#[must_use]
pub fn year_start_cutoff(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let year = now.with_timezone(&offset).year();
    offset
        .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .map_or(now, |start| start.with_timezone(&Utc))
}

/// Fetch metadata for every upload published at or after `cutoff`.
///
/// The uploads playlist is assumed newest-first: paging stops at the first
/// entry older than `cutoff`, so out-of-order entries behind it are never
/// seen. Entries without a publish time (private or deleted uploads) are
/// skipped without stopping. A channel without an uploads playlist yields an
/// empty catalog.
///
/// # Errors
///
/// Propagates the first [`CatalogError`] from the service, and returns
/// [`CatalogError::PaginationLimit`] after [`MAX_PAGES`] pages.
pub async fn fetch_uploads_since<C: CatalogService>(
    catalog: &C,
    channel_id: &str,
    cutoff: DateTime<Utc>,
) -> Result<Vec<VideoRecord>, CatalogError> {
    let Some(playlist_id) = catalog.uploads_playlist_id(channel_id).await? else {
        tracing::warn!(channel_id, "channel has no uploads playlist");
        return Ok(Vec::new());
    };

    let ids = collect_recent_ids(catalog, &playlist_id, cutoff).await?;

    let mut videos = Vec::with_capacity(ids.len());
    for batch in ids.chunks(VIDEO_BATCH_SIZE) {
        videos.extend(catalog.videos(batch).await?);
    }

    tracing::info!(
        channel_id,
        ids = ids.len(),
        videos = videos.len(),
        cutoff = %cutoff,
        "fetched channel uploads"
    );
    Ok(videos)
}

async fn collect_recent_ids<C: CatalogService>(
    catalog: &C,
    playlist_id: &str,
    cutoff: DateTime<Utc>,
) -> Result<Vec<String>, CatalogError> {
    let mut ids = Vec::new();
    let mut page_token: Option<String> = None;
    let mut page_count = 0usize;

    loop {
        page_count += 1;
        if page_count > MAX_PAGES {
            return Err(CatalogError::PaginationLimit {
                playlist_id: playlist_id.to_owned(),
                max_pages: MAX_PAGES,
            });
        }

        let page = catalog
            .playlist_page(playlist_id, page_token.as_deref())
            .await?;

        let mut reached_cutoff = false;
        for entry in page.entries {
            match entry.published_at {
                None => continue,
                Some(published) if published < cutoff => {
                    reached_cutoff = true;
                    break;
                }
                Some(_) => ids.push(entry.video_id),
            }
        }

        if reached_cutoff {
            break;
        }
        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(ids)
}
