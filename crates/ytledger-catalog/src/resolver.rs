//! Maps a user-supplied channel identifier to a canonical channel ID.

use crate::service::CatalogService;

/// Prefix marking an identifier as a handle rather than a channel ID.
pub const HANDLE_SIGIL: char = '@';

/// Resolve `raw` to a canonical channel ID.
///
/// Identifiers without the handle sigil are returned unchanged and are not
/// validated. Handles are looked up exactly first, then through a generic
/// channel search. Returns `None` when neither finds a channel or when the
/// catalog service fails at any point; the caller treats that as a silent
/// skip, not an error.
pub async fn resolve_channel_id<C: CatalogService>(catalog: &C, raw: &str) -> Option<String> {
    if !raw.starts_with(HANDLE_SIGIL) {
        return Some(raw.to_owned());
    }

    match lookup_handle(catalog, raw).await {
        Ok(Some(id)) => {
            tracing::debug!(handle = raw, channel_id = %id, "resolved channel handle");
            Some(id)
        }
        Ok(None) => {
            tracing::warn!(handle = raw, "no channel found for handle");
            None
        }
        Err(e) => {
            tracing::warn!(handle = raw, error = %e, "channel resolution failed");
            None
        }
    }
}

async fn lookup_handle<C: CatalogService>(
    catalog: &C,
    handle: &str,
) -> Result<Option<String>, crate::CatalogError> {
    if let Some(id) = catalog.channel_id_for_handle(handle).await? {
        return Ok(Some(id));
    }
    catalog.search_channel_id(handle).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{CatalogOp, MemoryCatalog};

    #[tokio::test]
    async fn plain_id_is_returned_unchanged() {
        let catalog = MemoryCatalog::default();
        let id = resolve_channel_id(&catalog, "UCabc").await;
        assert_eq!(id.as_deref(), Some("UCabc"));
    }

    #[tokio::test]
    async fn handle_resolves_by_exact_lookup() {
        let catalog = MemoryCatalog::default()
            .with_handle("@creator", "UChandle")
            .with_search("@creator", "UCsearch");
        let id = resolve_channel_id(&catalog, "@creator").await;
        assert_eq!(id.as_deref(), Some("UChandle"));
    }

    #[tokio::test]
    async fn handle_falls_back_to_search() {
        let catalog = MemoryCatalog::default().with_search("@creator", "UCsearch");
        let id = resolve_channel_id(&catalog, "@creator").await;
        assert_eq!(id.as_deref(), Some("UCsearch"));
    }

    #[tokio::test]
    async fn unknown_handle_is_not_found() {
        let catalog = MemoryCatalog::default();
        assert!(resolve_channel_id(&catalog, "@nobody").await.is_none());
    }

    #[tokio::test]
    async fn service_error_is_not_found() {
        let catalog = MemoryCatalog::default()
            .with_search("@creator", "UCsearch")
            .failing(CatalogOp::Handle);
        assert!(resolve_channel_id(&catalog, "@creator").await.is_none());
    }
}
