use thiserror::Error;

/// Errors returned by the catalog service and the fetch pipeline.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status and an error envelope.
    #[error("catalog API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("pagination limit reached for playlist {playlist_id}: exceeded {max_pages} pages")]
    PaginationLimit {
        playlist_id: String,
        max_pages: usize,
    },

    /// Raised by [`crate::MemoryCatalog`] when a failure has been injected.
    #[error("simulated catalog failure: {0}")]
    Simulated(String),
}
