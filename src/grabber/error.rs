//! Shared error type for grabbers: site detection, transport, and decoding failures.

use thiserror::Error;

/// Shared grabber error. Transport and decode failures abort the enclosing operation.
#[derive(Debug, Error)]
pub enum GrabberError {
    // Site / URL
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Unsupported site: no grabber recognizes {url}")]
    UnsupportedSite { url: String },

    #[error("Could not find a manga id in {url}")]
    MissingMangaId { url: String },

    // HTTP and network
    #[error("Network error: could not reach {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    // Decoding
    #[error("Unexpected response shape from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    /// A chapter listed by one backend was handed to another backend's resolver.
    #[error("Chapter belongs to the {found} grabber, not {expected}")]
    ForeignChapter {
        expected: &'static str,
        found: &'static str,
    },
}
