//! mangagrab: resolve a manga URL to its site, chapter list, and page image URLs.

pub mod cli;
pub mod config;
pub mod grabber;
pub mod model;

// Re-exports for CLI and consumers.
pub use grabber::{
    resolve_site, Grabber, GrabberError, HttpClient, HttpClientBuilder, Site, SiteGrabber,
    Transport,
};
pub use model::{AltTitles, Chapter, ChapterRef, Page, ResolvedChapter};
