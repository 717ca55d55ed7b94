//! Site grabbers. Site detection, the grabber trait, shared transport, and backends.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod testing;

pub mod mangadex;

pub use client::{HttpClient, HttpClientBuilder, Transport};
pub use error::GrabberError;

use crate::model::{Chapter, ResolvedChapter};
use regex::Regex;

/// Supported manga site. Variants are tried in [`Site::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Mangadex,
}

impl Site {
    /// Registration order used by [`resolve_site`].
    pub const ALL: [Site; 1] = [Site::Mangadex];

    /// Stable name, also the origin tag carried by chapters this site lists.
    pub fn name(self) -> &'static str {
        match self {
            Site::Mangadex => mangadex::NAME,
        }
    }

    /// Pure predicate: does this URL belong to the site.
    pub fn test(self, url: &str) -> bool {
        let pattern = match self {
            Site::Mangadex => mangadex::URL_PATTERN,
        };
        Regex::new(pattern)
            .map(|re| re.is_match(url))
            .unwrap_or(false)
    }
}

/// Bind a URL to the first registered site whose test matches.
pub fn resolve_site(url: &str) -> Result<Site, GrabberError> {
    Site::ALL
        .into_iter()
        .find(|site| site.test(url))
        .ok_or_else(|| GrabberError::UnsupportedSite {
            url: url.to_string(),
        })
}

/// Contract implemented by every backend. One instance is bound to one manga URL and
/// one preferred language.
pub trait Grabber {
    fn site(&self) -> Site;

    /// Manga title in the preferred language, falling back to the canonical title.
    /// Fetched once and cached.
    fn title(&mut self) -> Result<String, GrabberError>;

    /// Full chapter list in backend order. Fails as a whole; never returns a partial list.
    fn fetch_chapters(&mut self) -> Result<Vec<Chapter>, GrabberError>;

    /// Resolve one listed chapter into its pages. The chapter must come from this
    /// backend's own [`Grabber::fetch_chapters`].
    fn fetch_chapter(&mut self, chapter: &Chapter) -> Result<ResolvedChapter, GrabberError>;
}

/// Grabber bound to whichever site matched the URL.
pub enum SiteGrabber<'a> {
    Mangadex(mangadex::Mangadex<'a>),
}

impl<'a> SiteGrabber<'a> {
    /// Resolve the site for `url` and build its grabber over `client`.
    pub fn for_url(
        url: &str,
        language: Option<&str>,
        client: &'a mut dyn Transport,
    ) -> Result<Self, GrabberError> {
        match resolve_site(url)? {
            Site::Mangadex => Ok(SiteGrabber::Mangadex(mangadex::Mangadex::new(
                client, url, language,
            )?)),
        }
    }

    fn inner(&mut self) -> &mut dyn Grabber {
        match self {
            SiteGrabber::Mangadex(g) => g,
        }
    }
}

impl Grabber for SiteGrabber<'_> {
    fn site(&self) -> Site {
        match self {
            SiteGrabber::Mangadex(g) => g.site(),
        }
    }

    fn title(&mut self) -> Result<String, GrabberError> {
        self.inner().title()
    }

    fn fetch_chapters(&mut self) -> Result<Vec<Chapter>, GrabberError> {
        self.inner().fetch_chapters()
    }

    fn fetch_chapter(&mut self, chapter: &Chapter) -> Result<ResolvedChapter, GrabberError> {
        self.inner().fetch_chapter(chapter)
    }
}
