//! MangaDex grabber. Title from the manga endpoint, chapters from the paginated feed,
//! pages from the at-home manifest.

use crate::grabber::error::GrabberError;
use crate::grabber::{Grabber, Site, Transport};
use crate::model::{AltTitles, Chapter, ChapterRef, Page, ResolvedChapter};
use regex::Regex;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

pub(crate) const NAME: &str = "mangadex";
pub(crate) const URL_PATTERN: &str = r"mangadex\.org";

const API_BASE: &str = "https://api.mangadex.org";
const UUID_PATTERN: &str =
    r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

/// Chapters requested per feed page.
pub const FEED_PAGE_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
struct MangaResponse {
    data: MangaData,
}

#[derive(Debug, Deserialize)]
struct MangaData {
    attributes: MangaAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MangaAttributes {
    #[serde(default)]
    title: HashMap<String, String>,
    #[serde(default)]
    alt_titles: AltTitles,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    data: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    id: String,
    attributes: FeedAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedAttributes {
    #[allow(dead_code)]
    volume: Option<String>,
    chapter: Option<String>,
    title: Option<String>,
    #[serde(default)]
    translated_language: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageManifest {
    base_url: String,
    chapter: ManifestChapter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestChapter {
    hash: String,
    data: Vec<String>,
    #[allow(dead_code)]
    #[serde(default)]
    data_saver: Vec<String>,
}

/// Extract the first UUID-shaped token from a URL.
fn manga_id_from_url(url: &str) -> Option<String> {
    let re = Regex::new(UUID_PATTERN).ok()?;
    re.find(url).map(|m| m.as_str().to_string())
}

/// Scheme and host of the bound URL, sent as referer on the title request.
fn base_url(url: &str) -> Result<String, GrabberError> {
    let parsed = Url::parse(url).map_err(|e| GrabberError::InvalidUrl {
        input: url.to_string(),
        reason: e.to_string(),
    })?;
    let host = parsed.host_str().ok_or_else(|| GrabberError::InvalidUrl {
        input: url.to_string(),
        reason: "URL has no host".to_string(),
    })?;
    Ok(format!("{}://{}", parsed.scheme(), host))
}

/// Parse a chapter number; anything unparsable (including a missing field) is 0.
fn parse_chapter_number(raw: Option<&str>) -> f64 {
    match raw.map(str::trim) {
        Some(s) => s.parse::<f64>().unwrap_or_else(|_| {
            debug!(raw = s, "unparsable chapter number, using 0");
            0.0
        }),
        None => 0.0,
    }
}

/// `Chapter 0012 Title` style heading for a resolved chapter.
fn chapter_heading(number: f64, title: &str) -> String {
    format!("Chapter {:04} {}", number as i64, title)
}

/// `{base}/data/{hash}/{file}` for each file, numbered from 1 in manifest order.
fn build_pages(base_url: &str, hash: &str, files: &[String]) -> Vec<Page> {
    let base = base_url.trim_end_matches('/');
    files
        .iter()
        .enumerate()
        .map(|(i, file)| Page {
            number: i as u32 + 1,
            url: format!("{}/data/{}/{}", base, hash, file.trim_start_matches('/')),
        })
        .collect()
}

/// GET and decode JSON. The body stream is dropped before returning on every path.
fn fetch_json<T: DeserializeOwned>(
    client: &mut (dyn Transport + '_),
    url: &str,
    referer: Option<&str>,
) -> Result<T, GrabberError> {
    let body = client.get(url, referer)?;
    serde_json::from_reader(body).map_err(|e| GrabberError::Decode {
        url: url.to_string(),
        source: e,
    })
}

/// MangaDex grabber bound to one manga URL.
pub struct Mangadex<'a> {
    client: &'a mut dyn Transport,
    referer: String,
    manga_id: String,
    language: Option<String>,
    page_size: usize,
    title: Option<String>,
}

impl<'a> Mangadex<'a> {
    /// Bind to `url`. The URL must be absolute; an empty language is treated as no preference.
    pub fn new(
        client: &'a mut dyn Transport,
        url: &str,
        language: Option<&str>,
    ) -> Result<Self, GrabberError> {
        let manga_id = manga_id_from_url(url).ok_or_else(|| GrabberError::MissingMangaId {
            url: url.to_string(),
        })?;
        let referer = base_url(url)?;
        Ok(Self {
            client,
            referer,
            manga_id,
            language: language.filter(|l| !l.is_empty()).map(String::from),
            page_size: FEED_PAGE_SIZE,
            title: None,
        })
    }

    /// Override the feed page size (default [`FEED_PAGE_SIZE`]).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn feed_url(&self, offset: usize) -> Result<Url, GrabberError> {
        let base = format!("{}/manga/{}/feed", API_BASE, self.manga_id);
        let mut url = Url::parse(&base).map_err(|e| GrabberError::InvalidUrl {
            input: base.clone(),
            reason: e.to_string(),
        })?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("limit", &self.page_size.to_string())
                .append_pair("offset", &offset.to_string())
                .append_pair("order[volume]", "asc")
                .append_pair("order[chapter]", "asc");
            if let Some(lang) = &self.language {
                query.append_pair("translatedLanguage[]", lang);
            }
        }
        Ok(url)
    }
}

impl Grabber for Mangadex<'_> {
    fn site(&self) -> Site {
        Site::Mangadex
    }

    fn title(&mut self) -> Result<String, GrabberError> {
        if let Some(title) = &self.title {
            return Ok(title.clone());
        }

        let url = format!("{}/manga/{}", API_BASE, self.manga_id);
        let body: MangaResponse = fetch_json(&mut *self.client, &url, Some(&self.referer))?;
        let attributes = body.data.attributes;

        let preferred = self
            .language
            .as_deref()
            .and_then(|lang| attributes.alt_titles.title_for(lang))
            .filter(|t| !t.is_empty())
            .map(String::from);
        let title = match preferred {
            Some(t) => t,
            None => attributes.title.get("en").cloned().unwrap_or_default(),
        };
        self.title = Some(title.clone());
        Ok(title)
    }

    fn fetch_chapters(&mut self) -> Result<Vec<Chapter>, GrabberError> {
        let mut chapters = Vec::new();
        let mut offset = 0;
        loop {
            let url = self.feed_url(offset)?;
            debug!(offset, url = url.as_str(), "fetching feed page");
            let page: FeedResponse = fetch_json(&mut *self.client, url.as_str(), None)?;
            if page.data.is_empty() {
                break;
            }
            chapters.extend(page.data.into_iter().map(|entry| {
                let attrs = entry.attributes;
                Chapter::new(
                    parse_chapter_number(attrs.chapter.as_deref()),
                    attrs.title.unwrap_or_default(),
                    attrs.translated_language,
                    ChapterRef::new(NAME, entry.id),
                )
            }));
            offset += self.page_size;
        }
        info!(manga = %self.manga_id, count = chapters.len(), "listed chapters");
        Ok(chapters)
    }

    fn fetch_chapter(&mut self, chapter: &Chapter) -> Result<ResolvedChapter, GrabberError> {
        let source = chapter.source();
        if source.origin() != NAME {
            return Err(GrabberError::ForeignChapter {
                expected: NAME,
                found: source.origin(),
            });
        }

        let url = format!("{}/at-home/server/{}", API_BASE, source.id());
        let manifest: PageManifest = fetch_json(&mut *self.client, &url, None)?;
        let pages = build_pages(
            &manifest.base_url,
            &manifest.chapter.hash,
            &manifest.chapter.data,
        );
        info!(chapter = source.id(), pages = pages.len(), "resolved chapter");

        Ok(ResolvedChapter {
            title: chapter_heading(chapter.number(), chapter.title()),
            number: chapter.number(),
            language: chapter.language().to_string(),
            pages,
        })
    }
}
