//! Data model shared by all grabbers.
//!
//! A [`Chapter`] is what a feed listing yields; a [`ResolvedChapter`] is one chapter
//! after its page manifest has been fetched.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Backend-private chapter identifier. Fields are only constructible inside the crate,
/// so a chapter can only come from a grabber's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRef {
    origin: &'static str,
    id: String,
}

impl ChapterRef {
    pub(crate) fn new(origin: &'static str, id: impl Into<String>) -> Self {
        Self {
            origin,
            id: id.into(),
        }
    }

    /// Name of the grabber that produced this reference.
    pub fn origin(&self) -> &'static str {
        self.origin
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }
}

/// One chapter as listed by a grabber's feed. Numbers may repeat across languages
/// and scanlation groups; identity is the [`ChapterRef`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    number: f64,
    title: String,
    language: String,
    #[serde(skip)]
    source: ChapterRef,
}

impl Chapter {
    pub(crate) fn new(
        number: f64,
        title: impl Into<String>,
        language: impl Into<String>,
        source: ChapterRef,
    ) -> Self {
        Self {
            number,
            title: title.into(),
            language: language.into(),
            source,
        }
    }

    pub fn number(&self) -> f64 {
        self.number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn source(&self) -> &ChapterRef {
        &self.source
    }
}

/// One page image: 1-based position and absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub number: u32,
    pub url: String,
}

/// A chapter with its ordered pages. Page order is the manifest order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedChapter {
    pub title: String,
    pub number: f64,
    pub language: String,
    pub pages: Vec<Page>,
}

impl ResolvedChapter {
    pub fn pages_count(&self) -> usize {
        self.pages.len()
    }
}

/// Alternate titles as stored remotely: a list of single-language maps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct AltTitles(pub Vec<HashMap<String, String>>);

impl AltTitles {
    /// First title keyed by `lang`, in stored order.
    pub fn title_for(&self, lang: &str) -> Option<&str> {
        self.0
            .iter()
            .find_map(|entry| entry.get(lang).map(String::as_str))
    }
}

/// Stable ascending sort by chapter number.
pub fn sort_by_number(chapters: &mut [Chapter]) {
    chapters.sort_by(|a, b| a.number.total_cmp(&b.number));
}

/// Keep chapters whose number lies in `from..=to`.
pub fn filter_range(chapters: Vec<Chapter>, from: f64, to: f64) -> Vec<Chapter> {
    chapters
        .into_iter()
        .filter(|c| c.number >= from && c.number <= to)
        .collect()
}

/// Keep chapters translated into `language`. An empty language keeps everything.
pub fn filter_language(chapters: Vec<Chapter>, language: &str) -> Vec<Chapter> {
    if language.is_empty() {
        return chapters;
    }
    chapters
        .into_iter()
        .filter(|c| c.language == language)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn chapter(number: f64, lang: &str, id: &str) -> Chapter {
        Chapter::new(number, format!("ch {}", number), lang, ChapterRef::new("test", id))
    }

    #[test]
    fn alt_titles_first_match_wins() -> Result<(), Box<dyn Error>> {
        let alt: AltTitles =
            serde_json::from_str(r#"[{"fr":"A"},{"es":"B"},{"es":"B2"}]"#)?;
        assert_eq!(alt.title_for("es"), Some("B"));
        assert_eq!(alt.title_for("fr"), Some("A"));
        assert_eq!(alt.title_for("de"), None);

        let blank_first: AltTitles = serde_json::from_str(r#"[{"es":""},{"es":"B"}]"#)?;
        assert_eq!(blank_first.title_for("es"), Some(""));
        Ok(())
    }

    #[test]
    fn sort_is_stable_for_repeated_numbers() {
        let mut chapters = vec![
            chapter(2.0, "en", "a"),
            chapter(1.0, "en", "b"),
            chapter(2.0, "es", "c"),
            chapter(1.5, "en", "d"),
        ];
        sort_by_number(&mut chapters);
        let ids: Vec<&str> = chapters.iter().map(|c| c.source().id()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn filter_range_is_inclusive() {
        let chapters = vec![
            chapter(0.0, "en", "a"),
            chapter(1.0, "en", "b"),
            chapter(2.5, "en", "c"),
            chapter(3.0, "en", "d"),
        ];
        let kept = filter_range(chapters, 1.0, 2.5);
        let numbers: Vec<f64> = kept.iter().map(Chapter::number).collect();
        assert_eq!(numbers, vec![1.0, 2.5]);
    }

    #[test]
    fn filter_language_empty_keeps_all() {
        let chapters = vec![chapter(1.0, "en", "a"), chapter(1.0, "es", "b")];
        assert_eq!(filter_language(chapters.clone(), "").len(), 2);
        let es = filter_language(chapters, "es");
        assert_eq!(es.len(), 1);
        assert_eq!(es[0].language(), "es");
    }

    #[test]
    fn resolved_chapter_serializes_pages() -> Result<(), Box<dyn Error>> {
        let resolved = ResolvedChapter {
            title: "Chapter 0001 Start".to_string(),
            number: 1.0,
            language: "en".to_string(),
            pages: vec![Page {
                number: 1,
                url: "https://x/data/h/a.png".to_string(),
            }],
        };
        assert_eq!(resolved.pages_count(), 1);
        let value: serde_json::Value = serde_json::to_value(&resolved)?;
        assert_eq!(value["pages"][0]["url"], "https://x/data/h/a.png");
        assert_eq!(value["pages"][0]["number"], 1);
        Ok(())
    }

    #[test]
    fn chapter_serialization_hides_source() -> Result<(), Box<dyn Error>> {
        let value = serde_json::to_value(chapter(4.0, "en", "secret"))?;
        assert!(value.get("source").is_none());
        assert_eq!(value["language"], "en");
        Ok(())
    }
}
