//! Navigation routes for search results.
//!
//! Verses are addressed as `{book}-{section}-{chapter}-{verse}` under
//! `/shlokas/`. Books link to their landing page.

use std::fmt;

use serde::Serialize;

use crate::config::RoutesConfig;
use crate::search::{BookEntry, ChapterEntry, SearchEntry, SectionEntry};

/// Address of a single verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShlokaCode {
    pub book_code: String,
    pub section: u32,
    pub chapter: u32,
    pub verse: u32,
}

impl ShlokaCode {
    pub fn new(book_code: impl Into<String>, section: u32, chapter: u32, verse: u32) -> Self {
        Self {
            book_code: book_code.into(),
            section,
            chapter,
            verse,
        }
    }

    /// Parse `{book}-{section}-{chapter}[-{verse}]`. The verse defaults to 1.
    pub fn parse(code: &str) -> Option<Self> {
        let mut parts = code.trim().split('-');
        let book_code = parts.next().filter(|b| !b.is_empty())?;
        let section = parts.next()?.parse().ok()?;
        let chapter = parts.next()?.parse().ok()?;
        let verse = match parts.next() {
            Some(v) => v.parse().ok()?,
            None => 1,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(book_code, section, chapter, verse))
    }

    pub fn route(&self) -> String {
        format!("/shlokas/{}", self)
    }
}

impl fmt::Display for ShlokaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.book_code, self.section, self.chapter, self.verse
        )
    }
}

pub fn book_route(book: &BookEntry, routes: &RoutesConfig) -> String {
    routes.book_page(&book.code).to_string()
}

/// First verse of the section's first chapter, or the book page when the
/// section has no chapters.
pub fn section_route(section: &SectionEntry, routes: &RoutesConfig) -> String {
    match section.first_chapter_number {
        Some(chapter) => {
            ShlokaCode::new(&section.book.code, section.section.number, chapter, 1).route()
        }
        None => routes.book_page(&section.book.code).to_string(),
    }
}

pub fn chapter_route(chapter: &ChapterEntry) -> String {
    ShlokaCode::new(&chapter.book.code, chapter.section.number, chapter.number, 1).route()
}

pub fn route_for(entry: &SearchEntry, routes: &RoutesConfig) -> String {
    match entry {
        SearchEntry::Book(b) => book_route(b, routes),
        SearchEntry::Section(s) => section_route(s, routes),
        SearchEntry::Chapter(c) => chapter_route(c),
    }
}
