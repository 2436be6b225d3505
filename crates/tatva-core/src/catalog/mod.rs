//! Read-only access to the book / section / chapter catalog.
//!
//! Two sources are provided: [`RestCatalog`] talks to the hosted PostgREST
//! endpoint, [`SqliteCatalog`] reads a local mirror with the same tables.

#[cfg(feature = "rest")]
mod rest;
mod sqlite;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::CoreResult;

#[cfg(feature = "rest")]
pub use rest::RestCatalog;
pub use sqlite::SqliteCatalog;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRow {
    pub id: String,
    pub code: String,
    pub name_english: String,
    #[serde(default)]
    pub name_hindi: Option<String>,
    #[serde(default)]
    pub display_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRow {
    pub id: String,
    pub book_id: String,
    pub section_number: u32,
    pub name_english: String,
    #[serde(default)]
    pub name_hindi: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRow {
    pub id: String,
    pub section_id: String,
    pub chapter_number: u32,
    #[serde(default)]
    pub name_english: Option<String>,
    #[serde(default)]
    pub name_hindi: Option<String>,
}

/// The three bulk listings an index build consumes.
#[derive(Debug, Clone, Default)]
pub struct CatalogRows {
    pub books: Vec<BookRow>,
    pub sections: Vec<SectionRow>,
    pub chapters: Vec<ChapterRow>,
}

/// Sections of a single book with their chapters keyed by section number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookNavigation {
    pub book: BookRow,
    pub sections: Vec<SectionRow>,
    pub chapters_by_section: BTreeMap<u32, Vec<ChapterRow>>,
}

impl BookNavigation {
    /// Groups `chapters` under the section they belong to. Chapters of
    /// sections outside `sections` are dropped; every section gets an entry,
    /// even an empty one.
    pub fn assemble(book: BookRow, mut sections: Vec<SectionRow>, mut chapters: Vec<ChapterRow>) -> Self {
        sections.sort_by(|a, b| a.section_number.cmp(&b.section_number).then_with(|| a.id.cmp(&b.id)));
        chapters.sort_by(|a, b| a.chapter_number.cmp(&b.chapter_number).then_with(|| a.id.cmp(&b.id)));

        let mut chapters_by_section: BTreeMap<u32, Vec<ChapterRow>> = BTreeMap::new();
        for section in &sections {
            let grouped = chapters
                .iter()
                .filter(|c| c.section_id == section.id)
                .cloned()
                .collect::<Vec<_>>();
            chapters_by_section
                .entry(section.section_number)
                .or_default()
                .extend(grouped);
        }

        Self {
            book,
            sections,
            chapters_by_section,
        }
    }

    /// First chapter number of the given section, if it has any chapters.
    pub fn first_chapter(&self, section_number: u32) -> Option<u32> {
        self.chapters_by_section
            .get(&section_number)
            .and_then(|chapters| chapters.first())
            .map(|c| c.chapter_number)
    }
}

/// A read-only catalog store.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All books ordered by display rank.
    async fn list_books(&self) -> CoreResult<Vec<BookRow>>;

    /// All sections ordered by section number.
    async fn list_sections(&self) -> CoreResult<Vec<SectionRow>>;

    /// All chapters ordered by chapter number.
    async fn list_chapters(&self) -> CoreResult<Vec<ChapterRow>>;

    /// Sections and chapters of the book with `code`, or `None` when no such
    /// book exists.
    async fn book_navigation(&self, code: &str) -> CoreResult<Option<BookNavigation>>;
}

/// Treats an empty localized name the same as a missing one.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
