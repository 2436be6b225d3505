//! Index builder

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::error::{SearchError, SearchResult};
use super::types::{BookEntry, BookRef, ChapterEntry, SearchEntry, SectionEntry, SectionRef};
use crate::catalog::{non_empty, CatalogRows, CatalogSource, ChapterRow, SectionRow};

/// Flattens the three catalog tables into an ordered list of [`SearchEntry`].
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    chapter_placeholder: String,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new("Chapter {n}")
    }
}

impl IndexBuilder {
    /// `chapter_placeholder` names chapters without a localized name; `{n}`
    /// is replaced by the chapter number.
    pub fn new(chapter_placeholder: impl Into<String>) -> Self {
        Self {
            chapter_placeholder: chapter_placeholder.into(),
        }
    }

    /// Fetch books, sections and chapters concurrently.
    ///
    /// Fails as a whole if any listing fails, the timeout elapses, or the
    /// catalog has no books.
    pub async fn fetch<S>(source: &S, timeout: Duration) -> SearchResult<CatalogRows>
    where
        S: CatalogSource + ?Sized,
    {
        let fetch_all = async {
            tokio::try_join!(
                source.list_books(),
                source.list_sections(),
                source.list_chapters()
            )
        };

        let (books, sections, chapters) = tokio::time::timeout(timeout, fetch_all)
            .await
            .map_err(|_| SearchError::Timeout(timeout))??;

        if books.is_empty() {
            return Err(SearchError::EmptyCatalog);
        }

        Ok(CatalogRows {
            books,
            sections,
            chapters,
        })
    }

    /// Fetch and flatten in one step.
    pub async fn build_from<S>(&self, source: &S, timeout: Duration) -> SearchResult<Vec<SearchEntry>>
    where
        S: CatalogSource + ?Sized,
    {
        let rows = Self::fetch(source, timeout).await?;
        Ok(self.build(rows))
    }

    /// Emit one entry per book, then per section of that book, then per
    /// chapter of that section, each level in catalog order.
    pub fn build(&self, rows: CatalogRows) -> Vec<SearchEntry> {
        let CatalogRows {
            mut books,
            mut sections,
            mut chapters,
        } = rows;

        // Storage order is not trusted; ids break rank ties.
        books.sort_by(|a, b| (a.display_order, &a.id).cmp(&(b.display_order, &b.id)));
        sections.sort_by(|a, b| (a.section_number, &a.id).cmp(&(b.section_number, &b.id)));
        chapters.sort_by(|a, b| (a.chapter_number, &a.id).cmp(&(b.chapter_number, &b.id)));

        let mut sections_by_book: HashMap<&str, Vec<&SectionRow>> = HashMap::new();
        for section in &sections {
            sections_by_book
                .entry(section.book_id.as_str())
                .or_default()
                .push(section);
        }

        let mut chapters_by_section: HashMap<&str, Vec<&ChapterRow>> = HashMap::new();
        for chapter in &chapters {
            chapters_by_section
                .entry(chapter.section_id.as_str())
                .or_default()
                .push(chapter);
        }

        log_orphans(&books, &sections, &chapters);

        let mut entries = Vec::with_capacity(books.len() + sections.len() + chapters.len());

        for book in &books {
            let book_ref = BookRef {
                code: book.code.clone(),
                name: book.name_english.clone(),
                name_secondary: owned(book.name_hindi.as_deref()),
            };

            entries.push(SearchEntry::Book(BookEntry {
                id: book.id.clone(),
                code: book.code.clone(),
                name: book.name_english.clone(),
                name_secondary: book_ref.name_secondary.clone(),
            }));

            let book_sections = sections_by_book
                .get(book.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();

            for section in book_sections {
                let section_chapters = chapters_by_section
                    .get(section.id.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or_default();

                let section_ref = SectionRef {
                    number: section.section_number,
                    name: section.name_english.clone(),
                    name_secondary: owned(section.name_hindi.as_deref()),
                };

                entries.push(SearchEntry::Section(SectionEntry {
                    id: section.id.clone(),
                    name: non_empty(section.name_hindi.as_deref())
                        .unwrap_or(&section.name_english)
                        .to_string(),
                    section: section_ref.clone(),
                    first_chapter_number: section_chapters.first().map(|c| c.chapter_number),
                    book: book_ref.clone(),
                }));

                for chapter in section_chapters {
                    entries.push(SearchEntry::Chapter(ChapterEntry {
                        id: chapter.id.clone(),
                        name: self.chapter_name(chapter),
                        name_secondary: owned(chapter.name_hindi.as_deref()),
                        number: chapter.chapter_number,
                        section: section_ref.clone(),
                        book: book_ref.clone(),
                    }));
                }
            }
        }

        entries
    }

    fn chapter_name(&self, chapter: &ChapterRow) -> String {
        non_empty(chapter.name_hindi.as_deref())
            .or_else(|| non_empty(chapter.name_english.as_deref()))
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.chapter_placeholder
                    .replace("{n}", &chapter.chapter_number.to_string())
            })
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    non_empty(value).map(str::to_string)
}

fn log_orphans(books: &[crate::BookRow], sections: &[SectionRow], chapters: &[ChapterRow]) {
    let book_ids: HashSet<&str> = books.iter().map(|b| b.id.as_str()).collect();
    let section_ids: HashSet<&str> = sections
        .iter()
        .filter(|s| book_ids.contains(s.book_id.as_str()))
        .map(|s| s.id.as_str())
        .collect();

    let orphan_sections = sections.len() - section_ids.len();
    let orphan_chapters = chapters
        .iter()
        .filter(|c| !section_ids.contains(c.section_id.as_str()))
        .count();

    if orphan_sections > 0 || orphan_chapters > 0 {
        log::debug!(
            "Skipping {} sections and {} chapters without a parent",
            orphan_sections,
            orphan_chapters
        );
    }
}
