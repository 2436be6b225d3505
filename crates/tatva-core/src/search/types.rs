//! Search entry and result types

use serde::Serialize;

/// Hierarchy level of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Book,
    Section,
    Chapter,
}

/// Owning book, as carried by section and chapter entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRef {
    /// Routing prefix, e.g. "bg"
    pub code: String,
    /// Primary (English) name
    pub name: String,
    /// Secondary (Hindi) name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_secondary: Option<String>,
}

/// Owning section, as carried by chapter entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRef {
    /// 1-based position within the book
    pub number: u32,
    /// Primary (English) name
    pub name: String,
    /// Secondary (Hindi) name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_secondary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookEntry {
    pub id: String,
    pub code: String,
    /// Display name; the primary name for books
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_secondary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionEntry {
    pub id: String,
    /// Display name: secondary name when present, else primary
    pub name: String,
    pub section: SectionRef,
    /// Lowest chapter number in this section, resolved at build time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_chapter_number: Option<u32>,
    pub book: BookRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterEntry {
    pub id: String,
    /// Display name: secondary, else primary, else a numbered placeholder
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_secondary: Option<String>,
    /// 1-based position within the section
    pub number: u32,
    pub section: SectionRef,
    pub book: BookRef,
}

/// One flattened catalog node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchEntry {
    Book(BookEntry),
    Section(SectionEntry),
    Chapter(ChapterEntry),
}

impl SearchEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            SearchEntry::Book(_) => EntryKind::Book,
            SearchEntry::Section(_) => EntryKind::Section,
            SearchEntry::Chapter(_) => EntryKind::Chapter,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SearchEntry::Book(b) => &b.id,
            SearchEntry::Section(s) => &s.id,
            SearchEntry::Chapter(c) => &c.id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            SearchEntry::Book(b) => &b.name,
            SearchEntry::Section(s) => &s.name,
            SearchEntry::Chapter(c) => &c.name,
        }
    }

    pub fn book_code(&self) -> &str {
        match self {
            SearchEntry::Book(b) => &b.code,
            SearchEntry::Section(s) => &s.book.code,
            SearchEntry::Chapter(c) => &c.book.code,
        }
    }
}

/// Matched entries grouped by kind, each group sorted.
///
/// Groups are never truncated; use [`ResultGroups::chapter_preview`] to cap
/// what is displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultGroups {
    pub books: Vec<BookEntry>,
    pub sections: Vec<SectionEntry>,
    pub chapters: Vec<ChapterEntry>,
}

impl ResultGroups {
    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.sections.is_empty() && self.chapters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.books.len() + self.sections.len() + self.chapters.len()
    }

    /// First `limit` chapters and the number left out.
    pub fn chapter_preview(&self, limit: usize) -> (&[ChapterEntry], usize) {
        let shown = limit.min(self.chapters.len());
        (&self.chapters[..shown], self.chapters.len() - shown)
    }
}
