//! Query matching

use std::cmp::Ordering;
use std::collections::HashSet;

use super::cache::{IndexSnapshot, IndexedEntry};
use super::normalize::normalize_iast;
use super::types::{ResultGroups, SearchEntry};

/// Lowercased and normalized forms of one comparable name.
#[derive(Debug, Clone, Default)]
struct NameKeys {
    raw: String,
    lower: String,
    normalized: String,
    /// Secondary-language name, compared without folding
    secondary: Option<String>,
}

impl NameKeys {
    fn new(name: &str, secondary: Option<&str>) -> Self {
        Self {
            raw: name.to_string(),
            lower: name.to_lowercase(),
            normalized: normalize_iast(name),
            secondary: secondary.map(str::to_string),
        }
    }

    /// Case-insensitive order with the raw text as tie-break.
    fn sort_key(&self) -> (&str, &str) {
        (&self.lower, &self.raw)
    }

    fn matches(&self, query: &Query) -> bool {
        self.lower.contains(&query.lower)
            || (!query.normalized.is_empty() && self.normalized.contains(&query.normalized))
            || self
                .secondary
                .as_deref()
                .is_some_and(|s| s.contains(&query.lower))
    }
}

/// Precomputed comparison keys for one entry, built once per snapshot.
#[derive(Debug, Clone)]
pub(crate) struct MatchKeys {
    name: NameKeys,
    book: NameKeys,
    book_code: String,
    section: Option<NameKeys>,
    /// Lowercased name used for section / book collision checks
    dedup_name: String,
}

impl MatchKeys {
    pub(crate) fn for_entry(entry: &SearchEntry) -> Self {
        match entry {
            SearchEntry::Book(b) => Self {
                name: NameKeys::new(&b.name, b.name_secondary.as_deref()),
                book: NameKeys::new(&b.name, b.name_secondary.as_deref()),
                book_code: b.code.to_lowercase(),
                section: None,
                dedup_name: b.name.to_lowercase(),
            },
            SearchEntry::Section(s) => {
                let primary = if s.section.name.is_empty() {
                    &s.name
                } else {
                    &s.section.name
                };
                Self {
                    name: NameKeys::new(&s.name, s.section.name_secondary.as_deref()),
                    book: NameKeys::new(&s.book.name, s.book.name_secondary.as_deref()),
                    book_code: s.book.code.to_lowercase(),
                    section: Some(NameKeys::new(
                        &s.section.name,
                        s.section.name_secondary.as_deref(),
                    )),
                    dedup_name: primary.to_lowercase(),
                }
            }
            SearchEntry::Chapter(c) => Self {
                name: NameKeys::new(&c.name, c.name_secondary.as_deref()),
                book: NameKeys::new(&c.book.name, c.book.name_secondary.as_deref()),
                book_code: c.book.code.to_lowercase(),
                section: Some(NameKeys::new(
                    &c.section.name,
                    c.section.name_secondary.as_deref(),
                )),
                dedup_name: c.name.to_lowercase(),
            },
        }
    }

    fn matches(&self, query: &Query) -> bool {
        self.name.matches(query)
            || self.book.matches(query)
            || self.book_code.contains(&query.lower)
            || self.section.as_ref().is_some_and(|s| s.matches(query))
    }

    fn section_key(&self) -> Option<(&str, &str)> {
        self.section.as_ref().map(NameKeys::sort_key)
    }
}

struct Query {
    lower: String,
    normalized: String,
}

/// Match `query` against every entry in `snapshot`.
///
/// A blank query or an empty snapshot yields empty groups. Sections whose
/// name equals (case-insensitively) the name of a matched book are dropped.
pub fn match_query(snapshot: &IndexSnapshot, query: &str) -> ResultGroups {
    let trimmed = query.trim();
    if trimmed.is_empty() || snapshot.is_empty() {
        return ResultGroups::default();
    }

    let lower = trimmed.to_lowercase();
    let query = Query {
        normalized: normalize_iast(&lower),
        lower,
    };

    let mut books = Vec::new();
    let mut sections = Vec::new();
    let mut chapters = Vec::new();

    for indexed in snapshot.entries() {
        if !indexed.keys.matches(&query) {
            continue;
        }
        match &indexed.entry {
            SearchEntry::Book(_) => books.push(indexed),
            SearchEntry::Section(_) => sections.push(indexed),
            SearchEntry::Chapter(_) => chapters.push(indexed),
        }
    }

    let book_names: HashSet<&str> = books.iter().map(|b| b.keys.dedup_name.as_str()).collect();
    sections.retain(|s| !book_names.contains(s.keys.dedup_name.as_str()));

    books.sort_by(|a, b| a.keys.name.sort_key().cmp(&b.keys.name.sort_key()));
    sections.sort_by(|a, b| compare_book(a, b).then_with(|| compare_section(a, b)));
    chapters.sort_by(|a, b| {
        compare_book(a, b)
            .then_with(|| compare_section(a, b))
            .then_with(|| chapter_number(a).cmp(&chapter_number(b)))
    });

    ResultGroups {
        books: books
            .into_iter()
            .filter_map(|i| match &i.entry {
                SearchEntry::Book(b) => Some(b.clone()),
                _ => None,
            })
            .collect(),
        sections: sections
            .into_iter()
            .filter_map(|i| match &i.entry {
                SearchEntry::Section(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        chapters: chapters
            .into_iter()
            .filter_map(|i| match &i.entry {
                SearchEntry::Chapter(c) => Some(c.clone()),
                _ => None,
            })
            .collect(),
    }
}

fn compare_book(a: &IndexedEntry, b: &IndexedEntry) -> Ordering {
    a.keys.book.sort_key().cmp(&b.keys.book.sort_key())
}

fn compare_section(a: &IndexedEntry, b: &IndexedEntry) -> Ordering {
    a.keys.section_key().cmp(&b.keys.section_key())
}

fn chapter_number(entry: &IndexedEntry) -> u32 {
    match &entry.entry {
        SearchEntry::Chapter(c) => c.number,
        _ => 0,
    }
}
