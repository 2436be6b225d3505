use std::{fs, path::Path, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{BookNavigation, BookRow, CatalogSource, ChapterRow, SectionRow};
use crate::CoreResult;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS books (
        id TEXT PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        name_english TEXT NOT NULL,
        name_hindi TEXT,
        display_order INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS sections (
        id TEXT PRIMARY KEY,
        book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        section_number INTEGER NOT NULL,
        name_english TEXT NOT NULL,
        name_hindi TEXT,
        UNIQUE (book_id, section_number)
    );

    CREATE TABLE IF NOT EXISTS chapters (
        id TEXT PRIMARY KEY,
        section_id TEXT NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
        chapter_number INTEGER NOT NULL,
        name_english TEXT,
        name_hindi TEXT,
        UNIQUE (section_id, chapter_number)
    );
";

const BOOK_COLUMNS: &str = "id, code, name_english, name_hindi, display_order";
const SECTION_COLUMNS: &str = "id, book_id, section_number, name_english, name_hindi";
const CHAPTER_COLUMNS: &str = "id, section_id, chapter_number, name_english, name_hindi";

/// Local SQLite mirror of the catalog tables.
#[derive(Clone)]
pub struct SqliteCatalog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalog {
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> CoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> CoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn insert_book(&self, book: &BookRow) -> CoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO books (id, code, name_english, name_hindi, display_order)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    book.id,
                    book.code,
                    book.name_english,
                    book.name_hindi,
                    book.display_order
                ],
            )?;
            Ok(())
        })
    }

    pub fn insert_section(&self, section: &SectionRow) -> CoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sections (id, book_id, section_number, name_english, name_hindi)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    section.id,
                    section.book_id,
                    section.section_number,
                    section.name_english,
                    section.name_hindi
                ],
            )?;
            Ok(())
        })
    }

    pub fn insert_chapter(&self, chapter: &ChapterRow) -> CoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chapters (id, section_id, chapter_number, name_english, name_hindi)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    chapter.id,
                    chapter.section_id,
                    chapter.chapter_number,
                    chapter.name_english,
                    chapter.name_hindi
                ],
            )?;
            Ok(())
        })
    }

    pub fn books(&self) -> CoreResult<Vec<BookRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOK_COLUMNS} FROM books ORDER BY display_order, id"
            ))?;
            let rows = stmt
                .query_map([], row_to_book)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn sections(&self) -> CoreResult<Vec<SectionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SECTION_COLUMNS} FROM sections ORDER BY section_number, id"
            ))?;
            let rows = stmt
                .query_map([], row_to_section)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn chapters(&self) -> CoreResult<Vec<ChapterRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHAPTER_COLUMNS} FROM chapters ORDER BY chapter_number, id"
            ))?;
            let rows = stmt
                .query_map([], row_to_chapter)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn navigation(&self, code: &str) -> CoreResult<Option<BookNavigation>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }
        self.with_conn(|conn| {
            let book = conn
                .query_row(
                    &format!("SELECT {BOOK_COLUMNS} FROM books WHERE code = ?1"),
                    [code],
                    row_to_book,
                )
                .optional()?;
            let Some(book) = book else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(&format!(
                "SELECT {SECTION_COLUMNS} FROM sections WHERE book_id = ?1 ORDER BY section_number"
            ))?;
            let sections = stmt
                .query_map([&book.id], row_to_section)?
                .collect::<Result<Vec<_>, _>>()?;

            let mut stmt = conn.prepare(
                "SELECT c.id, c.section_id, c.chapter_number, c.name_english, c.name_hindi
                 FROM chapters c JOIN sections s ON s.id = c.section_id
                 WHERE s.book_id = ?1 ORDER BY c.chapter_number",
            )?;
            let chapters = stmt
                .query_map([&book.id], row_to_chapter)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Some(BookNavigation::assemble(book, sections, chapters)))
        })
    }

    fn with_conn<F, T>(&self, action: F) -> CoreResult<T>
    where
        F: FnOnce(&Connection) -> CoreResult<T>,
    {
        let conn = self.conn.lock();
        action(&conn)
    }
}

#[async_trait]
impl CatalogSource for SqliteCatalog {
    async fn list_books(&self) -> CoreResult<Vec<BookRow>> {
        self.books()
    }

    async fn list_sections(&self) -> CoreResult<Vec<SectionRow>> {
        self.sections()
    }

    async fn list_chapters(&self) -> CoreResult<Vec<ChapterRow>> {
        self.chapters()
    }

    async fn book_navigation(&self, code: &str) -> CoreResult<Option<BookNavigation>> {
        self.navigation(code)
    }
}

fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookRow> {
    Ok(BookRow {
        id: row.get(0)?,
        code: row.get(1)?,
        name_english: row.get(2)?,
        name_hindi: row.get(3)?,
        display_order: row.get(4)?,
    })
}

fn row_to_section(row: &rusqlite::Row<'_>) -> rusqlite::Result<SectionRow> {
    Ok(SectionRow {
        id: row.get(0)?,
        book_id: row.get(1)?,
        section_number: row.get(2)?,
        name_english: row.get(3)?,
        name_hindi: row.get(4)?,
    })
}

fn row_to_chapter(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChapterRow> {
    Ok(ChapterRow {
        id: row.get(0)?,
        section_id: row.get(1)?,
        chapter_number: row.get(2)?,
        name_english: row.get(3)?,
        name_hindi: row.get(4)?,
    })
}
