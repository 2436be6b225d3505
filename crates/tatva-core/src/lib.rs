//! Catalog search for the Tatva scripture library.
//!
//! The catalog is a three-level tree of books, sections and chapters held in
//! an external relational store. [`search::SearchIndex`] pulls the whole tree,
//! flattens it into [`search::SearchEntry`] values and serves keystroke-level
//! queries against an in-memory snapshot.

#[cfg(test)]
mod tests;

pub mod catalog;
pub mod config;
pub mod routes;
pub mod search;

use thiserror::Error;

pub use catalog::{
    BookNavigation, BookRow, CatalogRows, CatalogSource, ChapterRow, SectionRow, SqliteCatalog,
};
#[cfg(feature = "rest")]
pub use catalog::RestCatalog;
pub use config::{CatalogConfig, RoutesConfig, SearchBehaviorConfig, TatvaConfig};
pub use routes::ShlokaCode;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Message(String),
    #[error("catalog request failed ({status}): {message}")]
    Catalog { status: u16, message: String },
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[cfg(feature = "rest")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
