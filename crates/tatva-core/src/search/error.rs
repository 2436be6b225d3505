//! Search error types

use std::time::Duration;

use thiserror::Error;

use crate::CoreError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("catalog fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("catalog returned no books")]
    EmptyCatalog,
}

pub type SearchResult<T> = Result<T, SearchError>;
