//! Catalog search
//!
//! Builds a flat, denormalized index of every book, section and chapter and
//! matches keystroke queries against it.
//!
//! ## Features
//!
//! - Concurrent bulk fetch of the three catalog tables
//! - Snapshot cache with fresh / stale windows and atomic replacement
//! - Diacritic-insensitive (IAST → ASCII) substring matching
//! - Generation-tagged query sessions to drop superseded results
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tatva_core::search::{QuerySession, SearchIndex};
//!
//! let index = Arc::new(SearchIndex::new(Arc::new(catalog), &config.search));
//! // Per keystroke: never waits; a stale index rebuilds in the background.
//! let snapshot = index.serve();
//! let session = QuerySession::new();
//! let ticket = session.begin("krsna");
//! let tagged = session.run(&snapshot, ticket);
//! if let Some(groups) = session.accept(tagged) {
//!     // render groups.books / groups.sections / groups.chapters
//! }
//! ```

mod builder;
mod cache;
mod error;
mod matcher;
mod normalize;
mod session;
mod types;


pub use builder::IndexBuilder;
pub use cache::{IndexSnapshot, IndexStats, IndexStatus, SearchIndex};
pub use error::{SearchError, SearchResult};
pub use matcher::match_query;
pub use normalize::normalize_iast;
pub use session::{QuerySession, QueryTicket, TaggedResults};
pub use types::*;
