#![allow(clippy::needless_borrow)]

use std::sync::Arc;

use napi::bindgen_prelude::*;
use napi::Result as NapiResult;
use napi::{Env, JsUnknown};
use napi_derive::napi;
use once_cell::sync::OnceCell;
use serde::Serialize;
use tatva_core::routes::{book_route, chapter_route, section_route};
use tatva_core::search::{
    BookEntry, ChapterEntry, IndexStatus, QuerySession, SearchError, SearchIndex, SectionEntry,
};
use tatva_core::{
    CatalogSource, CoreError, RestCatalog, RoutesConfig, ShlokaCode, SqliteCatalog, TatvaConfig,
};

static CONFIG: OnceCell<TatvaConfig> = OnceCell::new();

fn config() -> NapiResult<&'static TatvaConfig> {
    CONFIG.get_or_try_init(|| TatvaConfig::load().map_err(to_napi_error))
}

fn to_napi_error(err: CoreError) -> napi::Error {
    napi::Error::from_reason(err.to_string())
}

fn search_error_to_napi(err: SearchError) -> napi::Error {
    napi::Error::from_reason(err.to_string())
}

fn to_json<T: Serialize>(value: &T) -> NapiResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| napi::Error::from_reason(e.to_string()))
}

fn to_js<T: Serialize>(env: Env, value: &T) -> NapiResult<JsUnknown> {
    env.to_js_value(value)
}

/// An entry together with the page it navigates to.
#[derive(Serialize)]
struct Routed<'a, T> {
    #[serde(flatten)]
    entry: &'a T,
    route: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse<'a> {
    generation: u64,
    query: String,
    /// False when a newer query was issued while this one ran
    current: bool,
    books: Vec<Routed<'a, BookEntry>>,
    sections: Vec<Routed<'a, SectionEntry>>,
    chapters: Vec<Routed<'a, ChapterEntry>>,
    /// Chapters matched beyond the display limit
    more_chapters: usize,
    status: IndexStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NavigationResponse<T: Serialize> {
    #[serde(flatten)]
    navigation: T,
    book_route: String,
}

/// SearchService - cached catalog search
#[napi]
pub struct SearchService {
    catalog: Arc<dyn CatalogSource>,
    index: Arc<SearchIndex>,
    session: Arc<QuerySession>,
    routes: RoutesConfig,
    chapter_limit: usize,
}

#[napi]
impl SearchService {
    /// Search service over the hosted catalog configured in `config.toml`
    /// or the environment.
    #[napi(factory)]
    pub async fn create() -> Result<SearchService> {
        let config = config()?;
        let catalog = RestCatalog::new(&config.catalog).map_err(to_napi_error)?;
        Ok(Self::with_catalog(Arc::new(catalog), config))
    }

    /// Search service over a local SQLite mirror of the catalog.
    #[napi(factory)]
    pub async fn open_local(db_path: String) -> Result<SearchService> {
        let config = config()?;
        let catalog = SqliteCatalog::open(&db_path).map_err(to_napi_error)?;
        Ok(Self::with_catalog(Arc::new(catalog), config))
    }

    fn with_catalog(catalog: Arc<dyn CatalogSource>, config: &TatvaConfig) -> Self {
        log::info!("Search service created");
        Self {
            index: Arc::new(SearchIndex::new(catalog.clone(), &config.search)),
            catalog,
            session: Arc::new(QuerySession::new()),
            routes: config.routes.clone(),
            chapter_limit: config.search.chapter_display_limit,
        }
    }

    /// Build the index now unless a fresh one is cached; resolves with the
    /// index status.
    #[napi]
    pub async fn warm(&self) -> Result<serde_json::Value> {
        self.index.ensure_fresh().await;
        to_json(&self.index.status())
    }

    /// Match `query` against the cached index without waiting on a build.
    /// A stale index triggers a background rebuild.
    ///
    /// Each call supersedes earlier ones; results of a superseded call come
    /// back empty with `current: false`.
    #[napi]
    pub async fn search(&self, query: String) -> Result<serde_json::Value> {
        let ticket = self.session.begin(query);
        let snapshot = self.index.serve();
        let tagged = self.session.run(&snapshot, ticket);
        let generation = tagged.generation;
        let query = tagged.query.clone();
        let groups = self.session.accept(tagged);
        let current = groups.is_some();
        let groups = groups.unwrap_or_default();

        let (chapters, more_chapters) = groups.chapter_preview(self.chapter_limit);
        let response = SearchResponse {
            generation,
            query,
            current,
            books: groups
                .books
                .iter()
                .map(|b| Routed {
                    entry: b,
                    route: book_route(b, &self.routes),
                })
                .collect(),
            sections: groups
                .sections
                .iter()
                .map(|s| Routed {
                    entry: s,
                    route: section_route(s, &self.routes),
                })
                .collect(),
            chapters: chapters
                .iter()
                .map(|c| Routed {
                    entry: c,
                    route: chapter_route(c),
                })
                .collect(),
            more_chapters,
            status: self.index.status(),
        };
        to_json(&response)
    }

    /// Whether `generation` belongs to the most recent `search` call.
    #[napi]
    pub fn is_current(&self, generation: i64) -> bool {
        generation >= 0 && self.session.is_current(generation as u64)
    }

    /// Rebuild now and return build statistics.
    #[napi]
    pub async fn refresh(&self) -> Result<serde_json::Value> {
        let stats = self.index.rebuild().await.map_err(search_error_to_napi)?;
        to_json(&stats)
    }

    /// Make the next search rebuild the index.
    #[napi]
    pub fn invalidate(&self) {
        self.index.invalidate();
    }

    #[napi]
    pub fn status(&self) -> Result<serde_json::Value> {
        to_json(&self.index.status())
    }

    /// Sections and chapters of one book, or `null` for an unknown code.
    #[napi]
    pub async fn book_navigation(&self, code: String) -> Result<serde_json::Value> {
        let navigation = self
            .catalog
            .book_navigation(&code)
            .await
            .map_err(to_napi_error)?;
        match navigation {
            Some(navigation) => {
                let book_route = self.routes.book_page(&navigation.book.code).to_string();
                to_json(&NavigationResponse {
                    navigation,
                    book_route,
                })
            }
            None => Ok(serde_json::Value::Null),
        }
    }
}

/// Parse a `{book}-{section}-{chapter}[-{verse}]` code; `null` when malformed.
#[napi]
pub fn parse_shloka_code(env: Env, code: String) -> NapiResult<JsUnknown> {
    to_js(env, &ShlokaCode::parse(&code))
}

#[napi]
pub fn shloka_route(book_code: String, section: u32, chapter: u32, verse: Option<u32>) -> String {
    ShlokaCode::new(book_code, section, chapter, verse.unwrap_or(1)).route()
}
