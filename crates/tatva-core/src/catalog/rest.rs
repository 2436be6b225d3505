//! PostgREST client for the hosted catalog

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{BookNavigation, BookRow, CatalogSource, ChapterRow, SectionRow};
use crate::config::CatalogConfig;
use crate::{CoreError, CoreResult};

const BOOK_SELECT: &str = "id,code,name_english,name_hindi,display_order";
const SECTION_SELECT: &str = "id,book_id,section_number,name_english,name_hindi";
const CHAPTER_SELECT: &str = "id,section_id,chapter_number,name_english,name_hindi";

/// Reads the catalog tables over the PostgREST API (`/rest/v1/{table}`).
pub struct RestCatalog {
    base_url: String,
    api_key: String,
    page_size: usize,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

impl RestCatalog {
    pub fn new(config: &CatalogConfig) -> CoreResult<Self> {
        let base_url = config.base_url()?;
        let api_key = config.get_api_key()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(CoreError::Http)?;

        Ok(Self {
            base_url,
            api_key,
            page_size: config.page_size.max(1),
            client,
        })
    }

    /// All rows of `table` matching `filters`, read page by page with
    /// `limit`/`offset` until a short page comes back.
    async fn fetch<T: DeserializeOwned>(
        &self,
        table: &str,
        select: &str,
        filters: &[(&str, String)],
        order: &str,
    ) -> CoreResult<Vec<T>> {
        let mut url = format!(
            "{}/rest/v1/{}?select={}",
            self.base_url,
            table,
            urlencoding::encode(select)
        );
        for (column, condition) in filters {
            url.push_str(&format!("&{}={}", column, urlencoding::encode(condition)));
        }
        url.push_str(&format!("&order={}", urlencoding::encode(order)));

        let mut rows: Vec<T> = Vec::new();
        loop {
            let page_url = format!("{}&limit={}&offset={}", url, self.page_size, rows.len());
            let page: Vec<T> = self.fetch_page(&page_url).await?;
            let last = page.len() < self.page_size;
            rows.extend(page);
            if last {
                break;
            }
        }

        log::debug!("Fetched {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    async fn fetch_page<T: DeserializeOwned>(&self, url: &str) -> CoreResult<Vec<T>> {
        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(CoreError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(CoreError::Http)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(CoreError::Catalog {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CatalogSource for RestCatalog {
    async fn list_books(&self) -> CoreResult<Vec<BookRow>> {
        self.fetch("books", BOOK_SELECT, &[], "display_order.asc").await
    }

    async fn list_sections(&self) -> CoreResult<Vec<SectionRow>> {
        self.fetch("sections", SECTION_SELECT, &[], "section_number.asc").await
    }

    async fn list_chapters(&self) -> CoreResult<Vec<ChapterRow>> {
        self.fetch("chapters", CHAPTER_SELECT, &[], "chapter_number.asc").await
    }

    async fn book_navigation(&self, code: &str) -> CoreResult<Option<BookNavigation>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }

        let books: Vec<BookRow> = self
            .fetch(
                "books",
                BOOK_SELECT,
                &[("code", format!("eq.{code}"))],
                "display_order.asc",
            )
            .await?;
        let Some(book) = books.into_iter().next() else {
            return Ok(None);
        };

        let sections: Vec<SectionRow> = self
            .fetch(
                "sections",
                SECTION_SELECT,
                &[("book_id", format!("eq.{}", book.id))],
                "section_number.asc",
            )
            .await?;

        let chapters: Vec<ChapterRow> = if sections.is_empty() {
            vec![]
        } else {
            let ids = sections
                .iter()
                .map(|s| s.id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            self.fetch(
                "chapters",
                CHAPTER_SELECT,
                &[("section_id", format!("in.({ids})"))],
                "chapter_number.asc",
            )
            .await?
        };

        Ok(Some(BookNavigation::assemble(book, sections, chapters)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog_for(server: &MockServer) -> RestCatalog {
        let config = CatalogConfig {
            url: Some(server.uri()),
            api_key: Some("anon-key".to_string()),
            ..CatalogConfig::default()
        };
        RestCatalog::new(&config).expect("catalog client")
    }

    #[tokio::test]
    async fn test_list_books_sends_key_and_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/books"))
            .and(query_param("select", BOOK_SELECT))
            .and(query_param("order", "display_order.asc"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "b1", "code": "bg", "name_english": "Bhagavad Gita", "name_hindi": "भगवद्गीता", "display_order": 1},
                {"id": "b2", "code": "rm", "name_english": "Ramayana", "name_hindi": null, "display_order": 2}
            ])))
            .mount(&server)
            .await;

        let books = catalog_for(&server).list_books().await.expect("books");
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].code, "bg");
        assert_eq!(books[0].name_hindi.as_deref(), Some("भगवद्गीता"));
        assert_eq!(books[1].name_hindi, None);
    }

    #[tokio::test]
    async fn test_error_body_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/sections"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid API key"})),
            )
            .mount(&server)
            .await;

        let err = catalog_for(&server).list_sections().await.unwrap_err();
        match err {
            CoreError::Catalog { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_book_navigation_filters_by_book() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/books"))
            .and(query_param("code", "eq.bg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "b1", "code": "bg", "name_english": "Bhagavad Gita", "display_order": 1}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/sections"))
            .and(query_param("book_id", "eq.b1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "s1", "book_id": "b1", "section_number": 1, "name_english": "Gita"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/chapters"))
            .and(query_param("section_id", "in.(s1)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "c2", "section_id": "s1", "chapter_number": 2, "name_english": "Sankhya Yoga"},
                {"id": "c1", "section_id": "s1", "chapter_number": 1, "name_english": null}
            ])))
            .mount(&server)
            .await;

        let nav = catalog_for(&server)
            .book_navigation("bg")
            .await
            .expect("navigation")
            .expect("book exists");
        assert_eq!(nav.sections.len(), 1);
        assert_eq!(nav.first_chapter(1), Some(1));
        assert_eq!(nav.chapters_by_section[&1].len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_book_code_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/books"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let nav = catalog_for(&server).book_navigation("zz").await.expect("navigation");
        assert!(nav.is_none());
    }

    #[tokio::test]
    async fn test_listing_reads_every_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/chapters"))
            .and(query_param("limit", "2"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "c1", "section_id": "s1", "chapter_number": 1},
                {"id": "c2", "section_id": "s1", "chapter_number": 2}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/chapters"))
            .and(query_param("limit", "2"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "c3", "section_id": "s1", "chapter_number": 3}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let config = CatalogConfig {
            url: Some(server.uri()),
            api_key: Some("anon-key".to_string()),
            page_size: 2,
            ..CatalogConfig::default()
        };
        let chapters = RestCatalog::new(&config)
            .expect("catalog client")
            .list_chapters()
            .await
            .expect("chapters");
        let ids: Vec<_> = chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = CatalogConfig {
            url: Some("localhost:54321".to_string()),
            api_key: Some("k".to_string()),
            ..CatalogConfig::default()
        };
        assert!(RestCatalog::new(&config).is_err());
    }
}
