//! Unit tests for tatva-core

#[cfg(test)]
mod catalog_tests {
    use crate::{BookRow, CatalogSource, ChapterRow, CoreError, SectionRow, SqliteCatalog};
    use tempfile::TempDir;

    fn book(id: &str, code: &str, order: i64) -> BookRow {
        BookRow {
            id: id.to_string(),
            code: code.to_string(),
            name_english: format!("Book {}", code),
            name_hindi: None,
            display_order: order,
        }
    }

    fn section(id: &str, book_id: &str, number: u32) -> SectionRow {
        SectionRow {
            id: id.to_string(),
            book_id: book_id.to_string(),
            section_number: number,
            name_english: format!("Section {}", number),
            name_hindi: Some(format!("खण्ड {}", number)),
        }
    }

    fn chapter(id: &str, section_id: &str, number: u32) -> ChapterRow {
        ChapterRow {
            id: id.to_string(),
            section_id: section_id.to_string(),
            chapter_number: number,
            name_english: None,
            name_hindi: None,
        }
    }

    fn create_test_catalog() -> SqliteCatalog {
        let catalog = SqliteCatalog::open_in_memory().expect("Failed to open catalog");
        catalog.insert_book(&book("b2", "mb", 2)).unwrap();
        catalog.insert_book(&book("b1", "rm", 1)).unwrap();
        catalog.insert_section(&section("s2", "b1", 2)).unwrap();
        catalog.insert_section(&section("s1", "b1", 1)).unwrap();
        catalog.insert_section(&section("s3", "b2", 1)).unwrap();
        catalog.insert_chapter(&chapter("c3", "s1", 3)).unwrap();
        catalog.insert_chapter(&chapter("c1", "s1", 1)).unwrap();
        catalog.insert_chapter(&chapter("c4", "s2", 1)).unwrap();
        catalog
    }

    #[tokio::test]
    async fn test_listings_are_ordered() {
        let catalog = create_test_catalog();

        let books = catalog.list_books().await.unwrap();
        let codes: Vec<_> = books.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes, vec!["rm", "mb"]);

        let sections = catalog.list_sections().await.unwrap();
        let numbers: Vec<_> = sections.iter().map(|s| s.section_number).collect();
        assert_eq!(numbers, vec![1, 1, 2]);

        let chapters = catalog.list_chapters().await.unwrap();
        let numbers: Vec<_> = chapters.iter().map(|c| c.chapter_number).collect();
        assert_eq!(numbers, vec![1, 1, 3]);
    }

    #[tokio::test]
    async fn test_optional_names_round_trip() {
        let catalog = create_test_catalog();
        let sections = catalog.list_sections().await.unwrap();
        assert_eq!(sections[0].name_hindi.as_deref(), Some("खण्ड 1"));
        let chapters = catalog.list_chapters().await.unwrap();
        assert!(chapters.iter().all(|c| c.name_english.is_none()));
    }

    #[tokio::test]
    async fn test_book_navigation_groups_chapters() {
        let catalog = create_test_catalog();
        let nav = catalog
            .book_navigation("rm")
            .await
            .unwrap()
            .expect("book exists");

        assert_eq!(nav.book.id, "b1");
        let numbers: Vec<_> = nav.sections.iter().map(|s| s.section_number).collect();
        assert_eq!(numbers, vec![1, 2]);

        let first: Vec<_> = nav.chapters_by_section[&1]
            .iter()
            .map(|c| c.chapter_number)
            .collect();
        assert_eq!(first, vec![1, 3]);
        assert_eq!(nav.first_chapter(1), Some(1));
        assert_eq!(nav.first_chapter(2), Some(1));
        assert_eq!(nav.first_chapter(9), None);
    }

    #[tokio::test]
    async fn test_book_navigation_with_empty_section() {
        let catalog = create_test_catalog();
        let nav = catalog.book_navigation("mb").await.unwrap().unwrap();
        assert_eq!(nav.sections.len(), 1);
        assert_eq!(nav.chapters_by_section.get(&1), Some(&Vec::new()));
        assert_eq!(nav.first_chapter(1), None);
    }

    #[tokio::test]
    async fn test_unknown_book_navigation_is_none() {
        let catalog = create_test_catalog();
        assert!(catalog.book_navigation("zz").await.unwrap().is_none());
        assert!(catalog.book_navigation("  ").await.unwrap().is_none());
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let catalog = create_test_catalog();
        let err = catalog.insert_book(&book("b9", "rm", 9)).unwrap_err();
        assert!(matches!(err, CoreError::Db(_)));
    }

    #[test]
    fn test_section_requires_existing_book() {
        let catalog = create_test_catalog();
        assert!(catalog.insert_section(&section("sx", "missing", 1)).is_err());
    }

    #[tokio::test]
    async fn test_file_catalog_persists() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("catalog.db");

        {
            let catalog = SqliteCatalog::open(&path).unwrap();
            catalog.insert_book(&book("b1", "bg", 1)).unwrap();
        }

        assert!(path.exists());
        let reopened = SqliteCatalog::open(&path).unwrap();
        let books = reopened.list_books().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].code, "bg");
    }
}

#[cfg(test)]
mod config_tests {
    use crate::{CatalogConfig, CoreError, SearchBehaviorConfig, TatvaConfig};
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = TatvaConfig::default();
        assert_eq!(config.search.fresh_for(), Duration::from_secs(1800));
        assert_eq!(config.search.stale_for(), Duration::from_secs(3600));
        assert_eq!(config.search.build_timeout(), Duration::from_secs(10));
        assert_eq!(config.search.chapter_display_limit, 20);
        assert_eq!(config.search.retry_backoff(), Duration::from_secs(60));
        assert_eq!(config.catalog.page_size, 1000);
        assert_eq!(config.routes.book_page("bg"), "/bhagavad-gita");
        assert_eq!(config.routes.book_page("yv"), "/yoga-vasishtha");
        assert_eq!(config.routes.book_page("unknown"), "/contents");
    }

    #[test]
    fn test_stale_window_never_shorter_than_fresh() {
        let search = SearchBehaviorConfig {
            fresh_secs: 120,
            stale_secs: 60,
            ..SearchBehaviorConfig::default()
        };
        assert_eq!(search.stale_for(), Duration::from_secs(120));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[catalog]
url = "https://example.supabase.co/"

[search]
fresh_secs = 60

[routes]
fallback = "/library"
"#,
        )
        .unwrap();

        let config = TatvaConfig::load_from(&path).unwrap();
        assert_eq!(
            config.catalog.base_url().unwrap(),
            "https://example.supabase.co"
        );
        assert_eq!(config.catalog.request_timeout_secs, 30);
        assert_eq!(config.search.fresh_secs, 60);
        assert_eq!(config.search.stale_secs, 3600);
        assert_eq!(config.routes.book_page("zz"), "/library");
        // Partial tables keep the remaining defaults.
        assert_eq!(config.routes.book_page("rm"), "/ramayana");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[search\nfresh_secs = ").unwrap();
        let err = TatvaConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TATVA_CATALOG_URL", ""),
            ("SUPABASE_URL", "https://env.supabase.co"),
            ("TATVA_CATALOG_KEY", "tatva-key"),
            ("SUPABASE_ANON_KEY", "anon-key"),
        ]
        .into_iter()
        .collect();

        let mut config = TatvaConfig::default();
        config.catalog.url = Some("https://file.supabase.co".into());
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.catalog.url.as_deref(), Some("https://env.supabase.co"));
        assert_eq!(config.catalog.api_key.as_deref(), Some("tatva-key"));
    }

    #[test]
    fn test_env_absent_keeps_file_values() {
        let mut config = TatvaConfig::default();
        config.catalog.api_key = Some("file-key".into());
        config.apply_env(|_| None);
        assert_eq!(config.catalog.api_key.as_deref(), Some("file-key"));
        assert!(config.catalog.url.is_none());
    }

    #[test]
    fn test_catalog_url_validation() {
        let config = CatalogConfig {
            url: Some("ftp://example.com".into()),
            ..CatalogConfig::default()
        };
        assert!(config.base_url().is_err());
        assert!(CatalogConfig::default().base_url().is_err());
        assert!(CatalogConfig::default().get_api_key().is_err());
    }
}

#[cfg(test)]
mod routes_tests {
    use crate::routes::{book_route, chapter_route, route_for, section_route};
    use crate::search::{BookEntry, BookRef, ChapterEntry, SearchEntry, SectionEntry, SectionRef};
    use crate::{RoutesConfig, ShlokaCode};

    fn book_ref(code: &str) -> BookRef {
        BookRef {
            code: code.to_string(),
            name: "Ramayana".to_string(),
            name_secondary: None,
        }
    }

    fn section_entry(code: &str, first_chapter_number: Option<u32>) -> SectionEntry {
        SectionEntry {
            id: "s1".to_string(),
            name: "Bala Kanda".to_string(),
            section: SectionRef {
                number: 1,
                name: "Bala Kanda".to_string(),
                name_secondary: None,
            },
            first_chapter_number,
            book: book_ref(code),
        }
    }

    #[test]
    fn test_parse_full_code() {
        let code = ShlokaCode::parse("rm-1-3-12").unwrap();
        assert_eq!(code, ShlokaCode::new("rm", 1, 3, 12));
        assert_eq!(code.route(), "/shlokas/rm-1-3-12");
    }

    #[test]
    fn test_parse_defaults_verse() {
        let code = ShlokaCode::parse("bg-1-2").unwrap();
        assert_eq!(code.verse, 1);
        assert_eq!(code.to_string(), "bg-1-2-1");
    }

    #[test]
    fn test_parse_rejects_malformed_codes() {
        assert!(ShlokaCode::parse("").is_none());
        assert!(ShlokaCode::parse("rm").is_none());
        assert!(ShlokaCode::parse("rm-1").is_none());
        assert!(ShlokaCode::parse("-1-2").is_none());
        assert!(ShlokaCode::parse("rm-x-2").is_none());
        assert!(ShlokaCode::parse("rm-1-2-3-4").is_none());
    }

    #[test]
    fn test_book_route_uses_landing_page() {
        let routes = RoutesConfig::default();
        let book = BookEntry {
            id: "b1".to_string(),
            code: "rm".to_string(),
            name: "Ramayana".to_string(),
            name_secondary: None,
        };
        assert_eq!(book_route(&book, &routes), "/ramayana");

        let other = BookEntry {
            code: "xx".to_string(),
            ..book
        };
        assert_eq!(book_route(&other, &routes), "/contents");
    }

    #[test]
    fn test_section_route_targets_first_chapter() {
        let routes = RoutesConfig::default();
        assert_eq!(
            section_route(&section_entry("rm", Some(3)), &routes),
            "/shlokas/rm-1-3-1"
        );
    }

    #[test]
    fn test_section_without_chapters_routes_to_book() {
        let routes = RoutesConfig::default();
        assert_eq!(section_route(&section_entry("rm", None), &routes), "/ramayana");
        assert_eq!(section_route(&section_entry("zz", None), &routes), "/contents");
    }

    #[test]
    fn test_chapter_route() {
        let chapter = ChapterEntry {
            id: "c1".to_string(),
            name: "Chapter 4".to_string(),
            name_secondary: None,
            number: 4,
            section: SectionRef {
                number: 2,
                name: "Ayodhya Kanda".to_string(),
                name_secondary: None,
            },
            book: book_ref("rm"),
        };
        assert_eq!(chapter_route(&chapter), "/shlokas/rm-2-4-1");
        assert_eq!(
            route_for(&SearchEntry::Chapter(chapter), &RoutesConfig::default()),
            "/shlokas/rm-2-4-1"
        );
    }
}
