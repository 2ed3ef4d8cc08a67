//! Integration tests for page upserts and section listing.

use pagewright_core::page_path::PagePath;
use pagewright_core::section::SectionType;
use pagewright_core::seo::SeoFields;
use pagewright_db::models::page::UpdatePage;
use pagewright_db::models::page_section::{CreatePageSection, UpdatePageSection};
use pagewright_db::repositories::{PageRepo, PageSectionRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn path(p: &str) -> PagePath {
    PagePath::parse(p).unwrap()
}

fn titled(title: &str) -> UpdatePage {
    UpdatePage {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

fn new_section(page: &str, key: &str, order: Option<i32>) -> CreatePageSection {
    CreatePageSection {
        page_path: path(page),
        section_key: key.to_string(),
        title: Some(format!("{key} title")),
        content: Some(format!("{key} body")),
        section_type: SectionType::Text,
        display_order: order,
        metadata: None,
    }
}

// ---------------------------------------------------------------------------
// Test: first upsert creates the page
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_creates_page(pool: PgPool) {
    assert!(PageRepo::find_by_path(&pool, &path("/about"))
        .await
        .unwrap()
        .is_none());

    let page = PageRepo::upsert(&pool, &path("/about"), &titled("About"), Some(7), None)
        .await
        .unwrap();

    assert_eq!(page.page_path.as_str(), "/about");
    assert_eq!(page.title, "About");
    assert!(!page.is_published);
    assert_eq!(page.updated_by, Some(7));
    assert!(page.meta_description.is_none());
}

// ---------------------------------------------------------------------------
// Test: upsert only touches provided fields
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_applies_only_set_fields(pool: PgPool) {
    let p = path("/services");
    let first = UpdatePage {
        title: Some("Services".into()),
        seo: SeoFields {
            meta_title: Some("Our services".into()),
            keywords: Some(vec!["seo".into(), "ppc".into()]),
            ..Default::default()
        },
        ..Default::default()
    };
    let created = PageRepo::upsert(&pool, &p, &first, Some(1), None).await.unwrap();

    let second = UpdatePage {
        is_published: Some(true),
        seo: SeoFields {
            meta_description: Some("What we do".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let updated = PageRepo::upsert(&pool, &p, &second, Some(2), None).await.unwrap();

    assert_eq!(updated.title, "Services");
    assert_eq!(updated.meta_title.as_deref(), Some("Our services"));
    assert_eq!(updated.meta_description.as_deref(), Some("What we do"));
    assert_eq!(updated.keywords, Some(vec!["seo".to_string(), "ppc".to_string()]));
    assert!(updated.is_published);
    assert_eq!(updated.updated_by, Some(2));
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.created_at, created.created_at);
}

// ---------------------------------------------------------------------------
// Test: page path cannot be rewritten
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_page_path_is_immutable(pool: PgPool) {
    PageRepo::upsert(&pool, &path("/careers"), &titled("Careers"), None, None)
        .await
        .unwrap();

    let result = sqlx::query("UPDATE pages SET page_path = '/jobs' WHERE page_path = '/careers'")
        .execute(&pool)
        .await;
    assert!(result.is_err(), "page_path update must be rejected");
}

// ---------------------------------------------------------------------------
// Test: sections list in display order and append by default
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sections_ordered_and_appended(pool: PgPool) {
    PageRepo::upsert(&pool, &path("/"), &titled("Home"), None, None)
        .await
        .unwrap();

    let b = PageSectionRepo::create(&pool, &new_section("/", "intro", Some(20)), None)
        .await
        .unwrap();
    let a = PageSectionRepo::create(&pool, &new_section("/", "hero", Some(0)), None)
        .await
        .unwrap();
    let c = PageSectionRepo::create(&pool, &new_section("/", "faq", None), None)
        .await
        .unwrap();

    assert_eq!(c.display_order, 30, "appended after the current maximum");

    let sections = PageSectionRepo::list_by_page(&pool, &path("/"), false)
        .await
        .unwrap();
    let ids: Vec<i64> = sections.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![a.id, b.id, c.id]);
    assert_eq!(sections[0].metadata, serde_json::json!({}));
}

// ---------------------------------------------------------------------------
// Test: duplicate section key is a unique violation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_section_key_rejected(pool: PgPool) {
    PageRepo::upsert(&pool, &path("/about"), &titled("About"), None, None)
        .await
        .unwrap();
    PageSectionRepo::create(&pool, &new_section("/about", "team", Some(0)), None)
        .await
        .unwrap();

    let err = PageSectionRepo::create(&pool, &new_section("/about", "team", Some(10)), None)
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("should be a database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
}

// ---------------------------------------------------------------------------
// Test: update changes only provided fields
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_section_update(pool: PgPool) {
    PageRepo::upsert(&pool, &path("/about"), &titled("About"), None, None)
        .await
        .unwrap();
    let section = PageSectionRepo::create(&pool, &new_section("/about", "story", Some(0)), None)
        .await
        .unwrap();

    let updated = PageSectionRepo::update(
        &pool,
        section.id,
        &UpdatePageSection {
            content: Some("New story".into()),
            section_type: Some(SectionType::Features),
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap()
    .expect("section should exist");

    assert_eq!(updated.content, "New story");
    assert_eq!(updated.section_type, SectionType::Features);
    assert_eq!(updated.title, section.title);

    let missing = PageSectionRepo::update(&pool, 999_999, &UpdatePageSection::default(), None)
        .await
        .unwrap();
    assert!(missing.is_none());
}
