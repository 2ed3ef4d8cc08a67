//! Integration tests for section deactivation.
//!
//! Deactivating a section must never remove the row: the full section list
//! keeps its cardinality and only the active flag differs.

use pagewright_core::page_path::PagePath;
use pagewright_core::section::SectionType;
use pagewright_db::models::page::UpdatePage;
use pagewright_db::models::page_section::CreatePageSection;
use pagewright_db::repositories::{PageRepo, PageSectionRepo};
use sqlx::PgPool;

fn path(p: &str) -> PagePath {
    PagePath::parse(p).unwrap()
}

async fn seed(pool: &PgPool) -> Vec<i64> {
    PageRepo::upsert(pool, &path("/services"), &UpdatePage::default(), None, None)
        .await
        .unwrap();
    let mut ids = Vec::new();
    for (i, key) in ["hero", "list", "faq"].iter().enumerate() {
        let section = PageSectionRepo::create(
            pool,
            &CreatePageSection {
                page_path: path("/services"),
                section_key: key.to_string(),
                title: None,
                content: None,
                section_type: SectionType::Text,
                display_order: Some(i as i32 * 10),
                metadata: None,
            },
            None,
        )
        .await
        .unwrap();
        ids.push(section.id);
    }
    ids
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deactivate_keeps_row(pool: PgPool) {
    let ids = seed(&pool).await;
    let p = path("/services");

    let before = PageSectionRepo::list_by_page(&pool, &p, true).await.unwrap();

    let changed = PageSectionRepo::set_active(&pool, ids[1], false, None).await.unwrap();
    assert!(changed);

    let after = PageSectionRepo::list_by_page(&pool, &p, true).await.unwrap();
    assert_eq!(before.len(), after.len(), "no row may be removed");

    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.id, a.id);
        assert_eq!(b.content, a.content);
        assert_eq!(a.is_active, a.id != ids[1]);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deactivated_hidden_from_active_lists(pool: PgPool) {
    let ids = seed(&pool).await;
    PageSectionRepo::set_active(&pool, ids[0], false, None).await.unwrap();

    let active = PageSectionRepo::list_by_page(&pool, &path("/services"), false)
        .await
        .unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|s| s.id != ids[0]));

    let all_active = PageSectionRepo::list_active(&pool).await.unwrap();
    assert!(all_active.iter().all(|s| s.id != ids[0]));

    let found = PageSectionRepo::find_by_id(&pool, ids[0]).await.unwrap();
    assert!(found.is_some_and(|s| !s.is_active));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deactivate_is_idempotent(pool: PgPool) {
    let ids = seed(&pool).await;
    assert!(PageSectionRepo::set_active(&pool, ids[2], false, None).await.unwrap());
    assert!(
        !PageSectionRepo::set_active(&pool, ids[2], false, None).await.unwrap(),
        "second deactivation should report no change"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_inactive_order_can_be_reused(pool: PgPool) {
    let ids = seed(&pool).await;
    PageSectionRepo::set_active(&pool, ids[0], false, None).await.unwrap();

    let reused = PageSectionRepo::create(
        &pool,
        &CreatePageSection {
            page_path: path("/services"),
            section_key: "new-hero".into(),
            title: None,
            content: None,
            section_type: SectionType::Hero,
            display_order: Some(0),
            metadata: None,
        },
        None,
    )
    .await;
    assert!(reused.is_ok(), "order uniqueness applies to active sections only");
}
