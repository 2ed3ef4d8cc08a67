//! SEO cache freshness, default backfill and write-back.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::*;
use pagewright_content::{
    Actor, ContentError, ContentStore, InMemoryStore, SeoCache, StoreOp,
};
use pagewright_core::seo::{SeoDefaults, SeoField, SeoFields};
use pagewright_db::models::page::UpdatePage;
use pagewright_events::ChangeBus;

const TTL: Duration = Duration::from_secs(300);

fn cache_over(store: Arc<InMemoryStore>) -> Arc<SeoCache> {
    Arc::new(SeoCache::new(
        store,
        SeoDefaults::new("https://www.example.com/"),
        TTL,
    ))
}

#[tokio::test(start_paused = true)]
async fn entries_expire_after_ttl() {
    let store = Arc::new(InMemoryStore::new());
    let cache = cache_over(store.clone());
    let about = path("/about");

    cache.get(&about).await.unwrap();
    cache.get(&about).await.unwrap();
    assert_eq!(store.calls(StoreOp::FindPage), 1);

    tokio::time::advance(TTL - Duration::from_secs(1)).await;
    assert!(cache.is_cached(&about));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(!cache.is_cached(&about));
    cache.get(&about).await.unwrap();
    assert_eq!(store.calls(StoreOp::FindPage), 2);
}

#[tokio::test]
async fn stored_values_win_over_defaults() {
    let store = Arc::new(InMemoryStore::new());
    store
        .upsert_page(
            &path("/services"),
            &UpdatePage::from_seo(SeoFields {
                meta_title: Some("Services | Agency".into()),
                ..Default::default()
            }),
            &Actor::default(),
        )
        .await
        .unwrap();
    let cache = cache_over(store);

    let seo = cache.get(&path("/services")).await.unwrap();
    assert_eq!(seo.fields.meta_title.as_deref(), Some("Services | Agency"));
    assert!(!seo.is_defaulted(SeoField::MetaTitle));
    assert!(seo.is_defaulted(SeoField::MetaDescription));
    assert_eq!(
        seo.fields.canonical_url.as_deref(),
        Some("https://www.example.com/services")
    );
}

#[tokio::test]
async fn defaults_are_never_written_back() {
    let store = Arc::new(InMemoryStore::new());
    let cache = cache_over(store.clone());

    let seo = cache.get(&path("/about")).await.unwrap();
    assert!(seo.fields.meta_description.is_some());
    assert!(seo.is_defaulted(SeoField::MetaDescription));

    cache.save_resolved(&seo, &Actor::user(1)).await.unwrap();

    let raw = store.find_page(&path("/about")).await.unwrap().unwrap();
    assert!(raw.meta_description.is_none());
    assert!(raw.meta_title.is_none());
    assert!(raw.canonical_url.is_none());
}

#[tokio::test]
async fn save_invalidates_and_returns_fresh_value() {
    let store = Arc::new(InMemoryStore::new());
    let cache = cache_over(store.clone());
    cache.get(&path("/blog")).await.unwrap();

    let saved = cache
        .save(
            &path("/blog"),
            &SeoFields {
                meta_title: Some("Insights".into()),
                keywords: Some(vec!["marketing".into()]),
                ..Default::default()
            },
            &Actor::user(1),
        )
        .await
        .unwrap();

    assert_eq!(saved.fields.meta_title.as_deref(), Some("Insights"));
    assert!(!saved.is_defaulted(SeoField::Keywords));
    assert_eq!(store.calls(StoreOp::FindPage), 2);
    assert_eq!(cache.get(&path("/blog")).await.unwrap(), saved);

    let actions: Vec<String> = store
        .list_activity(5)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.action)
        .collect();
    assert_eq!(actions, ["seo.update"]);
}

#[tokio::test]
async fn any_violation_rejects_the_whole_set() {
    let store = Arc::new(InMemoryStore::new());
    let cache = cache_over(store.clone());

    let err = cache
        .save(
            &path("/contact"),
            &SeoFields {
                meta_title: Some("Contact".into()),
                robots: Some("sometimes".into()),
                ..Default::default()
            },
            &Actor::user(1),
        )
        .await
        .unwrap_err();

    let ContentError::Validation(violations) = err else {
        panic!("expected a validation error");
    };
    assert!(violations.has_field("robots"));
    assert!(!violations.has_field("meta_title"));
    assert_eq!(store.calls(StoreOp::UpsertPage), 0);
}

#[tokio::test]
async fn backend_failure_is_reported() {
    let store = Arc::new(InMemoryStore::new());
    let cache = cache_over(store.clone());
    store.fail_next(StoreOp::FindPage, unavailable());

    assert_matches!(
        cache.get(&path("/")).await,
        Err(ContentError::Backend(_))
    );
    assert!(!cache.is_cached(&path("/")));
}

#[tokio::test]
async fn page_changes_invalidate_watched_cache() {
    let bus = Arc::new(ChangeBus::default());
    let store = Arc::new(InMemoryStore::with_feed(bus.clone()));
    let cache = cache_over(store.clone());
    let _subscription = cache.watch(bus.as_ref()).unwrap();

    cache.get(&path("/about")).await.unwrap();
    assert!(cache.is_cached(&path("/about")));

    store
        .upsert_page(&path("/about"), &titled("About"), &other_actor())
        .await
        .unwrap();

    wait_until(|| !cache.is_cached(&path("/about"))).await;
}

#[tokio::test]
async fn cleared_field_falls_back_to_default() {
    let store = Arc::new(InMemoryStore::new());
    let cache = cache_over(store.clone());
    let about = path("/about");
    let default_description = SeoDefaults::new("https://www.example.com")
        .for_path(&about)
        .meta_description;

    cache
        .save(
            &about,
            &SeoFields {
                meta_description: Some("Bespoke description".into()),
                ..Default::default()
            },
            &Actor::user(1),
        )
        .await
        .unwrap();
    let cleared = cache
        .save(
            &about,
            &SeoFields {
                meta_description: Some(String::new()),
                ..Default::default()
            },
            &Actor::user(1),
        )
        .await
        .unwrap();

    assert_eq!(cleared.fields.meta_description, default_description);
    assert!(cleared.is_defaulted(SeoField::MetaDescription));
    let raw = store.find_page(&about).await.unwrap().unwrap();
    assert_eq!(raw.meta_description.as_deref(), Some(""));
}

#[tokio::test]
async fn read_started_before_save_does_not_repopulate_cache() {
    let store = Arc::new(GatedStore::new(InMemoryStore::new()));
    let about = path("/about");
    store
        .inner
        .upsert_page(
            &about,
            &UpdatePage::from_seo(SeoFields {
                meta_title: Some("Old".into()),
                ..Default::default()
            }),
            &Actor::default(),
        )
        .await
        .unwrap();
    let cache = Arc::new(SeoCache::new(
        store.clone(),
        SeoDefaults::new("https://www.example.com"),
        TTL,
    ));

    let gate = store.hold(StoreOp::FindPage);
    let reader = tokio::spawn({
        let cache = cache.clone();
        let about = about.clone();
        async move { cache.get(&about).await }
    });
    wait_until(|| store.inner.calls(StoreOp::FindPage) == 1).await;

    let saved = cache
        .save(
            &about,
            &SeoFields {
                meta_title: Some("New".into()),
                ..Default::default()
            },
            &Actor::user(1),
        )
        .await
        .unwrap();
    assert_eq!(saved.fields.meta_title.as_deref(), Some("New"));

    gate.send(()).unwrap();
    let stale = reader.await.unwrap().unwrap();
    assert_eq!(stale.fields.meta_title.as_deref(), Some("Old"));

    let next = cache.get(&about).await.unwrap();
    assert_eq!(next.fields.meta_title.as_deref(), Some("New"));
}
