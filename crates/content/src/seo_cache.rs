//! Read-through cache of resolved SEO metadata, keyed by page path.
//!
//! Entries are served for the configured freshness window, then refetched
//! on the next access. Stored values are backfilled from the static
//! per-path default table at read time; defaults are never persisted.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use pagewright_core::page_path::PagePath;
use pagewright_core::seo::{validate_seo, ResolvedSeo, SeoDefaults, SeoFields};
use pagewright_db::models::activity_log::CreateActivityLog;
use pagewright_db::models::page::UpdatePage;
use pagewright_events::{ChangeFeed, ChangeFilter, Resource, SubscribeError, Subscription};
use tokio::time::Instant;

use crate::error::ContentError;
use crate::resource;
use crate::store::{Actor, ContentStore};

struct CacheEntry {
    seo: ResolvedSeo,
    fetched_at: Instant,
}

#[derive(Default)]
struct Entries {
    cached: HashMap<PagePath, CacheEntry>,
    /// Bumped per path by every invalidation. A fetch that started under an
    /// older generation must not populate the cache.
    generations: HashMap<PagePath, u64>,
}

impl Entries {
    fn generation(&self, path: &PagePath) -> u64 {
        self.generations.get(path).copied().unwrap_or_default()
    }
}

pub struct SeoCache {
    store: Arc<dyn ContentStore>,
    defaults: SeoDefaults,
    ttl: Duration,
    entries: RwLock<Entries>,
}

impl SeoCache {
    pub fn new(store: Arc<dyn ContentStore>, defaults: SeoDefaults, ttl: Duration) -> Self {
        Self {
            store,
            defaults,
            ttl,
            entries: RwLock::default(),
        }
    }

    /// Resolved SEO for `path`, from cache when fresh.
    pub async fn get(&self, path: &PagePath) -> Result<ResolvedSeo, ContentError> {
        if let Some(seo) = self.fresh(path) {
            return Ok(seo);
        }
        let generation = self.read_entries().generation(path);

        let stored = self
            .store
            .find_page(path)
            .await?
            .map(|page| page.seo())
            .unwrap_or_default();
        let seo = ResolvedSeo::resolve(path.clone(), stored, &self.defaults.for_path(path));

        let mut entries = self.write_entries();
        if entries.generation(path) == generation {
            entries.cached.insert(
                path.clone(),
                CacheEntry {
                    seo: seo.clone(),
                    fetched_at: Instant::now(),
                },
            );
        } else {
            tracing::debug!(page_path = %path, "SEO entry invalidated during fetch, not cached");
        }
        Ok(seo)
    }

    /// Validate and persist `fields` for `path`. Any violation rejects the
    /// whole set. The entry is invalidated so the returned value, and every
    /// later read, is fresh.
    pub async fn save(
        &self,
        path: &PagePath,
        fields: &SeoFields,
        actor: &Actor,
    ) -> Result<ResolvedSeo, ContentError> {
        validate_seo(fields)?;
        resource::upsert_page(
            self.store.as_ref(),
            path,
            &UpdatePage::from_seo(fields.clone()),
            actor,
        )
        .await?;
        self.invalidate(path);

        resource::record_activity(
            self.store.as_ref(),
            CreateActivityLog::new(actor.user_id, "seo.update", "page", Some(path.to_string())),
        )
        .await;

        self.get(path).await
    }

    /// Persist a previously read value. Only the stored part is written,
    /// never the backfilled defaults.
    pub async fn save_resolved(
        &self,
        seo: &ResolvedSeo,
        actor: &Actor,
    ) -> Result<ResolvedSeo, ContentError> {
        self.save(&seo.page_path, seo.stored(), actor).await
    }

    pub fn invalidate(&self, path: &PagePath) {
        let mut entries = self.write_entries();
        entries.cached.remove(path);
        *entries.generations.entry(path.clone()).or_default() += 1;
    }

    pub fn is_cached(&self, path: &PagePath) -> bool {
        self.fresh(path).is_some()
    }

    /// Invalidate entries whenever their page record changes on `feed`.
    pub fn watch(self: &Arc<Self>, feed: &dyn ChangeFeed) -> Result<Subscription, SubscribeError> {
        let cache = Arc::downgrade(self);
        feed.subscribe(
            ChangeFilter::resource(Resource::Pages),
            Arc::new(move |event| {
                if let Some(cache) = cache.upgrade() {
                    cache.invalidate(&event.page_path);
                }
            }),
        )
    }

    fn fresh(&self, path: &PagePath) -> Option<ResolvedSeo> {
        self.read_entries()
            .cached
            .get(path)
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.seo.clone())
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
