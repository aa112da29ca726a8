//! Caching front for the content loader.
//!
//! `ContentService` owns every cache it reads through. Listings (with their
//! tag, category and archive indexes) are cached per kind and draft filter,
//! single records per slug, and sidebars are memoized on a fingerprint of the
//! records they were built from.

use std::sync::Arc;

use tracing::debug;

use crate::application::error::AppError;
use crate::application::loader::{ContentLoader, LoadOptions, LoadReport};
use crate::cache::{
    BoundedCache, CacheConfig, CacheError, Clock, ListKey, Memo, RecordKey, SystemClock,
};
use crate::domain::content::{ContentKind, ContentRecord};
use crate::domain::nav::NavTree;
use crate::domain::taxonomy::{MonthCount, TaxonomyIndex};

pub struct ContentService<C = SystemClock> {
    loader: ContentLoader,
    enabled: bool,
    reports: BoundedCache<ListKey, Arc<LoadReport>, C>,
    records: BoundedCache<RecordKey, Arc<ContentRecord>, C>,
    sidebars: Memo<ContentKind, Arc<NavTree>, C>,
}

impl ContentService<SystemClock> {
    pub fn new(loader: ContentLoader, config: &CacheConfig) -> Result<Self, CacheError> {
        Self::with_clock(loader, config, SystemClock)
    }
}

impl<C: Clock + Clone> ContentService<C> {
    pub fn with_clock(
        loader: ContentLoader,
        config: &CacheConfig,
        clock: C,
    ) -> Result<Self, CacheError> {
        config.validate()?;
        Ok(Self {
            loader,
            enabled: config.enabled,
            reports: BoundedCache::with_clock("content_lists", config, clock.clone())?,
            records: BoundedCache::with_clock("content_records", config, clock.clone())?,
            sidebars: Memo::with_clock("content_sidebars", config, clock)?,
        })
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// All records of `kind` plus their aggregates.
    pub async fn list(
        &mut self,
        kind: ContentKind,
        options: &LoadOptions,
    ) -> Result<Arc<LoadReport>, AppError> {
        let key = ListKey {
            kind,
            include_drafts: options.include_drafts,
        };

        if self.enabled
            && !options.force_refresh
            && let Some(report) = self.reports.get(&key)
        {
            debug!(kind = %kind, "serving cached listing");
            return Ok(Arc::clone(report));
        }

        if self.enabled && options.force_refresh {
            self.forget_loaded(kind);
        }

        let report = Arc::new(self.loader.load_all(kind, options).await?);
        if self.enabled {
            self.reports.set(key, Arc::clone(&report));
        }
        Ok(report)
    }

    /// One record by slug, regardless of its draft flag.
    pub async fn get(
        &mut self,
        kind: ContentKind,
        slug: &str,
        force_refresh: bool,
    ) -> Result<Arc<ContentRecord>, AppError> {
        let key = RecordKey::new(kind, slug);

        if self.enabled && !force_refresh {
            if let Some(record) = self.records.get(&key) {
                debug!(kind = %kind, slug, "serving cached record");
                return Ok(Arc::clone(record));
            }
            if let Some(record) = self.find_in_cached_listing(kind, slug) {
                let record = Arc::new(record);
                self.records.set(key, Arc::clone(&record));
                return Ok(record);
            }
        }

        let record = self
            .loader
            .load_one(kind, slug)
            .await?
            .map(Arc::new)
            .ok_or_else(|| AppError::not_found(kind, slug))?;

        if self.enabled {
            self.records.set(key, Arc::clone(&record));
        }
        Ok(record)
    }

    pub async fn tags(
        &mut self,
        kind: ContentKind,
        options: &LoadOptions,
    ) -> Result<TaxonomyIndex, AppError> {
        Ok(self.list(kind, options).await?.tags.clone())
    }

    pub async fn categories(
        &mut self,
        kind: ContentKind,
        options: &LoadOptions,
    ) -> Result<TaxonomyIndex, AppError> {
        Ok(self.list(kind, options).await?.categories.clone())
    }

    pub async fn archive(
        &mut self,
        kind: ContentKind,
        options: &LoadOptions,
    ) -> Result<Vec<MonthCount>, AppError> {
        Ok(self.list(kind, options).await?.archive.clone())
    }

    /// Navigation tree for `kind`, rebuilt only when the slugs, titles or
    /// weights of its records change.
    pub async fn sidebar(
        &mut self,
        kind: ContentKind,
        options: &LoadOptions,
    ) -> Result<Arc<NavTree>, AppError> {
        let report = self.list(kind, options).await?;

        if !self.enabled {
            return Ok(Arc::new(NavTree::build(&report.records)));
        }
        if options.force_refresh {
            self.sidebars.invalidate(&kind);
        }

        let fingerprint: Vec<(&str, &str, Option<i64>)> = report
            .records
            .iter()
            .map(|record| {
                (
                    record.slug.as_str(),
                    record.title(),
                    record.front_matter.weight,
                )
            })
            .collect();

        Ok(self.sidebars.get_or_compute(kind, &fingerprint, || {
            Arc::new(NavTree::build(&report.records))
        }))
    }

    /// Forget everything cached for `kind`.
    pub fn invalidate(&mut self, kind: ContentKind) {
        self.forget_loaded(kind);
        self.sidebars.invalidate(&kind);
        debug!(kind = %kind, "content caches invalidated");
    }

    pub fn clear(&mut self) {
        self.reports.clear();
        self.records.clear();
        self.sidebars.clear();
    }

    /// Drops listings and records of `kind`. Sidebars stay, their memo
    /// rebuilds once the record fingerprint moves.
    fn forget_loaded(&mut self, kind: ContentKind) {
        self.reports.retain(|key, _| key.kind != kind);
        self.records.retain(|key, _| key.kind != kind);
    }

    fn find_in_cached_listing(&self, kind: ContentKind, slug: &str) -> Option<ContentRecord> {
        [true, false].into_iter().find_map(|include_drafts| {
            self.reports
                .peek(&ListKey {
                    kind,
                    include_drafts,
                })
                .and_then(|report| report.find(slug).cloned())
        })
    }
}
