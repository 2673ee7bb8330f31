use std::ops::Deref;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use crate::core::error::{Error, Result};
use crate::core::stats::{Lifecycle, SearcherStats};
use crate::core::types::DocId;
use crate::index::view::IndexView;
use crate::memory::low_memory::{LowMemoryHandler, LowMemoryNotifier, LowMemoryRegistration};
use crate::reader::disposal::DisposalSignal;
use crate::reader::term_cache::{DecodedTermCache, FieldSet, FieldTermCache, IndexEntries, StoredValueSet};
use crate::schema::SortType;

const LIVE: u8 = 0;
const SUPERSEDED: u8 = 1;
const RELEASED: u8 = 2;

struct CachedValues {
    fields: Arc<[String]>,
    values: Arc<StoredValueSet>,
}

/// One generation of the index view plus the caches derived from it.
///
/// Readers hold a generation through `SearcherHandle`s. Once the generation is
/// superseded, the reader that drops usage to zero closes the view; the
/// Superseded -> Released transition is a single compare-and-swap so teardown
/// runs exactly once.
pub struct SearcherState {
    generation: u64,
    view: Arc<dyn IndexView>,
    created_at: DateTime<Utc>,

    usage: AtomicUsize,
    lifecycle: AtomicU8,
    disposed: OnceCell<DisposalSignal>,
    registration: Mutex<Option<LowMemoryRegistration>>,

    // Taken exclusively only to clear everything on low memory
    cache_lock: RwLock<()>,
    term_cache: DashMap<String, Arc<FieldTermCache>>,
    decoded_cache: DashMap<(String, SortType), Arc<DecodedTermCache>>,
    value_cache: DashMap<(DocId, u32), CachedValues>,
    facet_usage: DashMap<String, DateTime<Utc>>,
    full_term_data: OnceCell<Arc<IndexEntries>>,
}

impl SearcherState {
    pub fn new(generation: u64, view: Arc<dyn IndexView>, notifier: Option<&LowMemoryNotifier>) -> Arc<Self> {
        let state = Arc::new(SearcherState {
            generation,
            view,
            created_at: Utc::now(),
            usage: AtomicUsize::new(0),
            lifecycle: AtomicU8::new(LIVE),
            disposed: OnceCell::new(),
            registration: Mutex::new(None),
            cache_lock: RwLock::new(()),
            term_cache: DashMap::new(),
            decoded_cache: DashMap::new(),
            value_cache: DashMap::new(),
            facet_usage: DashMap::new(),
            full_term_data: OnceCell::new(),
        });

        if let Some(notifier) = notifier {
            let strong: Arc<dyn LowMemoryHandler> = state.clone();
            let handler: Weak<dyn LowMemoryHandler> = Arc::downgrade(&strong);
            *state.registration.lock() = Some(notifier.register(handler));
        }
        state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn usage(&self) -> usize {
        self.usage.load(Ordering::SeqCst)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.lifecycle.load(Ordering::SeqCst) {
            LIVE => Lifecycle::Live,
            SUPERSEDED => Lifecycle::Superseded,
            _ => Lifecycle::Released,
        }
    }

    pub fn is_disposal_requested(&self) -> bool {
        self.lifecycle.load(Ordering::SeqCst) != LIVE
    }

    pub fn acquire(&self) {
        self.usage.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop one unit of usage. The release that drains a superseded
    /// generation to zero performs teardown.
    pub fn release(&self) {
        let previous = self
            .usage
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |usage| usage.checked_sub(1));

        match previous {
            Ok(1) => self.try_teardown(),
            Ok(_) => {}
            Err(_) => {
                tracing::error!(
                    target: "gendex::searcher",
                    generation = self.generation,
                    "Release without matching acquire ignored"
                );
            }
        }
    }

    /// Take a hold on this generation if it is still current
    pub fn try_hold(self: &Arc<Self>) -> Option<SearcherHandle> {
        self.acquire();
        if self.is_disposal_requested() {
            self.release();
            return None;
        }
        Some(SearcherHandle { state: self.clone() })
    }

    /// Request disposal. Teardown happens now if nobody holds the generation,
    /// otherwise when the last holder releases it.
    ///
    /// With `wait`, returns a signal completed once the view is closed.
    pub fn mark_for_disposal(&self, wait: bool) -> Option<DisposalSignal> {
        let signal = wait.then(|| self.disposed.get_or_init(DisposalSignal::new).clone());

        // Hold across the transition so only a release can observe the zero crossing
        self.acquire();
        let _ = self
            .lifecycle
            .compare_exchange(LIVE, SUPERSEDED, Ordering::SeqCst, Ordering::SeqCst);
        self.release();

        if let Some(signal) = &signal {
            if self.lifecycle() == Lifecycle::Released {
                signal.notify();
            }
        }
        signal
    }

    fn try_teardown(&self) {
        if self
            .lifecycle
            .compare_exchange(SUPERSEDED, RELEASED, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        self.registration.lock().take();
        self.clear_caches();

        if let Err(e) = self.view.close() {
            tracing::warn!(
                target: "gendex::searcher",
                generation = self.generation,
                error = %e,
                "Failed to close index view"
            );
        }

        if let Some(signal) = self.disposed.get() {
            signal.notify();
        }

        tracing::debug!(
            target: "gendex::searcher",
            generation = self.generation,
            "Index generation released"
        );
    }

    fn clear_caches(&self) {
        let _exclusive = self.cache_lock.write();
        self.facet_usage.clear();
        self.term_cache.clear();
        self.decoded_cache.clear();
        self.value_cache.clear();
    }

    /// Timestamp a facet field access for pre-warm selection
    pub fn record_facet_usage(&self, field: &str) {
        let now = Utc::now();
        let _shared = self.cache_lock.read();
        self.facet_usage
            .entry(field.to_string())
            .and_modify(|last| {
                if now > *last {
                    *last = now;
                }
            })
            .or_insert(now);
    }

    /// Facet fields accessed within `max_age`
    pub fn used_facets(&self, max_age: Duration) -> Vec<String> {
        let now = Utc::now();
        let _shared = self.cache_lock.read();
        let max_age = chrono::Duration::from_std(max_age).ok();
        self.facet_usage
            .iter()
            .filter(|entry| {
                let age = now.signed_duration_since(*entry.value());
                max_age.is_none_or(|max_age| age < max_age)
            })
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Records usage of `field` and reports whether its term cache is built
    pub fn is_in_cache(&self, field: &str) -> bool {
        self.record_facet_usage(field);
        let _shared = self.cache_lock.read();
        self.term_cache.contains_key(field)
    }

    /// Per-document terms of `field`, scanning postings on first use
    pub fn get_or_build_term_cache(&self, field: &str) -> Result<Arc<FieldTermCache>> {
        let _shared = self.cache_lock.read();
        if let Some(cache) = self.term_cache.get(field) {
            return Ok(Arc::clone(cache.value()));
        }

        let built = Arc::new(FieldTermCache::build(self.view.as_ref(), field)?);
        let resident = self.term_cache.entry(field.to_string()).or_insert(built);
        Ok(Arc::clone(resident.value()))
    }

    /// Numeric values of `field` decoded as `sort_type`, built from its term cache on first use
    pub fn get_or_build_decoded_terms(&self, field: &str, sort_type: SortType) -> Result<Arc<DecodedTermCache>> {
        let terms = self.get_or_build_term_cache(field)?;
        let key = (field.to_string(), sort_type);
        let _shared = self.cache_lock.read();
        if let Some(cache) = self.decoded_cache.get(&key) {
            return Ok(Arc::clone(cache.value()));
        }

        let built = Arc::new(DecodedTermCache::build(&terms, sort_type)?);
        let resident = self.decoded_cache.entry(key).or_insert(built);
        Ok(Arc::clone(resident.value()))
    }

    /// Install a term table built elsewhere. An already cached table wins and is returned.
    pub fn set_term_cache(&self, field: &str, data: FieldTermCache) -> Arc<FieldTermCache> {
        let _shared = self.cache_lock.read();
        let resident = self
            .term_cache
            .entry(field.to_string())
            .or_insert_with(|| Arc::new(data));
        Arc::clone(resident.value())
    }

    pub fn cached_fields<S: AsRef<str>>(&self, fields: &[S]) -> Vec<(String, Option<Arc<FieldTermCache>>)> {
        let _shared = self.cache_lock.read();
        fields
            .iter()
            .map(|field| {
                let field = field.as_ref();
                let cached = self.term_cache.get(field).map(|c| Arc::clone(c.value()));
                (field.to_string(), cached)
            })
            .collect()
    }

    /// Distinct stored values of `doc` across `fields`, cached per (doc, field set)
    pub fn get_or_build_field_values<S: AsRef<str>>(&self, doc: DocId, fields: &[S]) -> Result<Arc<StoredValueSet>> {
        let field_set = FieldSet::new(fields);
        let key = (doc, field_set.crc);
        let _shared = self.cache_lock.read();

        let mut collided = false;
        if let Some(cached) = self.value_cache.get(&key) {
            if cached.fields == field_set.fields {
                return Ok(Arc::clone(&cached.values));
            }
            collided = true;
        }

        let mut values = Vec::new();
        for field in field_set.fields.iter() {
            values.extend(self.view.stored_values(doc, field)?);
        }
        let values = Arc::new(StoredValueSet::new(values).map_err(|e| {
            Error::configuration(format!(
                "{} (document {}, fields {})",
                e.context,
                doc.0,
                field_set.fields.join(", ")
            ))
        })?);

        // A different field set owns this key; serve uncached rather than evict it
        if collided {
            return Ok(values);
        }

        let resident = self.value_cache.entry(key).or_insert(CachedValues {
            fields: field_set.fields.clone(),
            values,
        });
        Ok(Arc::clone(&resident.values))
    }

    /// Every document's full field map, built once per generation
    pub fn full_term_data(&self) -> Result<Arc<IndexEntries>> {
        self.full_term_data
            .get_or_try_init(|| IndexEntries::build(self.view.as_ref()).map(Arc::new))
            .cloned()
    }

    pub fn stats(&self) -> SearcherStats {
        SearcherStats {
            generation: self.generation,
            lifecycle: self.lifecycle(),
            usage: self.usage(),
            created_at: self.created_at,
            cached_term_fields: self.term_cache.len(),
            cached_decoded_fields: self.decoded_cache.len(),
            cached_field_values: self.value_cache.len(),
            tracked_facets: self.facet_usage.len(),
            has_full_term_data: self.full_term_data.get().is_some(),
        }
    }
}

impl LowMemoryHandler for SearcherState {
    /// Drop every derived cache; the index view is left alone
    fn handle_low_memory(&self) {
        self.clear_caches();
        tracing::debug!(
            target: "gendex::searcher",
            generation = self.generation,
            "Cleared searcher caches on low memory"
        );
    }
}

/// A held generation. Dropping it releases the hold.
pub struct SearcherHandle {
    state: Arc<SearcherState>,
}

impl SearcherHandle {
    pub fn view(&self) -> &dyn IndexView {
        self.state.view.as_ref()
    }

    pub fn state(&self) -> &Arc<SearcherState> {
        &self.state
    }
}

impl Deref for SearcherHandle {
    type Target = SearcherState;

    fn deref(&self) -> &SearcherState {
        &self.state
    }
}

impl Drop for SearcherHandle {
    fn drop(&mut self) {
        self.state.release();
    }
}
