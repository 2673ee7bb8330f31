use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use arc_swap::ArcSwap;
use crossbeam::channel;
use parking_lot::Mutex;
use rayon::prelude::*;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::HolderStats;
use crate::index::view::{IndexOpener, IndexView};
use crate::memory::low_memory::LowMemoryNotifier;
use crate::reader::disposal::DisposalSignal;
use crate::reader::searcher_state::{SearcherHandle, SearcherState};
use crate::reader::term_cache::IndexEntries;

/// Owns the current generation of one index.
///
/// Readers check out the current generation without taking a lock; index
/// commits install a new one with `swap`, which retires the previous
/// generation once its readers are done.
pub struct SearcherHolder {
    index_name: String,
    config: Config,
    current: ArcSwap<SearcherState>,
    next_generation: AtomicU64,
    notifier: LowMemoryNotifier,
    swap_lock: Mutex<()>,
}

impl SearcherHolder {
    pub fn new(
        index_name: &str,
        initial: Arc<dyn IndexView>,
        config: Config,
        notifier: LowMemoryNotifier,
    ) -> Self {
        let state = SearcherState::new(0, initial, Some(&notifier));
        SearcherHolder {
            index_name: index_name.to_string(),
            config,
            current: ArcSwap::new(state),
            next_generation: AtomicU64::new(1),
            notifier,
            swap_lock: Mutex::new(()),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn notifier(&self) -> &LowMemoryNotifier {
        &self.notifier
    }

    pub fn current_generation(&self) -> u64 {
        self.current.load().generation()
    }

    /// Install `view` as the current generation.
    ///
    /// Facets recently queried on the old generation are pre-warmed on the new
    /// one, waiting at most the configured time. The old generation is then
    /// marked for disposal; with `wait_for_disposal` the returned signal fires
    /// once its view is closed.
    pub fn swap(&self, view: Arc<dyn IndexView>, wait_for_disposal: bool) -> Option<DisposalSignal> {
        let _writer = self.swap_lock.lock();

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let state = SearcherState::new(generation, view, Some(&self.notifier));
        let old = self.current.swap(state.clone());

        tracing::info!(
            target: "gendex::searcher",
            index = %self.index_name,
            generation,
            previous = old.generation(),
            "Installed new index generation"
        );

        self.prewarm(&old, &state);
        old.mark_for_disposal(wait_for_disposal)
    }

    /// Open a new generation and install it. If opening fails the current
    /// generation stays in place and a resource error is returned.
    pub fn swap_from(&self, opener: &dyn IndexOpener, wait_for_disposal: bool) -> Result<Option<DisposalSignal>> {
        let view = opener.open().map_err(|e| {
            tracing::warn!(
                target: "gendex::searcher",
                index = %self.index_name,
                error = %e,
                "Failed to open new index generation, keeping current"
            );
            Error::resource(format!(
                "Failed to open new generation of index {}: {}",
                self.index_name, e.context
            ))
        })?;
        Ok(self.swap(view, wait_for_disposal))
    }

    fn prewarm(&self, old: &SearcherState, new: &Arc<SearcherState>) {
        let max_age = self.config.prewarm_facets_max_age();
        if max_age.is_zero() {
            return;
        }

        let fields = old.used_facets(max_age);
        if fields.is_empty() {
            return;
        }

        let Some(handle) = new.try_hold() else {
            return;
        };

        let (done_tx, done_rx) = channel::bounded::<()>(1);
        let index_name = self.index_name.clone();

        rayon::spawn(move || {
            let started = Instant::now();
            let result: Result<()> = fields
                .par_iter()
                .try_for_each(|field| handle.get_or_build_term_cache(field).map(|_| ()));

            if let Err(e) = result {
                tracing::warn!(
                    target: "gendex::searcher",
                    index = %index_name,
                    facets = %fields.join(","),
                    error = %e,
                    "Failed to properly pre-warm the facets cache"
                );
            }
            tracing::debug!(
                target: "gendex::searcher",
                index = %index_name,
                facets = %fields.join(","),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Pre-warming the facet cache finished"
            );
            let _ = done_tx.send(());
        });

        if done_rx.recv_timeout(self.config.prewarm_facets_sync_wait()).is_err() {
            tracing::debug!(
                target: "gendex::searcher",
                index = %self.index_name,
                "Pre-warm still running, continuing in background"
            );
        }
    }

    /// Hold the current generation.
    ///
    /// A generation being retired between reading the pointer and taking the
    /// hold is detected and the checkout retried against the new pointer.
    pub fn check_out(&self) -> Result<SearcherHandle> {
        for _ in 0..self.config.checkout_retry_limit.max(1) {
            let state = self.current.load_full();
            if let Some(handle) = state.try_hold() {
                return Ok(handle);
            }
            std::hint::spin_loop();
        }

        Err(Error::new(
            ErrorKind::InvalidState,
            format!(
                "Could not check out a live generation of index {} after {} attempts",
                self.index_name, self.config.checkout_retry_limit
            ),
        ))
    }

    /// Hold the current generation along with every document's full field map
    pub fn check_out_with_full_term_data(&self) -> Result<(SearcherHandle, Arc<IndexEntries>)> {
        let handle = self.check_out()?;
        // On error the handle drops here and releases its hold
        let entries = handle.full_term_data()?;
        Ok((handle, entries))
    }

    /// Forward a memory-pressure notification to every registered generation
    pub fn handle_low_memory(&self) -> usize {
        self.notifier.broadcast()
    }

    pub fn stats(&self) -> HolderStats {
        HolderStats {
            index_name: self.index_name.clone(),
            swaps: self.next_generation.load(Ordering::Relaxed) - 1,
            current: self.current.load().stats(),
            low_memory_handlers: self.notifier.handler_count(),
        }
    }
}

impl Drop for SearcherHolder {
    fn drop(&mut self) {
        self.current.load().mark_for_disposal(false);
    }
}
