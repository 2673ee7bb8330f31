pub mod core;
pub mod encoding;
pub mod schema;
pub mod index;
pub mod query;
pub mod memory;
pub mod reader;
pub mod search;

pub use crate::core::config::Config;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{DocId, Document, FieldValue};
pub use index::{IndexOpener, IndexView, MemoryIndex};
pub use memory::LowMemoryNotifier;
pub use query::ast::{IndexQuery, Query};
pub use reader::{DisposalSignal, SearcherHandle, SearcherHolder, SearcherState};
pub use schema::{IndexDefinition, SortType, SortTypeLookup};
pub use search::{
    FacetAggregation, FacetDefinition, FacetExecutor, FacetMode, FacetQuery, FacetResult, FacetResults,
    FacetValue, RangeParser, TermSortMode,
};

/*
┌──────────────────────────────────────────────────────────────────────────────────────┐
│                               GENDEX STRUCT ARCHITECTURE                              │
└──────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── READER LAYER ────────────────────────────────────┐
│                                                                                       │
│  ┌─────────────────────────────────────────────────────────────────────────────┐    │
│  │                          struct SearcherHolder                               │    │
│  │  ┌───────────────────────────────────────────────────────────────────────┐  │    │
│  │  │ index_name: String                                                    │  │    │
│  │  │ config: Config                     // Page size, pre-warm, retries    │  │    │
│  │  │ current: ArcSwap<SearcherState>    // Lock-free current generation    │  │    │
│  │  │ next_generation: AtomicU64                                            │  │    │
│  │  │ notifier: LowMemoryNotifier        // Cache eviction broadcast        │  │    │
│  │  │ swap_lock: Mutex<()>               // Single writer for swap          │  │    │
│  │  └───────────────────────────────────────────────────────────────────────┘  │    │
│  └─────────────────────────────────────────────────────────────────────────────┘    │
│                                         │ check_out() / swap()                        │
│                                         ▼                                             │
│  ┌─────────────────────────────────────────────────────────────────────────────┐    │
│  │                          struct SearcherState                                │    │
│  │  ┌───────────────────────────────────────────────────────────────────────┐  │    │
│  │  │ view: Arc<dyn IndexView>           // One immutable generation        │  │    │
│  │  │ usage: AtomicUsize                 // Holders, never below zero       │  │    │
│  │  │ lifecycle: AtomicU8                // Live -> Superseded -> Released  │  │    │
│  │  │ disposed: OnceCell<DisposalSignal> // Fired after view.close()        │  │    │
│  │  │ cache_lock: RwLock<()>             // Exclusive only to clear all     │  │    │
│  │  │ term_cache: DashMap<field, FieldTermCache>                            │  │    │
│  │  │ value_cache: DashMap<(DocId, crc), StoredValueSet>                    │  │    │
│  │  │ facet_usage: DashMap<field, DateTime<Utc>>                            │  │    │
│  │  │ full_term_data: OnceCell<IndexEntries>                                │  │    │
│  │  └───────────────────────────────────────────────────────────────────────┘  │    │
│  └─────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                       │
│  ┌──────────────────────┐  ┌──────────────────────┐  ┌─────────────────────────┐    │
│  │ struct SearcherHandle│  │ struct DisposalSignal│  │ struct LowMemoryNotifier│    │
│  │ • state: Arc<State>  │  │ • done: Mutex<bool>  │  │ • handlers: RwLock<     │    │
│  │ • Drop -> release()  │  │ • cond: Condvar      │  │   HashMap<id, Weak<..>>>│    │
│  └──────────────────────┘  └──────────────────────┘  └─────────────────────────┘    │
└───────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── SEARCH LAYER ────────────────────────────────────┐
│                                                                                       │
│  ┌──────────────────────────┐   ┌───────────────────────┐   ┌────────────────────┐  │
│  │ struct FacetExecutor     │   │ struct FacetDefinition│   │ struct ParsedRange │  │
│  │ • max_page_size: usize   │──▶│ • name / mode         │──▶│ • low / high       │  │
│  │ • sort_types: Arc<dyn    │   │ • aggregation (+field)│   │ • low_inclusive    │  │
│  │   SortTypeLookup>        │   │ • ranges / sort mode  │   │ • high_inclusive   │  │
│  └──────────────────────────┘   └───────────────────────┘   └────────────────────┘  │
│              │                                                                        │
│              ▼                                                                        │
│  ┌──────────────────────────┐   ┌───────────────────────┐                            │
│  │ struct FacetResults      │   │ struct FacetResult    │                            │
│  │ • results: BTreeMap<     │──▶│ • values: Vec<Value>  │                            │
│  │   name, FacetResult>     │   │ • remaining_* counts  │                            │
│  └──────────────────────────┘   └───────────────────────┘                            │
└───────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── INDEX LAYER ─────────────────────────────────────┐
│  trait IndexView            // max_doc, fields, search, for_each_term, stored_values  │
│  struct MemoryIndex         // field -> term -> RoaringBitmap, plus <field>_Range     │
│  struct SortableNumeric     // tag + fixed-width hex, order-preserving                │
└───────────────────────────────────────────────────────────────────────────────────────┘
*/
