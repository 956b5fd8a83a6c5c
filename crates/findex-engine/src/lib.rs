//! Findex indexing engine.
//!
//! Owns the durable record store, the bit-parallel fuzzy matcher, the
//! immutable search index snapshot, and the ingestion coordinator that
//! ties them together.

mod error;
mod fuzzy;
mod ingest;
mod record;
mod search;
mod stats;
mod store;

pub use error::EngineError;
pub use fuzzy::{FuzzyMatch, Pattern};
pub use ingest::{IngestOutcome, IngestProgress, Indexer, RunState};
pub use record::{IndexedRecord, MatchSpan, SearchHit};
pub use search::{SearchConfig, SearchField, SearchIndex};
pub use stats::CorpusStats;
pub use store::{RecordStore, StoreAggregates};
