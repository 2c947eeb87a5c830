//! Type definitions for batches and their scores

pub mod batch;
pub mod scored;

pub use batch::{Record, TransactionBatch};
pub use scored::{ResultLayout, ScoredBatch, ScoredRecord, Verdict};
