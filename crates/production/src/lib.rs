//! Production domain module.
//!
//! Batch lifecycle rules: `pending → in-progress → {completed | failed |
//! cancelled}`. Completion is the only transition with a stock effect, and
//! it happens at most once per batch.

pub mod batch;

pub use batch::{
    Batch, BatchStatus, CheckResult, NewBatch, QualityCheckUpdate, QualityChecks,
};
