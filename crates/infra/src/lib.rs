//! `creamery-infra` — services, scheduled jobs and wiring.
//!
//! This crate composes the pure domain crates with the record store and the
//! notification sink. Services own all persistence and concurrency control;
//! domain entities stay oblivious to both.

pub mod collections;
pub mod jobs;
pub mod services;


pub use services::{
    ClientLedger, FulfillmentService, InvoicingService, ProductionService, StockLedger,
};
