//! Clients domain module.
//!
//! Client purchase statistics are a denormalized convenience: they are
//! bumped best-effort when orders are placed and can always be rebuilt
//! exactly from the surviving orders.

pub mod client;

pub use client::{Client, ClientStatus, ClientType, NewClient};
