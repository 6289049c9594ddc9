//! `creamery-auth` — caller identity carried into the core.
//!
//! Authentication itself (tokens, sessions) lives outside this repository;
//! every mutating operation receives a [`Principal`] describing who acted.
//! The role→operation policy matrix is the embedding application's concern.

pub mod principal;
pub mod roles;

pub use principal::Principal;
pub use roles::Role;
