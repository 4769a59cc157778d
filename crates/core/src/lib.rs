//! Thimble Core - Shared domain types.
//!
//! This crate provides the common types used by the Thimble storefront
//! server: type-safe IDs, validated email addresses, the permission enum,
//! and integer money.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. The optional `postgres` feature adds sqlx column encodings so the
//! server's Postgres store can bind these types directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
