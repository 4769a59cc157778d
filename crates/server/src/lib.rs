//! Thimble storefront API server.
//!
//! Identity, authorization, cart, and checkout for the Thimble Goods
//! storefront, exposed as a JSON API over axum.
//!
//! # Architecture
//!
//! - `routes` - HTTP handlers; thin adapters over the service layer
//! - `services` - business operations, one module per concern
//! - `store` - persistence behind the [`store::Store`] trait
//! - `payments` / `mail` - external collaborators behind traits
//! - `middleware` - session cookie plumbing and caller resolution
//!
//! Every operation runs against a [`context::RequestContext`] carrying the
//! resolved caller and handles to the collaborators, so the whole engine is
//! testable without a database, a gateway, or an SMTP relay.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod context;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
