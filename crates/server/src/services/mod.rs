//! Business operations, one module per concern.
//!
//! Each function takes a [`crate::context::RequestContext`] and returns a
//! domain value or an `AppError`; HTTP concerns stay in the route layer.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod guard;
pub mod session;
