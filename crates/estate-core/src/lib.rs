//! Core types, rules and the request-level service of the estate asset
//! engine.
//!
//! Assets belong to properties; every asset change is paired with an
//! append-only history entry. This crate holds no HTTP or database code:
//! storage sits behind [`store::AssetStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod asset;
pub mod auth;
pub mod clock;
pub mod dashboard;
pub mod directory;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod schedule;
pub mod service;
pub mod store;

pub use error::{Error, Result};
pub use service::AssetService;
