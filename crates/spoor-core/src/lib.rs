//! Core types and trait definitions for the spoor persona store.
//!
//! This crate is deliberately free of database and archive dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in trait impls (stabilised in Rust
// 1.75). Suppress the advisory lint about `Send` bounds on returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod history;
pub mod id;
pub mod insight;
pub mod persona;
pub mod store;
pub mod time;

pub use error::{Error, Result};
