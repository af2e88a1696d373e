//! Core types and trait definitions for the NavOptima vessel-performance
//! warehouse.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! loader and the storage backends depend on it; it depends on nothing else
//! in the workspace.

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// returned futures in `warehouse`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod fact;
pub mod run;
pub mod telemetry;
pub mod vessel;
pub mod warehouse;
pub mod weather;

pub use error::{Error, Result};
