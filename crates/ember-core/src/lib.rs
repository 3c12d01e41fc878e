//! # ember-core
//!
//! Core types shared by the ember crates.
//!
//! This crate provides:
//! - [`EventArray`] — `[n, 4]` array of `(x, y, timestamp, polarity)` events
//! - [`Column`] — named access to the four event columns
//! - [`Error`] / [`Result`] — the error type used across the workspace

pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{Column, EventArray, EVENT_COLUMNS};
