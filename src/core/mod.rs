//! Core contracts and types for the muster engine.
//!
//! This module holds the pieces everything else is built on:
//!
//! - [`source`] - the [`DataSource`] trait: how a remote source identifies
//!   itself (`kind`/`identity`) and fetches its value, individually or as a
//!   same-kind batch.
//! - [`value`] - the [`FetchValue`] capability: what the engine needs from
//!   its value type to build and iterate sequences (`collect`/`traverse`).
//! - [`error`] - [`MusterError`], the typed failure taxonomy surfaced
//!   through `anyhow` context chains.
//!
//! The contracts here are deliberately narrow. A source knows nothing about
//! rounds, caching, or grouping; the engine knows nothing about wire
//! protocols or retry policy. Everything the interpreter does is derived
//! from `(kind, identity)` plus the two fetch entry points.

pub mod error;
pub mod source;
pub mod value;

pub use error::MusterError;
pub use source::{DataSource, Key, Kind};
pub use value::FetchValue;
