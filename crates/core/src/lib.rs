//! Pricewatch Core - Shared types library.
//!
//! This crate provides common types used across all Pricewatch components:
//! - `console` - State stores, controllers and view rendering
//! - `cli` - The interactive `pw` binary
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! Data-service adapters and the console both speak in these types, so the
//! wire contract lives in exactly one place.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, offers, favorites and the result envelope

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
