//! Pricewatch Console - state sync and orchestration for the price-comparison UI.
//!
//! The console keeps every visible region consistent with the session, the
//! favorites, the comparison set and the latest search, no matter in which
//! order data-service responses arrive.
//!
//! # Architecture
//!
//! ```text
//! Command ──▶ Console::dispatch ──▶ controller ──▶ DataService
//!                                       │
//!                                       ├──▶ stores (session, favorites, comparison)
//!                                       └──▶ views ──▶ Screen regions
//! ```
//!
//! - Stores own the mutable state; controllers are the only writers
//! - Views are pure functions of a [`Snapshot`] and always replace a region
//!   wholesale
//! - Results of a superseded search or of a request issued under a previous
//!   session are dropped, never rendered
//!
//! # Modules
//!
//! - [`service`] - Data-service port, HTTP adapter and mock catalogue
//! - [`stores`] - Session, favorites and comparison stores
//! - [`controllers`] - Search, favorites, alert and session controllers
//! - [`views`] - Region renderers backed by Askama templates
//! - [`screen`] - Named output regions with flash messages
//! - [`chart`] - Price-history chart surface
//! - [`console`] - The facade routing [`Command`]s to controllers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod chart;
pub mod command;
pub mod config;
pub mod console;
pub mod controllers;
pub mod error;
pub mod screen;
pub mod service;
pub mod state;
pub mod stores;
mod sync;
pub mod views;

pub use chart::{ChartSurface, TextChart};
pub use command::{Command, Credentials};
pub use config::{ApiConfig, ConfigError, ConsoleConfig};
pub use console::{Console, Outcome};
pub use controllers::SearchOutcome;
pub use error::{ConsoleError, Result};
pub use screen::{Region, Screen};
pub use service::{DataService, HttpDataService, MockDataService};
pub use state::{AppState, Snapshot};
