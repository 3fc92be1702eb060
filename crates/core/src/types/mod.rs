//! Core types for Pricewatch.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the console and its data-service adapters.

pub mod email;
pub mod envelope;
pub mod id;
pub mod offer;
pub mod price;
pub mod user;

pub use email::{Email, EmailError};
pub use envelope::{Envelope, ServiceError, ServiceErrorKind};
pub use id::*;
pub use offer::{CatalogueOption, Offer, PricePoint, SearchFilters, SearchResult};
pub use price::{Price, PriceError};
pub use user::{AuthPayload, Confirmation, Favorite, User};
