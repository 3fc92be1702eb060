//! Cache types for catalogue responses.

use pricewatch_core::CatalogueOption;

/// Cache key for filter option lists.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Brands,
}

impl CacheKey {
    /// Endpoint path serving this list.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Brands => "brands",
        }
    }
}

/// Cached value type.
pub type CacheValue = Vec<CatalogueOption>;
