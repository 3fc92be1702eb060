//! The price data service: the console's only external data source.
//!
//! # Architecture
//!
//! - [`DataService`] is the port: one async method per remote operation, each
//!   returning the result envelope as `Result<T, ServiceError>`
//! - [`MockDataService`] is a deterministic in-memory catalogue used by default
//!   and in tests
//! - [`HttpDataService`] talks to a REST backend with `reqwest`, caching
//!   categories and brands with `moka`
//!
//! Adapters never let a raw transport failure escape: everything is folded
//! into a [`ServiceError`].

mod cache;
mod http;
mod mock;

use std::future::Future;

use pricewatch_core::{
    AuthPayload, CatalogueOption, Confirmation, Email, Favorite, Price, PricePoint, ProductId,
    SearchFilters, SearchResult, ServiceError, UserId,
};
use secrecy::SecretString;

pub use http::HttpDataService;
pub use mock::{MockDataService, ServiceCall, ServiceOp};

/// Outcome of a single data-service call.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Contract of the external price data service.
pub trait DataService: Send + Sync + 'static {
    /// Offers from every delivery service for the product best matching `query`.
    fn fetch_offers(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> impl Future<Output = ServiceResult<SearchResult>> + Send;

    fn fetch_categories(&self) -> impl Future<Output = ServiceResult<Vec<CatalogueOption>>> + Send;

    fn fetch_brands(&self) -> impl Future<Output = ServiceResult<Vec<CatalogueOption>>> + Send;

    /// Chronologically ordered price observations for a product.
    fn fetch_price_history(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = ServiceResult<Vec<PricePoint>>> + Send;

    fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = ServiceResult<AuthPayload>> + Send;

    /// Always creates a new identity.
    fn register(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = ServiceResult<AuthPayload>> + Send;

    fn fetch_favorites(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = ServiceResult<Vec<Favorite>>> + Send;

    /// Adding an id that is already a favorite is a no-op.
    fn add_favorite(
        &self,
        product_id: &ProductId,
        product_name: &str,
        user_id: &UserId,
    ) -> impl Future<Output = ServiceResult<Confirmation>> + Send;

    fn remove_favorite(
        &self,
        product_id: &ProductId,
        user_id: &UserId,
    ) -> impl Future<Output = ServiceResult<Confirmation>> + Send;

    fn create_alert(
        &self,
        product_id: &ProductId,
        target_price: Price,
        user_id: &UserId,
    ) -> impl Future<Output = ServiceResult<Confirmation>> + Send;

    /// Drop any credentials remembered from a previous login. Local only.
    fn forget_session(&self) {}
}
