//! REST adapter for the price data service.
//!
//! Every endpoint answers with the result envelope. Anything that is not a
//! decodable envelope (a dropped connection, a timeout, an HTML error page
//! from a proxy) is normalized into a [`ServiceError`] here, so callers only
//! ever see `Ok(data)` or a service error with a displayable message.

use std::sync::{Arc, Mutex};

use moka::future::Cache;
use pricewatch_core::{
    AuthPayload, CatalogueOption, Confirmation, Email, Envelope, Favorite, Price, PricePoint,
    ProductId, SearchFilters, SearchResult, ServiceError, ServiceErrorKind, UserId,
};
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{DataService, ServiceResult};
use crate::config::ApiConfig;
use crate::sync::lock;

/// Header carrying the static API key.
const API_KEY_HEADER: &str = "X-Api-Key";

/// HTTP client for the price data service.
///
/// Cheap to clone; clones share the connection pool, the catalogue cache and
/// the session token.
#[derive(Clone)]
pub struct HttpDataService {
    inner: Arc<HttpDataServiceInner>,
}

struct HttpDataServiceInner {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<SecretString>,
    /// Bearer token issued by the last successful login or registration.
    session_token: Mutex<Option<SecretString>>,
    catalogue: Cache<CacheKey, CacheValue>,
}

impl HttpDataService {
    /// Create a client for the configured service.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path or the HTTP
    /// client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ServiceError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ServiceError::new(
                ServiceErrorKind::Transport,
                format!("Некорректный адрес сервиса: {}", config.base_url),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ServiceError::new(
                    ServiceErrorKind::Transport,
                    format!("Не удалось создать HTTP-клиент: {e}"),
                )
            })?;

        let catalogue = Cache::builder()
            .max_capacity(8)
            .time_to_live(config.catalogue_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(HttpDataServiceInner {
                client,
                base_url: config.base_url.clone(),
                api_key: config.token.clone(),
                session_token: Mutex::new(None),
                catalogue,
            }),
        })
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> ServiceResult<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ServiceError::new(ServiceErrorKind::Transport, "Некорректный адрес сервиса")
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request;
        if let Some(key) = &self.inner.api_key {
            request = request.header(API_KEY_HEADER, key.expose_secret());
        }
        if let Some(token) = lock(&self.inner.session_token).as_ref() {
            request = request.bearer_auth(token.expose_secret());
        }
        request
    }

    fn remember_session(&self, payload: &AuthPayload) {
        *lock(&self.inner.session_token) = Some(SecretString::from(payload.token.clone()));
    }

    /// Send a request and decode the envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ServiceResult<Envelope<T>> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| transport_error(&e))?;

        match serde_json::from_slice::<Envelope<T>>(&body) {
            Ok(mut envelope) => {
                if !envelope.ok && !status.is_success() {
                    envelope.status = envelope.status.or(Some(status.as_u16()));
                    envelope.error_kind = envelope
                        .error_kind
                        .or(Some(ServiceErrorKind::from_status(status.as_u16())));
                }
                Ok(envelope)
            }
            Err(e) if status.is_success() => {
                error!(
                    error = %e,
                    body = %String::from_utf8_lossy(&body).chars().take(500).collect::<String>(),
                    "Failed to decode data service response"
                );
                Err(
                    ServiceError::new(ServiceErrorKind::Decode, "Некорректный ответ сервиса")
                        .with_status(status.as_u16()),
                )
            }
            Err(_) => {
                warn!(
                    status = %status,
                    body = %String::from_utf8_lossy(&body).chars().take(200).collect::<String>(),
                    "Data service returned non-success status without an envelope"
                );
                Err(ServiceError::new(
                    ServiceErrorKind::from_status(status.as_u16()),
                    format!("Сервис вернул ошибку (HTTP {})", status.as_u16()),
                )
                .with_status(status.as_u16()))
            }
        }
    }

    async fn fetch_catalogue(&self, key: CacheKey) -> ServiceResult<CacheValue> {
        let url = self.endpoint(&[key.path()])?;
        self.send(self.inner.client.get(url)).await?.into_result()
    }

    async fn catalogue(&self, key: CacheKey) -> ServiceResult<CacheValue> {
        if let Some(options) = self.inner.catalogue.get(&key).await {
            debug!(list = key.path(), "Cache hit for catalogue options");
            return Ok(options);
        }

        let options = self.fetch_catalogue(key).await?;
        self.inner.catalogue.insert(key, options.clone()).await;
        Ok(options)
    }
}

fn transport_error(err: &reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        warn!(error = %err, "Data service request timed out");
        return ServiceError::new(
            ServiceErrorKind::Unavailable,
            "Сервис не ответил вовремя. Попробуйте позже.",
        );
    }
    error!(error = %err, "Data service request failed");
    ServiceError::new(
        ServiceErrorKind::Transport,
        "Не удалось связаться с сервисом. Проверьте подключение.",
    )
}

impl DataService for HttpDataService {
    #[instrument(skip(self, filters))]
    async fn fetch_offers(&self, query: &str, filters: &SearchFilters) -> ServiceResult<SearchResult> {
        let mut url = self.endpoint(&["offers"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            if let Some(category) = &filters.category {
                pairs.append_pair("category", category);
            }
            if let Some(brand) = &filters.brand {
                pairs.append_pair("brand", brand);
            }
            if let Some(min) = filters.min_price {
                pairs.append_pair("minPrice", &min.amount().to_string());
            }
            if let Some(max) = filters.max_price {
                pairs.append_pair("maxPrice", &max.amount().to_string());
            }
        }
        self.send(self.inner.client.get(url)).await?.into_result()
    }

    async fn fetch_categories(&self) -> ServiceResult<Vec<CatalogueOption>> {
        self.catalogue(CacheKey::Categories).await
    }

    async fn fetch_brands(&self) -> ServiceResult<Vec<CatalogueOption>> {
        self.catalogue(CacheKey::Brands).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn fetch_price_history(&self, product_id: &ProductId) -> ServiceResult<Vec<PricePoint>> {
        let url = self.endpoint(&["products", product_id.as_str(), "history"])?;
        self.send(self.inner.client.get(url)).await?.into_result()
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &Email, password: &SecretString) -> ServiceResult<AuthPayload> {
        let url = self.endpoint(&["auth", "login"])?;
        let body = json!({ "email": email.as_str(), "password": password.expose_secret() });
        let payload: AuthPayload = self
            .send(self.inner.client.post(url).json(&body))
            .await?
            .into_result()?;
        self.remember_session(&payload);
        Ok(payload)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn register(&self, email: &Email, password: &SecretString) -> ServiceResult<AuthPayload> {
        let url = self.endpoint(&["auth", "register"])?;
        let body = json!({ "email": email.as_str(), "password": password.expose_secret() });
        let payload: AuthPayload = self
            .send(self.inner.client.post(url).json(&body))
            .await?
            .into_result()?;
        self.remember_session(&payload);
        Ok(payload)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn fetch_favorites(&self, user_id: &UserId) -> ServiceResult<Vec<Favorite>> {
        let url = self.endpoint(&["users", user_id.as_str(), "favorites"])?;
        self.send(self.inner.client.get(url)).await?.into_result()
    }

    #[instrument(skip(self), fields(product_id = %product_id, user_id = %user_id))]
    async fn add_favorite(
        &self,
        product_id: &ProductId,
        product_name: &str,
        user_id: &UserId,
    ) -> ServiceResult<Confirmation> {
        let url = self.endpoint(&["users", user_id.as_str(), "favorites"])?;
        let body = json!({ "productId": product_id, "productName": product_name });
        self.send(self.inner.client.post(url).json(&body))
            .await?
            .into_result_or(Confirmation::default)
    }

    #[instrument(skip(self), fields(product_id = %product_id, user_id = %user_id))]
    async fn remove_favorite(
        &self,
        product_id: &ProductId,
        user_id: &UserId,
    ) -> ServiceResult<Confirmation> {
        let url = self.endpoint(&["users", user_id.as_str(), "favorites", product_id.as_str()])?;
        self.send(self.inner.client.delete(url))
            .await?
            .into_result_or(Confirmation::default)
    }

    #[instrument(skip(self), fields(product_id = %product_id, user_id = %user_id))]
    async fn create_alert(
        &self,
        product_id: &ProductId,
        target_price: Price,
        user_id: &UserId,
    ) -> ServiceResult<Confirmation> {
        let url = self.endpoint(&["alerts"])?;
        let body = json!({
            "productId": product_id,
            "targetPrice": target_price,
            "userId": user_id,
        });
        self.send(self.inner.client.post(url).json(&body))
            .await?
            .into_result_or(Confirmation::default)
    }

    fn forget_session(&self) {
        *lock(&self.inner.session_token) = None;
    }
}
