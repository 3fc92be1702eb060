//! Deterministic in-memory data service.
//!
//! Serves a small grocery catalogue, a user directory and per-user favorites.
//! Latency and failures can be injected, and every call is recorded so tests
//! can assert which operations actually reached the service.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use pricewatch_core::{
    AuthPayload, CatalogueOption, Confirmation, Email, Favorite, Offer, Price, PricePoint,
    ProductId, SearchFilters, SearchResult, ServiceError, ServiceErrorKind, User, UserId,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use uuid::Uuid;

use super::{DataService, ServiceResult};
use crate::sync::lock;

const MIN_PASSWORD_LENGTH: usize = 6;

const SAMOKAT: (&str, &str) = ("Самокат", "https://samokat.ru/");
const LAVKA: (&str, &str) = ("Яндекс Лавка", "https://lavka.yandex.ru/");
const KUPER: (&str, &str) = ("Kuper", "https://kuper.ru/");

/// Identifies a data-service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOp {
    FetchOffers,
    FetchCategories,
    FetchBrands,
    FetchPriceHistory,
    Login,
    Register,
    FetchFavorites,
    AddFavorite,
    RemoveFavorite,
    CreateAlert,
}

/// A call that reached the mock service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCall {
    pub op: ServiceOp,
    /// Main argument of the call (query, product id, email, ...).
    pub detail: String,
}

/// An alert accepted by the mock service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAlert {
    pub product_id: ProductId,
    pub target_price: Price,
    pub user_id: UserId,
}

struct CatalogueProduct {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    brand: &'static str,
    keywords: &'static [&'static str],
    offers: &'static [((&'static str, &'static str), i64)],
    /// Seven daily prices, oldest first.
    history: [i64; 7],
}

const CATALOGUE: &[CatalogueProduct] = &[
    CatalogueProduct {
        id: "milk123",
        name: "Молоко \"Фермерское\" 3.2%",
        category: "dairy",
        brand: "brandA",
        keywords: &["молоко", "milk"],
        offers: &[(SAMOKAT, 199), (LAVKA, 205), (KUPER, 210)],
        history: [210, 207, 205, 203, 201, 199, 198],
    },
    CatalogueProduct {
        id: "bread456",
        name: "Хлеб Бородинский",
        category: "bakery",
        brand: "brandB",
        keywords: &["хлеб", "bread"],
        offers: &[(SAMOKAT, 59), (KUPER, 64)],
        history: [66, 65, 63, 64, 61, 60, 59],
    },
    CatalogueProduct {
        id: "product789",
        name: "Сыр",
        category: "dairy",
        brand: "brandC",
        keywords: &["сыр", "cheese"],
        offers: &[(LAVKA, 349), (KUPER, 339), (SAMOKAT, 359)],
        history: [359, 355, 352, 349, 345, 341, 339],
    },
    CatalogueProduct {
        id: "kefir321",
        name: "Кефир 2.5%",
        category: "dairy",
        brand: "brandA",
        keywords: &["кефир", "kefir"],
        offers: &[(SAMOKAT, 95), (LAVKA, 99)],
        history: [104, 101, 99, 99, 97, 96, 95],
    },
];

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
struct MockState {
    accounts: Vec<Account>,
    favorites: HashMap<UserId, Vec<Favorite>>,
    alerts: Vec<RecordedAlert>,
    calls: Vec<ServiceCall>,
    failures: HashMap<ServiceOp, VecDeque<ServiceError>>,
    query_latency: HashMap<String, Duration>,
}

/// In-memory [`DataService`].
///
/// Cheap to clone; clones share state, so a test can keep one handle for
/// inspection while the console owns another.
#[derive(Clone)]
pub struct MockDataService {
    inner: Arc<MockInner>,
}

struct MockInner {
    latency: Duration,
    /// Midnight (UTC) of the last history day.
    history_anchor: DateTime<Utc>,
    state: Mutex<MockState>,
}

impl Default for MockDataService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDataService {
    /// A mock seeded with the demo user `user@example.com` / `password123`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Like [`MockDataService::new`] with a fixed delay before every answer.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        let accounts = Email::parse("user@example.com")
            .ok()
            .map(|email| Account {
                user: User {
                    id: UserId::new("user123"),
                    name: "Тестовый пользователь".to_owned(),
                    email,
                },
                password: "password123".to_owned(),
            })
            .into_iter()
            .collect();

        Self {
            inner: Arc::new(MockInner {
                latency,
                history_anchor: Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc(),
                state: Mutex::new(MockState {
                    accounts,
                    ..MockState::default()
                }),
            }),
        }
    }

    /// Delay answers to `fetch_offers(query)` by `latency` instead of the default.
    pub fn set_query_latency(&self, query: &str, latency: Duration) {
        lock(&self.inner.state)
            .query_latency
            .insert(query.trim().to_lowercase(), latency);
    }

    /// Make the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: ServiceOp, error: ServiceError) {
        lock(&self.inner.state)
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Every call received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<ServiceCall> {
        lock(&self.inner.state).calls.clone()
    }

    /// Number of calls of `op` received so far.
    #[must_use]
    pub fn call_count(&self, op: ServiceOp) -> usize {
        lock(&self.inner.state)
            .calls
            .iter()
            .filter(|call| call.op == op)
            .count()
    }

    /// Alerts accepted so far.
    #[must_use]
    pub fn alerts(&self) -> Vec<RecordedAlert> {
        lock(&self.inner.state).alerts.clone()
    }

    /// Server-side favorites of `user_id`.
    #[must_use]
    pub fn favorites_of(&self, user_id: &UserId) -> Vec<Favorite> {
        lock(&self.inner.state)
            .favorites
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Record the call, wait, then fail if a failure was injected.
    async fn enter(&self, op: ServiceOp, detail: &str, latency: Duration) -> ServiceResult<()> {
        let injected = {
            let mut state = lock(&self.inner.state);
            state.calls.push(ServiceCall {
                op,
                detail: detail.to_owned(),
            });
            state.failures.get_mut(&op).and_then(VecDeque::pop_front)
        };
        debug!(?op, detail, "mock data service call");

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        injected.map_or(Ok(()), Err)
    }

    fn issue_auth(user: User) -> AuthPayload {
        AuthPayload {
            user,
            token: Uuid::new_v4().simple().to_string(),
        }
    }
}

fn find_product(query: &str) -> Option<&'static CatalogueProduct> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    CATALOGUE.iter().find(|product| {
        product.id == needle
            || product.keywords.iter().any(|keyword| needle.contains(keyword))
            || product.name.to_lowercase().contains(&needle)
    })
}

impl DataService for MockDataService {
    async fn fetch_offers(&self, query: &str, filters: &SearchFilters) -> ServiceResult<SearchResult> {
        let latency = lock(&self.inner.state)
            .query_latency
            .get(&query.trim().to_lowercase())
            .copied()
            .unwrap_or(self.inner.latency);
        self.enter(ServiceOp::FetchOffers, query, latency).await?;

        let Some(product) = find_product(query) else {
            return Ok(SearchResult {
                product_id: ProductId::new(query.trim()),
                product_name: query.trim().to_owned(),
                offers: Vec::new(),
            });
        };

        let category_matches = filters
            .category
            .as_deref()
            .is_none_or(|category| category == product.category);
        let brand_matches = filters
            .brand
            .as_deref()
            .is_none_or(|brand| brand == product.brand);

        let offers = if category_matches && brand_matches {
            product
                .offers
                .iter()
                .map(|((service, url), price)| {
                    Offer::new(*service, Price::from_roubles(*price), *url)
                })
                .filter(|offer| filters.admits_price(offer.price))
                .collect()
        } else {
            Vec::new()
        };

        Ok(SearchResult {
            product_id: ProductId::new(product.id),
            product_name: product.name.to_owned(),
            offers,
        })
    }

    async fn fetch_categories(&self) -> ServiceResult<Vec<CatalogueOption>> {
        self.enter(ServiceOp::FetchCategories, "", self.inner.latency)
            .await?;
        Ok(vec![
            CatalogueOption::new("dairy", "Молочные продукты"),
            CatalogueOption::new("bakery", "Хлебобулочные изделия"),
            CatalogueOption::new("drinks", "Напитки"),
            CatalogueOption::new("fruits", "Фрукты"),
            CatalogueOption::new("vegetables", "Овощи"),
        ])
    }

    async fn fetch_brands(&self) -> ServiceResult<Vec<CatalogueOption>> {
        self.enter(ServiceOp::FetchBrands, "", self.inner.latency)
            .await?;
        Ok(vec![
            CatalogueOption::new("brandA", "Бренд А"),
            CatalogueOption::new("brandB", "Бренд Б"),
            CatalogueOption::new("brandC", "Бренд В"),
        ])
    }

    async fn fetch_price_history(&self, product_id: &ProductId) -> ServiceResult<Vec<PricePoint>> {
        self.enter(
            ServiceOp::FetchPriceHistory,
            product_id.as_str(),
            self.inner.latency,
        )
        .await?;

        let Some(product) = CATALOGUE.iter().find(|p| p.id == product_id.as_str()) else {
            return Ok(Vec::new());
        };

        let anchor = self.inner.history_anchor;
        Ok(product
            .history
            .iter()
            .zip((0_i64..7).rev())
            .map(|(price, days_ago)| PricePoint {
                date: anchor - TimeDelta::days(days_ago),
                price: Price::from_roubles(*price),
            })
            .collect())
    }

    async fn login(&self, email: &Email, password: &SecretString) -> ServiceResult<AuthPayload> {
        self.enter(ServiceOp::Login, email.as_str(), self.inner.latency)
            .await?;

        let state = lock(&self.inner.state);
        state
            .accounts
            .iter()
            .find(|account| {
                account.user.email == *email && account.password == password.expose_secret()
            })
            .map(|account| Self::issue_auth(account.user.clone()))
            .ok_or_else(|| {
                ServiceError::new(ServiceErrorKind::Unauthorized, "Неверный email или пароль")
                    .with_status(401)
            })
    }

    async fn register(&self, email: &Email, password: &SecretString) -> ServiceResult<AuthPayload> {
        self.enter(ServiceOp::Register, email.as_str(), self.inner.latency)
            .await?;

        if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::new(
                ServiceErrorKind::BadRequest,
                format!("Пароль должен содержать не менее {MIN_PASSWORD_LENGTH} символов"),
            )
            .with_status(400));
        }

        let mut state = lock(&self.inner.state);
        if state.accounts.iter().any(|a| a.user.email == *email) {
            return Err(ServiceError::new(
                ServiceErrorKind::Conflict,
                "Пользователь с таким email уже существует",
            )
            .with_status(409));
        }

        let user = User {
            id: UserId::new(format!("user-{}", Uuid::new_v4().simple())),
            name: email.as_str().split('@').next().unwrap_or_default().to_owned(),
            email: email.clone(),
        };
        state.accounts.push(Account {
            user: user.clone(),
            password: password.expose_secret().to_owned(),
        });
        drop(state);

        Ok(Self::issue_auth(user))
    }

    async fn fetch_favorites(&self, user_id: &UserId) -> ServiceResult<Vec<Favorite>> {
        self.enter(ServiceOp::FetchFavorites, user_id.as_str(), self.inner.latency)
            .await?;
        Ok(self.favorites_of(user_id))
    }

    async fn add_favorite(
        &self,
        product_id: &ProductId,
        product_name: &str,
        user_id: &UserId,
    ) -> ServiceResult<Confirmation> {
        self.enter(ServiceOp::AddFavorite, product_id.as_str(), self.inner.latency)
            .await?;

        let mut state = lock(&self.inner.state);
        let favorites = state.favorites.entry(user_id.clone()).or_default();
        if favorites.iter().any(|f| f.id == *product_id) {
            return Ok(Confirmation::with_message("Товар уже в избранном"));
        }
        favorites.push(Favorite {
            id: product_id.clone(),
            name: product_name.to_owned(),
            owner_user_id: user_id.clone(),
        });
        drop(state);

        Ok(Confirmation::with_message("Добавлено"))
    }

    async fn remove_favorite(
        &self,
        product_id: &ProductId,
        user_id: &UserId,
    ) -> ServiceResult<Confirmation> {
        self.enter(
            ServiceOp::RemoveFavorite,
            product_id.as_str(),
            self.inner.latency,
        )
        .await?;

        let mut state = lock(&self.inner.state);
        let favorites = state.favorites.entry(user_id.clone()).or_default();
        let before = favorites.len();
        favorites.retain(|f| f.id != *product_id);
        if favorites.len() == before {
            return Err(
                ServiceError::new(ServiceErrorKind::NotFound, "Товар не найден в избранном")
                    .with_status(404),
            );
        }
        drop(state);

        Ok(Confirmation::with_message("Удалено"))
    }

    async fn create_alert(
        &self,
        product_id: &ProductId,
        target_price: Price,
        user_id: &UserId,
    ) -> ServiceResult<Confirmation> {
        self.enter(ServiceOp::CreateAlert, product_id.as_str(), self.inner.latency)
            .await?;

        lock(&self.inner.state).alerts.push(RecordedAlert {
            product_id: product_id.clone(),
            target_price,
            user_id: user_id.clone(),
        });
        Ok(Confirmation::with_message("Уведомление создано"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn demo_email() -> Email {
        Email::parse("user@example.com").unwrap()
    }

    #[tokio::test]
    async fn test_milk_has_three_offers() {
        let mock = MockDataService::new();
        let result = mock
            .fetch_offers("молоко", &SearchFilters::default())
            .await
            .unwrap();
        assert_eq!(result.product_id.as_str(), "milk123");
        assert_eq!(result.product_name, "Молоко \"Фермерское\" 3.2%");
        let services: Vec<_> = result.offers.iter().map(|o| o.service.as_str()).collect();
        assert_eq!(services, ["Самокат", "Яндекс Лавка", "Kuper"]);
    }

    #[tokio::test]
    async fn test_unknown_query_is_empty_success() {
        let mock = MockDataService::new();
        let result = mock
            .fetch_offers("ананас", &SearchFilters::default())
            .await
            .unwrap();
        assert!(result.offers.is_empty());
        assert_eq!(result.product_id.as_str(), "ананас");
    }

    #[tokio::test]
    async fn test_filters_narrow_offers() {
        let mock = MockDataService::new();
        let filters = SearchFilters {
            max_price: Some(Price::from_roubles(205)),
            ..SearchFilters::default()
        };
        let result = mock.fetch_offers("молоко", &filters).await.unwrap();
        assert_eq!(result.offers.len(), 2);

        let wrong_category = SearchFilters {
            category: Some("bakery".to_owned()),
            ..SearchFilters::default()
        };
        let result = mock.fetch_offers("молоко", &wrong_category).await.unwrap();
        assert!(result.offers.is_empty());
    }

    #[tokio::test]
    async fn test_milk_history_is_chronological_and_ends_at_198() {
        let mock = MockDataService::new();
        let history = mock
            .fetch_price_history(&ProductId::new("milk123"))
            .await
            .unwrap();
        assert_eq!(history.len(), 7);
        assert!(history.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(history[6].price, Price::from_roubles(198));
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let mock = MockDataService::new();
        let ok = mock
            .login(&demo_email(), &SecretString::from("password123"))
            .await
            .unwrap();
        assert_eq!(ok.user.id.as_str(), "user123");

        let err = mock
            .login(&demo_email(), &SecretString::from("wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::Unauthorized);
        assert_eq!(err.message, "Неверный email или пароль");
    }

    #[tokio::test]
    async fn test_register_rejects_existing_email() {
        let mock = MockDataService::new();
        let err = mock
            .register(&demo_email(), &SecretString::from("password123"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::Conflict);

        let email = Email::parse("new@example.com").unwrap();
        let payload = mock
            .register(&email, &SecretString::from("secret-pass"))
            .await
            .unwrap();
        assert_eq!(payload.user.name, "new");
        assert!(payload.user.id.as_str().starts_with("user-"));
    }

    #[tokio::test]
    async fn test_add_favorite_is_idempotent() {
        let mock = MockDataService::new();
        let user = UserId::new("user123");
        let product = ProductId::new("product789");
        mock.add_favorite(&product, "Сыр", &user).await.unwrap();
        mock.add_favorite(&product, "Сыр", &user).await.unwrap();
        assert_eq!(mock.favorites_of(&user).len(), 1);
        assert!(mock.favorites_of(&UserId::new("someone-else")).is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot_and_recorded() {
        let mock = MockDataService::new();
        mock.fail_next(
            ServiceOp::FetchBrands,
            ServiceError::new(ServiceErrorKind::Unavailable, "нет связи"),
        );
        assert!(mock.fetch_brands().await.is_err());
        assert!(mock.fetch_brands().await.is_ok());
        assert_eq!(mock.call_count(ServiceOp::FetchBrands), 2);
    }
}
