//! Favorites mutations.
//!
//! Every successful add or remove is followed by a full reload from the data
//! service; the store only ever holds server-confirmed listings. Results that
//! arrive after the session changed are dropped.

use pricewatch_core::{ProductId, User};
use tracing::{info, instrument, warn};

use crate::error::{ConsoleError, Result, add_breadcrumb};
use crate::screen::Region;
use crate::service::DataService;
use crate::state::AppState;
use crate::views;

/// Adds, removes and reloads favorites of the signed-in user.
pub struct FavoritesController<'a, S> {
    state: &'a AppState<S>,
}

impl<'a, S: DataService> FavoritesController<'a, S> {
    #[must_use]
    pub const fn new(state: &'a AppState<S>) -> Self {
        Self { state }
    }

    fn flash_result(&self, message: &str) {
        let ttl = self.state.config().flash_ttl;
        self.state
            .screen()
            .flash(Region::SearchResults, message, Some(ttl));
    }

    /// Pin a product for the signed-in user.
    ///
    /// Returns the number of favorites after the reload.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::AuthRequired`] without calling the data service
    /// when nobody is signed in, [`ConsoleError::Service`] if the service
    /// rejects the add or the reload, and [`ConsoleError::SessionChanged`] if
    /// the session changed while the request was in flight.
    #[instrument(skip(self, product_name), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId, product_name: &str) -> Result<usize> {
        let Some((user, generation)) = self.state.session().authenticated() else {
            self.flash_result("Войдите, чтобы добавить в избранное.");
            return Err(ConsoleError::AuthRequired);
        };

        add_breadcrumb(
            "favorites",
            "Added favorite",
            Some(&[("product_id", product_id.as_str())]),
        );
        self.state
            .screen()
            .flash(Region::SearchResults, "Добавляем...", None);

        if let Err(err) = self
            .state
            .service()
            .add_favorite(product_id, product_name, &user.id)
            .await
        {
            warn!(error = %err, "Failed to add favorite");
            self.flash_result("Не удалось добавить в избранное.");
            return Err(err.into());
        }

        match self.reload_for(&user, generation).await {
            Ok(count) => {
                self.flash_result("Добавлено в избранное!");
                Ok(count)
            }
            Err(err) => {
                if err != ConsoleError::SessionChanged {
                    self.flash_result("Не удалось добавить в избранное.");
                }
                Err(err)
            }
        }
    }

    /// Unpin a product. On failure the store is left untouched.
    ///
    /// # Errors
    ///
    /// Same as [`FavoritesController::add`].
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<usize> {
        let Some((user, generation)) = self.state.session().authenticated() else {
            return Err(ConsoleError::AuthRequired);
        };

        add_breadcrumb(
            "favorites",
            "Removed favorite",
            Some(&[("product_id", product_id.as_str())]),
        );

        if let Err(err) = self
            .state
            .service()
            .remove_favorite(product_id, &user.id)
            .await
        {
            warn!(error = %err, "Failed to remove favorite");
            self.state.screen().flash(
                Region::Favorites,
                format!("Не удалось удалить из избранного: {}", err.message),
                Some(self.state.config().flash_ttl),
            );
            return Err(err.into());
        }

        self.reload_for(&user, generation).await
    }

    /// Reload the favorites of whoever is signed in.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::AuthRequired`] when nobody is signed in.
    pub async fn reload(&self) -> Result<usize> {
        let Some((user, generation)) = self.state.session().authenticated() else {
            return Err(ConsoleError::AuthRequired);
        };
        self.reload_for(&user, generation).await
    }

    /// Replace the store with the server listing for `user`, then re-render
    /// the favorites and the recommendations.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub(crate) async fn reload_for(&self, user: &User, generation: u64) -> Result<usize> {
        if self.state.session().generation() != generation {
            return Err(ConsoleError::SessionChanged);
        }

        let listing = match self.state.service().fetch_favorites(&user.id).await {
            Ok(listing) => listing,
            Err(err) => {
                warn!(error = %err, "Failed to reload favorites");
                if self.state.session().generation() == generation {
                    self.state.screen().render(
                        Region::Favorites,
                        format!("Не удалось загрузить избранное: {}", err.message),
                        Vec::new(),
                    );
                }
                return Err(err.into());
            }
        };

        let count = self
            .state
            .apply_favorites(generation, &user.id, listing)
            .inspect_err(|_| info!("Session changed during reload; listing dropped"))?;

        let snapshot = self.state.snapshot();
        views::render_favorites(self.state.screen(), &snapshot.favorites);
        views::render_recommendations(self.state.screen(), &snapshot.favorites);
        info!(count, "Favorites reloaded");
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pricewatch_core::{Email, ServiceError, ServiceErrorKind};
    use secrecy::SecretString;

    use super::*;
    use crate::chart::TextChart;
    use crate::config::ConsoleConfig;
    use crate::service::{MockDataService, ServiceOp};

    fn state_with(mock: &MockDataService) -> AppState<MockDataService> {
        AppState::new(ConsoleConfig::default(), mock.clone(), Arc::new(TextChart::new()))
    }

    async fn sign_in(state: &AppState<MockDataService>) -> User {
        let payload = state
            .service()
            .login(
                &Email::parse("user@example.com").unwrap(),
                &SecretString::from("password123"),
            )
            .await
            .unwrap();
        let ticket = state.session().begin_auth().unwrap();
        state
            .session()
            .complete_auth(ticket, payload.user.clone(), SecretString::from(payload.token))
            .unwrap();
        payload.user
    }

    #[tokio::test]
    async fn test_anonymous_add_never_reaches_service() {
        let mock = MockDataService::new();
        let state = state_with(&mock);

        let err = FavoritesController::new(&state)
            .add(&ProductId::new("product789"), "Сыр")
            .await
            .unwrap_err();

        assert_eq!(err, ConsoleError::AuthRequired);
        assert_eq!(mock.call_count(ServiceOp::AddFavorite), 0);
        assert_eq!(
            state.screen().flash_text(Region::SearchResults).as_deref(),
            Some("Войдите, чтобы добавить в избранное.")
        );
    }

    #[tokio::test]
    async fn test_anonymous_remove_never_reaches_service() {
        let mock = MockDataService::new();
        let state = state_with(&mock);

        let err = FavoritesController::new(&state)
            .remove(&ProductId::new("product789"))
            .await
            .unwrap_err();

        assert_eq!(err, ConsoleError::AuthRequired);
        assert_eq!(mock.call_count(ServiceOp::RemoveFavorite), 0);
    }

    #[tokio::test]
    async fn test_double_add_keeps_single_entry() {
        let mock = MockDataService::new();
        let state = state_with(&mock);
        sign_in(&state).await;
        let controller = FavoritesController::new(&state);
        let cheese = ProductId::new("product789");

        controller.add(&cheese, "Сыр").await.unwrap();
        let count = controller.add(&cheese, "Сыр").await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(state.favorites().items().len(), 1);
        assert_eq!(mock.call_count(ServiceOp::FetchFavorites), 2);
        assert_eq!(state.screen().body(Region::Favorites), "- Сыр (ID: product789)");
    }

    #[tokio::test]
    async fn test_failed_remove_leaves_store_untouched() {
        let mock = MockDataService::new();
        let state = state_with(&mock);
        sign_in(&state).await;
        let controller = FavoritesController::new(&state);
        controller
            .add(&ProductId::new("product789"), "Сыр")
            .await
            .unwrap();

        mock.fail_next(
            ServiceOp::RemoveFavorite,
            ServiceError::new(ServiceErrorKind::Unavailable, "Сервис недоступен"),
        );
        let err = controller
            .remove(&ProductId::new("product789"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConsoleError::Service(_)));
        assert_eq!(state.favorites().len(), 1);
        assert_eq!(
            state.screen().flash_text(Region::Favorites).as_deref(),
            Some("Не удалось удалить из избранного: Сервис недоступен")
        );
    }

    #[tokio::test]
    async fn test_remove_reloads() {
        let mock = MockDataService::new();
        let state = state_with(&mock);
        sign_in(&state).await;
        let controller = FavoritesController::new(&state);
        controller
            .add(&ProductId::new("product789"), "Сыр")
            .await
            .unwrap();

        let count = controller
            .remove(&ProductId::new("product789"))
            .await
            .unwrap();

        assert_eq!(count, 0);
        assert_eq!(
            state.screen().body(Region::Favorites),
            "У вас пока нет избранных товаров."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_during_add_drops_result() {
        let mock = MockDataService::with_latency(Duration::from_millis(100));
        let state = state_with(&mock);
        sign_in(&state).await;
        let controller = FavoritesController::new(&state);
        let cheese = ProductId::new("product789");

        let (result, ()) = tokio::join!(
            controller.add(&cheese, "Сыр"),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                state.sign_out();
            }
        );

        assert_eq!(result.unwrap_err(), ConsoleError::SessionChanged);
        assert!(state.favorites().is_empty());
    }
}
