//! The console facade: owns the application state and routes commands.

use std::sync::Arc;

use pricewatch_core::{Price, User};
use tracing::{debug, instrument};

use crate::chart::{ChartSurface, TextChart};
use crate::command::Command;
use crate::config::ConsoleConfig;
use crate::controllers::{
    AlertController, FavoritesController, SearchController, SearchOutcome, SessionController,
};
use crate::error::Result;
use crate::screen::Screen;
use crate::service::DataService;
use crate::state::AppState;
use crate::views;

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Search(SearchOutcome),
    /// Favorites count after the reload.
    Favorites { count: usize },
    Comparison { entries: usize, changed: bool },
    AlertCreated(Price),
    AuthDialog { open: bool },
    SignedIn(User),
    SignedOut(Option<User>),
}

/// A price-comparison console over a data service.
pub struct Console<S> {
    state: AppState<S>,
}

impl<S: DataService> Console<S> {
    /// A console drawing charts with [`TextChart`].
    #[must_use]
    pub fn new(config: ConsoleConfig, service: S) -> Self {
        Self::with_chart_surface(config, service, Arc::new(TextChart::new()))
    }

    #[must_use]
    pub fn with_chart_surface(
        config: ConsoleConfig,
        service: S,
        surface: Arc<dyn ChartSurface>,
    ) -> Self {
        Self {
            state: AppState::new(config, service, surface),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &AppState<S> {
        &self.state
    }

    #[must_use]
    pub fn screen(&self) -> &Screen {
        self.state.screen()
    }

    /// Render every region, then load the filter options.
    #[instrument(skip(self))]
    pub async fn start(&self) {
        let snapshot = self.state.snapshot();
        views::render_all(self.state.screen(), self.state.chart(), &snapshot);
        SearchController::new(&self.state).load_filters().await;
    }

    /// Route a command to the controller that owns it.
    ///
    /// # Errors
    ///
    /// Returns the controller's error. The failure has already been rendered
    /// into the relevant region.
    pub async fn dispatch(&self, command: Command) -> Result<Outcome> {
        debug!(command = command.name(), "Dispatching command");
        let state = &self.state;

        match command {
            Command::Search { query, filters } => SearchController::new(state)
                .search(&query, &filters)
                .await
                .map(Outcome::Search),
            Command::AddFavorite {
                product_id,
                product_name,
            } => FavoritesController::new(state)
                .add(&product_id, &product_name)
                .await
                .map(|count| Outcome::Favorites { count }),
            Command::RemoveFavorite { product_id } => FavoritesController::new(state)
                .remove(&product_id)
                .await
                .map(|count| Outcome::Favorites { count }),
            Command::AddToComparison(entry) => {
                let changed = SearchController::new(state).add_to_comparison(entry);
                Ok(Outcome::Comparison {
                    entries: state.comparison().len(),
                    changed,
                })
            }
            Command::ClearComparison => {
                let removed = SearchController::new(state).clear_comparison();
                Ok(Outcome::Comparison {
                    entries: 0,
                    changed: removed > 0,
                })
            }
            Command::CreateAlert {
                product_id,
                target_price,
            } => AlertController::new(state)
                .create(&product_id, &target_price)
                .await
                .map(Outcome::AlertCreated),
            Command::OpenAuth => {
                SessionController::new(state).open_auth();
                Ok(Outcome::AuthDialog { open: true })
            }
            Command::CloseAuth => {
                SessionController::new(state).close_auth();
                Ok(Outcome::AuthDialog { open: false })
            }
            Command::Login(credentials) => SessionController::new(state)
                .login(&credentials)
                .await
                .map(Outcome::SignedIn),
            Command::Register(credentials) => SessionController::new(state)
                .register(&credentials)
                .await
                .map(Outcome::SignedIn),
            Command::Logout => Ok(Outcome::SignedOut(SessionController::new(state).logout())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pricewatch_core::{ProductId, SearchFilters};

    use super::*;
    use crate::command::Credentials;
    use crate::screen::Region;
    use crate::service::MockDataService;

    #[tokio::test]
    async fn test_start_renders_every_region() {
        let console = Console::new(ConsoleConfig::default(), MockDataService::new());
        console.start().await;

        let screen = console.screen();
        assert_eq!(
            screen.body(Region::SearchResults),
            "Введите название продукта для поиска."
        );
        assert_eq!(screen.body(Region::SessionIndicator), "Войти");
        assert!(screen.body(Region::Filters).contains("Молочные продукты"));
        assert!(!screen.is_visible(Region::AuthModal));
    }

    #[tokio::test]
    async fn test_dispatch_follows_region_commands() {
        let console = Console::new(ConsoleConfig::default(), MockDataService::new());
        console.start().await;
        console
            .dispatch(Command::Search {
                query: "сыр".to_owned(),
                filters: SearchFilters::default(),
            })
            .await
            .unwrap();

        let add_to_comparison = console
            .screen()
            .commands(Region::SearchResults)
            .into_iter()
            .find(|command| matches!(command, Command::AddToComparison(_)))
            .unwrap();
        let outcome = console.dispatch(add_to_comparison).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Comparison {
                entries: 1,
                changed: true
            }
        );
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let console = Console::new(ConsoleConfig::default(), MockDataService::new());
        let outcome = console
            .dispatch(Command::Login(Credentials::new(
                "user@example.com",
                "password123",
            )))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::SignedIn(ref user) if user.id.as_str() == "user123"));

        console
            .dispatch(Command::AddFavorite {
                product_id: ProductId::new("product789"),
                product_name: "Сыр".to_owned(),
            })
            .await
            .unwrap();

        let outcome = console.dispatch(Command::Logout).await.unwrap();
        assert!(matches!(outcome, Outcome::SignedOut(Some(_))));
        assert!(console.state().favorites().is_empty());
    }
}
