//! Application state shared by controllers and views.
//!
//! `AppState` is constructed once at startup and handed by reference to every
//! controller. It is cheap to clone (`Arc` inner), which lets delayed tasks
//! such as closing the login dialog hold on to it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use pricewatch_core::{CatalogueOption, Favorite, ProductId, SearchResult, User, UserId};

use crate::chart::{ChartSlot, ChartSurface};
use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::screen::Screen;
use crate::service::DataService;
use crate::stores::{ComparisonStore, ComparisonTable, FavoritesStore, SessionStore};
use crate::sync::lock;

/// Category and brand options offered by the search filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub categories: Vec<CatalogueOption>,
    pub brands: Vec<CatalogueOption>,
}

/// Price alert form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertForm {
    /// Product the form is bound to; `None` until a search finds something.
    pub product_id: Option<ProductId>,
    /// Last rejected input, kept so the user can correct it.
    pub input: String,
    pub error: Option<String>,
}

/// A message inside the login dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthNotice {
    pub text: String,
    pub is_error: bool,
}

impl AuthNotice {
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Login dialog state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthDialog {
    pub open: bool,
    pub notice: Option<AuthNotice>,
    /// Identifies the latest scheduled close; reopening invalidates it.
    pub(crate) close_token: u64,
}

/// How the favorites panel should look for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesView {
    SignedOut,
    /// Signed in, but the store does not hold this user's favorites yet.
    Loading,
    Loaded(Vec<Favorite>),
}

/// Consistent read of everything the views need.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub user: Option<User>,
    pub favorites: FavoritesView,
    pub comparison: ComparisonTable,
    pub product_id: Option<ProductId>,
    pub alert: AlertForm,
    pub auth: AuthDialog,
    pub filters: FilterOptions,
}

/// Shared application state.
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<S> {
    config: ConsoleConfig,
    service: S,
    session: SessionStore,
    favorites: FavoritesStore,
    comparison: ComparisonStore,
    /// Stamp of the most recently started search.
    search_seq: AtomicU64,
    current: Mutex<Option<SearchResult>>,
    alert: Mutex<AlertForm>,
    auth: Mutex<AuthDialog>,
    filters: Mutex<FilterOptions>,
    chart_surface: Arc<dyn ChartSurface>,
    chart: ChartSlot,
    screen: Screen,
}

impl<S: DataService> AppState<S> {
    #[must_use]
    pub fn new(config: ConsoleConfig, service: S, chart_surface: Arc<dyn ChartSurface>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                service,
                session: SessionStore::new(),
                favorites: FavoritesStore::new(),
                comparison: ComparisonStore::new(),
                search_seq: AtomicU64::new(0),
                current: Mutex::new(None),
                alert: Mutex::new(AlertForm::default()),
                auth: Mutex::new(AuthDialog::default()),
                filters: Mutex::new(FilterOptions::default()),
                chart_surface,
                chart: ChartSlot::new(),
                screen: Screen::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn service(&self) -> &S {
        &self.inner.service
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn favorites(&self) -> &FavoritesStore {
        &self.inner.favorites
    }

    #[must_use]
    pub fn comparison(&self) -> &ComparisonStore {
        &self.inner.comparison
    }

    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.inner.screen
    }

    #[must_use]
    pub fn chart(&self) -> &ChartSlot {
        &self.inner.chart
    }

    #[must_use]
    pub fn chart_surface(&self) -> &dyn ChartSurface {
        self.inner.chart_surface.as_ref()
    }

    /// Stamp a new search. Every earlier stamp becomes stale.
    pub fn next_search_seq(&self) -> u64 {
        self.inner.search_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `seq` still stamps the most recently started search.
    #[must_use]
    pub fn is_latest_search(&self, seq: u64) -> bool {
        self.inner.search_seq.load(Ordering::SeqCst) == seq
    }

    /// The result currently on display.
    #[must_use]
    pub fn current_result(&self) -> Option<SearchResult> {
        lock(&self.inner.current).clone()
    }

    /// Replace the displayed result and rebind the alert form to its product.
    ///
    /// The alert input is kept only if the product did not change.
    pub fn set_current_result(&self, result: Option<SearchResult>) {
        let product_id = result.as_ref().map(|r| r.product_id.clone());
        *lock(&self.inner.current) = result;

        let mut alert = lock(&self.inner.alert);
        if alert.product_id != product_id {
            *alert = AlertForm {
                product_id,
                ..AlertForm::default()
            };
        }
    }

    #[must_use]
    pub fn alert_form(&self) -> AlertForm {
        lock(&self.inner.alert).clone()
    }

    pub(crate) fn alert_form_mut(&self) -> MutexGuard<'_, AlertForm> {
        lock(&self.inner.alert)
    }

    #[must_use]
    pub fn auth_dialog(&self) -> AuthDialog {
        lock(&self.inner.auth).clone()
    }

    pub(crate) fn auth_dialog_mut(&self) -> MutexGuard<'_, AuthDialog> {
        lock(&self.inner.auth)
    }

    #[must_use]
    pub fn filter_options(&self) -> FilterOptions {
        lock(&self.inner.filters).clone()
    }

    pub fn set_filter_options(&self, options: FilterOptions) {
        *lock(&self.inner.filters) = options;
    }

    /// Store a favorites listing for `owner`, but only if the session is still
    /// the one the listing was requested under.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::SessionChanged`] if the session moved on.
    pub fn apply_favorites(
        &self,
        generation: u64,
        owner: &UserId,
        listing: Vec<Favorite>,
    ) -> Result<usize, ConsoleError> {
        let session = self.inner.session.lock();
        let still_owner = session.generation() == generation
            && session.user().is_some_and(|user| user.id == *owner);
        if !still_owner {
            return Err(ConsoleError::SessionChanged);
        }
        let stored = self.inner.favorites.lock().replace(owner, listing);
        drop(session);
        Ok(stored)
    }

    /// Clear the session and the favorites together.
    ///
    /// Returns the user that was signed in.
    pub fn sign_out(&self) -> Option<User> {
        let mut session = self.inner.session.lock();
        let user = session.clear();
        self.inner.favorites.lock().clear();
        drop(session);
        user
    }

    /// Read the session and the favorites together, then the rest.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let (user, favorites) = {
            let session = self.inner.session.lock();
            let favorites = self.inner.favorites.lock();
            let user = session.user().cloned();
            let view = match &user {
                None => FavoritesView::SignedOut,
                Some(user) if favorites.is_loaded_for(&user.id) => {
                    FavoritesView::Loaded(favorites.items().to_vec())
                }
                Some(_) => FavoritesView::Loading,
            };
            (user, view)
        };

        Snapshot {
            user,
            favorites,
            comparison: self.inner.comparison.table(),
            product_id: lock(&self.inner.current)
                .as_ref()
                .map(|r| r.product_id.clone()),
            alert: self.alert_form(),
            auth: self.auth_dialog(),
            filters: self.filter_options(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pricewatch_core::Email;
    use secrecy::SecretString;

    use super::*;
    use crate::chart::TextChart;
    use crate::service::MockDataService;

    fn state() -> AppState<MockDataService> {
        AppState::new(
            ConsoleConfig::default(),
            MockDataService::new(),
            Arc::new(TextChart::new()),
        )
    }

    fn sign_in(state: &AppState<MockDataService>) -> u64 {
        let ticket = state.session().begin_auth().unwrap();
        state
            .session()
            .complete_auth(
                ticket,
                User {
                    id: UserId::new("user123"),
                    name: "Тест".to_owned(),
                    email: Email::parse("user@example.com").unwrap(),
                },
                SecretString::from("t"),
            )
            .unwrap()
    }

    fn favorite(id: &str) -> Favorite {
        Favorite {
            id: ProductId::new(id),
            name: id.to_owned(),
            owner_user_id: UserId::new("user123"),
        }
    }

    #[test]
    fn test_only_latest_search_is_fresh() {
        let state = state();
        let first = state.next_search_seq();
        let second = state.next_search_seq();
        assert!(!state.is_latest_search(first));
        assert!(state.is_latest_search(second));
    }

    #[test]
    fn test_favorites_loading_until_reload_applies() {
        let state = state();
        assert_eq!(state.snapshot().favorites, FavoritesView::SignedOut);

        let generation = sign_in(&state);
        assert_eq!(state.snapshot().favorites, FavoritesView::Loading);

        state
            .apply_favorites(generation, &UserId::new("user123"), vec![favorite("milk123")])
            .unwrap();
        assert_eq!(
            state.snapshot().favorites,
            FavoritesView::Loaded(vec![favorite("milk123")])
        );
    }

    #[test]
    fn test_stale_listing_is_rejected_after_sign_out() {
        let state = state();
        let generation = sign_in(&state);
        state.sign_out();

        let err = state
            .apply_favorites(generation, &UserId::new("user123"), vec![favorite("milk123")])
            .unwrap_err();
        assert_eq!(err, ConsoleError::SessionChanged);
        assert!(state.favorites().is_empty());
    }

    #[test]
    fn test_sign_out_clears_favorites_but_not_comparison() {
        let state = state();
        let generation = sign_in(&state);
        state
            .apply_favorites(generation, &UserId::new("user123"), vec![favorite("milk123")])
            .unwrap();
        state.comparison().add(crate::stores::ComparisonEntry::new(
            ProductId::new("milk123"),
            "Молоко",
            Vec::new(),
        ));

        let user = state.sign_out();

        assert_eq!(user.unwrap().id.as_str(), "user123");
        assert!(state.favorites().is_empty());
        assert_eq!(state.comparison().len(), 1);
    }

    #[test]
    fn test_alert_input_reset_when_product_changes() {
        let state = state();
        let result = |id: &str| SearchResult {
            product_id: ProductId::new(id),
            product_name: id.to_owned(),
            offers: Vec::new(),
        };
        state.set_current_result(Some(result("milk123")));
        state.alert_form_mut().input = "150".to_owned();

        state.set_current_result(Some(result("milk123")));
        assert_eq!(state.alert_form().input, "150");

        state.set_current_result(Some(result("bread456")));
        assert_eq!(state.alert_form().input, "");
        assert_eq!(state.alert_form().product_id, Some(ProductId::new("bread456")));
    }
}
