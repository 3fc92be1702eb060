//! Offer search, price history, filters and the comparison table.
//!
//! Each search is stamped with a sequence number before it suspends on the
//! data service. When the response arrives it is rendered only if no newer
//! search has started in the meantime; otherwise it is dropped silently. The
//! history lookup that follows a search is checked against the same stamp.

use pricewatch_core::{ProductId, SearchFilters, SearchResult};
use tracing::{debug, info, instrument, warn};

use crate::error::{ConsoleError, Result, add_breadcrumb};
use crate::service::DataService;
use crate::state::{AppState, FilterOptions};
use crate::stores::ComparisonEntry;
use crate::views;

/// How a search ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank query: the prompt is shown instead.
    Prompt,
    /// Results rendered.
    Found { product_id: ProductId, offers: usize },
    /// A newer search started first; nothing was rendered.
    Superseded,
}

/// Drives searches and everything keyed on the found product.
pub struct SearchController<'a, S> {
    state: &'a AppState<S>,
}

impl<'a, S: DataService> SearchController<'a, S> {
    #[must_use]
    pub const fn new(state: &'a AppState<S>) -> Self {
        Self { state }
    }

    /// Search offers for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::EmptyResult`] when nothing matched and
    /// [`ConsoleError::Service`] when the data service failed. Both states are
    /// rendered before returning. A superseded response is not an error.
    #[instrument(skip(self, filters), fields(query = %query))]
    pub async fn search(&self, query: &str, filters: &SearchFilters) -> Result<SearchOutcome> {
        let query = query.trim();
        let seq = self.state.next_search_seq();
        let screen = self.state.screen();

        if query.is_empty() {
            self.show_product(None);
            views::render_search_prompt(screen);
            return Ok(SearchOutcome::Prompt);
        }

        add_breadcrumb("search", "Searched offers", Some(&[("query", query)]));
        views::render_search_loading(screen);

        let response = self.state.service().fetch_offers(query, filters).await;
        if !self.state.is_latest_search(seq) {
            debug!(seq, "Discarding superseded search response");
            return Ok(SearchOutcome::Superseded);
        }

        let result = match response {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, kind = ?err.kind, "Search failed");
                self.show_product(None);
                views::render_search_error(screen, &err.message);
                return Err(err.into());
            }
        };

        if result.offers.is_empty() {
            info!("No offers found");
            self.show_product(None);
            views::render_search_not_found(screen, query);
            return Err(ConsoleError::EmptyResult);
        }

        let product_id = result.product_id.clone();
        let offers = result.offers.len();
        info!(product_id = %product_id, offers, "Search succeeded");

        views::render_search_results(screen, query, &result);
        self.show_product(Some(result));
        self.load_history(seq, &product_id).await;

        Ok(SearchOutcome::Found { product_id, offers })
    }

    /// Bind the result (or its absence) and re-render the views keyed on it.
    fn show_product(&self, result: Option<SearchResult>) {
        let cleared = result.is_none();
        self.state.set_current_result(result);

        let snapshot = self.state.snapshot();
        if cleared {
            views::render_price_chart_prompt(
                self.state.screen(),
                self.state.chart(),
                snapshot.user.as_ref(),
            );
        }
        views::render_alert_form(
            self.state.screen(),
            snapshot.user.as_ref(),
            &snapshot.alert,
        );
    }

    /// Fetch and draw the price history of the product found by search `seq`.
    async fn load_history(&self, seq: u64, product_id: &ProductId) {
        let screen = self.state.screen();
        let chart = self.state.chart();
        views::render_price_chart_loading(screen, chart);

        let response = self.state.service().fetch_price_history(product_id).await;
        if !self.state.is_latest_search(seq) {
            debug!(seq, "Discarding superseded price history");
            return;
        }

        match response {
            Ok(points) => {
                debug!(points = points.len(), "Price history loaded");
                views::render_price_chart(
                    screen,
                    chart,
                    self.state.chart_surface(),
                    product_id,
                    &points,
                );
            }
            Err(err) => {
                warn!(error = %err, "Failed to load price history");
                views::render_price_chart_error(screen, chart, &err.message);
            }
        }
    }

    /// Add a frozen copy of a result to the comparison table.
    ///
    /// Returns whether the table changed; an id already present is a no-op.
    #[instrument(skip(self, entry), fields(product_id = %entry.id))]
    pub fn add_to_comparison(&self, entry: ComparisonEntry) -> bool {
        add_breadcrumb(
            "comparison",
            "Added product to comparison",
            Some(&[("product_id", entry.id.as_str())]),
        );
        let added = self.state.comparison().add(entry);
        if added {
            views::render_comparison(self.state.screen(), &self.state.comparison().table());
        } else {
            debug!("Product already in comparison");
        }
        added
    }

    /// Empty the comparison table. Returns how many entries were removed.
    #[instrument(skip(self))]
    pub fn clear_comparison(&self) -> usize {
        add_breadcrumb("comparison", "Cleared comparison", None);
        let removed = self.state.comparison().clear();
        views::render_comparison(self.state.screen(), &self.state.comparison().table());
        removed
    }

    /// Load category and brand options for the search filters.
    ///
    /// A failed list is logged and left empty; it does not stop the other.
    #[instrument(skip(self))]
    pub async fn load_filters(&self) -> FilterOptions {
        let service = self.state.service();

        let categories = service.fetch_categories().await.unwrap_or_else(|err| {
            warn!(error = %err, "Failed to load categories");
            Vec::new()
        });
        let brands = service.fetch_brands().await.unwrap_or_else(|err| {
            warn!(error = %err, "Failed to load brands");
            Vec::new()
        });

        let options = FilterOptions { categories, brands };
        self.state.set_filter_options(options.clone());
        views::render_filters(self.state.screen(), &options);
        options
    }
}
