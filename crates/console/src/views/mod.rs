//! The view renderer.
//!
//! Every function here projects data it is handed into one region of the
//! [`Screen`] and lists the commands that region offers. Views never touch
//! the stores; controllers take a [`Snapshot`] and pass the pieces in.

mod account;
mod alerts;
mod comparison;
mod history;
mod search;

use askama::Template;
use tracing::error;

pub use account::{
    render_auth_modal, render_favorites, render_profile, render_recommendations,
    render_session_indicator,
};
pub use alerts::render_alert_form;
pub use comparison::render_comparison;
pub use history::{
    render_price_chart, render_price_chart_error, render_price_chart_loading,
    render_price_chart_prompt,
};
pub use search::{
    render_filters, render_search_error, render_search_loading, render_search_not_found,
    render_search_prompt, render_search_results,
};

use crate::chart::ChartSlot;
use crate::screen::Screen;
use crate::state::Snapshot;

/// Render a template, falling back to `fallback` if rendering fails.
fn render_template(template: &impl Template, fallback: &str) -> String {
    match template.render() {
        Ok(text) => text.trim_end().to_owned(),
        Err(e) => {
            error!(error = %e, "Failed to render view template");
            fallback.to_owned()
        }
    }
}

/// Re-render every view that depends on who is signed in.
///
/// Called after each session transition. The price chart is included only
/// when no product is shown, since its prompt is the only session-dependent
/// state it has.
pub fn render_session_views(screen: &Screen, chart: &ChartSlot, snapshot: &Snapshot) {
    let user = snapshot.user.as_ref();
    render_session_indicator(screen, user);
    render_profile(screen, user);
    render_favorites(screen, &snapshot.favorites);
    render_recommendations(screen, &snapshot.favorites);
    render_alert_form(screen, user, &snapshot.alert);
    if snapshot.product_id.is_none() {
        render_price_chart_prompt(screen, chart, user);
    }
}

/// Initial render of every region.
pub fn render_all(screen: &Screen, chart: &ChartSlot, snapshot: &Snapshot) {
    render_filters(screen, &snapshot.filters);
    render_search_prompt(screen);
    render_comparison(screen, &snapshot.comparison);
    render_auth_modal(screen, &snapshot.auth);
    render_session_views(screen, chart, snapshot);
}
