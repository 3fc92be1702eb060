//! Controllers: validate input, call the data service, update a store and
//! re-render the views that depend on it.
//!
//! Controllers are short-lived borrows of the [`AppState`](crate::AppState):
//!
//! ```rust,ignore
//! SearchController::new(&state).search("молоко", &filters).await?;
//! ```

mod alerts;
mod favorites;
mod search;
mod session;

pub use alerts::AlertController;
pub use favorites::FavoritesController;
pub use search::{SearchController, SearchOutcome};
pub use session::{AuthMode, SessionController};
