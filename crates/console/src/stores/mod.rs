//! Console state holders.
//!
//! Stores are plain synchronous containers. Controllers mutate them in short
//! critical sections that never span an `.await`. When the session and the
//! favorites must be read or written together, the session is locked first.

mod comparison;
mod favorites;
mod session;

pub use comparison::{ComparisonEntry, ComparisonRow, ComparisonStore, ComparisonTable, PLACEHOLDER};
pub use favorites::{FavoritesSlot, FavoritesStore};
pub use session::{AuthTicket, Session, SessionPhase, SessionSlot, SessionState, SessionStore};
