//! Unified error handling with Sentry integration.
//!
//! Every controller returns `Result<T, ConsoleError>`. Failures are already
//! rendered into the relevant region by the time the error is returned; the
//! error value tells the caller *what kind* of failure happened.

use pricewatch_core::{EmailError, PriceError, ServiceError};
use thiserror::Error;

/// Console-level error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// Bad local input, caught before any network call.
    #[error("{0}")]
    Validation(String),

    /// The data service answered `ok: false` (or could not be reached).
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// A well-formed response that carried no data.
    #[error("Ничего не найдено")]
    EmptyResult,

    /// The action needs an authenticated session.
    #[error("Необходимо войти в аккаунт")]
    AuthRequired,

    /// A login or registration is already running.
    #[error("Вход уже выполняется")]
    AuthInProgress,

    /// The session changed while the request was in flight; its result was dropped.
    #[error("Сессия изменилась, результат отброшен")]
    SessionChanged,
}

impl From<EmailError> for ConsoleError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PriceError> for ConsoleError {
    fn from(err: PriceError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl ConsoleError {
    /// Whether the error was resolved locally without touching the data service.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::AuthRequired | Self::AuthInProgress
        )
    }
}

/// Result type alias for `ConsoleError`.
pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Set the Sentry user context after a successful login.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("search", "Searched offers", Some(&[("query", "молоко")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
