//! Commands: the messages views hand back to controllers.
//!
//! A rendered region lists the commands it offers (a result offers
//! "add to favorites", the comparison table offers "clear", ...). The front end
//! picks one, fills in user input where needed, and passes it to
//! [`Console::dispatch`](crate::Console::dispatch).

use pricewatch_core::{ProductId, SearchFilters};
use secrecy::SecretString;

use crate::stores::ComparisonEntry;

/// Login or registration form input.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// The password, wrapped for handing to the data service.
    #[must_use]
    pub fn password(&self) -> SecretString {
        SecretString::from(self.password.clone())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A user action routed to a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search {
        query: String,
        filters: SearchFilters,
    },
    AddFavorite {
        product_id: ProductId,
        product_name: String,
    },
    RemoveFavorite {
        product_id: ProductId,
    },
    AddToComparison(ComparisonEntry),
    ClearComparison,
    /// `target_price` is the raw form input; it is validated by the controller.
    CreateAlert {
        product_id: ProductId,
        target_price: String,
    },
    OpenAuth,
    CloseAuth,
    Login(Credentials),
    Register(Credentials),
    Logout,
}

impl Command {
    /// Short action name, for logs and menus.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::AddFavorite { .. } => "add-favorite",
            Self::RemoveFavorite { .. } => "remove-favorite",
            Self::AddToComparison(_) => "add-to-comparison",
            Self::ClearComparison => "clear-comparison",
            Self::CreateAlert { .. } => "create-alert",
            Self::OpenAuth => "open-auth",
            Self::CloseAuth => "close-auth",
            Self::Login(_) => "login",
            Self::Register(_) => "register",
            Self::Logout => "logout",
        }
    }

    /// Button caption shown next to a region.
    #[must_use]
    pub const fn caption(&self) -> &'static str {
        match self {
            Self::Search { .. } => "Найти",
            Self::AddFavorite { .. } => "Добавить в избранное",
            Self::RemoveFavorite { .. } => "Удалить",
            Self::AddToComparison(_) => "Добавить к сравнению",
            Self::ClearComparison => "Очистить сравнение",
            Self::CreateAlert { .. } => "Создать уведомление",
            Self::OpenAuth => "Войти",
            Self::CloseAuth => "Закрыть",
            Self::Login(_) => "Вход",
            Self::Register(_) => "Регистрация",
            Self::Logout => "Выйти",
        }
    }
}
