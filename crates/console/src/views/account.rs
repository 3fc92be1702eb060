//! Session-dependent views: account indicator, profile, favorites,
//! recommendations and the login dialog.

use askama::Template;
use pricewatch_core::{Favorite, User};

use super::render_template;
use crate::command::Command;
use crate::screen::{Region, Screen};
use crate::state::{AuthDialog, FavoritesView};

#[derive(Template)]
#[template(path = "favorites.txt")]
struct FavoritesTemplate<'a> {
    favorites: &'a [Favorite],
}

#[derive(Template)]
#[template(path = "auth_modal.txt")]
struct AuthModalTemplate<'a> {
    notice: &'a str,
    is_error: bool,
}

pub fn render_session_indicator(screen: &Screen, user: Option<&User>) {
    match user {
        Some(user) => screen.render(
            Region::SessionIndicator,
            user.name.clone(),
            vec![Command::Logout],
        ),
        None => screen.render(Region::SessionIndicator, "Войти", vec![Command::OpenAuth]),
    }
}

/// The profile is shown only while signed in.
pub fn render_profile(screen: &Screen, user: Option<&User>) {
    match user {
        Some(user) => {
            screen.render(
                Region::Profile,
                format!("{}\n{}", user.name, user.email),
                vec![Command::Logout],
            );
            screen.set_visible(Region::Profile, true);
        }
        None => {
            screen.render(Region::Profile, "", Vec::new());
            screen.set_visible(Region::Profile, false);
        }
    }
}

pub fn render_favorites(screen: &Screen, favorites: &FavoritesView) {
    match favorites {
        FavoritesView::SignedOut => screen.render(
            Region::Favorites,
            "Войдите, чтобы просматривать избранные товары.",
            Vec::new(),
        ),
        FavoritesView::Loading => {
            screen.render(Region::Favorites, "Загрузка избранного...", Vec::new());
        }
        FavoritesView::Loaded(items) if items.is_empty() => screen.render(
            Region::Favorites,
            "У вас пока нет избранных товаров.",
            Vec::new(),
        ),
        FavoritesView::Loaded(items) => {
            let body = render_template(
                &FavoritesTemplate { favorites: items },
                "Не удалось отобразить избранное.",
            );
            let commands = items
                .iter()
                .map(|favorite| Command::RemoveFavorite {
                    product_id: favorite.id.clone(),
                })
                .collect();
            screen.render(Region::Favorites, body, commands);
        }
    }
}

/// Suggestions follow the most recently added favorite.
pub fn render_recommendations(screen: &Screen, favorites: &FavoritesView) {
    let body = match favorites {
        FavoritesView::SignedOut => {
            "Войдите, чтобы увидеть персональные рекомендации.".to_owned()
        }
        FavoritesView::Loading => "Загрузка рекомендаций...".to_owned(),
        FavoritesView::Loaded(items) => match items.last() {
            Some(latest) => format!(
                "Основываясь на ваших избранных товарах, мы думаем, вам может понравиться \
                 что-то похожее на \"{}\".",
                latest.name
            ),
            None => "Добавьте товары в избранное, чтобы мы могли дать вам рекомендации."
                .to_owned(),
        },
    };
    screen.render(Region::Recommendations, body, Vec::new());
}

pub fn render_auth_modal(screen: &Screen, dialog: &AuthDialog) {
    if !dialog.open {
        screen.render(Region::AuthModal, "", Vec::new());
        screen.set_visible(Region::AuthModal, false);
        return;
    }

    let (notice, is_error) = dialog
        .notice
        .as_ref()
        .map_or(("", false), |notice| (notice.text.as_str(), notice.is_error));
    let body = render_template(
        &AuthModalTemplate { notice, is_error },
        "Форма входа недоступна.",
    );
    screen.render(Region::AuthModal, body, vec![Command::CloseAuth]);
    screen.set_visible(Region::AuthModal, true);
}
