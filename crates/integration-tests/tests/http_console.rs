//! The console driven over the REST adapter against an `httpmock` server.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use httpmock::prelude::*;
use pricewatch_console::{
    ApiConfig, Command, Console, ConsoleConfig, ConsoleError, Credentials, HttpDataService,
    Region,
};
use pricewatch_core::SearchFilters;
use serde_json::json;
use url::Url;

fn console(server: &MockServer) -> Console<HttpDataService> {
    let api = ApiConfig {
        base_url: Url::parse(&server.url("/api/")).unwrap(),
        token: None,
        timeout: Duration::from_secs(5),
        catalogue_ttl: Duration::from_secs(300),
    };
    let service = HttpDataService::new(&api).unwrap();
    Console::new(
        ConsoleConfig {
            api: Some(api),
            ..ConsoleConfig::default()
        },
        service,
    )
}

fn search(query: &str) -> Command {
    Command::Search {
        query: query.to_owned(),
        filters: SearchFilters::default(),
    }
}

#[tokio::test]
async fn test_search_and_history_over_http() {
    let server = MockServer::start_async().await;
    let offers = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/offers")
                .query_param("q", "молоко");
            then.status(200).json_body(json!({
                "ok": true,
                "data": {
                    "productId": "milk123",
                    "productName": "Молоко \"Фермерское\" 3.2%",
                    "offers": [
                        {"service": "Самокат", "price": 199, "url": "https://samokat.ru/"},
                        {"service": "Яндекс Лавка", "price": 205, "url": "https://lavka.yandex.ru/"},
                        {"service": "Kuper", "price": 210, "url": "https://kuper.ru/"}
                    ]
                }
            }));
        })
        .await;
    let history = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/products/milk123/history");
            then.status(200).json_body(json!({
                "ok": true,
                "data": [
                    {"date": "2026-03-01T00:00:00Z", "price": 210},
                    {"date": "2026-03-02T00:00:00Z", "price": 207},
                    {"date": "2026-03-03T00:00:00Z", "price": 205},
                    {"date": "2026-03-04T00:00:00Z", "price": 203},
                    {"date": "2026-03-05T00:00:00Z", "price": 201},
                    {"date": "2026-03-06T00:00:00Z", "price": 199},
                    {"date": "2026-03-07T00:00:00Z", "price": 198}
                ]
            }));
        })
        .await;
    let console = console(&server);

    console.dispatch(search("молоко")).await.unwrap();

    offers.assert_async().await;
    history.assert_async().await;
    let results = console.screen().body(Region::SearchResults);
    assert!(results.contains("- Самокат: 199 ₽ (лучшая цена)"));
    let chart = console.screen().body(Region::PriceChart);
    assert!(chart.contains("1 мар. … 7 мар."), "{chart}");
    assert!(chart.ends_with("сейчас 198 ₽"));
}

#[tokio::test]
async fn test_gateway_failure_renders_friendly_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/offers");
            then.status(502).body("<html>Bad Gateway</html>");
        })
        .await;
    let console = console(&server);

    let err = console.dispatch(search("молоко")).await.unwrap_err();

    assert!(matches!(err, ConsoleError::Service(_)));
    assert_eq!(
        console.screen().body(Region::SearchResults),
        "Ошибка загрузки данных: Сервис вернул ошибку (HTTP 502). Пожалуйста, попробуйте позже."
    );
    assert!(console.state().current_result().is_none());
}

#[tokio::test]
async fn test_login_error_is_shown_verbatim() {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(401).json_body(json!({
                "ok": false,
                "message": "Аккаунт заблокирован"
            }));
        })
        .await;
    let console = console(&server);
    console.dispatch(Command::OpenAuth).await.unwrap();

    let err = console
        .dispatch(Command::Login(Credentials::new(
            "user@example.com",
            "password123",
        )))
        .await
        .unwrap_err();

    login.assert_async().await;
    assert_eq!(err.to_string(), "Аккаунт заблокирован");
    assert!(
        console
            .screen()
            .body(Region::AuthModal)
            .ends_with("Ошибка: Аккаунт заблокирован")
    );
    assert!(!console.state().session().is_authenticated());
}

#[tokio::test]
async fn test_sign_in_loads_favorites_with_bearer_token() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(200).json_body(json!({
                "ok": true,
                "data": {
                    "user": {"id": "user123", "name": "Тестовый пользователь", "email": "user@example.com"},
                    "token": "tok-1"
                }
            }));
        })
        .await;
    let favorites = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/users/user123/favorites")
                .header("Authorization", "Bearer tok-1");
            then.status(200).json_body(json!({
                "ok": true,
                "data": [{"id": "product789", "name": "Сыр", "ownerUserId": "user123"}]
            }));
        })
        .await;
    let console = console(&server);

    console
        .dispatch(Command::Login(Credentials::new(
            "user@example.com",
            "password123",
        )))
        .await
        .unwrap();

    favorites.assert_async().await;
    assert_eq!(
        console.screen().body(Region::Favorites),
        "- Сыр (ID: product789)"
    );
    assert_eq!(
        console.screen().body(Region::SessionIndicator),
        "Тестовый пользователь"
    );
}
