//! Price-drop alerts.

use pricewatch_core::{Price, ProductId};
use tracing::{info, instrument, warn};

use crate::error::{ConsoleError, Result, add_breadcrumb};
use crate::screen::Region;
use crate::service::DataService;
use crate::state::AppState;
use crate::views;

/// Validates and submits alert requests for the signed-in user.
pub struct AlertController<'a, S> {
    state: &'a AppState<S>,
}

impl<'a, S: DataService> AlertController<'a, S> {
    #[must_use]
    pub const fn new(state: &'a AppState<S>) -> Self {
        Self { state }
    }

    fn render_form(&self) {
        let snapshot = self.state.snapshot();
        views::render_alert_form(
            self.state.screen(),
            snapshot.user.as_ref(),
            &snapshot.alert,
        );
    }

    /// Ask to be notified when `product_id` drops to `target_price_raw`.
    ///
    /// The alert is filed for the signed-in user. Invalid input stays in the
    /// form next to the error; once a request is sent the input is cleared
    /// whatever the outcome, and the outcome is flashed under the form.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::AuthRequired`] or [`ConsoleError::Validation`]
    /// without calling the data service, [`ConsoleError::Service`] if the
    /// service rejects the alert and [`ConsoleError::SessionChanged`] if the
    /// session changed while the request was in flight.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn create(&self, product_id: &ProductId, target_price_raw: &str) -> Result<Price> {
        let Some((user, generation)) = self.state.session().authenticated() else {
            self.render_form();
            return Err(ConsoleError::AuthRequired);
        };

        let target_price = match Price::parse_positive(target_price_raw) {
            Ok(price) => price,
            Err(err) => {
                {
                    let mut form = self.state.alert_form_mut();
                    form.input = target_price_raw.to_owned();
                    form.error = Some(err.to_string());
                }
                self.render_form();
                return Err(err.into());
            }
        };

        add_breadcrumb(
            "alerts",
            "Created price alert",
            Some(&[("product_id", product_id.as_str())]),
        );
        {
            let mut form = self.state.alert_form_mut();
            form.input.clear();
            form.error = None;
        }
        self.render_form();
        self.state
            .screen()
            .flash(Region::AlertForm, "Создаем уведомление...", None);

        let response = self
            .state
            .service()
            .create_alert(product_id, target_price, &user.id)
            .await;

        if self.state.session().generation() != generation {
            info!("Session changed while creating alert; outcome dropped");
            self.render_form();
            return Err(ConsoleError::SessionChanged);
        }

        let ttl = Some(self.state.config().flash_ttl);
        match response {
            Ok(_) => {
                info!(target_price = %target_price, "Alert created");
                self.state.screen().flash(
                    Region::AlertForm,
                    "Уведомление создано (запрос отправлен)!",
                    ttl,
                );
                Ok(target_price)
            }
            Err(err) => {
                warn!(error = %err, "Failed to create alert");
                self.state.screen().flash(
                    Region::AlertForm,
                    format!("Не удалось создать уведомление. {}", err.message),
                    ttl,
                );
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pricewatch_core::{Email, SearchResult, ServiceError, ServiceErrorKind};
    use secrecy::SecretString;

    use super::*;
    use crate::chart::TextChart;
    use crate::config::ConsoleConfig;
    use crate::service::{MockDataService, ServiceOp};

    fn state_with(mock: &MockDataService) -> AppState<MockDataService> {
        let state = AppState::new(
            ConsoleConfig::default(),
            mock.clone(),
            Arc::new(TextChart::new()),
        );
        state.set_current_result(Some(SearchResult {
            product_id: ProductId::new("milk123"),
            product_name: "Молоко".to_owned(),
            offers: Vec::new(),
        }));
        state
    }

    async fn sign_in(state: &AppState<MockDataService>) {
        let payload = state
            .service()
            .login(
                &Email::parse("user@example.com").unwrap(),
                &SecretString::from("password123"),
            )
            .await
            .unwrap();
        let ticket = state.session().begin_auth().unwrap();
        state
            .session()
            .complete_auth(ticket, payload.user, SecretString::from(payload.token))
            .unwrap();
    }

    #[tokio::test]
    async fn test_anonymous_create_never_reaches_service() {
        let mock = MockDataService::new();
        let state = state_with(&mock);

        let err = AlertController::new(&state)
            .create(&ProductId::new("milk123"), "150")
            .await
            .unwrap_err();

        assert_eq!(err, ConsoleError::AuthRequired);
        assert_eq!(mock.call_count(ServiceOp::CreateAlert), 0);
    }

    #[tokio::test]
    async fn test_empty_price_is_a_local_validation_error() {
        let mock = MockDataService::new();
        let state = state_with(&mock);
        sign_in(&state).await;

        let err = AlertController::new(&state)
            .create(&ProductId::new("milk123"), "  ")
            .await
            .unwrap_err();

        assert_eq!(err, ConsoleError::Validation("Введите цену.".to_owned()));
        assert_eq!(mock.call_count(ServiceOp::CreateAlert), 0);
        assert_eq!(state.alert_form().error.as_deref(), Some("Введите цену."));
        assert!(
            state
                .screen()
                .body(Region::AlertForm)
                .ends_with("Введите цену.")
        );
    }

    #[tokio::test]
    async fn test_negative_price_keeps_input() {
        let mock = MockDataService::new();
        let state = state_with(&mock);
        sign_in(&state).await;

        let err = AlertController::new(&state)
            .create(&ProductId::new("milk123"), "-10")
            .await
            .unwrap_err();

        assert!(err.is_local());
        assert_eq!(state.alert_form().input, "-10");
    }

    #[tokio::test(start_paused = true)]
    async fn test_created_alert_flashes_and_resets_input() {
        let mock = MockDataService::new();
        let state = state_with(&mock);
        sign_in(&state).await;
        state.alert_form_mut().input = "abc".to_owned();

        let price = AlertController::new(&state)
            .create(&ProductId::new("milk123"), "150,5")
            .await
            .unwrap();

        assert_eq!(price.to_string(), "150.5 ₽");
        assert_eq!(mock.alerts().len(), 1);
        assert_eq!(mock.alerts()[0].user_id.as_str(), "user123");
        assert!(state.alert_form().input.is_empty());
        assert_eq!(
            state.screen().flash_text(Region::AlertForm).as_deref(),
            Some("Уведомление создано (запрос отправлен)!")
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(state.screen().flash_text(Region::AlertForm).is_none());
    }

    #[tokio::test]
    async fn test_service_rejection_resets_input_and_reports() {
        let mock = MockDataService::new();
        mock.fail_next(
            ServiceOp::CreateAlert,
            ServiceError::new(ServiceErrorKind::BadRequest, "Цена выше текущей"),
        );
        let state = state_with(&mock);
        sign_in(&state).await;

        let err = AlertController::new(&state)
            .create(&ProductId::new("milk123"), "500")
            .await
            .unwrap_err();

        assert!(matches!(err, ConsoleError::Service(_)));
        assert!(state.alert_form().input.is_empty());
        assert_eq!(
            state.screen().flash_text(Region::AlertForm).as_deref(),
            Some("Не удалось создать уведомление. Цена выше текущей")
        );
    }
}
