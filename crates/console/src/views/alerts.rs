//! Price alert form.

use askama::Template;
use pricewatch_core::{ProductId, User};

use super::render_template;
use crate::command::Command;
use crate::screen::{Region, Screen};
use crate::state::AlertForm;

#[derive(Template)]
#[template(path = "alert_form.txt")]
struct AlertFormTemplate<'a> {
    product_id: &'a ProductId,
    input: &'a str,
    error: &'a str,
}

/// Render the form for the current product and session.
pub fn render_alert_form(screen: &Screen, user: Option<&User>, form: &AlertForm) {
    let Some(product_id) = &form.product_id else {
        let body = if user.is_some() {
            "Выберите товар для настройки уведомлений."
        } else {
            "Войдите, чтобы настроить уведомления."
        };
        screen.render(Region::AlertForm, body, Vec::new());
        return;
    };

    if user.is_none() {
        screen.render(
            Region::AlertForm,
            "Пожалуйста, войдите, чтобы создавать уведомления.",
            vec![Command::OpenAuth],
        );
        return;
    }

    let body = render_template(
        &AlertFormTemplate {
            product_id,
            input: &form.input,
            error: form.error.as_deref().unwrap_or_default(),
        },
        "Форма уведомлений недоступна.",
    );
    screen.render(
        Region::AlertForm,
        body,
        vec![Command::CreateAlert {
            product_id: product_id.clone(),
            target_price: form.input.clone(),
        }],
    );
}
