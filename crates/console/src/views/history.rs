//! Price history chart.

use pricewatch_core::{PricePoint, ProductId, User};
use rust_decimal::Decimal;

use crate::chart::{ChartSlot, ChartSurface, date_label};
use crate::screen::{Region, Screen};

/// No product selected: dispose the chart and prompt.
pub fn render_price_chart_prompt(screen: &Screen, chart: &ChartSlot, user: Option<&User>) {
    chart.clear();
    let body = if user.is_some() {
        "Выберите товар, чтобы увидеть историю его цен."
    } else {
        "Войдите, чтобы просматривать историю цен."
    };
    screen.render(Region::PriceChart, body, Vec::new());
}

pub fn render_price_chart_loading(screen: &Screen, chart: &ChartSlot) {
    chart.clear();
    screen.render(Region::PriceChart, "Загрузка графика...", Vec::new());
}

pub fn render_price_chart_error(screen: &Screen, chart: &ChartSlot, message: &str) {
    chart.clear();
    screen.render(
        Region::PriceChart,
        format!("Не удалось загрузить историю цен: {message}"),
        Vec::new(),
    );
}

/// Draw the history of `product_id`, replacing any previous chart.
pub fn render_price_chart(
    screen: &Screen,
    chart: &ChartSlot,
    surface: &dyn ChartSurface,
    product_id: &ProductId,
    points: &[PricePoint],
) {
    if points.is_empty() {
        chart.clear();
        screen.render(
            Region::PriceChart,
            "История цен для этого товара недоступна.",
            Vec::new(),
        );
        return;
    }

    let labels: Vec<String> = points.iter().map(|point| date_label(point.date)).collect();
    let series: Vec<Decimal> = points.iter().map(|point| point.price.amount()).collect();
    let body = chart.draw(
        surface,
        &labels,
        &series,
        &format!("История цен для: {product_id}"),
    );
    screen.render(Region::PriceChart, body, Vec::new());
}
