//! Search results and filter options.

use askama::Template;
use pricewatch_core::{CatalogueOption, Offer, ProductId, SearchResult};

use super::render_template;
use crate::command::Command;
use crate::screen::{Region, Screen};
use crate::state::FilterOptions;
use crate::stores::ComparisonEntry;

const RESULTS_FALLBACK: &str = "Произошла ошибка при отображении результатов.";

#[derive(Template)]
#[template(path = "search_results.txt")]
struct SearchResultsTemplate<'a> {
    query: &'a str,
    product_id: &'a ProductId,
    product_name: &'a str,
    offers: &'a [Offer],
    /// Index of the cheapest offer.
    best: usize,
}

#[derive(Template)]
#[template(path = "filters.txt")]
struct FiltersTemplate<'a> {
    categories: &'a [CatalogueOption],
    brands: &'a [CatalogueOption],
}

pub fn render_filters(screen: &Screen, options: &FilterOptions) {
    let body = render_template(
        &FiltersTemplate {
            categories: &options.categories,
            brands: &options.brands,
        },
        "Фильтры недоступны.",
    );
    screen.render(Region::Filters, body, Vec::new());
}

pub fn render_search_prompt(screen: &Screen) {
    screen.render(
        Region::SearchResults,
        "Введите название продукта для поиска.",
        Vec::new(),
    );
}

pub fn render_search_loading(screen: &Screen) {
    screen.render(Region::SearchResults, "Загрузка...", Vec::new());
}

pub fn render_search_not_found(screen: &Screen, query: &str) {
    screen.render(
        Region::SearchResults,
        format!("Товары по запросу \"{query}\" не найдены."),
        Vec::new(),
    );
}

pub fn render_search_error(screen: &Screen, message: &str) {
    screen.render(
        Region::SearchResults,
        format!("Ошибка загрузки данных: {message}. Пожалуйста, попробуйте позже."),
        Vec::new(),
    );
}

/// Offers for the found product, with favorite and comparison actions.
pub fn render_search_results(screen: &Screen, query: &str, result: &SearchResult) {
    let best = result
        .offers
        .iter()
        .enumerate()
        .min_by_key(|(_, offer)| offer.price)
        .map_or(0, |(index, _)| index);

    let body = render_template(
        &SearchResultsTemplate {
            query,
            product_id: &result.product_id,
            product_name: &result.product_name,
            offers: &result.offers,
            best,
        },
        RESULTS_FALLBACK,
    );

    let commands = vec![
        Command::AddFavorite {
            product_id: result.product_id.clone(),
            product_name: result.product_name.clone(),
        },
        Command::AddToComparison(ComparisonEntry::from(result)),
    ];
    screen.render(Region::SearchResults, body, commands);
}
