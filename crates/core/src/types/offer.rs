//! Offers, search results and price history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// One delivery service's price quote for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Delivery service name, e.g. `Самокат`.
    pub service: String,
    pub price: Price,
    /// Link to the product on the service's site.
    pub url: String,
}

impl Offer {
    #[must_use]
    pub fn new(service: impl Into<String>, price: Price, url: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            price,
            url: url.into(),
        }
    }
}

/// Payload of a successful `fetchOffers` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub product_id: ProductId,
    pub product_name: String,
    pub offers: Vec<Offer>,
}

impl SearchResult {
    /// The cheapest offer, if any.
    #[must_use]
    pub fn best_offer(&self) -> Option<&Offer> {
        self.offers.iter().min_by_key(|offer| offer.price)
    }
}

/// One observation in a product's price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: DateTime<Utc>,
    pub price: Price,
}

/// Optional narrowing of an offers search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Price>,
}

impl SearchFilters {
    /// Whether a price falls inside the `[min_price, max_price]` window.
    #[must_use]
    pub fn admits_price(&self, price: Price) -> bool {
        self.min_price.is_none_or(|min| price >= min)
            && self.max_price.is_none_or(|max| price <= max)
    }
}

/// A selectable filter value (category or brand).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueOption {
    pub id: String,
    pub name: String,
}

impl CatalogueOption {
    #[must_use]
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn milk() -> SearchResult {
        SearchResult {
            product_id: ProductId::new("milk123"),
            product_name: "Молоко".to_owned(),
            offers: vec![
                Offer::new("Самокат", Price::from_roubles(199), "https://samokat.ru/"),
                Offer::new("Kuper", Price::from_roubles(210), "https://kuper.ru/"),
            ],
        }
    }

    #[test]
    fn test_best_offer_is_cheapest() {
        assert_eq!(milk().best_offer().unwrap().service, "Самокат");
    }

    #[test]
    fn test_search_result_uses_camel_case_on_the_wire() {
        let json = serde_json::json!({
            "productId": "milk123",
            "productName": "Молоко",
            "offers": [{"service": "Самокат", "price": 199, "url": "https://samokat.ru/"}]
        });
        let parsed: SearchResult = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.product_id.as_str(), "milk123");
        assert_eq!(parsed.offers.len(), 1);
    }

    #[test]
    fn test_filters_price_window() {
        let filters = SearchFilters {
            min_price: Some(Price::from_roubles(200)),
            max_price: Some(Price::from_roubles(206)),
            ..SearchFilters::default()
        };
        assert!(!filters.admits_price(Price::from_roubles(199)));
        assert!(filters.admits_price(Price::from_roubles(205)));
        assert!(!filters.admits_price(Price::from_roubles(210)));
        assert!(SearchFilters::default().admits_price(Price::from_roubles(1)));
    }

    #[test]
    fn test_empty_filters_serialize_to_empty_object() {
        let json = serde_json::to_value(SearchFilters::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
