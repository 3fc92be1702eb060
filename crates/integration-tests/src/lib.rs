//! Integration tests for Pricewatch.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pricewatch-integration-tests
//! ```
//!
//! No external services are needed: the console runs against the in-memory
//! mock catalogue, or against an `httpmock` server for the HTTP adapter.
//!
//! # Test Categories
//!
//! - `scenarios` - End-to-end user flows through `Console::dispatch`
//! - `properties` - Ordering, uniqueness and auth-gating guarantees
//! - `http_console` - The console driven over the REST adapter

use std::time::Duration;

use pricewatch_console::{
    Command, Console, ConsoleConfig, Credentials, MockDataService, Outcome, Region,
};
use pricewatch_core::SearchFilters;

/// Demo account seeded into every mock service.
pub const DEMO_EMAIL: &str = "user@example.com";
pub const DEMO_PASSWORD: &str = "password123";

/// A console over a mock service, plus a handle on that service for
/// inspecting which calls reached it.
pub struct TestContext {
    pub console: Console<MockDataService>,
    pub service: MockDataService,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        let service = MockDataService::with_latency(latency);
        Self {
            console: Console::new(ConsoleConfig::default(), service.clone()),
            service,
        }
    }

    /// Search without filters.
    ///
    /// # Errors
    ///
    /// Returns the console's error, e.g. `EmptyResult` for an unknown product.
    pub async fn search(&self, query: &str) -> pricewatch_console::Result<Outcome> {
        self.console
            .dispatch(Command::Search {
                query: query.to_owned(),
                filters: SearchFilters::default(),
            })
            .await
    }

    /// Sign in as the demo user.
    ///
    /// # Errors
    ///
    /// Returns the console's error if the login is refused.
    pub async fn sign_in(&self) -> pricewatch_console::Result<Outcome> {
        self.console
            .dispatch(Command::Login(Credentials::new(DEMO_EMAIL, DEMO_PASSWORD)))
            .await
    }

    /// The first command a region offers that matches `pick`.
    #[must_use]
    pub fn offered(&self, region: Region, pick: impl Fn(&Command) -> bool) -> Option<Command> {
        self.console
            .screen()
            .commands(region)
            .into_iter()
            .find(|command| pick(command))
    }

    #[must_use]
    pub fn body(&self, region: Region) -> String {
        self.console.screen().body(region)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Offer lines of a rendered search result.
#[must_use]
pub fn offer_lines(body: &str) -> Vec<&str> {
    body.lines().filter(|line| line.starts_with("- ")).collect()
}
