//! Line-oriented front end: parses a typed line, resolves it against what the
//! screen currently offers and dispatches the resulting command.

use std::collections::HashMap;

use clap::{Parser, Subcommand};
use pricewatch_console::screen::{RegionContent, format_region};
use pricewatch_console::{Command, Console, Credentials, DataService, Region, Screen};
use pricewatch_core::{Price, ProductId, SearchFilters};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::CliError;

const GREETING: &str = "Введите `help`, чтобы увидеть список команд.\n";

#[derive(Parser)]
#[command(name = "console", no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Action {
    /// Search offers for a product
    Search {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long, value_parser = parse_price)]
        min_price: Option<Price>,
        #[arg(long, value_parser = parse_price)]
        max_price: Option<Price>,
        /// Product name; may contain spaces. Filters may come before or after it.
        query: Vec<String>,
    },
    /// Add the shown product to the comparison
    Compare,
    /// Empty the comparison
    ClearCompare,
    /// Add the shown product to favorites
    Fav,
    /// Remove a product from favorites
    Unfav { product_id: String },
    /// Create a price alert for the shown product
    Alert { target_price: String },
    /// Open the login dialog
    Auth,
    /// Close the login dialog
    Close,
    Login { email: String, password: String },
    Register { email: String, password: String },
    Logout,
    /// Print one region, or the whole screen
    Show { region: Option<Region> },
    Quit,
}

fn parse_price(raw: &str) -> Result<Price, String> {
    Price::parse_positive(raw).map_err(|e| e.to_string())
}

/// What to do with a parsed line.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Dispatch(Command),
    Show(Option<Region>),
    /// The screen does not offer the action right now.
    Unavailable(&'static str),
    Quit,
}

/// Find a command the region offers.
fn offered(screen: &Screen, region: Region, pick: impl Fn(&Command) -> bool) -> Option<Command> {
    screen.commands(region).into_iter().find(|command| pick(command))
}

fn resolve(screen: &Screen, action: Action) -> Step {
    match action {
        Action::Search {
            category,
            brand,
            min_price,
            max_price,
            query,
        } => Step::Dispatch(Command::Search {
            query: query.join(" "),
            filters: SearchFilters {
                category,
                brand,
                min_price,
                max_price,
            },
        }),
        Action::Compare => offered(screen, Region::SearchResults, |command| {
            matches!(command, Command::AddToComparison(_))
        })
        .map_or(Step::Unavailable("Сначала найдите товар."), Step::Dispatch),
        Action::ClearCompare => Step::Dispatch(Command::ClearComparison),
        Action::Fav => offered(screen, Region::SearchResults, |command| {
            matches!(command, Command::AddFavorite { .. })
        })
        .map_or(Step::Unavailable("Сначала найдите товар."), Step::Dispatch),
        Action::Unfav { product_id } => Step::Dispatch(Command::RemoveFavorite {
            product_id: ProductId::new(product_id),
        }),
        Action::Alert { target_price } => {
            match offered(screen, Region::AlertForm, |command| {
                matches!(command, Command::CreateAlert { .. } | Command::OpenAuth)
            }) {
                Some(Command::CreateAlert { product_id, .. }) => {
                    Step::Dispatch(Command::CreateAlert {
                        product_id,
                        target_price,
                    })
                }
                Some(command) => Step::Dispatch(command),
                None => Step::Unavailable("Сначала найдите товар."),
            }
        }
        Action::Auth => Step::Dispatch(Command::OpenAuth),
        Action::Close => Step::Dispatch(Command::CloseAuth),
        Action::Login { email, password } => {
            Step::Dispatch(Command::Login(Credentials::new(email, password)))
        }
        Action::Register { email, password } => {
            Step::Dispatch(Command::Register(Credentials::new(email, password)))
        }
        Action::Logout => Step::Dispatch(Command::Logout),
        Action::Show { region } => Step::Show(region),
        Action::Quit => Step::Quit,
    }
}

/// Regions whose content differs from the last print.
fn changed_regions(screen: &Screen, seen: &mut HashMap<Region, RegionContent>) -> String {
    let mut out = String::new();
    for region in Region::ALL {
        let content = screen.region(region);
        if seen.get(&region) == Some(&content) {
            continue;
        }
        out.push_str(&format_region(region, &content));
        seen.insert(region, content);
    }
    out
}

async fn write(out: &mut (impl AsyncWrite + Unpin), text: &str) -> Result<(), CliError> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run<S: DataService>(console: &Console<S>, full: bool) -> Result<(), CliError> {
    let mut out = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seen = HashMap::new();

    console.start().await;
    write(&mut out, &changed_regions(console.screen(), &mut seen)).await?;
    write(&mut out, GREETING).await?;

    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        let action = match Line::try_parse_from(words) {
            Ok(line) => line.action,
            Err(err) => {
                write(&mut out, &err.render().to_string()).await?;
                continue;
            }
        };

        let command = match resolve(console.screen(), action) {
            Step::Dispatch(command) => command,
            Step::Show(Some(region)) => {
                let text = format_region(region, &console.screen().region(region));
                write(&mut out, &text).await?;
                continue;
            }
            Step::Show(None) => {
                write(&mut out, &console.screen().dump()).await?;
                continue;
            }
            Step::Unavailable(reason) => {
                write(&mut out, &format!("{reason}\n")).await?;
                continue;
            }
            Step::Quit => break,
        };

        if let Err(err) = console.dispatch(command).await {
            tracing::debug!(error = %err, "Command failed");
            write(&mut out, &format!("! {err}\n")).await?;
        }

        let screen = console.screen();
        let text = if full {
            screen.dump()
        } else {
            changed_regions(screen, &mut seen)
        };
        write(&mut out, &text).await?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pricewatch_console::{ConsoleConfig, MockDataService};

    use super::*;

    fn parse(line: &str) -> Action {
        Line::try_parse_from(line.split_whitespace()).unwrap().action
    }

    #[test]
    fn test_search_joins_query_words() {
        let action = parse("search --brand Простоквашино молоко 3.2%");
        assert_eq!(
            action,
            Action::Search {
                category: None,
                brand: Some("Простоквашино".to_owned()),
                min_price: None,
                max_price: None,
                query: vec!["молоко".to_owned(), "3.2%".to_owned()],
            }
        );
    }

    #[test]
    fn test_filters_after_query_are_parsed() {
        let action = parse("search молоко 3.2% --max-price 205");
        assert_eq!(
            action,
            Action::Search {
                category: None,
                brand: None,
                min_price: None,
                max_price: Some(Price::from_roubles(205)),
                query: vec!["молоко".to_owned(), "3.2%".to_owned()],
            }
        );
    }

    #[test]
    fn test_invalid_price_filter_is_rejected() {
        assert!(Line::try_parse_from(["search", "--min-price", "0", "сыр"]).is_err());
    }

    #[test]
    fn test_region_argument_is_parsed() {
        assert_eq!(
            parse("show compare"),
            Action::Show {
                region: Some(Region::Comparison)
            }
        );
    }

    #[test]
    fn test_compare_needs_a_result() {
        let screen = Screen::new();
        assert_eq!(
            resolve(&screen, Action::Compare),
            Step::Unavailable("Сначала найдите товар.")
        );
    }

    #[tokio::test]
    async fn test_alert_asks_anonymous_user_to_sign_in() {
        let console = Console::new(ConsoleConfig::default(), MockDataService::new());
        console.start().await;
        console
            .dispatch(resolve_line(&console, "search молоко"))
            .await
            .unwrap();

        assert_eq!(
            resolve(console.screen(), parse("alert 150")),
            Step::Dispatch(Command::OpenAuth)
        );
    }

    #[tokio::test]
    async fn test_alert_fills_in_target_price() {
        let console = Console::new(ConsoleConfig::default(), MockDataService::new());
        console.start().await;
        console
            .dispatch(resolve_line(&console, "login user@example.com password123"))
            .await
            .unwrap();
        console
            .dispatch(resolve_line(&console, "search молоко"))
            .await
            .unwrap();

        let Step::Dispatch(Command::CreateAlert {
            product_id,
            target_price,
        }) = resolve(console.screen(), parse("alert 150"))
        else {
            panic!("expected an alert command");
        };
        assert_eq!(product_id.as_str(), "milk123");
        assert_eq!(target_price, "150");
    }

    #[test]
    fn test_changed_regions_prints_each_change_once() {
        let screen = Screen::new();
        let mut seen = HashMap::new();
        let first = changed_regions(&screen, &mut seen);
        screen.render(Region::Comparison, "Добавьте товары для сравнения.", Vec::new());

        let second = changed_regions(&screen, &mut seen);

        assert!(first.contains("[compare]"));
        assert!(second.contains("Добавьте товары для сравнения."));
        assert!(!second.contains("[results]"));
        assert!(changed_regions(&screen, &mut seen).is_empty());
    }

    fn resolve_line(console: &Console<MockDataService>, line: &str) -> Command {
        match resolve(console.screen(), parse(line)) {
            Step::Dispatch(command) => command,
            step => panic!("unexpected step {step:?}"),
        }
    }
}
