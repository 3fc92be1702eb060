//! The presentation surface.
//!
//! A [`Screen`] is a set of named regions. Views write rendered text and the
//! commands a region offers into it; front ends read it back. Regions can
//! also carry a flash message that clears itself after a delay.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::command::Command;
use crate::sync::lock;

/// A named area of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    SessionIndicator,
    Profile,
    Filters,
    SearchResults,
    PriceChart,
    AlertForm,
    Comparison,
    Favorites,
    Recommendations,
    AuthModal,
}

impl Region {
    /// Every region, in display order.
    pub const ALL: [Self; 10] = [
        Self::SessionIndicator,
        Self::Profile,
        Self::Filters,
        Self::SearchResults,
        Self::PriceChart,
        Self::AlertForm,
        Self::Comparison,
        Self::Favorites,
        Self::Recommendations,
        Self::AuthModal,
    ];

    /// Short name used on the command line.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::SessionIndicator => "session",
            Self::Profile => "profile",
            Self::Filters => "filters",
            Self::SearchResults => "results",
            Self::PriceChart => "chart",
            Self::AlertForm => "alert",
            Self::Comparison => "compare",
            Self::Favorites => "favorites",
            Self::Recommendations => "recommendations",
            Self::AuthModal => "auth",
        }
    }

    /// Heading shown above the region.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::SessionIndicator => "Аккаунт",
            Self::Profile => "Профиль",
            Self::Filters => "Фильтры",
            Self::SearchResults => "Результаты поиска",
            Self::PriceChart => "История цен",
            Self::AlertForm => "Уведомления о снижении цены",
            Self::Comparison => "Сравнение",
            Self::Favorites => "Избранные товары",
            Self::Recommendations => "Рекомендации",
            Self::AuthModal => "Вход / Регистрация",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when parsing an unknown region name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("неизвестная область: {0}")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|region| region.key() == s)
            .ok_or_else(|| UnknownRegion(s.to_owned()))
    }
}

/// What a region currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionContent {
    pub body: String,
    /// Actions offered by the region.
    pub commands: Vec<Command>,
    pub visible: bool,
    /// Transient message shown under the body.
    pub flash: Option<String>,
    /// Number of renders since startup.
    pub renders: u64,
}

impl RegionContent {
    /// Body followed by the flash message, if any.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.flash {
            Some(flash) => format!("{}\n{flash}", self.body),
            None => self.body.clone(),
        }
    }
}

#[derive(Debug)]
struct ScreenState {
    regions: HashMap<Region, RegionContent>,
    /// Identifies the latest flash per region, so an older timer cannot
    /// clear a newer message.
    flash_tokens: HashMap<Region, u64>,
    next_token: u64,
}

impl Default for ScreenState {
    fn default() -> Self {
        let regions = Region::ALL
            .into_iter()
            .map(|region| {
                let visible = !matches!(region, Region::Profile | Region::AuthModal);
                (
                    region,
                    RegionContent {
                        visible,
                        ..RegionContent::default()
                    },
                )
            })
            .collect();
        Self {
            regions,
            flash_tokens: HashMap::new(),
            next_token: 0,
        }
    }
}

impl ScreenState {
    fn content(&mut self, region: Region) -> &mut RegionContent {
        self.regions.entry(region).or_default()
    }

    fn issue_token(&mut self, region: Region) -> u64 {
        self.next_token += 1;
        self.flash_tokens.insert(region, self.next_token);
        self.next_token
    }
}

/// Shared handle to the presentation surface.
///
/// Cheap to clone; clones refer to the same regions.
#[derive(Debug, Clone, Default)]
pub struct Screen {
    inner: Arc<Mutex<ScreenState>>,
}

impl Screen {
    /// A blank screen. The profile and the auth dialog start hidden.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a region's body and commands. Drops any flash message.
    pub fn render(&self, region: Region, body: impl Into<String>, commands: Vec<Command>) {
        let mut state = lock(&self.inner);
        state.issue_token(region);
        let content = state.content(region);
        content.body = body.into();
        content.commands = commands;
        content.flash = None;
        content.renders += 1;
    }

    pub fn set_visible(&self, region: Region, visible: bool) {
        lock(&self.inner).content(region).visible = visible;
    }

    /// Show a flash message under a region.
    ///
    /// With `ttl` the message clears itself unless it has been replaced in the
    /// meantime. Without, it stays until the next render or flash.
    pub fn flash(&self, region: Region, message: impl Into<String>, ttl: Option<Duration>) {
        let token = {
            let mut state = lock(&self.inner);
            let token = state.issue_token(region);
            state.content(region).flash = Some(message.into());
            token
        };

        let Some(ttl) = ttl else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(%region, "No runtime, flash message will not auto-clear");
            return;
        };
        let screen = self.clone();
        runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            screen.expire_flash(region, token);
        });
    }

    fn expire_flash(&self, region: Region, token: u64) {
        let mut state = lock(&self.inner);
        if state.flash_tokens.get(&region) == Some(&token) {
            state.content(region).flash = None;
        }
    }

    /// Snapshot of one region.
    #[must_use]
    pub fn region(&self, region: Region) -> RegionContent {
        lock(&self.inner)
            .regions
            .get(&region)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn body(&self, region: Region) -> String {
        self.region(region).body
    }

    #[must_use]
    pub fn flash_text(&self, region: Region) -> Option<String> {
        self.region(region).flash
    }

    #[must_use]
    pub fn commands(&self, region: Region) -> Vec<Command> {
        self.region(region).commands
    }

    #[must_use]
    pub fn render_count(&self, region: Region) -> u64 {
        self.region(region).renders
    }

    #[must_use]
    pub fn is_visible(&self, region: Region) -> bool {
        self.region(region).visible
    }

    /// All visible regions as text, with headings and command captions.
    #[must_use]
    pub fn dump(&self) -> String {
        Region::ALL
            .into_iter()
            .map(|region| format_region(region, &self.region(region)))
            .collect()
    }
}

/// One region as text: heading, body, flash and command captions.
///
/// Hidden regions format to an empty string.
#[must_use]
pub fn format_region(region: Region, content: &RegionContent) -> String {
    let mut out = String::new();
    if !content.visible {
        return out;
    }
    let _ = writeln!(out, "== {} [{}] ==", region.title(), region.key());
    let _ = writeln!(out, "{}", content.text());
    if !content.commands.is_empty() {
        let captions: Vec<&str> = content.commands.iter().map(Command::caption).collect();
        let _ = writeln!(out, "[{}]", captions.join("] ["));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_names_round_trip() {
        for region in Region::ALL {
            assert_eq!(region.key().parse::<Region>(), Ok(region));
        }
        assert!("nowhere".parse::<Region>().is_err());
    }

    #[test]
    fn test_render_counts_and_clears_flash() {
        let screen = Screen::new();
        screen.flash(Region::SearchResults, "Добавляем...", None);
        screen.render(Region::SearchResults, "Загрузка...", Vec::new());

        let content = screen.region(Region::SearchResults);
        assert_eq!(content.renders, 1);
        assert_eq!(content.body, "Загрузка...");
        assert!(content.flash.is_none());
    }

    #[test]
    fn test_profile_and_auth_start_hidden() {
        let screen = Screen::new();
        assert!(!screen.is_visible(Region::Profile));
        assert!(!screen.is_visible(Region::AuthModal));
        assert!(screen.is_visible(Region::Favorites));
        assert!(!screen.dump().contains("[profile]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flash_clears_after_ttl() {
        let screen = Screen::new();
        screen.flash(
            Region::AlertForm,
            "Уведомление создано (запрос отправлен)!",
            Some(Duration::from_millis(2500)),
        );
        assert!(screen.flash_text(Region::AlertForm).is_some());

        tokio::time::sleep(Duration::from_millis(2600)).await;
        assert!(screen.flash_text(Region::AlertForm).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_keeps_newer_flash() {
        let screen = Screen::new();
        let ttl = Some(Duration::from_millis(1000));
        screen.flash(Region::SearchResults, "Добавлено в избранное!", ttl);
        tokio::time::sleep(Duration::from_millis(600)).await;
        screen.flash(Region::SearchResults, "Не удалось добавить в избранное.", ttl);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(
            screen.flash_text(Region::SearchResults).as_deref(),
            Some("Не удалось добавить в избранное.")
        );

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(screen.flash_text(Region::SearchResults).is_none());
    }
}
