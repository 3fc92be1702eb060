//! Chart surface used by the price history view.
//!
//! A [`ChartSurface`] creates chart instances; every instance must be disposed
//! before another one is drawn on the same surface. [`ChartSlot`] enforces
//! that for the single chart area of the console.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::sync::lock;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

const SHORT_MONTHS: [&str; 12] = [
    "янв.", "февр.", "мар.", "апр.", "мая", "июн.", "июл.", "авг.", "сент.", "окт.", "нояб.",
    "дек.",
];

/// A drawn chart. Holds resources until disposed.
pub trait ChartInstance: Send {
    /// Line representation of the chart.
    fn render(&self) -> String;

    /// Release the instance.
    fn dispose(self: Box<Self>);
}

/// Factory of chart instances.
pub trait ChartSurface: Send + Sync {
    fn create(&self, labels: &[String], series: &[Decimal], title: &str) -> Box<dyn ChartInstance>;
}

/// Axis label for a price point: day and short month, e.g. `3 мар.`.
#[must_use]
pub fn date_label(date: DateTime<Utc>) -> String {
    let month = SHORT_MONTHS
        .get(date.month0() as usize)
        .copied()
        .unwrap_or_default();
    format!("{} {month}", date.day())
}

/// Sparkline renderer that keeps count of its live instances.
#[derive(Debug, Clone, Default)]
pub struct TextChart {
    live: Arc<AtomicUsize>,
}

impl TextChart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instances created and not yet disposed.
    #[must_use]
    pub fn live_instances(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl ChartSurface for TextChart {
    fn create(&self, labels: &[String], series: &[Decimal], title: &str) -> Box<dyn ChartInstance> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Box::new(TextChartInstance {
            title: title.to_owned(),
            labels: labels.to_vec(),
            series: series.to_vec(),
            live: Arc::clone(&self.live),
        })
    }
}

struct TextChartInstance {
    title: String,
    labels: Vec<String>,
    series: Vec<Decimal>,
    live: Arc<AtomicUsize>,
}

impl TextChartInstance {
    fn sparkline(&self) -> String {
        let (Some(min), Some(max)) = (
            self.series.iter().min().copied(),
            self.series.iter().max().copied(),
        ) else {
            return String::new();
        };
        let span = max - min;
        let top = SPARK_LEVELS.len() - 1;

        self.series
            .iter()
            .map(|value| {
                let level = if span.is_zero() {
                    top / 2
                } else {
                    ((*value - min) / span * Decimal::from(top))
                        .round()
                        .to_usize()
                        .unwrap_or(0)
                        .min(top)
                };
                SPARK_LEVELS.get(level).copied().unwrap_or(' ')
            })
            .collect()
    }
}

impl ChartInstance for TextChartInstance {
    fn render(&self) -> String {
        let mut out = format!("{}\n{}", self.title, self.sparkline());
        if let (Some(first), Some(last)) = (self.labels.first(), self.labels.last()) {
            out.push_str(&format!("\n{first} … {last}"));
        }
        if let (Some(min), Some(max), Some(current)) = (
            self.series.iter().min(),
            self.series.iter().max(),
            self.series.last(),
        ) {
            out.push_str(&format!(
                "\nмин. {} ₽, макс. {} ₽, сейчас {} ₽",
                min.normalize(),
                max.normalize(),
                current.normalize()
            ));
        }
        out
    }

    fn dispose(self: Box<Self>) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The chart area: holds at most one live instance.
#[derive(Default)]
pub struct ChartSlot {
    current: Mutex<Option<Box<dyn ChartInstance>>>,
}

impl ChartSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispose the current chart, draw a new one and return its rendering.
    pub fn draw(
        &self,
        surface: &dyn ChartSurface,
        labels: &[String],
        series: &[Decimal],
        title: &str,
    ) -> String {
        let mut current = lock(&self.current);
        if let Some(previous) = current.take() {
            debug!("Disposing previous chart");
            previous.dispose();
        }
        let chart = surface.create(labels, series, title);
        let rendered = chart.render();
        *current = Some(chart);
        rendered
    }

    /// Dispose the current chart, if any.
    pub fn clear(&self) {
        if let Some(previous) = lock(&self.current).take() {
            previous.dispose();
        }
    }

    #[must_use]
    pub fn is_drawn(&self) -> bool {
        lock(&self.current).is_some()
    }
}
