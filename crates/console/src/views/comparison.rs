//! Comparison table.

use askama::Template;

use super::render_template;
use crate::command::Command;
use crate::screen::{Region, Screen};
use crate::stores::ComparisonTable;

struct RowView {
    label: String,
    cells: Vec<String>,
}

#[derive(Template)]
#[template(path = "comparison.txt")]
struct ComparisonTemplate {
    columns: Vec<String>,
    rows: Vec<RowView>,
}

pub fn render_comparison(screen: &Screen, table: &ComparisonTable) {
    if table.is_empty() {
        screen.render(
            Region::Comparison,
            "Добавьте товары для сравнения.",
            Vec::new(),
        );
        return;
    }

    let rows = table
        .rows
        .iter()
        .map(|row| RowView {
            label: row.label.clone(),
            cells: row.cell_texts(),
        })
        .collect();
    let body = render_template(
        &ComparisonTemplate {
            columns: table.columns.clone(),
            rows,
        },
        "Не удалось отобразить сравнение.",
    );
    screen.render(Region::Comparison, body, vec![Command::ClearComparison]);
}
