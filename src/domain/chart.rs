//! Stacked horizontal bar chart model.

use crate::domain::error::DashboardError;
use crate::domain::table::Table;

pub const CHART_WIDTH: f64 = 12.0;
pub const MIN_CHART_HEIGHT: f64 = 4.0;
pub const HEIGHT_PER_BAR: f64 = 0.8;

pub const DEFAULT_TITLE: &str = "Distribución de Activos y Pasivos por Compañía";
pub const DEFAULT_X_LABEL: &str = "Monto";

/// max(4, 0.8 * bars)
pub fn chart_height(bars: usize) -> f64 {
    (HEIGHT_PER_BAR * bars as f64).max(MIN_CHART_HEIGHT)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub length: f64,
}

impl Segment {
    pub fn end(&self) -> f64 {
        self.start + self.length
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub assets: Segment,
    pub liabilities: Segment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLabels {
    pub title: String,
    pub x_label: String,
    pub assets_legend: String,
    pub liabilities_legend: String,
}

impl Default for ChartLabels {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            x_label: DEFAULT_X_LABEL.to_string(),
            assets_legend: "Activos".to_string(),
            liabilities_legend: "Pasivos".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub labels: ChartLabels,
    pub width: f64,
    pub height: f64,
    pub bars: Vec<Bar>,
}

impl Chart {
    /// Smallest and largest x reached by any segment, always including 0.
    pub fn x_range(&self) -> (f64, f64) {
        self.bars
            .iter()
            .flat_map(|b| [b.assets.start, b.assets.end(), b.liabilities.end()])
            .fold((0.0, 0.0), |(lo, hi), x| (f64::min(lo, x), f64::max(hi, x)))
    }
}

/// One bar per row: assets from zero, liabilities stacked on the assets end.
/// Missing values draw as zero-length segments.
pub fn render(
    table: &Table,
    name_col: &str,
    assets_col: &str,
    liabilities_col: &str,
) -> Result<Chart, DashboardError> {
    render_with_labels(
        table,
        name_col,
        assets_col,
        liabilities_col,
        ChartLabels::default(),
    )
}

pub fn render_with_labels(
    table: &Table,
    name_col: &str,
    assets_col: &str,
    liabilities_col: &str,
    labels: ChartLabels,
) -> Result<Chart, DashboardError> {
    for column in [name_col, assets_col, liabilities_col] {
        table.require_column(column)?;
    }

    let bars: Vec<Bar> = table
        .rows()
        .iter()
        .map(|row| {
            let assets = row.get(assets_col).as_number().unwrap_or(0.0);
            let liabilities = row.get(liabilities_col).as_number().unwrap_or(0.0);
            Bar {
                label: row.get(name_col).to_string(),
                assets: Segment {
                    start: 0.0,
                    length: assets,
                },
                liabilities: Segment {
                    start: assets,
                    length: liabilities,
                },
            }
        })
        .collect();

    Ok(Chart {
        labels,
        width: CHART_WIDTH,
        height: chart_height(bars.len()),
        bars,
    })
}
