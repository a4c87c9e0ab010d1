//! SVG writer for stacked horizontal bar charts.

use crate::domain::chart::Chart;
use crate::domain::error::DashboardError;
use crate::ports::chart_port::ChartPort;
use std::fs;
use std::path::Path;

pub const PX_PER_UNIT: f64 = 72.0;
const MARGIN_LEFT: f64 = 220.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
const BAR_FILL: f64 = 0.8;
const TICKS: usize = 5;

const ASSETS_COLOR: &str = "blue";
const LIABILITIES_COLOR: &str = "red";

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Whole amount with thousands separators, e.g. `-1,234,567`.
pub fn fmt_amount(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && grouped != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn generate_chart_svg(chart: &Chart) -> String {
    let width = chart.width * PX_PER_UNIT;
    let height = chart.height * PX_PER_UNIT;
    let plot_width = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = height - MARGIN_TOP - MARGIN_BOTTOM;

    let (lo, hi) = chart.x_range();
    let range = if hi > lo { hi - lo } else { 1.0 };
    let x_scale = |v: f64| -> f64 { MARGIN_LEFT + (v - lo) / range * plot_width };

    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}" xmlns="http://www.w3.org/2000/svg">"##,
        width, height, width, height
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{:.1}\" y=\"30\" text-anchor=\"middle\" font-size=\"16\">{}</text>\n",
        width / 2.0,
        escape_xml(&chart.labels.title)
    ));

    // x axis with ticks
    let axis_y = MARGIN_TOP + plot_height;
    svg.push_str(&format!(
        "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#333\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        axis_y,
        MARGIN_LEFT + plot_width,
        axis_y
    ));
    for i in 0..=TICKS {
        let value = lo + range * i as f64 / TICKS as f64;
        let x = x_scale(value);
        svg.push_str(&format!(
            "  <line x1=\"{x:.1}\" y1=\"{:.1}\" x2=\"{x:.1}\" y2=\"{:.1}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
            MARGIN_TOP, axis_y
        ));
        svg.push_str(&format!(
            "  <text x=\"{x:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            axis_y + 15.0,
            fmt_amount(value)
        ));
    }
    svg.push_str(&format!(
        "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\">{}</text>\n",
        MARGIN_LEFT + plot_width / 2.0,
        height - 15.0,
        escape_xml(&chart.labels.x_label)
    ));

    if !chart.bars.is_empty() {
        let band = plot_height / chart.bars.len() as f64;
        let thickness = band * BAR_FILL;
        for (i, bar) in chart.bars.iter().enumerate() {
            let y = MARGIN_TOP + band * i as f64 + (band - thickness) / 2.0;
            for (segment, color) in [
                (bar.assets, ASSETS_COLOR),
                (bar.liabilities, LIABILITIES_COLOR),
            ] {
                let x0 = x_scale(segment.start.min(segment.end()));
                let x1 = x_scale(segment.start.max(segment.end()));
                svg.push_str(&format!(
                    "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>\n",
                    x0,
                    y,
                    x1 - x0,
                    thickness,
                    color
                ));
            }
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" dominant-baseline=\"middle\" font-size=\"11\">{}</text>\n",
                MARGIN_LEFT - 6.0,
                y + thickness / 2.0,
                escape_xml(&bar.label)
            ));
        }
    }

    // legend, top right of the plot
    let legend_x = MARGIN_LEFT + plot_width - 110.0;
    for (i, (name, color)) in [
        (&chart.labels.assets_legend, ASSETS_COLOR),
        (&chart.labels.liabilities_legend, LIABILITIES_COLOR),
    ]
    .into_iter()
    .enumerate()
    {
        let y = MARGIN_TOP + 8.0 + i as f64 * 18.0;
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{}\"/>\n",
            legend_x, y, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\">{}</text>\n",
            legend_x + 18.0,
            y + 10.0,
            escape_xml(name)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SvgChartAdapter;

impl SvgChartAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ChartPort for SvgChartAdapter {
    fn write(&self, chart: &Chart, output_path: &str) -> Result<(), DashboardError> {
        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, generate_chart_svg(chart))?;
        Ok(())
    }
}
