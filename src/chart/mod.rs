pub mod svg;

use std::fmt::Write;

use thiserror::Error;

use crate::history::FileSeries;
use crate::projection::Geometry;
use crate::series::CategoryGroup;

/// Circle colors, indexed by a recording's rank within its dance (most
/// common recording first). Its length is the hard ceiling on distinct
/// recordings per category — running past it is an error, never a wrap.
pub const SERIES_COLORS: &[&str] = &[
    "black",
    "blue",
    "green",
    "red",
    "orange",
    "darkblue",
    "darkgreen",
    "darkred",
    "darkorange",
];

/// Stroke for the hour and year reference lines, and the label color.
pub const GRID_COLOR: &str = "lightgray";

/// File name of the pooled chart for rarely danced categories.
pub const RARE_CHART_NAME: &str = "less_than_three.svg";

/// File name of the index document referencing every chart.
pub const INDEX_NAME: &str = "index.html";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error(
        "category {category:?} has a recording at rank {rank}, beyond the \
         {palette}-color palette"
    )]
    PaletteExhausted {
        category: String,
        rank: usize,
        palette: usize,
    },
}

/// Label plus the grid: horizontal lines for each whole evening hour,
/// vertical lines for each year boundary in range.
fn frame(out: &mut String, label: &str, geom: &Geometry) {
    svg::text(out, label, 0.0, geom.label_y());
    for y in geom.hour_lines() {
        svg::line(out, geom.offset, y, geom.width, y, GRID_COLOR);
    }
    for x in geom.year_lines() {
        svg::line(out, x, 0.0, x, geom.height, GRID_COLOR);
    }
}

/// One circle per play that projects into view. Events above the evening
/// window are dropped from rendering only; they still count toward the
/// totals the caller put in the label.
fn plot_series(out: &mut String, series: &FileSeries, color: &str, geom: &Geometry) {
    for event in series {
        let Some(y) = geom.y(event) else { continue };
        svg::circle(out, geom.x(event), y, geom.radius, color);
    }
}

/// Render one category's chart: `"<count> <name>"` label, grid, and every
/// recording's plays colored by that recording's rank.
pub fn render_category(group: &CategoryGroup, geom: &Geometry) -> Result<String, ChartError> {
    let mut out = String::new();
    svg::header(&mut out, geom.width, geom.height);
    frame(&mut out, &format!("{} {}", group.total(), group.name), geom);

    for (rank, series) in group.series.iter().enumerate() {
        let color = SERIES_COLORS
            .get(rank)
            .ok_or_else(|| ChartError::PaletteExhausted {
                category: group.name.clone(),
                rank,
                palette: SERIES_COLORS.len(),
            })?;
        plot_series(&mut out, series, color, geom);
    }

    svg::footer(&mut out);
    Ok(out)
}

/// Render the pooled chart for categories below the popularity threshold.
/// Every series draws in the first palette color; the label counts the
/// whole pool.
pub fn render_rare(groups: &[CategoryGroup], geom: &Geometry) -> String {
    let total: usize = groups.iter().map(CategoryGroup::total).sum();

    let mut out = String::new();
    svg::header(&mut out, geom.width, geom.height);
    frame(&mut out, &format!("{total} less than three"), geom);
    for group in groups {
        for series in &group.series {
            plot_series(&mut out, series, SERIES_COLORS[0], geom);
        }
    }
    svg::footer(&mut out);
    out
}

/// Render the index document: one image reference per chart in Ranking
/// order, terminated by the rare-pool chart.
pub fn render_index(chart_count: usize) -> String {
    let mut out = String::new();
    for i in 1..=chart_count {
        let _ = writeln!(out, "<p><img src=\"{i}.svg\"/></p>");
    }
    let _ = writeln!(out, "<p><img src=\"{RARE_CHART_NAME}\"/></p>");
    out
}
