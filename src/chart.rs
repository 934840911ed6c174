//! Layout of the comparison chart.
//!
//! [`ChartPlan::build`] turns labeled results into the six panels of a 2x3
//! grid with their series, colors and axis ranges. Drawing the plan is left to
//! [`crate::render`].

use plotters::style::RGBColor;

use crate::{
    GcBenchError,
    labeling::{LabeledResults, Strategy},
    metrics::{LatencySummary, Metric, derive_runs},
};

pub const GRID: (usize, usize) = (2, 3);
pub const TITLE_PREFIX: &str = "GC Benchmark Comparison";
pub const LATENCY_CATEGORIES: [&str; 2] = ["P50", "P99"];

const TRACE_COLOR: RGBColor = RGBColor(0x34, 0x98, 0xdb);
const RC_COLOR: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);
const ARENA_COLOR: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
const FALLBACK_PALETTE: [RGBColor; 5] = [
    RGBColor(0x9b, 0x59, 0xb6),
    RGBColor(0xf3, 0x9c, 0x12),
    RGBColor(0x1a, 0xbc, 0x9c),
    RGBColor(0x34, 0x49, 0x5e),
    RGBColor(0xe6, 0x7e, 0x22),
];

const BOX_PAD_LOW: f64 = 0.8;
const BOX_PAD_HIGH: f64 = 1.9;
const BAR_LOG_FLOOR: f64 = 0.5;
const BAR_LOG_CEILING: f64 = 2.0;
const BAR_LINEAR_HEADROOM: f64 = 1.1;
const EMPTY_AXIS: (f64, f64) = (0.1, 1.0);

/// How per-run metrics are drawn. One layout applies to the whole chart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChartLayout {
    /// One bar group per run, one bar per label.
    #[default]
    GroupedBars,
    /// One horizontal box per label over all of its runs.
    BoxPlots,
}

impl ChartLayout {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bars" | "bar" => Some(ChartLayout::GroupedBars),
            "box" | "boxplot" | "boxes" => Some(ChartLayout::BoxPlots),
            _ => None,
        }
    }
}

/// Label → color, fixed for every panel of one chart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorMap {
    entries: Vec<(String, RGBColor)>,
}

impl ColorMap {
    /// Strategy labels get their fixed color; anything else cycles the
    /// fallback palette in insertion order.
    pub fn assign(results: &LabeledResults) -> Self {
        let mut fallback = 0usize;
        let entries = results
            .iter()
            .map(|entry| {
                let color = match strategy_color(&entry.strategy) {
                    Some(color) => color,
                    None => {
                        let color = FALLBACK_PALETTE[fallback % FALLBACK_PALETTE.len()];
                        fallback += 1;
                        color
                    }
                };
                (entry.label.clone(), color)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, label: &str) -> Option<RGBColor> {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, color)| *color)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn strategy_color(strategy: &Strategy) -> Option<RGBColor> {
    match strategy {
        Strategy::Trace => Some(TRACE_COLOR),
        Strategy::Arena => Some(ARENA_COLOR),
        Strategy::Rc => Some(RC_COLOR),
        Strategy::Other(_) => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
    pub log: bool,
}

impl AxisRange {
    /// Bar axes start at zero (linear) or just under the smallest positive
    /// value (log).
    pub fn for_bars(values: &[f64], log: bool) -> Self {
        if log {
            let (lo, hi) = positive_bounds(values)
                .map(|(lo, hi)| (lo * BAR_LOG_FLOOR, hi * BAR_LOG_CEILING))
                .unwrap_or(EMPTY_AXIS);
            return Self { min: lo, max: hi, log };
        }
        let hi = values.iter().copied().fold(0.0f64, f64::max) * BAR_LINEAR_HEADROOM;
        Self {
            min: 0.0,
            max: if hi > 0.0 { hi } else { 1.0 },
            log,
        }
    }

    /// Distribution axes pad the observed range so whiskers are not clipped.
    pub fn for_boxes(values: &[f64], log: bool) -> Self {
        let bounds = if log {
            positive_bounds(values)
        } else {
            finite_bounds(values)
        };
        let (lo, hi) = bounds
            .map(|(lo, hi)| (lo * BOX_PAD_LOW, hi * BOX_PAD_HIGH))
            .unwrap_or(if log { EMPTY_AXIS } else { (0.0, 1.0) });
        let hi = if hi > lo { hi } else { lo + 1.0 };
        Self {
            min: lo,
            max: hi,
            log,
        }
    }

    /// Values are lifted to the axis floor on log axes.
    pub fn clamp(&self, value: f64) -> f64 {
        if self.log { value.max(self.min) } else { value }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SeriesPlan {
    pub label: String,
    pub color: RGBColor,
    /// Run-ordered values for metric panels, `[p50, p99]` for latency.
    pub values: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelKind {
    Runs(Metric),
    Latency,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelStyle {
    Bars,
    Boxes,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanelPlan {
    pub kind: PanelKind,
    pub style: PanelStyle,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Bar group names along the x axis; empty for box panels.
    pub categories: Vec<String>,
    pub series: Vec<SeriesPlan>,
    pub axis: AxisRange,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartPlan {
    pub title: String,
    pub layout: ChartLayout,
    pub colors: ColorMap,
    /// Row-major, [`GRID`] shaped.
    pub panels: Vec<PanelPlan>,
    pub jitter_lines: Vec<String>,
}

impl ChartPlan {
    pub fn build(results: &LabeledResults, layout: ChartLayout) -> Result<Self, GcBenchError> {
        if results.is_empty() {
            return Err(GcBenchError::EmptyResultSet);
        }
        let colors = ColorMap::assign(results);
        let mut panels: Vec<PanelPlan> = Metric::ALL
            .into_iter()
            .map(|metric| metric_panel(results, &colors, metric, layout))
            .collect();
        panels.push(latency_panel(results, &colors));

        let names: Vec<&str> = results.iter().map(|e| e.results.name.as_str()).collect();
        Ok(Self {
            title: chart_title(&names),
            layout,
            colors,
            panels,
            jitter_lines: jitter_lines(results),
        })
    }

    pub fn panel(&self, kind: PanelKind) -> Option<&PanelPlan> {
        self.panels.iter().find(|p| p.kind == kind)
    }
}

/// `GC Benchmark Comparison: <suffix>`, where the suffix is the shared prefix
/// before the last underscore or else the first name.
pub fn chart_title(names: &[&str]) -> String {
    let Some(first) = names.first() else {
        return TITLE_PREFIX.to_string();
    };
    let prefix_of = |name: &str| name.rsplit_once('_').map(|(head, _)| head.to_string());
    let shared = prefix_of(first).filter(|prefix| {
        !prefix.is_empty()
            && names
                .iter()
                .all(|name| prefix_of(name).as_deref() == Some(prefix.as_str()))
    });
    format!("{TITLE_PREFIX}: {}", shared.unwrap_or_else(|| first.to_string()))
}

pub fn jitter_lines(results: &LabeledResults) -> Vec<String> {
    results
        .iter()
        .map(|entry| {
            let latency = LatencySummary::from(&entry.results.summary);
            format!("{}: {:.1}%", entry.label, latency.jitter_pct)
        })
        .collect()
}

fn metric_panel(
    results: &LabeledResults,
    colors: &ColorMap,
    metric: Metric,
    layout: ChartLayout,
) -> PanelPlan {
    let raw: Vec<(String, Vec<f64>)> = results
        .iter()
        .map(|entry| {
            let values = derive_runs(&entry.results)
                .iter()
                .map(|run| run.value(metric))
                .collect();
            (entry.label.clone(), values)
        })
        .collect();
    let all: Vec<f64> = raw.iter().flat_map(|(_, v)| v.iter().copied()).collect();
    let (style, axis, categories, x_label) = match layout {
        ChartLayout::GroupedBars => (
            PanelStyle::Bars,
            AxisRange::for_bars(&all, metric.log_scale()),
            run_categories(results),
            "Run".to_string(),
        ),
        ChartLayout::BoxPlots => (
            PanelStyle::Boxes,
            AxisRange::for_boxes(&all, metric.log_scale()),
            Vec::new(),
            metric.axis_label().to_string(),
        ),
    };
    PanelPlan {
        kind: PanelKind::Runs(metric),
        style,
        title: metric.title().to_string(),
        x_label,
        y_label: metric.axis_label().to_string(),
        categories,
        series: into_series(raw, colors, &axis),
        axis,
    }
}

fn latency_panel(results: &LabeledResults, colors: &ColorMap) -> PanelPlan {
    let raw: Vec<(String, Vec<f64>)> = results
        .iter()
        .map(|entry| {
            let latency = LatencySummary::from(&entry.results.summary);
            (entry.label.clone(), vec![latency.p50_us, latency.p99_us])
        })
        .collect();
    let all: Vec<f64> = raw.iter().flat_map(|(_, v)| v.iter().copied()).collect();
    let axis = AxisRange::for_bars(&all, true);
    PanelPlan {
        kind: PanelKind::Latency,
        style: PanelStyle::Bars,
        title: "Latency Percentiles".to_string(),
        x_label: "Percentile".to_string(),
        y_label: "Latency (µs)".to_string(),
        categories: LATENCY_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        series: into_series(raw, colors, &axis),
        axis,
    }
}

fn into_series(raw: Vec<(String, Vec<f64>)>, colors: &ColorMap, axis: &AxisRange) -> Vec<SeriesPlan> {
    raw.into_iter()
        .map(|(label, values)| SeriesPlan {
            color: colors.get(&label).unwrap_or(FALLBACK_PALETTE[0]),
            values: values.into_iter().map(|v| axis.clamp(v)).collect(),
            label,
        })
        .collect()
}

/// Run indices of the longest result set; shorter sets fill the first slots.
fn run_categories(results: &LabeledResults) -> Vec<String> {
    results
        .iter()
        .max_by_key(|entry| entry.results.runs.len())
        .map(|entry| {
            entry
                .results
                .runs
                .iter()
                .map(|run| run.run_index.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn positive_bounds(values: &[f64]) -> Option<(f64, f64)> {
    bounds(values.iter().copied().filter(|v| v.is_finite() && *v > 0.0))
}

fn finite_bounds(values: &[f64]) -> Option<(f64, f64)> {
    bounds(values.iter().copied().filter(|v| v.is_finite()))
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_uses_shared_prefix() {
        assert_eq!(
            chart_title(&["gol_trace", "gol_rc"]),
            "GC Benchmark Comparison: gol"
        );
    }

    #[test]
    fn title_falls_back_to_first_name() {
        assert_eq!(
            chart_title(&["bench-arena-1", "bench-rc-1"]),
            "GC Benchmark Comparison: bench-arena-1"
        );
        assert_eq!(
            chart_title(&["a_x", "b_y"]),
            "GC Benchmark Comparison: a_x"
        );
    }

    #[test]
    fn box_axis_is_padded() {
        let axis = AxisRange::for_boxes(&[10.0, 20.0], false);
        assert_eq!(axis.min, 8.0);
        assert_eq!(axis.max, 38.0);
    }

    #[test]
    fn log_bar_axis_ignores_zeros() {
        let axis = AxisRange::for_bars(&[0.0, 4.0, 16.0], true);
        assert_eq!(axis.min, 2.0);
        assert_eq!(axis.max, 32.0);
        assert_eq!(axis.clamp(0.0), 2.0);
    }

    #[test]
    fn all_zero_log_axis_is_still_valid() {
        let axis = AxisRange::for_bars(&[0.0, 0.0], true);
        assert!(axis.min > 0.0 && axis.max > axis.min);
        let axis = AxisRange::for_boxes(&[], true);
        assert!(axis.min > 0.0 && axis.max > axis.min);
    }

    #[test]
    fn layout_names() {
        assert_eq!(ChartLayout::parse("box"), Some(ChartLayout::BoxPlots));
        assert_eq!(ChartLayout::parse("bars"), Some(ChartLayout::GroupedBars));
        assert_eq!(ChartLayout::parse("pie"), None);
    }
}
