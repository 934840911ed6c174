//! Draws a [`ChartPlan`] into a PNG with `plotters`.

use std::path::{Path, PathBuf};

use plotters::{coord::Shift, drawing::DrawingAreaErrorKind, prelude::*};
use tracing::{info, warn};

use crate::{
    GcBenchError,
    chart::{ChartLayout, ChartPlan, GRID, PanelKind, PanelPlan, PanelStyle},
    labeling::LabeledResults,
};

pub const IMAGE_SIZE: (u32, u32) = (1400, 800);

const FONT: &str = "sans-serif";
const TITLE_FONT_SIZE: u32 = 24;
const PANEL_FONT_SIZE: u32 = 16;
const NOTE_FONT_SIZE: u32 = 13;
const GROUP_WIDTH: f64 = 0.8;
const NOTE_BACKGROUND: RGBColor = RGBColor(0xf5, 0xde, 0xb3);

impl<E> From<DrawingAreaErrorKind<E>> for GcBenchError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        GcBenchError::render(err.to_string())
    }
}

/// Lays out and renders `results` into `output`, replacing any previous image.
pub fn compose(
    results: &LabeledResults,
    layout: ChartLayout,
    output: &Path,
) -> Result<PathBuf, GcBenchError> {
    if results.is_empty() {
        warn!("no data to plot");
        return Err(GcBenchError::EmptyResultSet);
    }
    let plan = ChartPlan::build(results, layout)?;
    render_plan(&plan, output)?;
    info!(path = %output.display(), "saved comparison chart");
    Ok(output.to_path_buf())
}

pub fn render_plan(plan: &ChartPlan, output: &Path) -> Result<(), GcBenchError> {
    draw_plan(BitMapBackend::new(output, IMAGE_SIZE).into_drawing_area(), plan)
}

/// Draws every panel of `plan` onto `root` and presents it.
pub fn draw_plan<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    plan: &ChartPlan,
) -> Result<(), GcBenchError> {
    root.fill(&WHITE)?;
    let root = root.titled(&plan.title, (FONT, TITLE_FONT_SIZE).into_font().style(FontStyle::Bold))?;
    let areas = root.split_evenly(GRID);
    for (area, panel) in areas.iter().zip(&plan.panels) {
        match panel.style {
            PanelStyle::Bars => draw_bar_panel(area, panel)?,
            PanelStyle::Boxes => draw_box_panel(area, panel)?,
        }
        if panel.kind == PanelKind::Latency {
            draw_jitter_note(area, &plan.jitter_lines)?;
        }
    }
    root.present()?;
    Ok(())
}

macro_rules! fill_bars {
    ($chart:expr, $panel:expr) => {{
        let chart = &mut $chart;
        let panel: &PanelPlan = $panel;
        let categories = &panel.categories;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(categories.len().max(1))
            .x_label_formatter(&|x: &f64| category_label(categories, *x))
            .x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .draw()?;
        let count = panel.series.len().max(1) as f64;
        let width = GROUP_WIDTH / count;
        let floor = panel.axis.min;
        for (idx, series) in panel.series.iter().enumerate() {
            let offset = (idx as f64 - count / 2.0 + 0.5) * width;
            let color = series.color;
            chart
                .draw_series(series.values.iter().enumerate().map(|(slot, value)| {
                    let center = slot as f64 + offset;
                    Rectangle::new(
                        [(center - width / 2.0, floor), (center + width / 2.0, *value)],
                        color.filled(),
                    )
                }))?
                .label(series.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }};
}

macro_rules! fill_boxes {
    ($chart:expr, $panel:expr, $labels:expr) => {{
        let chart = &mut $chart;
        let panel: &PanelPlan = $panel;
        let labels: &[String] = $labels;
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(labels.len())
            .y_label_formatter(&|seg: &SegmentValue<usize>| segment_label(labels, seg))
            .x_desc(panel.x_label.as_str())
            .draw()?;
        for (idx, series) in panel.series.iter().enumerate() {
            if series.values.is_empty() {
                continue;
            }
            let quartiles = Quartiles::new(&series.values);
            let color = series.color;
            chart
                .draw_series(std::iter::once(
                    Boxplot::new_horizontal(SegmentValue::CenterOf(idx), &quartiles)
                        .width(16)
                        .whisker_width(0.6)
                        .style(color.stroke_width(2)),
                ))?
                .label(series.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }};
}

fn draw_bar_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &PanelPlan,
) -> Result<(), GcBenchError> {
    let slots = panel.categories.len().max(1) as f64;
    let x_range = -0.5f64..(slots - 0.5);
    let mut builder = ChartBuilder::on(area);
    builder
        .caption(&panel.title, (FONT, PANEL_FONT_SIZE))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(60);
    if panel.axis.log {
        let mut chart =
            builder.build_cartesian_2d(x_range, (panel.axis.min..panel.axis.max).log_scale())?;
        fill_bars!(chart, panel);
    } else {
        let mut chart = builder.build_cartesian_2d(x_range, panel.axis.min..panel.axis.max)?;
        fill_bars!(chart, panel);
    }
    Ok(())
}

fn draw_box_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &PanelPlan,
) -> Result<(), GcBenchError> {
    let labels: Vec<String> = panel.series.iter().map(|s| s.label.clone()).collect();
    let y_range = (0..labels.len()).into_segmented();
    let (lo, hi) = (panel.axis.min as f32, panel.axis.max as f32);
    let mut builder = ChartBuilder::on(area);
    builder
        .caption(&panel.title, (FONT, PANEL_FONT_SIZE))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(70);
    if panel.axis.log {
        let mut chart = builder.build_cartesian_2d((lo..hi).log_scale(), y_range)?;
        fill_boxes!(chart, panel, &labels);
    } else {
        let mut chart = builder.build_cartesian_2d(lo..hi, y_range)?;
        fill_boxes!(chart, panel, &labels);
    }
    Ok(())
}

fn draw_jitter_note<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    lines: &[String],
) -> Result<(), GcBenchError> {
    let (width, _) = area.dim_in_pixel();
    let line_height = NOTE_FONT_SIZE as i32 + 3;
    let box_width = 150i32;
    let left = width as i32 - box_width - 12;
    let top = 30i32;
    let bottom = top + line_height * (lines.len() as i32 + 1) + 6;
    area.draw(&Rectangle::new(
        [(left, top), (left + box_width, bottom)],
        NOTE_BACKGROUND.mix(0.5).filled(),
    ))?;
    let style = (FONT, NOTE_FONT_SIZE).into_font().color(&BLACK);
    area.draw(&Text::new("Jitter:", (left + 6, top + 4), style.clone()))?;
    for (idx, line) in lines.iter().enumerate() {
        let y = top + 4 + line_height * (idx as i32 + 1);
        area.draw(&Text::new(line.as_str(), (left + 6, y), style.clone()))?;
    }
    Ok(())
}

fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if idx < 0.0 || (x - idx).abs() > 0.3 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

fn segment_label(labels: &[String], seg: &SegmentValue<usize>) -> String {
    match seg {
        SegmentValue::CenterOf(idx) | SegmentValue::Exact(idx) => {
            labels.get(*idx).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        labeling::{SubstringClassifier, label_sets},
        record::parse_reader,
    };

    #[test]
    fn category_labels_only_at_group_centers() {
        let cats = vec!["1".to_string(), "2".to_string()];
        assert_eq!(category_label(&cats, 0.0), "1");
        assert_eq!(category_label(&cats, 1.05), "2");
        assert_eq!(category_label(&cats, 0.5), "");
        assert_eq!(category_label(&cats, -0.4), "");
        assert_eq!(category_label(&cats, 5.0), "");
    }

    #[test]
    fn segment_labels_map_indices() {
        let labels = vec!["trace".to_string(), "rc".to_string()];
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(1)), "rc");
        assert_eq!(segment_label(&labels, &SegmentValue::Last), "");
    }

    #[test]
    fn empty_results_write_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("benchmark_comparison.png");
        let err = compose(&LabeledResults::default(), ChartLayout::GroupedBars, &output).unwrap_err();
        assert!(matches!(err, GcBenchError::EmptyResultSet));
        assert!(!output.exists());
    }

    fn sample_results() -> LabeledResults {
        let sets = [
            ("gol-trace", "1,150000,10,50000,204800,409600,0\n2,0,0,0,204800,409600,0\n#p50_ns=1200,p99_ns=9800,jitter=7.1\n"),
            ("gol-rc", "1,0,0,0,51200,65536,0\n#p50_ns=700,p99_ns=1400,jitter=1.0\n"),
        ]
        .into_iter()
        .map(|(name, text)| (name.to_string(), parse_reader(name, text.as_bytes()).unwrap()))
        .collect();
        label_sets(sets, &SubstringClassifier)
    }

    /// Draws into memory for both layouts. Without a system font the first
    /// text call fails with `Render` after the background is filled.
    #[test]
    fn draws_plan_into_memory_buffer() {
        let results = sample_results();
        for layout in [ChartLayout::GroupedBars, ChartLayout::BoxPlots] {
            let plan = ChartPlan::build(&results, layout).unwrap();
            let (w, h) = IMAGE_SIZE;
            let mut buffer = vec![0u8; (w * h * 3) as usize];
            let result = {
                let root = BitMapBackend::with_buffer(&mut buffer, IMAGE_SIZE).into_drawing_area();
                draw_plan(root, &plan)
            };
            match result {
                Ok(()) => assert!(buffer.iter().any(|b| *b != 0xff)),
                Err(GcBenchError::Render(_)) => assert!(buffer.iter().any(|b| *b == 0xff)),
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
    }
}
