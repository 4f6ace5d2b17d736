// src/viz/charts.rs
//! Count bar chart and daily-score line chart, rendered to SVG strings.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use plotters::prelude::*;

use super::{daily_mean, daily_series, reindex_daily, sentiment_counts, SentimentCounts};
use crate::sentiment::{LabelColumn, LabeledHeadline, Sentiment};

pub const CHART_SIZE: (u32, u32) = (720, 420);

pub const POSITIVE_COLOR: RGBColor = RGBColor(46, 160, 67);
pub const NEUTRAL_COLOR: RGBColor = RGBColor(140, 140, 140);
pub const NEGATIVE_COLOR: RGBColor = RGBColor(214, 39, 40);
const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);

pub fn sentiment_color(s: Sentiment) -> RGBColor {
    match s {
        Sentiment::Positive => POSITIVE_COLOR,
        Sentiment::Neutral => NEUTRAL_COLOR,
        Sentiment::Negative => NEGATIVE_COLOR,
    }
}

/// Count of headlines per label in `column`.
pub fn bar_chart(rows: &[LabeledHeadline], column: LabelColumn) -> Result<String> {
    let counts = sentiment_counts(rows, column);
    render_counts(&counts, &format!("Headlines by {}", column.column_name()))
}

/// Bars in positive/neutral/negative order; an absent label is a zero-height bar.
pub fn render_counts(counts: &SentimentCounts, caption: &str) -> Result<String> {
    let bars = counts.ordered();
    let y_max = bars.iter().map(|(_, n)| *n).max().unwrap_or(0).max(1) as u32;
    let y_top = y_max + (y_max / 8).max(1);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(36)
            .y_label_area_size(48)
            .build_cartesian_2d((0i32..3i32).into_segmented(), 0u32..y_top)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc("Headlines")
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => Sentiment::ALL
                    .get(*i as usize)
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
                SegmentValue::Last => String::new(),
            })
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, (label, n))| {
            let i = i as i32;
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0), (SegmentValue::Exact(i + 1), *n as u32)],
                sentiment_color(*label).filled(),
            );
            bar.set_margin(0, 0, 14, 14);
            bar
        }))?;

        root.present()?;
    }
    Ok(svg)
}

/// Mean `finbert_score` per day. With `range`, every day in it is on the axis;
/// without, the axis spans the first to last dated headline. Days with no
/// headlines are gaps in the line.
pub fn line_plot(
    rows: &[LabeledHeadline],
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<String> {
    let means = daily_mean(rows);
    let series = match range {
        Some((start, end)) => reindex_daily(&means, start, end),
        None => daily_series(&means),
    };
    render_daily(&series, "Daily mean FinBERT score")
}

pub fn render_daily(series: &[(NaiveDate, Option<f64>)], caption: &str) -> Result<String> {
    let n = series.len().max(1);
    let start = series.first().map(|(d, _)| *d);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let caption = if series.is_empty() {
            format!("{caption} (no dated headlines)")
        } else {
            caption.to_string()
        };
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(36)
            .y_label_area_size(48)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..1.05f64)?;

        let day_label = |x: &f64| -> String {
            let off = x.round();
            if (x - off).abs() > 1e-6 || off < 0.0 {
                return String::new();
            }
            start
                .map(|s| (s + Duration::days(off as i64)).format("%m-%d").to_string())
                .unwrap_or_default()
        };
        chart
            .configure_mesh()
            .x_labels(n.min(10))
            .x_label_formatter(&day_label)
            .y_desc("Mean score")
            .draw()?;

        for run in segments(series) {
            chart.draw_series(LineSeries::new(run, &LINE_COLOR))?;
        }
        chart.draw_series(series.iter().enumerate().filter_map(|(i, (_, v))| {
            v.map(|y| Circle::new((i as f64, y), 3, LINE_COLOR.filled()))
        }))?;

        root.present()?;
    }
    Ok(svg)
}

/// Contiguous runs of present values, as `(day offset, value)` points.
fn segments(series: &[(NaiveDate, Option<f64>)]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut cur = Vec::new();
    for (i, (_, v)) in series.iter().enumerate() {
        match v {
            Some(y) => cur.push((i as f64, *y)),
            None if !cur.is_empty() => out.push(std::mem::take(&mut cur)),
            None => {}
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}
