// src/viz/cloud.rs
//! Word cloud: frequency-sized words placed on a spiral, no overlaps.

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::charts::sentiment_color;
use super::{cloud_text, word_frequencies};
use crate::sentiment::{LabelColumn, LabeledHeadline, Sentiment};

pub const CLOUD_SIZE: (u32, u32) = (800, 400);
pub const MAX_WORDS: usize = 100;
const MIN_FONT: f64 = 12.0;
const MAX_FONT: f64 = 64.0;
const SPIRAL_STEPS: usize = 4_000;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub word: String,
    pub count: usize,
    pub font_size: f64,
    /// Center of the word.
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PlacedWord {
    fn bounds(&self) -> (i32, i32, i32, i32) {
        (
            self.x - self.width / 2,
            self.y - self.height / 2,
            self.x + self.width / 2,
            self.y + self.height / 2,
        )
    }

    pub fn overlaps(&self, other: &PlacedWord) -> bool {
        let (l1, t1, r1, b1) = self.bounds();
        let (l2, t2, r2, b2) = other.bounds();
        l1 < r2 && l2 < r1 && t1 < b2 && t2 < b1
    }
}

/// Approximate box of a word in a proportional sans font.
fn text_box(word: &str, size: f64) -> (i32, i32) {
    let w = 0.6 * size * word.chars().count() as f64 + 4.0;
    let h = 1.1 * size;
    (w.ceil() as i32, h.ceil() as i32)
}

/// Greedy spiral layout, largest first. Words that fit nowhere are dropped.
pub fn layout(freqs: &[(String, usize)], (w, h): (u32, u32)) -> Vec<PlacedWord> {
    let Some(top) = freqs.iter().map(|(_, c)| *c).max() else {
        return Vec::new();
    };
    let (w, h) = (w as i32, h as i32);
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let aspect = w as f64 / h.max(1) as f64;

    let mut placed: Vec<PlacedWord> = Vec::new();
    for (word, count) in freqs {
        let rel = *count as f64 / top as f64;
        let size = MIN_FONT + (MAX_FONT - MIN_FONT) * rel.sqrt();
        let (bw, bh) = text_box(word, size);
        if bw > w || bh > h {
            continue;
        }

        for step in 0..SPIRAL_STEPS {
            let t = step as f64 * 0.1;
            let r = 1.5 * t;
            let cand = PlacedWord {
                word: word.clone(),
                count: *count,
                font_size: size,
                x: (cx + r * aspect * t.cos()).round() as i32,
                y: (cy + r * t.sin()).round() as i32,
                width: bw,
                height: bh,
            };
            let (l, top_edge, rt, bottom) = cand.bounds();
            if l < 0 || top_edge < 0 || rt > w || bottom > h {
                continue;
            }
            if placed.iter().all(|p| !p.overlaps(&cand)) {
                placed.push(cand);
                break;
            }
        }
    }
    placed
}

fn darken(c: RGBColor) -> RGBColor {
    let f = |v: u8| (f64::from(v) * 0.7) as u8;
    RGBColor(f(c.0), f(c.1), f(c.2))
}

/// Cloud of titles labeled `label` in `column`, or `None` when there are none.
pub fn word_cloud(
    rows: &[LabeledHeadline],
    column: LabelColumn,
    label: Sentiment,
) -> Result<Option<String>> {
    let text = cloud_text(rows, column, label);
    render_cloud(&text, sentiment_color(label))
}

/// `None` for text with no usable words.
pub fn render_cloud(text: &str, color: RGBColor) -> Result<Option<String>> {
    render_frequencies(&word_frequencies(text, MAX_WORDS), color)
}

/// `None` when no word fits on the canvas.
pub fn render_frequencies(freqs: &[(String, usize)], color: RGBColor) -> Result<Option<String>> {
    if freqs.is_empty() {
        return Ok(None);
    }
    let words = layout(freqs, CLOUD_SIZE);
    if words.is_empty() {
        return Ok(None);
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CLOUD_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let anchor = Pos::new(HPos::Center, VPos::Center);
        for (i, pw) in words.iter().enumerate() {
            // Alternate shades so neighbouring words stay distinguishable.
            let shade = if i % 2 == 0 { color } else { darken(color) };
            let style = ("sans-serif", pw.font_size)
                .into_font()
                .color(&shade)
                .pos(anchor);
            root.draw(&Text::new(pw.word.clone(), (pw.x, pw.y), style))?;
        }
        root.present()?;
    }
    Ok(Some(svg))
}
