// tests/viz_charts.rs
use chrono::NaiveDate;

use headline_sentiment::sentiment::{LabelColumn, LabeledHeadline, Sentiment};
use headline_sentiment::viz::{self, charts, cloud};

fn row(title: &str, published: &str, vader: Sentiment, finbert: Sentiment, score: f32) -> LabeledHeadline {
    LabeledHeadline {
        id: format!("{:012x}", title.len()),
        title: title.to_string(),
        link: format!("https://news.example/{}", title.len()),
        published: published.to_string(),
        source: "Example".to_string(),
        vader_label: vader,
        finbert_label: finbert,
        finbert_score: score,
    }
}

fn sample() -> Vec<LabeledHeadline> {
    use Sentiment::*;
    vec![
        row("Apple unveils new Vision Pro", "Mon, 09 Jun 2025 18:04:00 GMT", Positive, Positive, 0.9),
        row("Vision Pro sales soar", "Mon, 09 Jun 2025 20:00:00 GMT", Positive, Positive, 0.7),
        row("Apple WWDC disappoints investors", "Tue, 10 Jun 2025 07:30:00 GMT", Negative, Negative, 0.8),
        row("WWDC keynote recap", "Thu, 12 Jun 2025 21:15:00 GMT", Neutral, Neutral, 0.6),
        row("Undated rumor", "sometime soon", Neutral, Positive, 0.5),
    ]
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

#[test]
fn counts_follow_the_chosen_column() {
    let rows = sample();
    let fin = viz::sentiment_counts(&rows, LabelColumn::Finbert);
    let vad = viz::sentiment_counts(&rows, LabelColumn::Vader);
    assert_eq!((fin.positive, fin.neutral, fin.negative), (3, 1, 1));
    assert_eq!((vad.positive, vad.neutral, vad.negative), (2, 2, 1));
}

#[test]
fn missing_category_is_zero_not_omitted() {
    let rows: Vec<_> = sample().into_iter().filter(|r| r.finbert_label == Sentiment::Positive).collect();
    let counts = viz::sentiment_counts(&rows, LabelColumn::Finbert);
    assert_eq!(
        counts.ordered(),
        [(Sentiment::Positive, 3), (Sentiment::Neutral, 0), (Sentiment::Negative, 0)]
    );
    let svg = charts::bar_chart(&rows, LabelColumn::Finbert).unwrap();
    assert!(svg.contains("neutral") && svg.contains("negative"));
}

#[test]
fn daily_mean_skips_unparseable_dates() {
    let means = viz::daily_mean(&sample());
    assert_eq!(means.len(), 3);
    assert!((means[&d(9)] - 0.8).abs() < 1e-6);
    assert!((means[&d(10)] - 0.8).abs() < 1e-6);
    assert!((means[&d(12)] - 0.6).abs() < 1e-6);
}

#[test]
fn reindexed_series_covers_every_day() {
    let means = viz::daily_mean(&sample());
    let series = viz::daily_series(&means);
    assert_eq!(series.len(), (d(12) - d(9)).num_days() as usize + 1);
    assert_eq!(series[2], (d(11), None));
    assert!(series[0].1.is_some());
}

#[test]
fn line_plot_renders_with_and_without_range() {
    let rows = sample();
    assert!(charts::line_plot(&rows, None).unwrap().contains("<svg"));
    assert!(charts::line_plot(&rows, Some((d(1), d(30)))).unwrap().contains("<svg"));
}

#[test]
fn word_cloud_only_for_present_labels() {
    let rows = sample();
    let svg = cloud::word_cloud(&rows, LabelColumn::Finbert, Sentiment::Positive)
        .unwrap()
        .expect("positive titles exist");
    assert!(svg.contains("vision"));

    let none: Vec<LabeledHeadline> = Vec::new();
    assert!(cloud::word_cloud(&none, LabelColumn::Finbert, Sentiment::Positive)
        .unwrap()
        .is_none());
}

#[test]
fn render_all_writes_dated_files_and_skips_empty_cloud() {
    let tmp = tempfile::tempdir().unwrap();
    let charts_dir = tmp.path().join("charts");
    let rows: Vec<_> = sample().into_iter().filter(|r| r.finbert_label != Sentiment::Negative).collect();

    let written = viz::render_all(&rows, &charts_dir, d(10), LabelColumn::Finbert, Sentiment::Negative).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["sentiment_counts_2025-06-10.svg", "daily_score_2025-06-10.svg"]);
    assert!(written.iter().all(|p| p.exists()));

    let written = viz::render_all(&rows, &charts_dir, d(10), LabelColumn::Finbert, Sentiment::Positive).unwrap();
    assert_eq!(written.len(), 3);
    assert!(charts_dir.join("wordcloud_positive_2025-06-10.svg").exists());
}
