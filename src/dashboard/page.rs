// src/dashboard/page.rs
//! Server-rendered HTML for the dashboard. Charts are inlined as SVG.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::NaiveDate;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use super::cache::LoadedDataset;
use super::view::{SortKey, SortOrder, View};
use crate::sentiment::Sentiment;
use crate::viz::{charts, cloud};

pub const NO_MATCHES: &str = "No headlines match the current filters.";

const STYLE: &str = "body{font-family:sans-serif;margin:1.5rem;color:#222}\
header h1{margin:0 0 .3rem}\
.kpis{display:flex;gap:1rem;margin:1rem 0}\
.kpi{border:1px solid #ddd;border-radius:6px;padding:.6rem 1rem;min-width:7rem}\
.kpi b{display:block;font-size:1.4rem}\
form{display:flex;flex-wrap:wrap;gap:.8rem;align-items:end;margin:1rem 0}\
.charts{display:flex;flex-wrap:wrap;gap:1rem}\
.table-wrap{max-height:28rem;overflow:auto;border:1px solid #ddd}\
table{border-collapse:collapse;width:100%}\
th,td{padding:.3rem .6rem;border-bottom:1px solid #eee;text-align:left}\
.error{color:#b00020;font-weight:bold}\
footer{margin-top:1rem;color:#666;font-size:.9rem}";

fn head(out: &mut String, refresh_secs: u64) {
    let _ = write!(
        out,
        "<!doctype html><html><head><meta charset=\"utf-8\">\
         <meta http-equiv=\"refresh\" content=\"{refresh_secs}\">\
         <title>Headline Sentiment</title><style>{STYLE}</style></head><body>"
    );
}

/// Error page; the message is shown inline, the page still auto-refreshes.
pub fn render_error(message: &str, refresh_secs: u64) -> String {
    let mut out = String::new();
    head(&mut out, refresh_secs);
    let _ = write!(
        out,
        "<header><h1>Headline Sentiment</h1></header><p class=\"error\">{}</p></body></html>",
        text(message)
    );
    out
}

pub fn render(view: &View, ds: &LoadedDataset, refresh_secs: u64) -> Result<String> {
    let mut out = String::new();
    head(&mut out, refresh_secs);

    let file = ds
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let d = &view.dataset.counts;
    let _ = write!(
        out,
        "<header><h1>Headline Sentiment</h1>\
         <p>Dataset <code>{}</code>: {} headlines ({} positive, {} neutral, {} negative)</p></header>",
        text(&file),
        view.dataset.total,
        d.positive,
        d.neutral,
        d.negative
    );

    filter_form(&mut out, view);

    let f = &view.filtered.counts;
    out.push_str("<section class=\"kpis\">");
    for (label, n) in [
        ("Total", view.filtered.total),
        ("Positive", f.positive),
        ("Neutral", f.neutral),
        ("Negative", f.negative),
    ] {
        let _ = write!(out, "<div class=\"kpi\">{label}<b>{n}</b></div>");
    }
    out.push_str("</section>");

    out.push_str("<section class=\"charts\">");
    out.push_str(&charts::render_counts(f, "Headlines by sentiment")?);
    let series: Vec<(NaiveDate, Option<f64>)> =
        view.daily.iter().map(|p| (p.date, p.mean_score)).collect();
    out.push_str(&charts::render_daily(&series, "Daily mean FinBERT score")?);
    let color = charts::sentiment_color(view.cloud_label);
    match cloud::render_frequencies(&view.cloud_words, color)? {
        Some(svg) => out.push_str(&svg),
        None => {
            let _ = write!(out, "<p>{NO_MATCHES}</p>");
        }
    }
    out.push_str("</section>");

    table(&mut out, view);

    let updated = ds
        .modified
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let _ = write!(
        out,
        "<footer>Showing {} of {} headlines · Data file last updated: {} · Auto-refresh every {} s</footer>",
        view.shown(),
        view.of_total(),
        text(&updated),
        refresh_secs
    );
    out.push_str("</body></html>");
    Ok(out)
}

fn filter_form(out: &mut String, view: &View) {
    let (start, end) = view
        .filters
        .date_range
        .map(|(s, e)| (s.to_string(), e.to_string()))
        .unwrap_or_default();
    let _ = write!(
        out,
        "<form method=\"get\" action=\"/\">\
         <label>From <input type=\"date\" name=\"start\" value=\"{}\"></label>\
         <label>To <input type=\"date\" name=\"end\" value=\"{}\"></label>\
         <input type=\"hidden\" name=\"sentiment\" value=\"\">",
        attr(&start),
        attr(&end)
    );
    for s in Sentiment::ALL {
        let checked = if view.filters.sentiments.contains(&s) {
            " checked"
        } else {
            ""
        };
        let _ = write!(
            out,
            "<label><input type=\"checkbox\" name=\"sentiment\" value=\"{s}\"{checked}> {s}</label>"
        );
    }
    let kw = view.filters.keyword.as_deref().unwrap_or("");
    let _ = write!(
        out,
        "<label>Keyword <input type=\"text\" name=\"q\" value=\"{}\"></label>",
        attr(kw)
    );

    out.push_str("<label>Cloud <select name=\"cloud\">");
    for s in Sentiment::ALL {
        let sel = if s == view.cloud_label { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{s}\"{sel}>{s}</option>");
    }
    out.push_str("</select></label><label>Sort <select name=\"sort\"><option value=\"\">file order</option>");
    for k in SortKey::ALL {
        let sel = if view.sort == Some(k) { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{0}\"{sel}>{0}</option>", k.as_str());
    }
    let (asc, desc) = match view.order {
        SortOrder::Asc => (" selected", ""),
        SortOrder::Desc => ("", " selected"),
    };
    let _ = write!(
        out,
        "</select></label><label>Order <select name=\"order\">\
         <option value=\"asc\"{asc}>asc</option><option value=\"desc\"{desc}>desc</option>\
         </select></label><button type=\"submit\">Apply</button></form>"
    );
}

fn table(out: &mut String, view: &View) {
    out.push_str(
        "<div class=\"table-wrap\"><table><thead><tr>\
         <th>Published</th><th>Title</th><th>Source</th><th>VADER</th><th>FinBERT</th><th>Score</th>\
         </tr></thead><tbody>",
    );
    for r in &view.rows {
        let _ = write!(
            out,
            "<tr><td>{}</td><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{:.3}</td></tr>",
            text(&r.published),
            attr(&r.link),
            text(&r.title),
            text(&r.source),
            r.vader_label,
            r.finbert_label,
            r.finbert_score
        );
    }
    out.push_str("</tbody></table></div>");
}
