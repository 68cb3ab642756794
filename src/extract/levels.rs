//! Per-site fill-level extraction strategies.
//!
//! Each utility exposes its fill level in a different markup shape, so every
//! source gets its own [`LevelStrategy`] variant behind one
//! [`LevelStrategy::extract`] contract.
//!
//! | City | Strategy | Markup |
//! |------|----------|--------|
//! | İstanbul | [`LevelStrategy::StyledDiv`] | Tailwind-styled `div` holding `%xx,xx` |
//! | Bursa | [`LevelStrategy::LabeledSpan`] | `span` with a fixed id |
//! | Ankara | [`LevelStrategy::ServerLabel`] | ASP.NET `label` server control |
//! | İzmir | [`LevelStrategy::VolumeRatio`] | Per-dam volume table, ratio of two row totals |

use super::numbers::{parse_percentage, ratio_pct, sum_row};
use scraper::{ElementRef, Html, Selector};
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

static SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span").expect("static selector"));

/// How a source's fill level is located in its rendered markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStrategy {
    /// A styled element matched by its class list.
    StyledDiv(&'static str),
    /// A `span` matched by id.
    LabeledSpan(&'static str),
    /// A server-rendered `label` matched by id.
    ServerLabel(&'static str),
    /// Ratio of two table-row totals, each row found through a label span
    /// whose text contains the given phrase.
    VolumeRatio {
        available_label: &'static str,
        total_label: &'static str,
    },
}

impl LevelStrategy {
    /// Extract the fill percentage from `markup`, falling back to `default`
    /// whenever the expected node is missing or unreadable.
    pub fn extract(&self, markup: &str, default: f64) -> f64 {
        let document = Html::parse_document(markup);
        match *self {
            LevelStrategy::StyledDiv(css)
            | LevelStrategy::LabeledSpan(css)
            | LevelStrategy::ServerLabel(css) => single_node_pct(&document, css, default),
            LevelStrategy::VolumeRatio {
                available_label,
                total_label,
            } => {
                let total = sum_row(find_label(&document, total_label));
                let available = sum_row(find_label(&document, available_label));
                debug!(available, total, "Summed volume rows");
                if total == 0.0 {
                    info!(label = total_label, "Total volume row missing or empty");
                }
                ratio_pct(available, total)
            }
        }
    }
}

fn single_node_pct(document: &Html, css: &str, default: f64) -> f64 {
    let selector = match Selector::parse(css) {
        Ok(selector) => selector,
        Err(e) => {
            warn!(selector = css, error = %e, "Invalid level selector");
            return default;
        }
    };
    match document.select(&selector).next() {
        Some(node) => {
            let text: String = node.text().map(str::trim).collect();
            parse_percentage(&text, default)
        }
        None => {
            info!(selector = css, "Level node not found; using default");
            default
        }
    }
}

/// First `span` whose text contains `phrase`.
fn find_label<'a>(document: &'a Html, phrase: &str) -> Option<ElementRef<'a>> {
    document
        .select(&SPAN)
        .find(|span| span.text().collect::<String>().contains(phrase))
}
