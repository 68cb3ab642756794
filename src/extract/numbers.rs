//! Numeric parsing helpers for Turkish-formatted figures.
//!
//! Reservoir sites print numbers the Turkish way: `.` groups thousands and `,`
//! marks the decimal point (`1.234,5`). Percentages come with a `%` sign on
//! either side (`%73,4` or `73,4 %`).

use scraper::{ElementRef, Selector};
use once_cell::sync::Lazy;
use tracing::debug;

/// Cells carrying the per-dam figures that make up a row total.
static TOTAL_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td.damtotaltd").expect("static selector"));

/// Parse a loosely formatted percentage such as `"73,40%"` or `" 61.2 "`.
///
/// Strips `%`, turns a decimal comma into a point and trims whitespace.
/// Anything that still fails to parse yields `default`.
pub fn parse_percentage(text: &str, default: f64) -> f64 {
    let cleaned = text.replace('%', "").replace(',', ".");
    cleaned.trim().parse::<f64>().unwrap_or(default)
}

/// Parse a number with thousands dots and a decimal comma (`"1.234,5"`).
pub fn parse_locale_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace('.', "").replace(',', ".").parse::<f64>().ok()
}

/// Sum the aggregate-total cells of the table row enclosing `label`.
///
/// Cells that are empty or unparseable are skipped. No label, or a label
/// outside any `<tr>`, sums to `0.0`.
pub fn sum_row(label: Option<ElementRef<'_>>) -> f64 {
    let Some(label) = label else {
        return 0.0;
    };
    let Some(row) = label
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tr")
    else {
        debug!("Label has no enclosing table row");
        return 0.0;
    };

    row.select(&TOTAL_CELL)
        .filter_map(|cell| {
            let text: String = cell.text().map(str::trim).collect();
            parse_locale_number(&text)
        })
        .sum()
}

/// `available / total * 100`, rounded to two decimals. A zero total gives `0.0`.
pub fn ratio_pct(available: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    round2(available / total * 100.0)
}

/// Round to two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
        doc.select(&Selector::parse(css).unwrap()).next()
    }

    #[test]
    fn test_parse_percentage_comma_decimal() {
        assert!((parse_percentage("73,40%", 0.0) - 73.40).abs() < 1e-9);
        assert!((parse_percentage(" %61,2 ", 0.0) - 61.2).abs() < 1e-9);
        assert!((parse_percentage("61.2", 0.0) - 61.2).abs() < 1e-9);
    }

    #[test]
    fn test_parse_percentage_falls_back_to_default() {
        for bad in ["", "   ", "%", "yok", "12,3,4", "1.234,5", "--"] {
            assert_eq!(parse_percentage(bad, 0.0), 0.0, "input {bad:?}");
            assert_eq!(parse_percentage(bad, -1.0), -1.0, "input {bad:?}");
        }
    }

    #[test]
    fn test_parse_locale_number() {
        assert_eq!(parse_locale_number("1.234,5"), Some(1234.5));
        assert_eq!(parse_locale_number("765,0"), Some(765.0));
        assert_eq!(parse_locale_number("12.345.678"), Some(12345678.0));
        assert_eq!(parse_locale_number(""), None);
        assert_eq!(parse_locale_number("bad"), None);
    }

    #[test]
    fn test_sum_row_skips_bad_cells() {
        let doc = Html::parse_document(
            r#"<table><tr>
                <td><span id="label">Kullanılabilir su hacmi</span></td>
                <td class="damtotaltd">1.234,5</td>
                <td class="damtotaltd">bad</td>
                <td class="damtotaltd">765,0</td>
                <td class="damtotaltd"></td>
                <td>9.999</td>
            </tr></table>"#,
        );
        let sum = sum_row(first(&doc, "#label"));
        assert!((sum - 1999.5).abs() < 1e-9);
    }

    #[test]
    fn test_sum_row_absent_label_or_row() {
        let doc = Html::parse_document(r#"<div><span id="label">x</span></div>"#);
        assert_eq!(sum_row(None), 0.0);
        assert_eq!(sum_row(first(&doc, "#label")), 0.0);
    }

    #[test]
    fn test_ratio_pct() {
        assert_eq!(ratio_pct(50.0, 0.0), 0.0);
        assert_eq!(ratio_pct(1.0, 3.0), 33.33);
        assert_eq!(ratio_pct(2.0, 3.0), 66.67);
    }

    #[test]
    fn test_two_decimal_ties_round_to_even() {
        assert_eq!(round2(12.125), 12.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(31.256), 31.26);
        assert_eq!(ratio_pct(1.0, 8.0), 12.5);
    }
}
