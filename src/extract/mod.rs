//! Markup extraction and normalization.
//!
//! Everything in here is pure: raw HTML in, normalized values out. Nothing
//! returns an error; a node that cannot be found or read produces the
//! caller's default (levels) or is simply absent (forecast days and fields).
//!
//! - [`numbers`]: Turkish number parsing, row totals and ratios
//! - [`levels`]: One fill-level strategy per source site
//! - [`forecast`]: Threshold-based forecast card detection

pub mod forecast;
pub mod levels;
pub mod numbers;
