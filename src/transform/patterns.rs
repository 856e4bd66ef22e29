//! Cached regex patterns for the textual passes.
//!
//! Uses LazyLock to compile patterns once on first use. Everything that can
//! be done on the tree is done there; these cover what only exists as text.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Matches `<!--[if ...]> ... <![endif]-->` blocks, including the
/// downlevel-revealed form html5ever turns into `<!--[if ...]-->...<!--[endif]-->`.
pub static CONDITIONAL_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<!--\[if.*?endif\]-->").unwrap());

/// Matches the spreadsheet `<x:WorksheetSource HRef="...sheet001.htm"/>` hint.
pub static WORKSHEET_HINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)HRef\s*=\s*["']([^"']*sheet\d+\.html?)["']"#).unwrap()
});

/// Matches url(...) in CSS
pub static CSS_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)url\(\s*([^)]*?)\s*\)").unwrap());

/// Matches a number followed by the `pt` unit.
pub static POINT_LENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d*\.?\d+)\s*pt\b").unwrap());

/// Matches a 0.5pt solid border on any side.
pub static HAIRLINE_BORDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(border(?:-top|-right|-bottom|-left)?)\s*:\s*0?\.5pt\s+solid\s+([^;}]+)").unwrap()
});
