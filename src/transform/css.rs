//! Stylesheet rewriting using cssparser and the cached patterns.
//!
//! Provides utilities for:
//! - Stripping vendor declarations (`mso-*`, `-ms-*`) without reformatting
//!   the rest of the sheet
//! - URL rewriting for resources
//! - Point to pixel conversion and hairline border clamping

use std::borrow::Cow;

use cssparser::{ParseError, Parser, ParserInput, Token};

use super::patterns::{CSS_URL_RE, HAIRLINE_BORDER_RE, POINT_LENGTH_RE};
use crate::config::PipelineConfig;

type CssParseError<'i> = ParseError<'i, ()>;

/// At-rules whose block holds rules rather than declarations.
const GROUPING_AT_RULES: &[&str] = &["media", "supports", "document", "layer", "container"];

/// Rewrite `url(...)` references in CSS.
///
/// The rewriter receives the unquoted reference. Returning `None` leaves the
/// original `url(...)` text untouched.
///
/// ```
/// use office_fragment::transform::css::rewrite_css_urls;
///
/// let css = "td { background: url('bg.png') } th { background: url(missing.gif) }";
/// let out = rewrite_css_urls(css, |url| (url == "bg.png").then(|| "data:image/png;base64,AA==".to_string()));
/// assert_eq!(
///     out,
///     r#"td { background: url("data:image/png;base64,AA==") } th { background: url(missing.gif) }"#
/// );
/// ```
pub fn rewrite_css_urls<F>(css: &str, mut rewriter: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut result = String::with_capacity(css.len());
    let mut last = 0;
    for cap in CSS_URL_RE.captures_iter(css) {
        let (Some(full), Some(inner)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let url = inner.as_str().trim_matches(['"', '\'']).trim();
        if let Some(new_url) = rewriter(url) {
            result.push_str(&css[last..full.start()]);
            result.push_str("url(\"");
            result.push_str(&new_url);
            result.push_str("\")");
            last = full.end();
        }
    }
    result.push_str(&css[last..]);
    result
}

/// Remove declarations whose property starts with one of `prefixes`.
///
/// Everything else is copied from the source verbatim, so comments,
/// `<!-- -->` wrappers and formatting survive.
///
/// ```
/// use office_fragment::transform::css::strip_vendor_declarations;
///
/// let css = "p.MsoNormal {mso-style-parent:\"\"; margin:0in; mso-pagination:widow-orphan;}";
/// assert_eq!(
///     strip_vendor_declarations(css, &["mso-"]),
///     "p.MsoNormal { margin:0in; }"
/// );
/// ```
pub fn strip_vendor_declarations<S: AsRef<str>>(css: &str, prefixes: &[S]) -> String {
    let mut output = String::with_capacity(css.len());
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);

    strip_recursive(&mut parser, prefixes, false, &mut output);
    output
}

fn strip_recursive<S: AsRef<str>>(
    parser: &mut Parser<'_, '_>,
    prefixes: &[S],
    in_declarations: bool,
    output: &mut String,
) {
    let mut at_declaration_start = in_declarations;
    let mut grouping_prelude = false;

    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) | Token::Comment(_) => output.push_str(parser.slice_from(start)),
            Token::Ident(ref name)
                if at_declaration_start && is_vendor_property(name, prefixes) =>
            {
                skip_declaration(parser);
            }
            Token::AtKeyword(ref name) => {
                grouping_prelude = GROUPING_AT_RULES
                    .iter()
                    .any(|rule| name.eq_ignore_ascii_case(rule));
                output.push_str(parser.slice_from(start));
                at_declaration_start = false;
            }
            Token::CurlyBracketBlock => {
                output.push('{');
                let nested_declarations = !grouping_prelude;
                let _ = parser.parse_nested_block(|p| {
                    strip_recursive(p, prefixes, nested_declarations, output);
                    Ok::<_, CssParseError>(())
                });
                output.push('}');
                grouping_prelude = false;
                at_declaration_start = in_declarations;
            }
            Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => {
                output.push_str(parser.slice_from(start));
                let close = if matches!(token, Token::SquareBracketBlock) { ']' } else { ')' };
                let _ = parser.parse_nested_block(|p| {
                    strip_recursive(p, prefixes, false, output);
                    Ok::<_, CssParseError>(())
                });
                output.push(close);
                at_declaration_start = false;
            }
            Token::Semicolon => {
                output.push(';');
                at_declaration_start = in_declarations;
                grouping_prelude = false;
            }
            _ => {
                output.push_str(parser.slice_from(start));
                at_declaration_start = false;
            }
        }
    }
}

fn skip_declaration(parser: &mut Parser<'_, '_>) {
    // Nested blocks inside the value are skipped by the tokenizer itself.
    while let Ok(token) = parser.next_including_whitespace_and_comments() {
        if matches!(token, Token::Semicolon) {
            break;
        }
    }
}

/// Whether a property name carries one of the vendor prefixes.
pub fn is_vendor_property<S: AsRef<str>>(property: &str, prefixes: &[S]) -> bool {
    let property = property.trim().to_ascii_lowercase();
    prefixes
        .iter()
        .any(|prefix| property.starts_with(&prefix.as_ref().to_ascii_lowercase()))
}

/// Convert every `<n>pt` length to pixels, leaving `url(...)` contents alone.
///
/// ```
/// use office_fragment::transform::css::points_to_pixels;
///
/// assert_eq!(points_to_pixels("font-size:12pt; margin:10.0pt 0pt", 1.3333), "font-size:16px; margin:13.33px 0px");
/// ```
pub fn points_to_pixels(text: &str, ratio: f64) -> Cow<'_, str> {
    if !POINT_LENGTH_RE.is_match(text) {
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for url in CSS_URL_RE.find_iter(text) {
        result.push_str(&convert_points(&text[last..url.start()], ratio));
        result.push_str(url.as_str());
        last = url.end();
    }
    result.push_str(&convert_points(&text[last..], ratio));
    Cow::Owned(result)
}

fn convert_points(segment: &str, ratio: f64) -> Cow<'_, str> {
    POINT_LENGTH_RE.replace_all(segment, |caps: &regex_lite::Captures<'_>| {
        match caps[1].parse::<f64>() {
            Ok(points) => format!("{}px", format_px(points * ratio)),
            Err(_) => caps[0].to_string(),
        }
    })
}

/// Format a pixel value with at most two decimals and no trailing zeros.
fn format_px(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

/// Raise `0.5pt solid` borders to `1px solid` so they survive rendering.
///
/// ```
/// use office_fragment::transform::css::clamp_hairline_borders;
///
/// assert_eq!(
///     clamp_hairline_borders("border-top:.5pt solid windowtext;"),
///     "border-top: 1px solid windowtext;"
/// );
/// ```
pub fn clamp_hairline_borders(text: &str) -> Cow<'_, str> {
    HAIRLINE_BORDER_RE.replace_all(text, "$1: 1px solid $2")
}

/// Run the stylesheet sanitizer: vendor declarations out, hairlines
/// clamped, points converted.
pub fn sanitize_stylesheet(css: &str, config: &PipelineConfig) -> String {
    let stripped = strip_vendor_declarations(css, &config.vendor_prefixes);
    let clamped = clamp_hairline_borders(&stripped);
    points_to_pixels(&clamped, config.pt_to_px_ratio).into_owned()
}
