//! Inline style sanitization.
//!
//! Every element under the content root gets its `style` attribute rewritten:
//! vendor declarations dropped, hairline borders clamped, points converted to
//! pixels and office fonts remapped to web-safe stacks. Text elements also
//! receive a baseline `line-height` unless they already set one.

use std::fmt;

use super::css::{clamp_hairline_borders, is_vendor_property, points_to_pixels};
use crate::config::{FontRemap, PipelineConfig};
use crate::dom::{ArenaDom, ArenaNodeId};

/// Elements that receive the baseline line-height.
const LINE_HEIGHT_TAGS: &[&str] = &["p", "li", "div", "span", "h1", "h2", "h3", "h4", "h5", "h6"];

/// A single `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// Parsed contents of a `style` attribute.
///
/// ```
/// use office_fragment::transform::style::StyleDeclaration;
///
/// let mut style = StyleDeclaration::parse("font-family:\"Calibri\",sans-serif;mso-bidi-font-size:11.0pt");
/// assert_eq!(style.get("FONT-FAMILY"), Some("\"Calibri\",sans-serif"));
/// style.retain(|d| !d.property.starts_with("mso-"));
/// assert_eq!(style.to_string(), "font-family: \"Calibri\",sans-serif;");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclaration {
    declarations: Vec<Declaration>,
}

impl StyleDeclaration {
    /// Split on `;` outside quotes and parentheses, then on the first `:`.
    /// Pieces without a property name or a colon are dropped.
    pub fn parse(style: &str) -> Self {
        let declarations = split_declarations(style)
            .into_iter()
            .filter_map(|piece| {
                let (property, value) = piece.split_once(':')?;
                let property = property.trim();
                if property.is_empty() {
                    return None;
                }
                Some(Declaration {
                    property: property.to_string(),
                    value: value.trim().to_string(),
                })
            })
            .collect();
        Self { declarations }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Value of the first declaration of `property` (case-insensitive).
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| d.property.eq_ignore_ascii_case(property))
            .map(|d| d.value.as_str())
    }

    pub fn contains(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    pub fn push(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.declarations.push(Declaration {
            property: property.into(),
            value: value.into(),
        });
    }

    pub fn retain<F: FnMut(&Declaration) -> bool>(&mut self, f: F) {
        self.declarations.retain(f);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    /// Replace the first `font-family` that mentions a mapped family.
    fn remap_font_family(&mut self, font_map: &[FontRemap]) {
        let Some(decl) = self
            .declarations
            .iter_mut()
            .find(|d| d.property.eq_ignore_ascii_case("font-family"))
        else {
            return;
        };
        let normalized = decl.value.replace(['"', '\''], "").to_lowercase();
        let remap = font_map
            .iter()
            .find(|r| normalized.contains(&r.family.to_lowercase()));
        if let Some(remap) = remap {
            decl.value = remap.stack.clone();
        }
    }
}

impl fmt::Display for StyleDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, decl) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}: {};", decl.property, decl.value)?;
        }
        Ok(())
    }
}

fn split_declarations(style: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in style.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                pieces.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&style[start..]);
    pieces.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

/// Sanitize one inline style value. Returns an empty string when nothing
/// is left.
///
/// ```
/// use office_fragment::PipelineConfig;
/// use office_fragment::transform::style::sanitize_inline_style;
///
/// let out = sanitize_inline_style(
///     "font-size:11.0pt;font-family:\"Calibri\",sans-serif;mso-fareast-font-family:Calibri",
///     &PipelineConfig::default(),
/// );
/// assert_eq!(
///     out,
///     "font-size: 14.67px; font-family: Calibri, 'Segoe UI', Arial, Helvetica, sans-serif;"
/// );
/// ```
pub fn sanitize_inline_style(style: &str, config: &PipelineConfig) -> String {
    sanitize_declarations(style, config).to_string()
}

fn sanitize_declarations(style: &str, config: &PipelineConfig) -> StyleDeclaration {
    let clamped = clamp_hairline_borders(style);
    let converted = points_to_pixels(&clamped, config.pt_to_px_ratio);
    let mut decl = StyleDeclaration::parse(&converted);
    decl.retain(|d| !is_vendor_property(&d.property, &config.vendor_prefixes));
    decl.remap_font_family(&config.font_map);
    decl
}

/// Drop vendor (`Mso*`) classes. Returns `None` when no class remains.
pub fn strip_vendor_classes(class: &str) -> Option<String> {
    let kept: Vec<&str> = class
        .split_ascii_whitespace()
        .filter(|c| !c.to_ascii_lowercase().starts_with("mso"))
        .collect();
    (!kept.is_empty()).then(|| kept.join(" "))
}

/// Counters for one sanitize pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct SanitizeStats {
    pub styles_rewritten: usize,
    pub line_heights_added: usize,
    pub classes_stripped: usize,
}

/// Sanitize the styles of every element below `root`.
pub fn sanitize_element_styles(
    dom: &mut ArenaDom,
    root: ArenaNodeId,
    config: &PipelineConfig,
) -> SanitizeStats {
    let mut stats = SanitizeStats::default();

    for id in dom.descendants(root) {
        let Some(tag) = dom.element_name(id).map(|n| n.to_string()) else {
            continue;
        };

        let original = dom.get_attr(id, "style").map(str::to_string);
        let mut decl = original
            .as_deref()
            .map(|s| sanitize_declarations(s, config))
            .unwrap_or_default();

        if LINE_HEIGHT_TAGS.contains(&tag.as_str()) && !decl.contains("line-height") {
            decl.push("line-height", config.line_height.as_str());
            stats.line_heights_added += 1;
        }

        if decl.is_empty() {
            if original.is_some() {
                dom.remove_attr(id, "style");
                stats.styles_rewritten += 1;
            }
        } else {
            let rewritten = decl.to_string();
            if original.as_deref() != Some(rewritten.as_str()) {
                dom.set_attr(id, "style", rewritten);
                stats.styles_rewritten += 1;
            }
        }

        if config.strip_vendor_classes
            && let Some(class) = dom.get_attr(id, "class").map(str::to_string)
        {
            match strip_vendor_classes(&class) {
                Some(kept) if kept == class => {}
                Some(kept) => {
                    dom.set_attr(id, "class", kept);
                    stats.classes_stripped += 1;
                }
                None => {
                    dom.remove_attr(id, "class");
                    stats.classes_stripped += 1;
                }
            }
        }
    }

    log::debug!(
        "sanitized styles: {} rewritten, {} line-heights added, {} class attributes cleaned",
        stats.styles_rewritten,
        stats.line_heights_added,
        stats.classes_stripped
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_document, serialize_node};

    #[test]
    fn test_split_respects_quotes_and_parens() {
        let decl = StyleDeclaration::parse(
            "font-family:'A;B';background:url(\"data:image/png;base64,AA==\");color:red;;",
        );
        assert_eq!(decl.len(), 3);
        assert_eq!(decl.get("font-family"), Some("'A;B'"));
        assert_eq!(decl.get("background"), Some("url(\"data:image/png;base64,AA==\")"));
    }

    #[test]
    fn test_malformed_pieces_dropped() {
        let decl = StyleDeclaration::parse("garbage; :x; color : blue ");
        assert_eq!(decl.to_string(), "color: blue;");
    }

    #[test]
    fn test_font_remap_first_match() {
        let config = PipelineConfig::default();
        assert_eq!(
            sanitize_inline_style("font-family:\"Times New Roman\",serif", &config),
            "font-family: 'Times New Roman', Times, serif;"
        );
        assert_eq!(
            sanitize_inline_style("font-family:Arial Narrow", &config),
            "font-family: Arial, Helvetica, sans-serif;"
        );
        assert_eq!(
            sanitize_inline_style("font-family:Georgia", &config),
            "font-family: Georgia;"
        );
    }

    #[test]
    fn test_hairline_before_points() {
        let config = PipelineConfig::default();
        assert_eq!(
            sanitize_inline_style("border:0.5pt solid #000000;width:48pt", &config),
            "border: 1px solid #000000; width: 64px;"
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let config = PipelineConfig::default();
        let once = sanitize_inline_style(
            "margin:0in 0in 8.0pt;line-height:107%;font-size:11.0pt;mso-spacerun:yes",
            &config,
        );
        assert_eq!(sanitize_inline_style(&once, &config), once);
    }

    #[test]
    fn test_vendor_classes() {
        assert_eq!(strip_vendor_classes("MsoNormal"), None);
        assert_eq!(strip_vendor_classes("xl65 MsoTableGrid"), Some("xl65".to_string()));
        assert_eq!(strip_vendor_classes("lead"), Some("lead".to_string()));
    }

    #[test]
    fn test_element_pass() {
        let mut dom = parse_document(
            r#"<div id=root><p class=MsoNormal style="mso-margin-top-alt:auto">Hi <span style="font-size:10.0pt">x</span></p><h2 style="line-height:2">y</h2><b>z</b></div>"#,
        );
        let root = dom.find_by_tag("div").unwrap();
        let stats = sanitize_element_styles(&mut dom, root, &PipelineConfig::default());

        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(dom.get_attr(p, "style"), Some("line-height: 1;"));
        assert_eq!(dom.get_attr(p, "class"), None);
        let span = dom.find_by_tag("span").unwrap();
        assert_eq!(dom.get_attr(span, "style"), Some("font-size: 13.33px; line-height: 1;"));
        let b = dom.find_by_tag("b").unwrap();
        assert_eq!(dom.get_attr(b, "style"), None);
        // The root itself is left alone.
        assert_eq!(dom.get_attr(root, "style"), None);
        assert_eq!(stats.line_heights_added, 2);
        assert_eq!(stats.classes_stripped, 1);
    }

    #[test]
    fn test_existing_line_height_kept() {
        let mut dom = parse_document(r#"<div><h1 style="line-height:150%">T</h1></div>"#);
        let root = dom.find_by_tag("div").unwrap();
        sanitize_element_styles(&mut dom, root, &PipelineConfig::default().with_line_height("1.2"));
        let h1 = dom.find_by_tag("h1").unwrap();
        assert_eq!(
            serialize_node(&dom, h1).unwrap(),
            r#"<h1 style="line-height: 150%;">T</h1>"#
        );
    }
}
