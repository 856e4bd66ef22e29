//! Whitespace and markup cleanup.
//!
//! Tree passes run on the content subtree before styles are sanitized,
//! because space-run spans are recognised by a vendor declaration the
//! sanitizer removes. Text passes run on the serialized fragment and cover
//! what html5ever keeps as opaque comments or what only exists as markup.

use std::borrow::Cow;

use super::patterns::CONDITIONAL_COMMENT_RE;
use crate::dom::{ArenaDom, ArenaNodeData, ArenaNodeId};

/// Elements whose whitespace is collapsed.
const TEXT_BLOCKS: &[&str] = &["p", "li"];

/// Descendants of a text block that keep their whitespace.
const PRESERVE_WHITESPACE: &[&str] = &["pre", "code", "style", "textarea"];

/// Document-level elements that never belong in a fragment.
const DOCUMENT_WRAPPERS: &[&str] = &["html", "head", "body"];

/// Inline wrappers office tools leave behind empty.
const EMPTY_WRAPPERS: &[&str] = &["span", "font", "o:p"];

/// Elements that count as content without carrying text.
pub const MEDIA_ELEMENTS: &[&str] = &[
    "img",
    "svg",
    "hr",
    "iframe",
    "video",
    "audio",
    "canvas",
    "object",
    "embed",
    "v:imagedata",
    "v:shape",
];

const NBSP: char = '\u{a0}';

/// Counters for one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct CleanupStats {
    pub conditional_comments: usize,
    pub spacerun_spans: usize,
    pub text_nodes_collapsed: usize,
    pub wrappers_removed: usize,
}

/// Run the tree passes in order: conditional comments, space runs,
/// text-block whitespace, empty wrappers.
pub fn clean_tree(dom: &mut ArenaDom, root: ArenaNodeId) -> CleanupStats {
    let stats = CleanupStats {
        conditional_comments: remove_conditional_comments(dom, root),
        spacerun_spans: collapse_spacerun_spans(dom, root),
        text_nodes_collapsed: collapse_block_whitespace(dom, root),
        wrappers_removed: remove_empty_wrappers(dom, root),
    };
    log::debug!(
        "cleanup: {} conditional comments, {} space runs, {} text nodes collapsed, {} empty wrappers",
        stats.conditional_comments,
        stats.spacerun_spans,
        stats.text_nodes_collapsed,
        stats.wrappers_removed
    );
    stats
}

/// Drop conditional comment nodes.
///
/// Hidden blocks (`<!--[if gte mso 9]>...<![endif]-->`) are one comment and
/// go with their payload. The revealed form (`<![if !supportLists]>` ...
/// `<![endif]>`) parses as two marker comments around real content; only the
/// markers are removed so list bullets survive.
pub fn remove_conditional_comments(dom: &mut ArenaDom, root: ArenaNodeId) -> usize {
    let comments: Vec<_> = dom
        .descendants(root)
        .into_iter()
        .filter(|&id| {
            dom.get(id).is_some_and(|n| match &n.data {
                ArenaNodeData::Comment(text) => is_conditional_comment(text),
                _ => false,
            })
        })
        .collect();
    for &id in &comments {
        dom.detach(id);
    }
    comments.len()
}

fn is_conditional_comment(text: &str) -> bool {
    let text = text.trim();
    (text.starts_with("[if") && text.ends_with(']')) || text.eq_ignore_ascii_case("[endif]")
}

/// Replace `<span style="mso-spacerun:yes">` with plain text.
///
/// Word writes runs of spaces as `&nbsp;` inside these spans; in a web page
/// they become ordinary spaces, at most one in a row.
pub fn collapse_spacerun_spans(dom: &mut ArenaDom, root: ArenaNodeId) -> usize {
    let spans: Vec<_> = dom
        .elements_named(root, &["span"])
        .into_iter()
        .filter(|&id| dom.get_attr(id, "style").is_some_and(is_spacerun_style))
        .collect();

    // Innermost first so nested spans are flattened before their parent.
    for &span in spans.iter().rev() {
        let text = dom.deep_text(span).replace(NBSP, " ");
        let text = collapse_spaces(&text);
        let text = if text.is_empty() { " ".to_string() } else { text.into_owned() };
        dom.replace_with_text(span, text);
    }
    spans.len()
}

fn is_spacerun_style(style: &str) -> bool {
    let compact: String = style
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '"' && *c != '\'')
        .collect();
    compact.to_ascii_lowercase().contains("mso-spacerun:yes")
}

/// Collapse runs of two or more spaces into one.
fn collapse_spaces(text: &str) -> Cow<'_, str> {
    if !text.contains("  ") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for c in text.chars() {
        if c == ' ' {
            if !prev_space {
                out.push(c);
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    Cow::Owned(out)
}

/// Collapse whitespace (including non-breaking spaces) in the text of
/// paragraphs and list items to single spaces.
pub fn collapse_block_whitespace(dom: &mut ArenaDom, root: ArenaNodeId) -> usize {
    let mut changed = 0;
    for block in dom.elements_named(root, TEXT_BLOCKS) {
        for id in dom.descendants(block) {
            let Some(text) = dom.text_content(id) else {
                continue;
            };
            if dom.has_ancestor_named(id, PRESERVE_WHITESPACE, block) {
                continue;
            }
            if let Some(collapsed) = collapse_whitespace(text) {
                dom.set_text(id, collapsed);
                changed += 1;
            }
        }
    }
    changed
}

/// Returns the collapsed text, or `None` when it is already collapsed.
fn collapse_whitespace(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() || c == NBSP {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    (out != text).then_some(out)
}

/// Remove inline wrappers in paragraphs and list items that hold no
/// content. A wrapper holding only whitespace becomes a single space so the
/// words around it stay apart.
pub fn remove_empty_wrappers(dom: &mut ArenaDom, root: ArenaNodeId) -> usize {
    let mut removed = 0;
    let mut wrappers: Vec<_> = dom
        .elements_named(root, EMPTY_WRAPPERS)
        .into_iter()
        .filter(|&id| dom.has_ancestor_named(id, TEXT_BLOCKS, root))
        .collect();
    // Innermost first: an outer wrapper may only become empty once its
    // children are gone.
    wrappers.reverse();

    for id in wrappers {
        if !dom.elements_named(id, MEDIA_ELEMENTS).is_empty()
            || !dom.elements_named(id, &["br"]).is_empty()
        {
            continue;
        }
        let text = dom.deep_text(id);
        if text.is_empty() {
            dom.detach(id);
            removed += 1;
        } else if text.chars().all(|c| c.is_whitespace() || c == NBSP) {
            dom.replace_with_text(id, " ".to_string());
            removed += 1;
        }
    }
    removed
}

/// Whether the subtree holds visible text or media.
pub fn has_meaningful_content(dom: &ArenaDom, root: ArenaNodeId) -> bool {
    dom.descendants(root).into_iter().any(|id| {
        dom.text_content(id)
            .is_some_and(|t| t.chars().any(|c| !c.is_whitespace() && c != NBSP))
            || dom
                .element_name(id)
                .is_some_and(|n| MEDIA_ELEMENTS.contains(&n.as_ref()))
    })
}

/// Remove `<!--[if ...]> ... <![endif]-->` blocks.
pub fn strip_conditional_comments(html: &str) -> Cow<'_, str> {
    CONDITIONAL_COMMENT_RE.replace_all(html, "")
}

/// Replace any `<html>`, `<head>` or `<body>` element below `root` with its
/// children.
pub fn unwrap_document_wrappers(dom: &mut ArenaDom, root: ArenaNodeId) -> usize {
    let wrappers = dom.elements_named(root, DOCUMENT_WRAPPERS);
    for &wrapper in &wrappers {
        let children: Vec<_> = dom.children(wrapper).collect();
        for child in children {
            dom.detach(child);
            dom.insert_before(wrapper, child);
        }
        dom.detach(wrapper);
    }
    wrappers.len()
}

/// Final textual pass over serialized markup.
///
/// ```
/// use office_fragment::transform::cleanup::finalize_markup;
///
/// let html = " <div><!--[if gte mso 9]><xml><o:shapedefaults/></xml><![endif]-->Hi</div>\n";
/// assert_eq!(finalize_markup(html), "<div>Hi</div>");
/// ```
pub fn finalize_markup(html: &str) -> String {
    strip_conditional_comments(html).trim().to_string()
}
