//! Reading office HTML exports into a normalized tree.
//!
//! Word, Excel and LibreOffice all write "Save as Web Page" output in their
//! own dialect. Normalization turns any of them into the same shape: one
//! detached content root holding the document body, the style blocks that
//! were scattered through it, and the stylesheet links found in the head.
//!
//! # Example
//!
//! ```no_run
//! use office_fragment::PipelineConfig;
//! use office_fragment::import::{Dialect, normalize};
//!
//! let doc = normalize("Report.htm".as_ref(), &PipelineConfig::default())?;
//! if doc.export.dialect == Dialect::Frameset {
//!     println!("content read from {}", doc.content_path.display());
//! }
//! # Ok::<(), office_fragment::Error>(())
//! ```

mod frameset;

pub use frameset::{locate_worksheet, worksheet_candidates};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;

use crate::config::PipelineConfig;
use crate::dom::{ArenaDom, ArenaNodeData, ArenaNodeId, parse_document};
use crate::error::{Error, Result, Stage};
use crate::resolve::companion_dir;
use crate::transform::assets::is_stylesheet_link;
use crate::util::decode_text;

/// Extensions accepted as HTML exports.
pub const HTML_EXTENSIONS: &[&str] = &["htm", "html"];

/// Elements dropped from the tree before anything else looks at it.
const DROPPED_ELEMENTS: &[&str] = &["script", "xml"];

/// Which flavour of export a document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Spreadsheet frameset pointing at per-sheet files.
    Frameset,
    /// A single office page (Word, Excel single sheet, LibreOffice).
    Direct,
    /// HTML without office markers.
    CleanHtml,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Frameset => "frameset",
            Dialect::Direct => "direct",
            Dialect::CleanHtml => "clean-html",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an export lives and how it was read.
#[derive(Debug, Clone)]
pub struct DocumentExport {
    /// The file the caller asked for.
    pub path: PathBuf,
    pub dialect: Dialect,
    /// Encoding the content file was decoded with.
    pub encoding: &'static Encoding,
    /// Companion folder (may not exist).
    pub asset_dir: PathBuf,
    /// Directory relative references in the content file start from.
    pub document_dir: PathBuf,
}

/// A `<style>` block taken out of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleBlock {
    pub css: String,
    pub media: Option<String>,
}

/// An export reduced to its content.
pub struct NormalizedDocument {
    pub export: DocumentExport,
    /// File the content was read from (the worksheet for framesets).
    pub content_path: PathBuf,
    pub dom: ArenaDom,
    /// Detached `<div>` holding the body content.
    pub content: ArenaNodeId,
    pub style_blocks: Vec<StyleBlock>,
    /// Stylesheet hrefs found outside the body.
    pub stylesheet_links: Vec<String>,
}

/// Whether a path has an HTML extension.
pub fn is_html_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| HTML_EXTENSIONS.iter().any(|h| ext.eq_ignore_ascii_case(h)))
}

/// Read and normalize an HTML export.
pub fn normalize(path: &Path, config: &PipelineConfig) -> Result<NormalizedDocument> {
    if !is_html_path(path) {
        return Err(Error::UnsupportedInput {
            path: path.to_path_buf(),
        });
    }

    let document_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let asset_dir = companion_dir(path, &config.asset_dir_suffixes);
    let (raw, encoding) = read_markup(path)?;
    let mut dom = parse_document(&raw);
    let mut export = DocumentExport {
        path: path.to_path_buf(),
        dialect: detect_dialect(&dom, &raw),
        encoding,
        asset_dir,
        document_dir,
    };
    let mut content_path = path.to_path_buf();

    if dom.find_by_tag("frameset").is_some() {
        export.dialect = Dialect::Frameset;
        if let Some(sheet) = locate_worksheet(&dom, &raw, &export.asset_dir, &export.document_dir) {
            let (sheet_raw, sheet_encoding) = read_markup(&sheet)?;
            dom = parse_document(&sheet_raw);
            let sheet_dir = sheet.parent().map(Path::to_path_buf).unwrap_or_default();
            export.encoding = sheet_encoding;
            export.asset_dir = sheet_dir.clone();
            export.document_dir = sheet_dir;
            content_path = sheet;
        }
    }
    log::info!(
        "normalizing {} ({}, {})",
        content_path.display(),
        export.dialect,
        export.encoding.name()
    );

    drop_elements(&mut dom, DROPPED_ELEMENTS);
    let style_blocks = take_style_blocks(&mut dom);
    let stylesheet_links = head_stylesheet_links(&dom);
    let content = take_content(&mut dom);

    Ok(NormalizedDocument {
        export,
        content_path,
        dom,
        content,
        style_blocks,
        stylesheet_links,
    })
}

fn read_markup(path: &Path) -> Result<(String, &'static Encoding)> {
    let bytes = fs::read(path).map_err(|e| Error::io(Stage::Normalize, path, e))?;
    let (text, encoding) = decode_text(&bytes);
    Ok((text.into_owned(), encoding))
}

/// Classify a parsed export by the markers office tools leave behind.
pub fn detect_dialect(dom: &ArenaDom, raw_markup: &str) -> Dialect {
    if dom.find_by_tag("frameset").is_some() {
        return Dialect::Frameset;
    }

    let generator = dom
        .elements_named(dom.document(), &["meta"])
        .into_iter()
        .filter(|&m| dom.get_attr(m, "name").is_some_and(|n| n.eq_ignore_ascii_case("generator")))
        .find_map(|m| dom.get_attr(m, "content"))
        .map(str::to_ascii_lowercase);
    if generator.is_some_and(|g| {
        ["microsoft", "libreoffice", "openoffice", "staroffice"]
            .iter()
            .any(|vendor| g.contains(vendor))
    }) {
        return Dialect::Direct;
    }

    let lower = raw_markup.to_ascii_lowercase();
    let has_marker = ["urn:schemas-microsoft-com", "mso-", "class=mso", "class=\"mso", "class='mso"]
        .iter()
        .any(|marker| lower.contains(marker));
    if has_marker { Dialect::Direct } else { Dialect::CleanHtml }
}

fn drop_elements(dom: &mut ArenaDom, tags: &[&str]) {
    for id in dom.elements_named(dom.document(), tags) {
        dom.detach(id);
    }
}

/// Detach every `<style>` element and return its text.
fn take_style_blocks(dom: &mut ArenaDom) -> Vec<StyleBlock> {
    dom.elements_named(dom.document(), &["style"])
        .into_iter()
        .map(|id| {
            let block = StyleBlock {
                css: dom.deep_text(id),
                media: dom.get_attr(id, "media").map(str::to_string),
            };
            dom.detach(id);
            block
        })
        .filter(|block| !block.css.trim().is_empty())
        .collect()
}

/// Stylesheet hrefs that live outside `<body>`.
fn head_stylesheet_links(dom: &ArenaDom) -> Vec<String> {
    let doc = dom.document();
    dom.elements_named(doc, &["link"])
        .into_iter()
        .filter(|&id| is_stylesheet_link(dom, id) && !dom.has_ancestor_named(id, &["body"], doc))
        .filter_map(|id| dom.get_attr(id, "href").map(str::to_string))
        .collect()
}

/// Move the body content into a fresh detached `<div>`.
///
/// Without a body (a frameset whose worksheet was not found, or markup
/// html5ever did not give one) the children of `<html>` are used, minus the
/// head and any frame structure.
fn take_content(dom: &mut ArenaDom) -> ArenaNodeId {
    let container = dom.create_html_element("div", &[]);

    if let Some(body) = dom.find_by_tag("body") {
        dom.reparent_children(body, container);
        return container;
    }

    let parent = dom.find_by_tag("html").unwrap_or(dom.document());
    let children: Vec<_> = dom.children(parent).collect();
    for child in children {
        let skip = match dom.get(child).map(|n| &n.data) {
            Some(ArenaNodeData::Element { name, .. }) => {
                matches!(name.local.as_ref(), "head" | "frameset" | "noframes")
            }
            Some(ArenaNodeData::Doctype { .. }) => true,
            _ => false,
        };
        if !skip {
            dom.detach(child);
            dom.append(container, child);
        }
    }
    container
}
