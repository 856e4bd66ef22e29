//! Embedding images and stylesheets as data URIs.
//!
//! Images referenced from the content subtree and resources referenced from
//! stylesheets or inline styles are read from disk and replaced by `data:`
//! URIs. Linked
//! stylesheets, plus any stylesheet sitting in the companion folder, are
//! concatenated into a single CSS bundle for the assembler.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::css::rewrite_css_urls;
use crate::dom::{ArenaDom, ArenaNodeId};
use crate::import::StyleBlock;
use crate::resolve::{Resolver, Strategy, is_external};
use crate::util::{MediaFormat, decode_text, detect_media_format};

/// Element/attribute pairs that carry image references.
const IMAGE_ATTRIBUTES: &[(&str, &str)] = &[
    ("img", "src"),
    ("v:imagedata", "src"),
    ("table", "background"),
    ("td", "background"),
    ("th", "background"),
];

/// A base64 `data:` URI.
///
/// ```
/// use office_fragment::transform::assets::DataUri;
///
/// let uri = DataUri::encode(b"GIF89a", "image/gif");
/// assert_eq!(uri.to_string(), "data:image/gif;base64,R0lGODlh");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: &'static str,
    pub payload: String,
}

impl DataUri {
    pub fn encode(bytes: &[u8], mime: &'static str) -> Self {
        Self {
            mime,
            payload: STANDARD.encode(bytes),
        }
    }

    /// Read a file and encode it with the MIME type its extension implies.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::encode(&bytes, detect_media_format(path).mime_type()))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, self.payload)
    }
}

/// What an inlining pass did.
#[derive(Debug, Clone, Default)]
pub struct InlineOutcome {
    /// Concatenated stylesheets with their `url()` references embedded.
    pub css_bundle: String,
    pub images_inlined: usize,
    pub stylesheets_inlined: usize,
    pub css_urls_inlined: usize,
    /// Local references no strategy could locate (or read).
    pub unresolved: Vec<String>,
}

/// Replaces local references with embedded data.
#[derive(Debug, Clone)]
pub struct AssetInliner {
    resolver: Resolver,
    asset_dir: PathBuf,
    document_dir: PathBuf,
}

impl AssetInliner {
    pub fn new(asset_dir: impl Into<PathBuf>, document_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver: Resolver::default(),
            asset_dir: asset_dir.into(),
            document_dir: document_dir.into(),
        }
    }

    /// Inline every image and stylesheet reachable from `content`.
    ///
    /// `head_links` are stylesheet hrefs the normalizer found outside the
    /// content subtree. Resolution failures are never fatal: image and
    /// `url()` references stay as written, stylesheet links are dropped,
    /// and every local miss is listed in the outcome.
    pub fn inline(
        &self,
        dom: &mut ArenaDom,
        content: ArenaNodeId,
        head_links: &[String],
    ) -> InlineOutcome {
        let mut outcome = InlineOutcome::default();
        self.inline_images(dom, content, &mut outcome);

        let mut bundled = HashSet::new();
        let mut sheets = Vec::new();

        for href in head_links.iter().filter(|h| !is_external(h)) {
            match self.resolve_stylesheet(href) {
                Some(path) => sheets.push(path),
                None => outcome.unresolved.push(href.clone()),
            }
        }
        for link in dom.elements_named(content, &["link"]) {
            if !is_stylesheet_link(dom, link) {
                continue;
            }
            // Stylesheet links never reach the fragment, bundled or not.
            let href = dom.get_attr(link, "href").map(str::to_string);
            dom.detach(link);
            let Some(href) = href.filter(|h| !is_external(h)) else {
                continue;
            };
            match self.resolve_stylesheet(&href) {
                Some(path) => sheets.push(path),
                None => outcome.unresolved.push(href),
            }
        }
        sheets.extend(self.companion_stylesheets());

        let mut parts = Vec::new();
        for path in sheets {
            let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !bundled.insert(key) {
                continue;
            }
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("skipping stylesheet {}: {e}", path.display());
                    outcome.unresolved.push(path.display().to_string());
                    continue;
                }
            };
            let (css, _) = decode_text(&bytes);
            let css_dir = path.parent().unwrap_or(self.document_dir.as_path());
            parts.push(self.embed_css_urls(&css, css_dir, &mut outcome));
            outcome.stylesheets_inlined += 1;
        }
        outcome.css_bundle = parts.join("\n");

        let local_references =
            outcome.images_inlined + outcome.stylesheets_inlined + outcome.unresolved.len();
        if local_references > 0 && !self.asset_dir.is_dir() {
            log::warn!(
                "companion folder {} does not exist; {} local references looked up elsewhere",
                self.asset_dir.display(),
                local_references
            );
        }
        log::debug!(
            "inlined {} images, {} stylesheets, {} stylesheet resources; {} unresolved",
            outcome.images_inlined,
            outcome.stylesheets_inlined,
            outcome.css_urls_inlined,
            outcome.unresolved.len()
        );
        outcome
    }

    /// Embed `url()` references in style blocks taken from the document,
    /// resolved from the document's own directory.
    pub fn inline_style_blocks(&self, blocks: &mut [StyleBlock], outcome: &mut InlineOutcome) {
        for block in blocks {
            block.css = self.embed_css_urls(&block.css, &self.document_dir, outcome);
        }
    }

    fn inline_images(&self, dom: &mut ArenaDom, content: ArenaNodeId, outcome: &mut InlineOutcome) {
        for &(tag, attr) in IMAGE_ATTRIBUTES {
            for id in dom.elements_named(content, &[tag]) {
                let Some(reference) = dom.get_attr(id, attr).map(str::to_string) else {
                    continue;
                };
                if is_external(&reference) {
                    continue;
                }
                let resolved =
                    self.resolver.resolve(&reference, &self.asset_dir, &self.document_dir);
                let Some(path) = resolved else {
                    outcome.unresolved.push(reference);
                    continue;
                };
                match DataUri::from_file(&path) {
                    Ok(uri) => {
                        dom.set_attr(id, attr, uri.to_string());
                        outcome.images_inlined += 1;
                    }
                    Err(e) => {
                        log::warn!("could not read {}: {e}", path.display());
                        outcome.unresolved.push(reference);
                    }
                }
            }
        }

        // url(...) in inline styles, e.g. paragraph or cell backgrounds.
        for id in dom.descendants(content) {
            let Some(style) = dom
                .get_attr(id, "style")
                .filter(|s| s.to_ascii_lowercase().contains("url("))
                .map(str::to_string)
            else {
                continue;
            };
            let embedded = self.embed_urls(&style, &self.resolver, &self.document_dir, outcome);
            if embedded != style {
                dom.set_attr(id, "style", embedded);
            }
        }
    }

    fn resolve_stylesheet(&self, href: &str) -> Option<PathBuf> {
        self.resolver
            .resolve(href, &self.asset_dir, &self.document_dir)
            .filter(|path| detect_media_format(path) == MediaFormat::Css)
    }

    /// Stylesheets in the companion folder, sorted by file name.
    fn companion_stylesheets(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.asset_dir) else {
            return Vec::new();
        };
        let mut sheets: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && detect_media_format(path) == MediaFormat::Css)
            .collect();
        sheets.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));
        sheets
    }

    /// Embed `url()` references, resolved against the stylesheet's own
    /// folder first and then by file name in the companion folder.
    fn embed_css_urls(&self, css: &str, css_dir: &Path, outcome: &mut InlineOutcome) -> String {
        let resolver = Resolver::new(vec![Strategy::DocumentDirJoined, Strategy::AssetDirFileName]);
        self.embed_urls(css, &resolver, css_dir, outcome)
    }

    fn embed_urls(
        &self,
        css: &str,
        resolver: &Resolver,
        css_dir: &Path,
        outcome: &mut InlineOutcome,
    ) -> String {
        rewrite_css_urls(css, |url| {
            if is_external(url) {
                return None;
            }
            let Some(path) = resolver.resolve(url, &self.asset_dir, css_dir) else {
                outcome.unresolved.push(url.to_string());
                return None;
            };
            match DataUri::from_file(&path) {
                Ok(uri) => {
                    outcome.css_urls_inlined += 1;
                    Some(uri.to_string())
                }
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                    outcome.unresolved.push(url.to_string());
                    None
                }
            }
        })
    }
}

pub(crate) fn is_stylesheet_link(dom: &ArenaDom, link: ArenaNodeId) -> bool {
    dom.get_attr(link, "rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}
