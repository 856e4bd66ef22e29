//! Fragment assembly.
//!
//! The fragment is one `<div>` container: the stylesheet bundle first, then
//! the style blocks extracted from the source, then the content. Document
//! wrappers are unwrapped in the tree; after serialization the textual
//! cleanup removes what the tree could not.

use std::fmt;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::dom::{ArenaDom, ArenaNodeId, serialize_node};
use crate::error::{Error, Result, Stage};
use crate::import::StyleBlock;
use crate::transform::cleanup::{finalize_markup, has_meaningful_content, unwrap_document_wrappers};

/// A self-contained HTML fragment ready to embed in a CMS page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    html: String,
}

impl Fragment {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.html.len()
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

impl AsRef<str> for Fragment {
    fn as_ref(&self) -> &str {
        &self.html
    }
}

/// Wrap `content` in the styling container and serialize it.
///
/// `source` only names the document in errors. Fails with
/// [`Error::EmptyFragment`] when the content has neither visible text nor
/// media.
pub fn assemble(
    dom: &mut ArenaDom,
    content: ArenaNodeId,
    css_bundle: &str,
    style_blocks: &[StyleBlock],
    config: &PipelineConfig,
    source: &Path,
) -> Result<Fragment> {
    if !has_meaningful_content(dom, content) {
        return Err(Error::EmptyFragment {
            path: source.to_path_buf(),
        });
    }

    let style = config.container_style();
    let container = dom.create_html_element(
        "div",
        &[("class", config.container_class.as_str()), ("style", style.as_str())],
    );

    if !css_bundle.trim().is_empty() {
        let bundle = dom.create_html_element("style", &[]);
        dom.append_text(bundle, css_bundle);
        dom.append(container, bundle);
    }
    for block in style_blocks {
        let attrs: Vec<(&str, &str)> =
            block.media.as_deref().map(|m| ("media", m)).into_iter().collect();
        let element = dom.create_html_element("style", &attrs);
        dom.append_text(element, &block.css);
        dom.append(container, element);
    }
    dom.reparent_children(content, container);
    unwrap_document_wrappers(dom, container);

    let html = serialize_node(dom, container).map_err(|e| Error::io(Stage::Assemble, source, e))?;
    let fragment = Fragment {
        html: finalize_markup(&html),
    };
    log::debug!("assembled fragment of {} bytes", fragment.len());
    Ok(fragment)
}
