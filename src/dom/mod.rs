//! Arena DOM, html5ever parsing and serialization.
//!
//! # Example
//!
//! ```
//! use office_fragment::dom::{parse_document, serialize_node};
//!
//! let dom = parse_document("<p class=MsoNormal>Hello<o:p></o:p></p>");
//! let p = dom.find_by_tag("p").unwrap();
//! assert_eq!(
//!     serialize_node(&dom, p).unwrap(),
//!     r#"<p class="MsoNormal">Hello<o:p></o:p></p>"#
//! );
//! ```

mod arena;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute, ChildrenIter};

use std::io;

use html5ever::QualName;
use html5ever::driver::ParseOpts;
use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};
use html5ever::tendril::TendrilSink;

use tree_sink::ArenaSink;

/// Parse an HTML document into an [`ArenaDom`].
///
/// html5ever follows the browser error-recovery algorithm, so any input
/// produces a tree; recoverable parse errors are only counted and logged.
pub fn parse_document(html: &str) -> ArenaDom {
    let sink = html5ever::parse_document(ArenaSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());
    if sink.parse_errors() > 0 {
        log::debug!("recovered from {} HTML parse errors", sink.parse_errors());
    }
    sink.into_dom()
}

/// Serialize a node (including itself) to an HTML string.
pub fn serialize_node(dom: &ArenaDom, id: ArenaNodeId) -> io::Result<String> {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    serialize(&mut bytes, &NodeRef { dom, id }, opts)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// A node borrowed from an arena, serializable by html5ever.
struct NodeRef<'a> {
    dom: &'a ArenaDom,
    id: ArenaNodeId,
}

enum SerializeOp {
    Open(ArenaNodeId),
    Close(QualName),
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(
        &self,
        serializer: &mut S,
        traversal_scope: TraversalScope,
    ) -> io::Result<()> {
        let mut ops = match traversal_scope {
            TraversalScope::IncludeNode => vec![SerializeOp::Open(self.id)],
            TraversalScope::ChildrenOnly(_) => {
                let mut children: Vec<_> =
                    self.dom.children(self.id).map(SerializeOp::Open).collect();
                children.reverse();
                children
            }
        };

        while let Some(op) = ops.pop() {
            let id = match op {
                SerializeOp::Open(id) => id,
                SerializeOp::Close(name) => {
                    serializer.end_elem(name)?;
                    continue;
                }
            };
            let Some(node) = self.dom.get(id) else {
                continue;
            };
            match &node.data {
                ArenaNodeData::Element { name, attrs } => {
                    let attrs = attrs.iter().map(|a| (&a.name, a.value.as_str()));
                    serializer.start_elem(name.clone(), attrs)?;
                    ops.push(SerializeOp::Close(name.clone()));
                }
                ArenaNodeData::Text(text) => {
                    serializer.write_text(text)?;
                    continue;
                }
                ArenaNodeData::Comment(text) => {
                    serializer.write_comment(text)?;
                    continue;
                }
                ArenaNodeData::Doctype { name } => {
                    serializer.write_doctype(name)?;
                    continue;
                }
                ArenaNodeData::Document => {}
            }
            let mut children: Vec<_> = self.dom.children(id).map(SerializeOp::Open).collect();
            children.reverse();
            ops.extend(children);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_keeps_style_text_raw() {
        let dom = parse_document("<style>td > p { color: red }</style><p>a &amp; b</p>");
        let style = dom.find_by_tag("style").unwrap();
        assert_eq!(
            serialize_node(&dom, style).unwrap(),
            "<style>td > p { color: red }</style>"
        );
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(serialize_node(&dom, p).unwrap(), "<p>a &amp; b</p>");
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let dom = parse_document(r#"<p>one<br>two<img src="x.png"></p>"#);
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(
            serialize_node(&dom, p).unwrap(),
            r#"<p>one<br>two<img src="x.png"></p>"#
        );
    }

    #[test]
    fn test_comments_survive_serialization() {
        let dom = parse_document("<div><!--[if gte mso 9]><xml></xml><![endif]--></div>");
        let div = dom.find_by_tag("div").unwrap();
        assert_eq!(
            serialize_node(&dom, div).unwrap(),
            "<div><!--[if gte mso 9]><xml></xml><![endif]--></div>"
        );
    }

    #[test]
    fn test_detached_subtree_serializes() {
        let mut dom = ArenaDom::new();
        let div = dom.create_html_element("div", &[("class", "box")]);
        dom.append_text(div, "x < y");
        assert_eq!(
            serialize_node(&dom, div).unwrap(),
            r#"<div class="box">x &lt; y</div>"#
        );
    }
}
