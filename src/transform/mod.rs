//! Content transforms applied to a normalized export
//!
//! - assets: Data URI embedding and the stylesheet bundle
//! - css: Stylesheet rewriting (vendor stripping, units, url rewriting)
//! - style: Inline style sanitization
//! - cleanup: Whitespace and markup cleanup

pub mod assets;
pub mod cleanup;
pub mod css;
mod patterns;
pub mod style;

pub(crate) use patterns::WORKSHEET_HINT_RE;
