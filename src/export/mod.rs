//! Producing the final fragment.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//!
//! use office_fragment::PipelineConfig;
//! use office_fragment::dom::parse_document;
//! use office_fragment::export::assemble;
//!
//! let mut dom = parse_document("<p>Quarterly figures</p>");
//! let body = dom.find_by_tag("body").unwrap();
//! let fragment = assemble(&mut dom, body, "", &[], &PipelineConfig::default(), Path::new("q3.htm"))?;
//! assert!(fragment.as_str().starts_with(r#"<div class="wp-office-fixed""#));
//! assert!(fragment.as_str().ends_with("<p>Quarterly figures</p></div>"));
//! # Ok::<(), office_fragment::Error>(())
//! ```

mod fragment;

pub use fragment::{Fragment, assemble};
