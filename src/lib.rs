//! # office-fragment
//!
//! Turns office "Save as Web Page" exports (Word, Excel, LibreOffice) into a
//! single self-contained HTML fragment that can be pasted into a CMS page.
//!
//! ## Features
//!
//! - Handles direct exports, spreadsheet framesets and plain HTML
//! - Inlines images and linked stylesheets as data URIs
//! - Strips vendor (`mso-`) styling, converts points to pixels, remaps fonts
//! - Removes conditional comments, document wrappers and empty spans
//! - Wraps everything in a width-constrained container
//! - Optional conversion of `.doc`/`.xls` binaries through a [`Converter`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use office_fragment::{PipelineConfig, convert_html};
//!
//! let conversion = convert_html("Report.htm".as_ref(), &PipelineConfig::default())?;
//! std::fs::write("report-fragment.html", conversion.fragment.as_str()).unwrap();
//! for reference in &conversion.report.unresolved {
//!     eprintln!("not inlined: {reference}");
//! }
//! # Ok::<(), office_fragment::Error>(())
//! ```
//!
//! ## Configuration
//!
//! ```
//! use office_fragment::PipelineConfig;
//!
//! let config = PipelineConfig::default()
//!     .with_max_width(720)
//!     .with_container_class("intranet-doc")
//!     .with_font_remap("verdana", "Verdana, Geneva, sans-serif");
//! assert!(config.container_style().contains("min(100%, 720px)"));
//! ```

pub mod config;
pub mod convert;
pub mod dom;
pub mod error;
pub mod export;
pub mod import;
pub mod pipeline;
pub mod publish;
pub mod resolve;
pub mod transform;
pub mod util;

pub use config::{FontRemap, PipelineConfig};
pub use convert::{Converter, SofficeConverter};
pub use error::{BoxError, Error, Result, Stage};
pub use export::Fragment;
pub use import::{Dialect, NormalizedDocument, normalize};
pub use pipeline::{
    Conversion, ConversionReport, InputKind, NoProgress, ProgressEvent, ProgressSink,
    convert_and_publish, convert_document, convert_html, convert_html_with_progress,
};
pub use publish::{FilePublisher, Publisher};
pub use resolve::Resolver;
