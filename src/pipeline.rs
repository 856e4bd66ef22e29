//! End-to-end conversion.
//!
//! Stages run in a fixed order on one in-memory tree:
//!
//! 1. normalize: read the export, pick the content subtree
//! 2. inline assets: images and stylesheets become data URIs / a CSS bundle
//! 3. clean markup: conditional comments, space runs, whitespace, empty wrappers
//! 4. sanitize styles: inline styles, the bundle and extracted style blocks
//! 5. assemble: container, serialization, textual cleanup
//!
//! Cleanup runs before sanitizing because space-run spans are recognised by
//! the `mso-spacerun` declaration the sanitizer strips.
//!
//! # Example
//!
//! ```no_run
//! use office_fragment::{PipelineConfig, ProgressEvent, convert_html_with_progress};
//!
//! let mut progress = |event: ProgressEvent| eprintln!("{event}");
//! let conversion = convert_html_with_progress(
//!     "Quarterly.htm".as_ref(),
//!     &PipelineConfig::default(),
//!     &mut progress,
//! )?;
//! println!("{}", conversion.fragment);
//! # Ok::<(), office_fragment::Error>(())
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::config::PipelineConfig;
use crate::convert::Converter;
use crate::error::{Error, Result, Stage};
use crate::export::{Fragment, assemble};
use crate::import::{Dialect, is_html_path, normalize};
use crate::publish::Publisher;
use crate::transform::assets::AssetInliner;
use crate::transform::cleanup::{CleanupStats, clean_tree};
use crate::transform::css::sanitize_stylesheet;
use crate::transform::style::{SanitizeStats, sanitize_element_styles};

/// Extensions handed to a [`Converter`] before normalization.
pub const WORD_PROCESSOR_EXTENSIONS: &[&str] = &["doc", "docx"];
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx"];

const HTML_STAGES: usize = 5;

/// A progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A stage is starting; `step` counts from 1 up to `total`.
    Stage { stage: Stage, step: usize, total: usize },
    /// Something worth telling a user that is not an error.
    Message(String),
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Stage { stage, step, total } => write!(f, "[{step}/{total}] {stage}"),
            ProgressEvent::Message(message) => f.write_str(message),
        }
    }
}

/// Receives progress notifications.
pub trait ProgressSink {
    fn report(&mut self, event: ProgressEvent);
}

impl<F: FnMut(ProgressEvent)> ProgressSink for F {
    fn report(&mut self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for mpsc::Sender<ProgressEvent> {
    fn report(&mut self, event: ProgressEvent) {
        // A dropped receiver only means nobody is listening anymore.
        let _ = self.send(event);
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _event: ProgressEvent) {}
}

/// What kind of document an input path is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Html,
    WordProcessor,
    Spreadsheet,
}

impl InputKind {
    /// Classify by extension. Anything else is [`Error::UnsupportedInput`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if is_html_path(path) {
            Ok(InputKind::Html)
        } else if WORD_PROCESSOR_EXTENSIONS.contains(&ext.as_str()) {
            Ok(InputKind::WordProcessor)
        } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Ok(InputKind::Spreadsheet)
        } else {
            Err(Error::UnsupportedInput {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Summary of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct ConversionReport {
    pub source: PathBuf,
    /// File the content came from (the worksheet for framesets, the
    /// converter's output for office binaries).
    pub content_path: PathBuf,
    #[cfg_attr(feature = "cli", serde(serialize_with = "serialize_dialect"))]
    pub dialect: Dialect,
    pub encoding: String,
    pub asset_dir: PathBuf,
    pub asset_dir_found: bool,
    pub images_inlined: usize,
    pub stylesheets_inlined: usize,
    pub css_resources_inlined: usize,
    pub unresolved: Vec<String>,
    pub cleanup: CleanupStats,
    pub sanitize: SanitizeStats,
    pub fragment_bytes: usize,
}

#[cfg(feature = "cli")]
fn serialize_dialect<S: serde::Serializer>(
    dialect: &Dialect,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(dialect.as_str())
}

/// A finished fragment and how it was made.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub fragment: Fragment,
    pub report: ConversionReport,
}

struct Steps<'a> {
    sink: &'a mut dyn ProgressSink,
    step: usize,
    total: usize,
}

impl<'a> Steps<'a> {
    fn new(sink: &'a mut dyn ProgressSink, total: usize) -> Self {
        Self { sink, step: 0, total }
    }

    fn begin(&mut self, stage: Stage) {
        self.step += 1;
        log::info!("[{}/{}] {stage}", self.step, self.total);
        self.sink.report(ProgressEvent::Stage {
            stage,
            step: self.step,
            total: self.total,
        });
    }

    fn message(&mut self, message: String) {
        self.sink.report(ProgressEvent::Message(message));
    }
}

/// Convert an HTML export into a fragment.
pub fn convert_html(path: &Path, config: &PipelineConfig) -> Result<Conversion> {
    convert_html_with_progress(path, config, &mut NoProgress)
}

/// Convert an HTML export into a fragment, reporting progress.
pub fn convert_html_with_progress(
    path: &Path,
    config: &PipelineConfig,
    progress: &mut dyn ProgressSink,
) -> Result<Conversion> {
    let mut steps = Steps::new(progress, HTML_STAGES);
    run_html(path, path, config, &mut steps)
}

/// Convert any supported document. Office binaries are first exported to
/// HTML in `workdir` by `converter`.
pub fn convert_document(
    source: &Path,
    workdir: &Path,
    converter: &dyn Converter,
    config: &PipelineConfig,
    progress: &mut dyn ProgressSink,
) -> Result<Conversion> {
    let kind = InputKind::from_path(source)?;
    let total = HTML_STAGES + usize::from(kind != InputKind::Html);
    let mut steps = Steps::new(progress, total);
    convert_with_steps(source, workdir, kind, converter, config, &mut steps)
}

/// Convert a document and publish the fragment to `target`.
pub fn convert_and_publish(
    source: &Path,
    workdir: &Path,
    target: &str,
    converter: &dyn Converter,
    publisher: &dyn Publisher,
    config: &PipelineConfig,
    progress: &mut dyn ProgressSink,
) -> Result<Conversion> {
    let kind = InputKind::from_path(source)?;
    let total = HTML_STAGES + usize::from(kind != InputKind::Html) + 1;
    let mut steps = Steps::new(progress, total);
    let conversion = convert_with_steps(source, workdir, kind, converter, config, &mut steps)?;

    steps.begin(Stage::Publish);
    publisher
        .publish(conversion.fragment.as_str(), target)
        .map_err(|source| Error::Publisher {
            target: target.to_string(),
            source,
        })?;
    steps.message(format!("published {} bytes to {target}", conversion.fragment.len()));
    Ok(conversion)
}

fn convert_with_steps(
    source: &Path,
    workdir: &Path,
    kind: InputKind,
    converter: &dyn Converter,
    config: &PipelineConfig,
    steps: &mut Steps<'_>,
) -> Result<Conversion> {
    if kind == InputKind::Html {
        return run_html(source, source, config, steps);
    }

    steps.begin(Stage::Convert);
    let exported = converter
        .convert(source, workdir)
        .map_err(|e| Error::Converter {
            path: source.to_path_buf(),
            source: e,
        })?;
    steps.message(format!("exported {} to {}", source.display(), exported.display()));
    run_html(source, &exported, config, steps)
}

fn run_html(
    source: &Path,
    html: &Path,
    config: &PipelineConfig,
    steps: &mut Steps<'_>,
) -> Result<Conversion> {
    steps.begin(Stage::Normalize);
    let mut doc = normalize(html, config)?;

    steps.begin(Stage::Inline);
    let inliner = AssetInliner::new(&doc.export.asset_dir, &doc.export.document_dir);
    let mut outcome = inliner.inline(&mut doc.dom, doc.content, &doc.stylesheet_links);
    inliner.inline_style_blocks(&mut doc.style_blocks, &mut outcome);
    for reference in &outcome.unresolved {
        steps.message(format!("unresolved reference kept: {reference}"));
    }

    steps.begin(Stage::Clean);
    let cleanup = clean_tree(&mut doc.dom, doc.content);

    steps.begin(Stage::Sanitize);
    let sanitize = sanitize_element_styles(&mut doc.dom, doc.content, config);
    let bundle = sanitize_stylesheet(&outcome.css_bundle, config);
    if config.sanitize_extracted_styles {
        for block in &mut doc.style_blocks {
            block.css = sanitize_stylesheet(&block.css, config);
        }
    }

    steps.begin(Stage::Assemble);
    let fragment = assemble(
        &mut doc.dom,
        doc.content,
        &bundle,
        &doc.style_blocks,
        config,
        &doc.content_path,
    )?;

    let report = ConversionReport {
        source: source.to_path_buf(),
        content_path: doc.content_path,
        dialect: doc.export.dialect,
        encoding: doc.export.encoding.name().to_string(),
        asset_dir_found: doc.export.asset_dir.is_dir(),
        asset_dir: doc.export.asset_dir,
        images_inlined: outcome.images_inlined,
        stylesheets_inlined: outcome.stylesheets_inlined,
        css_resources_inlined: outcome.css_urls_inlined,
        unresolved: outcome.unresolved,
        cleanup,
        sanitize,
        fragment_bytes: fragment.len(),
    };
    log::info!(
        "{}: {} bytes, {} images, {} stylesheets, {} unresolved",
        source.display(),
        report.fragment_bytes,
        report.images_inlined,
        report.stylesheets_inlined,
        report.unresolved.len()
    );
    Ok(Conversion { fragment, report })
}
