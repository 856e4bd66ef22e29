//! Locating asset files referenced by an export.
//!
//! Office tools write references that are only loosely related to where the
//! files actually end up: the companion folder may have been renamed, the
//! HTML may have been moved next to it, or a frameset may point into the
//! folder from one level up. Resolution is therefore an ordered list of
//! [`Strategy`] values evaluated first-match-wins.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Companion folder suffixes, in the order office tools produce them.
pub const DEFAULT_ASSET_DIR_SUFFIXES: &[&str] = &[
    "_files",
    ".files",
    "-files",
    ".html_files",
    "-Dateien",
    ".fld",
    "_Dateien",
];

/// One way of turning a relative reference into a candidate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `asset_dir/reference`, only when the asset directory exists.
    AssetDirJoined,
    /// `document_dir/reference`.
    DocumentDirJoined,
    /// `asset_dir/<file name of reference>`, ignoring any subpath.
    AssetDirFileName,
    /// `document_dir/<file name of reference>`.
    DocumentDirFileName,
}

impl Strategy {
    fn candidate(self, reference: &str, asset_dir: &Path, document_dir: &Path) -> Option<PathBuf> {
        match self {
            Strategy::AssetDirJoined => asset_dir.is_dir().then(|| asset_dir.join(reference)),
            Strategy::DocumentDirJoined => Some(document_dir.join(reference)),
            Strategy::AssetDirFileName => {
                let name = file_name(reference)?;
                asset_dir.is_dir().then(|| asset_dir.join(name))
            }
            Strategy::DocumentDirFileName => Some(document_dir.join(file_name(reference)?)),
        }
    }
}

/// Ordered list of resolution strategies.
#[derive(Debug, Clone)]
pub struct Resolver {
    strategies: Vec<Strategy>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(vec![
            Strategy::AssetDirJoined,
            Strategy::DocumentDirJoined,
            Strategy::AssetDirFileName,
            Strategy::DocumentDirFileName,
        ])
    }
}

impl Resolver {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// Strategies used to find the worksheet a frameset points at: the
    /// frameset's own directory first, then the companion folder.
    pub fn for_frameset() -> Self {
        Self::new(vec![
            Strategy::DocumentDirJoined,
            Strategy::AssetDirJoined,
            Strategy::AssetDirFileName,
            Strategy::DocumentDirFileName,
        ])
    }

    /// Find the file a reference points at.
    ///
    /// Returns `None` for references that are not local files (see
    /// [`is_external`]) and for local references no strategy can locate.
    pub fn resolve(
        &self,
        reference: &str,
        asset_dir: &Path,
        document_dir: &Path,
    ) -> Option<PathBuf> {
        if is_external(reference) {
            return None;
        }
        let cleaned = clean_reference(reference);
        if cleaned.is_empty() {
            return None;
        }
        let decoded = percent_decode_str(&cleaned).decode_utf8().ok();
        let decoded = decoded.filter(|d| d.as_ref() != cleaned.as_str());

        for strategy in &self.strategies {
            let variants = std::iter::once(cleaned.as_str()).chain(decoded.as_deref());
            for variant in variants {
                if let Some(path) = strategy.candidate(variant, asset_dir, document_dir)
                    && path.is_file()
                {
                    log::trace!("resolved {reference} via {strategy:?}");
                    return Some(path);
                }
            }
        }
        log::debug!("unresolved reference: {reference}");
        None
    }
}

/// Whether a reference is already embedded, remote, or otherwise not a
/// relative filesystem path.
///
/// ```
/// use office_fragment::resolve::is_external;
///
/// assert!(is_external("data:image/png;base64,AAAA"));
/// assert!(is_external("https://example.com/a.png"));
/// assert!(is_external("mailto:someone@example.com"));
/// assert!(is_external("#bookmark"));
/// assert!(!is_external("Book_files/image001.png"));
/// ```
pub fn is_external(reference: &str) -> bool {
    let r = reference.trim();
    if r.is_empty() || r.starts_with('#') || r.starts_with('/') || r.starts_with('\\') {
        return true;
    }
    let bytes = r.as_bytes();
    // Drive-letter paths (C:\ or C:/) are absolute.
    if bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'\\' | b'/')
    {
        return true;
    }
    match r.find(':') {
        Some(colon) if colon > 1 => r[..colon]
            .chars()
            .enumerate()
            .all(|(i, c)| {
                c.is_ascii_alphabetic()
                    || (i > 0 && (c.is_ascii_digit() || matches!(c, '+' | '-' | '.')))
            }),
        _ => false,
    }
}

/// Normalise separators and strip `./`, query strings and fragments.
fn clean_reference(reference: &str) -> String {
    let mut r = reference.trim().replace('\\', "/");
    if let Some(pos) = r.find(['?', '#']) {
        r.truncate(pos);
    }
    let mut r = r.as_str();
    while let Some(rest) = r.strip_prefix("./") {
        r = rest;
    }
    r.to_string()
}

fn file_name(reference: &str) -> Option<&str> {
    reference.rsplit('/').next().filter(|n| !n.is_empty() && *n != "..")
}

/// Locate the companion folder for an exported document.
///
/// Returns the first existing `<stem><suffix>` directory next to the
/// document, or the conventional `<stem>_files` path (which may not exist)
/// so callers can always join against it.
pub fn companion_dir<S: AsRef<str>>(document: &Path, suffixes: &[S]) -> PathBuf {
    let parent = document.parent().unwrap_or(Path::new("."));
    let stem: Cow<'_, str> = document
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    suffixes
        .iter()
        .map(|suffix| parent.join(format!("{stem}{}", suffix.as_ref())))
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| parent.join(format!("{stem}_files")))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_external_references() {
        assert!(is_external("http://example.com/x.png"));
        assert!(is_external("HTTPS://example.com/x.png"));
        assert!(is_external("file:///tmp/x.png"));
        assert!(is_external("//cdn.example.com/x.png"));
        assert!(is_external("C:\\Users\\me\\x.png"));
        assert!(is_external(""));
        assert!(!is_external("image001.png"));
        assert!(!is_external("../shared/image001.png"));
        assert!(!is_external("a:b.png"));
    }

    #[test]
    fn test_clean_reference() {
        assert_eq!(clean_reference(".\\Book_files\\image001.png"), "Book_files/image001.png");
        assert_eq!(clean_reference("./a.css?v=2"), "a.css");
        assert_eq!(clean_reference("img.png#frag"), "img.png");
    }

    #[test]
    fn test_strategy_order() {
        let tmp = tempfile::tempdir().unwrap();
        let doc_dir = tmp.path();
        let assets = doc_dir.join("Report_files");
        touch(&assets.join("image001.png"));
        touch(&doc_dir.join("image001.png"));

        let resolver = Resolver::default();
        // Asset directory wins over the document directory.
        assert_eq!(
            resolver.resolve("image001.png", &assets, doc_dir),
            Some(assets.join("image001.png"))
        );
        // Document-relative path with a subdirectory.
        assert_eq!(
            resolver.resolve("Report_files/image001.png", &assets, doc_dir),
            Some(doc_dir.join("Report_files/image001.png"))
        );
        // Subpath ignored, found by file name in the asset directory.
        assert_eq!(
            resolver.resolve("Old Name_files/image001.png", &assets, doc_dir),
            Some(assets.join("image001.png"))
        );
    }

    #[test]
    fn test_missing_asset_dir_falls_back_to_document_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let doc_dir = tmp.path();
        touch(&doc_dir.join("logo.gif"));

        let resolver = Resolver::default();
        let missing = doc_dir.join("Report_files");
        assert_eq!(
            resolver.resolve("Report_files/logo.gif", &missing, doc_dir),
            Some(doc_dir.join("logo.gif"))
        );
        assert_eq!(resolver.resolve("nothing.gif", &missing, doc_dir), None);
    }

    #[test]
    fn test_percent_encoded_reference() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = tmp.path().join("My Report_files");
        touch(&assets.join("image 1.png"));

        let resolved =
            Resolver::default().resolve("My%20Report_files/image%201.png", &assets, tmp.path());
        assert_eq!(resolved, Some(assets.join("image 1.png")));
    }

    #[test]
    fn test_external_never_resolves() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("data:x"));
        assert_eq!(Resolver::default().resolve("data:x", tmp.path(), tmp.path()), None);
    }

    #[test]
    fn test_companion_dir_detection() {
        let tmp = tempfile::tempdir().unwrap();
        let doc = tmp.path().join("Budget.htm");
        assert_eq!(
            companion_dir(&doc, DEFAULT_ASSET_DIR_SUFFIXES),
            tmp.path().join("Budget_files")
        );

        fs::create_dir(tmp.path().join("Budget.fld")).unwrap();
        assert_eq!(
            companion_dir(&doc, DEFAULT_ASSET_DIR_SUFFIXES),
            tmp.path().join("Budget.fld")
        );

        fs::create_dir(tmp.path().join("Budget-files")).unwrap();
        assert_eq!(
            companion_dir(&doc, DEFAULT_ASSET_DIR_SUFFIXES),
            tmp.path().join("Budget-files")
        );
    }
}
