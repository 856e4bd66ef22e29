//! Spreadsheet framesets.
//!
//! A multi-sheet spreadsheet export is a frameset page whose real content
//! lives in `sheetNNN.htm` files inside the companion folder. The worksheet
//! is found through the first `<frame src>`; when that is missing or does not
//! resolve, through the `<x:WorksheetSource HRef="...">` hint the exporter
//! leaves inside a conditional comment (visible only in the raw markup).

use std::path::{Path, PathBuf};

use crate::dom::ArenaDom;
use crate::resolve::Resolver;
use crate::transform::WORKSHEET_HINT_RE;

/// Worksheet references in preference order, without duplicates.
pub fn worksheet_candidates(dom: &ArenaDom, raw_markup: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    let frame_src = dom
        .elements_named(dom.document(), &["frame"])
        .into_iter()
        .find_map(|frame| dom.get_attr(frame, "src").filter(|s| !s.trim().is_empty()));
    if let Some(src) = frame_src {
        candidates.push(src.trim().to_string());
    }

    for cap in WORKSHEET_HINT_RE.captures_iter(raw_markup) {
        let hint = cap[1].to_string();
        if !candidates.contains(&hint) {
            candidates.push(hint);
        }
    }
    candidates
}

/// Resolve the first worksheet candidate that exists on disk.
pub fn locate_worksheet(
    dom: &ArenaDom,
    raw_markup: &str,
    asset_dir: &Path,
    document_dir: &Path,
) -> Option<PathBuf> {
    let resolver = Resolver::for_frameset();
    let candidates = worksheet_candidates(dom, raw_markup);
    let found = candidates
        .iter()
        .find_map(|candidate| resolver.resolve(candidate, asset_dir, document_dir));
    match &found {
        Some(path) => log::info!("frameset content found at {}", path.display()),
        None => log::warn!("frameset has no resolvable worksheet (tried {candidates:?})"),
    }
    found
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::dom::parse_document;

    const FRAMESET: &str = r#"<html xmlns:x="urn:schemas-microsoft-com:office:excel">
<head>
<!--[if gte mso 9]><xml>
 <x:ExcelWorkbook><x:ExcelWorksheets><x:ExcelWorksheet>
  <x:Name>Sheet1</x:Name>
  <x:WorksheetSource HRef="Book_files/sheet001.htm"/>
 </x:ExcelWorksheet></x:ExcelWorksheets></x:ExcelWorkbook>
</xml><![endif]-->
</head>
<frameset rows="*,39" border=0>
 <frame src="Book_files/sheet001.htm" name="frSheet">
 <frame src="Book_files/tabstrip.htm" name="frTabs">
</frameset>
</html>"#;

    #[test]
    fn test_candidates_prefer_frame() {
        let dom = parse_document(FRAMESET);
        assert_eq!(worksheet_candidates(&dom, FRAMESET), vec!["Book_files/sheet001.htm"]);
    }

    #[test]
    fn test_hint_used_without_frame() {
        let raw = FRAMESET.replace("<frame src=\"Book_files/sheet001.htm\" name=\"frSheet\">", "");
        let raw = raw.replace("<frame src=\"Book_files/tabstrip.htm\" name=\"frTabs\">", "");
        let dom = parse_document(&raw);
        assert_eq!(worksheet_candidates(&dom, &raw), vec!["Book_files/sheet001.htm"]);
    }

    #[test]
    fn test_locate_falls_back_to_hint() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = tmp.path().join("Book_files");
        fs::create_dir(&assets).unwrap();
        fs::write(assets.join("sheet002.htm"), "<table></table>").unwrap();

        let raw = FRAMESET.replace(
            "x:WorksheetSource HRef=\"Book_files/sheet001.htm\"",
            "x:WorksheetSource HRef=\"Book_files/sheet002.htm\"",
        );
        let dom = parse_document(&raw);
        assert_eq!(
            locate_worksheet(&dom, &raw, &assets, tmp.path()),
            Some(tmp.path().join("Book_files/sheet002.htm"))
        );
    }

    #[test]
    fn test_locate_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let dom = parse_document(FRAMESET);
        assert_eq!(
            locate_worksheet(&dom, FRAMESET, &tmp.path().join("Book_files"), tmp.path()),
            None
        );
    }
}
