//! End-to-end conversion of word-processor exports.

use std::fs;
use std::path::{Path, PathBuf};

use office_fragment::{Dialect, Error, PipelineConfig, Stage, convert_html};

/// PNG signature, enough for a data URI.
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

const CONTAINER_OPEN: &str = r#"<div class="wp-office-fixed" style="margin:0 !important;padding:0;width:min(100%, 900px);background:transparent;overflow:visible;">"#;

const MEMO: &str = r#"<html xmlns:v="urn:schemas-microsoft-com:vml"
xmlns:o="urn:schemas-microsoft-com:office:office"
xmlns:w="urn:schemas-microsoft-com:office:word">
<head>
<meta http-equiv=Content-Type content="text/html; charset=windows-1252">
<meta name=Generator content="Microsoft Word 15 (filtered)">
<link rel=File-List href="Memo_files/filelist.xml">
<!--[if gte mso 9]><xml>
 <o:DocumentProperties><o:Author>Finance</o:Author></o:DocumentProperties>
</xml><![endif]-->
<style>
<!--
p.MsoNormal
	{margin:0in;
	font-size:11.0pt;
	font-family:"Calibri",sans-serif;
	mso-fareast-font-family:Calibri;}
-->
</style>
</head>
<body lang=EN-US style='tab-interval:.5in'>
<div class=WordSection1>
<p class=MsoNormal style='font-size:12.0pt;font-family:"Calibri",sans-serif;mso-bidi-font-family:Arial'>Quarterly<span style='mso-spacerun:yes'>&nbsp;&nbsp; </span>results<o:p></o:p></p>
<p class=MsoNormal>{CAFE}</p>
<p class=MsoNormal><img width=120 height=40 src="Memo_files/image001.png" alt=Logo></p>
<p class=MsoListParagraph style='text-indent:-.25in;mso-list:l0 level1 lfo1'><![if !supportLists]><span>1.<span style='font:7.0pt "Times New Roman"'>&nbsp;&nbsp;&nbsp; </span></span><![endif]>First point</p>
<table class=MsoTableGrid border=1 cellspacing=0 cellpadding=0 style='border-collapse:collapse;border:none'>
 <tr>
  <td style='border:solid windowtext 1.0pt;padding:0in 5.4pt 0in 5.4pt'><p class=MsoNormal>Cell<o:p>&nbsp;</o:p></p></td>
 </tr>
</table>
</div>
</body>
</html>
"#;

/// Write the memo export (Windows-1252 encoded) and its companion folder.
fn write_memo(dir: &Path) -> PathBuf {
    let (head, tail) = MEMO.split_once("{CAFE}").unwrap();
    let bytes = [head.as_bytes(), b"Caf\xe9 menu", tail.as_bytes()].concat();
    let path = dir.join("Memo.htm");
    fs::write(&path, bytes).unwrap();

    let assets = dir.join("Memo_files");
    fs::create_dir(&assets).unwrap();
    fs::write(assets.join("image001.png"), PNG).unwrap();
    fs::write(assets.join("filelist.xml"), "<xml></xml>").unwrap();
    path
}

#[test]
fn test_memo_becomes_self_contained_fragment() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_memo(tmp.path());

    let conversion = convert_html(&path, &PipelineConfig::default()).unwrap();
    let html = conversion.fragment.as_str();

    assert!(html.starts_with(CONTAINER_OPEN), "{html}");
    assert!(html.ends_with("</div>"));
    for forbidden in [
        "<html",
        "<head",
        "<body",
        "</body>",
        "Memo_files/",
        "mso-",
        "[if",
        "endif",
        "<o:p",
        "class=\"Mso",
    ] {
        assert!(!html.contains(forbidden), "found {forbidden:?} in {html}");
    }

    assert!(html.contains(&format!(r#"src="{PNG_URI}""#)));
    assert!(html.contains("Quarterly results"));
    assert!(html.contains("Café menu"));
    assert!(html.contains("First point"));
    assert!(html.contains("1."), "list bullet kept");
    assert!(html.contains(
        "font-size: 16px; font-family: Calibri, 'Segoe UI', Arial, Helvetica, sans-serif; line-height: 1;"
    ));
    assert!(html.contains("padding: 0in 7.2px 0in 7.2px;"));
    assert!(html.contains("<style>"), "extracted style block kept");
    assert!(html.contains("font-size:14.67px"));

    let report = &conversion.report;
    assert_eq!(report.dialect, Dialect::Direct);
    assert_eq!(report.encoding, "windows-1252");
    assert_eq!(report.content_path, path);
    assert_eq!(report.asset_dir, tmp.path().join("Memo_files"));
    assert!(report.asset_dir_found);
    assert_eq!(report.images_inlined, 1);
    assert!(report.unresolved.is_empty());
    assert_eq!(report.fragment_bytes, html.len());
}

#[test]
fn test_conversion_is_repeatable_and_read_only() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_memo(tmp.path());
    let before = fs::read(&path).unwrap();

    let config = PipelineConfig::default();
    let first = convert_html(&path, &config).unwrap();
    let second = convert_html(&path, &config).unwrap();

    assert_eq!(first.fragment, second.fragment);
    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(fs::read(tmp.path().join("Memo_files/image001.png")).unwrap(), PNG);
}

#[test]
fn test_unresolved_references_left_verbatim() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Links.htm");
    fs::write(
        &path,
        r#"<html><head>
<meta name=Generator content="Microsoft Word 15">
<link rel=stylesheet href="theme/missing.css">
</head><body>
<p class=MsoNormal><img src="Links_files/missing%20image.png"></p>
<p class=MsoNormal><img src="https://example.com/logo.png"></p>
<table><tr><td background="Links_files/tile.gif">x</td></tr></table>
</body></html>"#,
    )
    .unwrap();

    let conversion = convert_html(&path, &PipelineConfig::default()).unwrap();
    let html = conversion.fragment.as_str();

    assert!(html.contains(r#"src="Links_files/missing%20image.png""#));
    assert!(html.contains(r#"src="https://example.com/logo.png""#));
    assert!(html.contains(r#"background="Links_files/tile.gif""#));
    assert_eq!(conversion.report.images_inlined, 0);
    assert_eq!(
        conversion.report.unresolved,
        vec![
            "Links_files/missing%20image.png".to_string(),
            "Links_files/tile.gif".to_string(),
            "theme/missing.css".to_string(),
        ]
    );
}

#[test]
fn test_inline_style_backgrounds_embedded() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Memo.htm");
    fs::write(
        &path,
        r#"<meta name=Generator content="Microsoft Word 15">
<p class=MsoNormal style="background:url(Memo_files/bg.png)">Shaded</p>
<table><tr><td style="background-image:url('Memo_files/bg.png');padding:0in 5.4pt">Cell</td></tr></table>"#,
    )
    .unwrap();
    let assets = tmp.path().join("Memo_files");
    fs::create_dir(&assets).unwrap();
    fs::write(assets.join("bg.png"), PNG).unwrap();

    let conversion = convert_html(&path, &PipelineConfig::default()).unwrap();
    let html = conversion.fragment.as_str();

    assert!(!html.contains("Memo_files"), "{html}");
    assert!(html.contains("Shaded"));
    assert_eq!(html.matches("data:image/png;base64,iVBORw0KGgo=").count(), 2);
    assert!(html.contains("padding: 0in 7.2px;"));
    assert_eq!(conversion.report.css_resources_inlined, 2);
    assert!(conversion.report.unresolved.is_empty());
}

#[test]
fn test_unresolved_body_stylesheet_link_removed() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Linked.htm");
    fs::write(
        &path,
        r#"<p class=MsoNormal>Body</p><link rel=stylesheet href="Linked_files/gone.css">"#,
    )
    .unwrap();

    let conversion = convert_html(&path, &PipelineConfig::default()).unwrap();
    let html = conversion.fragment.as_str();

    assert!(!html.contains("<link"), "{html}");
    assert!(!html.contains("gone.css"));
    assert_eq!(conversion.report.unresolved, vec!["Linked_files/gone.css".to_string()]);
}

#[test]
fn test_missing_companion_folder_uses_document_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Moved.htm");
    fs::write(
        &path,
        r#"<meta name=Generator content="Microsoft Word 15"><p class=MsoNormal><img src="Moved_files/image001.png"></p>"#,
    )
    .unwrap();
    fs::write(tmp.path().join("image001.png"), PNG).unwrap();

    let conversion = convert_html(&path, &PipelineConfig::default()).unwrap();
    assert!(conversion.fragment.as_str().contains(PNG_URI));
    assert!(!conversion.report.asset_dir_found);
    assert_eq!(conversion.report.images_inlined, 1);
}

#[test]
fn test_renamed_companion_folder_found_by_suffix() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Letter.html");
    fs::write(
        &path,
        r#"<p class=MsoNormal><img src="Letter_files/image001.png"><v:imagedata src="Letter_files/image001.png" o:title=""></v:imagedata></p>"#,
    )
    .unwrap();
    let assets = tmp.path().join("Letter.fld");
    fs::create_dir(&assets).unwrap();
    fs::write(assets.join("image001.png"), PNG).unwrap();

    let conversion = convert_html(&path, &PipelineConfig::default()).unwrap();
    assert_eq!(conversion.report.asset_dir, assets);
    assert_eq!(conversion.report.images_inlined, 2);
    assert!(!conversion.fragment.as_str().contains("Letter_files"));
}

#[test]
fn test_line_height_kept_or_added() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Spacing.htm");
    fs::write(
        &path,
        r#"<p style="line-height:115%">Loose</p><h2>Title</h2><table><tr><td>Cell</td></tr></table>"#,
    )
    .unwrap();

    let config = PipelineConfig::default().with_line_height("1.4");
    let html = convert_html(&path, &config).unwrap().fragment.into_string();

    assert!(html.contains(r#"<p style="line-height: 115%;">Loose</p>"#));
    assert!(html.contains(r#"<h2 style="line-height: 1.4;">Title</h2>"#));
    assert!(html.contains("<td>Cell</td>"));
}

#[test]
fn test_blank_document_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Blank.htm");
    fs::write(
        &path,
        r#"<meta name=Generator content="Microsoft Word 15"><div class=WordSection1><p class=MsoNormal><o:p>&nbsp;</o:p></p></div>"#,
    )
    .unwrap();

    let err = convert_html(&path, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, Error::EmptyFragment { .. }));
    assert_eq!(err.stage(), Stage::Assemble);
}

#[test]
fn test_missing_file_is_io_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = convert_html(&tmp.path().join("Nope.htm"), &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Io { stage: Stage::Normalize, .. }));
}
