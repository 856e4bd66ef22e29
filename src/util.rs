//! Text decoding and media type helpers.

use std::borrow::Cow;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Decode bytes to a string, handling the encodings office exports use.
///
/// This function:
/// 1. Honours a byte order mark (UTF-8, UTF-16LE/BE)
/// 2. Tries strict UTF-8
/// 3. If malformed, tries the declared charset (`<meta charset>`, `http-equiv`
///    content type, or `<?xml encoding="..."?>`)
/// 4. Asks chardetng for a byte-pattern guess and uses it when confident
/// 5. Falls back to Windows-1252 (superset of ISO-8859-1), replacing
///    invalid sequences instead of failing
///
/// Returns the decoded text together with the encoding that produced it.
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
///
/// # Examples
///
/// ```
/// use office_fragment::util::decode_text;
///
/// let (text, encoding) = decode_text("Grüße".as_bytes());
/// assert_eq!(text, "Grüße");
/// assert_eq!(encoding.name(), "UTF-8");
///
/// // "Grüße" in Windows-1252
/// let (text, _) = decode_text(b"<meta charset=windows-1252>Gr\xfc\xdfe");
/// assert!(text.ends_with("Grüße"));
/// ```
pub fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (text, encoding);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (Cow::Borrowed(text), encoding_rs::UTF_8);
    }

    if let Some(encoding) = declared_charset(bytes).and_then(|l| Encoding::for_label(l.as_bytes()))
        && encoding != encoding_rs::UTF_8
    {
        let (text, _) = encoding.decode_without_bom_handling(bytes);
        return (text, encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let (guess, confident) = detector.guess_assess(None, true);
    if confident && guess != encoding_rs::UTF_8 {
        let (text, _) = guess.decode_without_bom_handling(bytes);
        return (text, guess);
    }

    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
    (text, encoding_rs::WINDOWS_1252)
}

/// Extract the charset a document declares for itself.
///
/// Only the first 2 KiB are inspected. Recognises `<?xml encoding="..."?>`,
/// `<meta charset="...">` and `<meta http-equiv="Content-Type"
/// content="text/html; charset=...">`.
pub fn declared_charset(bytes: &[u8]) -> Option<String> {
    let check_len = bytes.len().min(2048);
    let prefix = String::from_utf8_lossy(&bytes[..check_len]).to_ascii_lowercase();

    for marker in ["encoding=", "charset="] {
        let mut search = prefix.as_str();
        while let Some(pos) = search.find(marker) {
            let rest = &search[pos + marker.len()..];
            let rest = rest.trim_start_matches(['"', '\'']);
            let label: String = rest
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
                .collect();
            if !label.is_empty() {
                return Some(label);
            }
            search = &search[pos + marker.len()..];
        }
    }
    None
}

// ============================================================================
// Resource Format Detection
// ============================================================================

/// Media formats found next to office HTML exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    Svg,
    WebP,
    Icon,
    Css,
    Woff,
    Woff2,
    Ttf,
    Otf,
    /// Unknown/binary format
    Binary,
}

impl MediaFormat {
    /// Get the MIME type string for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Png => "image/png",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Bmp => "image/bmp",
            MediaFormat::Tiff => "image/tiff",
            MediaFormat::Svg => "image/svg+xml",
            MediaFormat::WebP => "image/webp",
            MediaFormat::Icon => "image/x-icon",
            MediaFormat::Css => "text/css",
            MediaFormat::Woff => "font/woff",
            MediaFormat::Woff2 => "font/woff2",
            MediaFormat::Ttf => "font/ttf",
            MediaFormat::Otf => "font/otf",
            MediaFormat::Binary => "application/octet-stream",
        }
    }
}

/// Detect a resource format from its file extension.
pub fn detect_media_format(path: &Path) -> MediaFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" | "jpe" | "jfif" => MediaFormat::Jpeg,
        "png" | "apng" => MediaFormat::Png,
        "gif" => MediaFormat::Gif,
        "bmp" => MediaFormat::Bmp,
        "tif" | "tiff" => MediaFormat::Tiff,
        "svg" => MediaFormat::Svg,
        "webp" => MediaFormat::WebP,
        "ico" => MediaFormat::Icon,
        "css" => MediaFormat::Css,
        "woff" => MediaFormat::Woff,
        "woff2" => MediaFormat::Woff2,
        "ttf" => MediaFormat::Ttf,
        "otf" => MediaFormat::Otf,
        _ => MediaFormat::Binary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_borrows() {
        let (text, encoding) = decode_text(b"<p>plain</p>");
        assert!(matches!(text, Cow::Borrowed(_)));
        assert_eq!(encoding, encoding_rs::UTF_8);
    }

    #[test]
    fn test_decode_utf8_bom() {
        let (text, encoding) = decode_text(b"\xEF\xBB\xBF<p>x</p>");
        assert_eq!(text, "<p>x</p>");
        assert_eq!(encoding, encoding_rs::UTF_8);
    }

    #[test]
    fn test_decode_utf16le_bom() {
        let bytes = [0xFF, 0xFE, b'<', 0, b'p', 0, b'>', 0];
        let (text, encoding) = decode_text(&bytes);
        assert_eq!(text, "<p>");
        assert_eq!(encoding, encoding_rs::UTF_16LE);
    }

    #[test]
    fn test_decode_declared_charset() {
        let bytes = b"<meta http-equiv=Content-Type content=\"text/html; charset=windows-1252\"><p>\xe6\xf8\xe5</p>";
        let (text, encoding) = decode_text(bytes);
        assert!(text.contains("æøå"));
        assert_eq!(encoding, encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_decode_never_fails() {
        let (text, _) = decode_text(b"\x80\x81 garbage \xfd");
        assert!(!text.is_empty());
    }

    #[test]
    fn test_declared_charset_variants() {
        assert_eq!(
            declared_charset(br#"<?xml version="1.0" encoding="ISO-8859-1"?>"#).as_deref(),
            Some("iso-8859-1")
        );
        assert_eq!(
            declared_charset(b"<meta charset='utf-8'>").as_deref(),
            Some("utf-8")
        );
        assert_eq!(declared_charset(b"<p>no declaration</p>"), None);
    }

    #[test]
    fn test_detect_media_format_by_extension() {
        assert_eq!(detect_media_format(Path::new("image001.JPG")), MediaFormat::Jpeg);
        assert_eq!(detect_media_format(Path::new("a/b/image002.png")), MediaFormat::Png);
        assert_eq!(detect_media_format(Path::new("stylesheet.css")), MediaFormat::Css);
        assert_eq!(detect_media_format(Path::new("image003.emz")), MediaFormat::Binary);
        assert_eq!(detect_media_format(Path::new("noext")), MediaFormat::Binary);
    }

    #[test]
    fn test_media_format_mime_type() {
        assert_eq!(MediaFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(MediaFormat::Svg.mime_type(), "image/svg+xml");
        assert_eq!(MediaFormat::Binary.mime_type(), "application/octet-stream");
    }
}
