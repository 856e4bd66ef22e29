//! Pipeline configuration.
//!
//! ```
//! use office_fragment::PipelineConfig;
//!
//! let config = PipelineConfig::default()
//!     .with_max_width(1200)
//!     .with_line_height("1.15")
//!     .with_font_remap("verdana", "Verdana, Geneva, sans-serif");
//!
//! assert!(config.container_style().contains("min(100%, 1200px)"));
//! ```

use crate::resolve::DEFAULT_ASSET_DIR_SUFFIXES;

/// Replace any `font-family` mentioning `family` with `stack`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize, serde::Serialize))]
pub struct FontRemap {
    /// Lowercase family name matched as a substring.
    pub family: String,
    /// Full replacement `font-family` value.
    pub stack: String,
}

impl FontRemap {
    pub fn new(family: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            family: family.into().to_lowercase(),
            stack: stack.into(),
        }
    }
}

/// Tunables for one conversion.
///
/// With the `cli` feature the struct deserializes from JSON; missing fields
/// keep their defaults.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct PipelineConfig {
    /// Upper bound of the container width in pixels.
    pub max_width_px: u32,
    /// Class put on the styling container.
    pub container_class: String,
    /// Value of the baseline `line-height` added to text elements.
    pub line_height: String,
    /// Pixels per point.
    pub pt_to_px_ratio: f64,
    /// Property-name prefixes that mark vendor declarations.
    pub vendor_prefixes: Vec<String>,
    /// Font remaps, first match wins.
    pub font_map: Vec<FontRemap>,
    /// Companion folder suffixes tried after the document stem.
    pub asset_dir_suffixes: Vec<String>,
    /// Drop `Mso*` classes from `class` attributes.
    pub strip_vendor_classes: bool,
    /// Run the stylesheet sanitizer over style blocks taken from the source.
    pub sanitize_extracted_styles: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_width_px: 900,
            container_class: "wp-office-fixed".to_string(),
            line_height: "1".to_string(),
            pt_to_px_ratio: 1.3333,
            vendor_prefixes: vec!["mso-".to_string(), "-ms-".to_string()],
            font_map: vec![
                FontRemap::new("calibri", "Calibri, 'Segoe UI', Arial, Helvetica, sans-serif"),
                FontRemap::new("cambria", "Cambria, 'Times New Roman', Times, serif"),
                FontRemap::new("times new roman", "'Times New Roman', Times, serif"),
                FontRemap::new("arial", "Arial, Helvetica, sans-serif"),
            ],
            asset_dir_suffixes: DEFAULT_ASSET_DIR_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            strip_vendor_classes: true,
            sanitize_extracted_styles: true,
        }
    }
}

impl PipelineConfig {
    pub fn with_max_width(mut self, px: u32) -> Self {
        self.max_width_px = px;
        self
    }

    pub fn with_container_class(mut self, class: impl Into<String>) -> Self {
        self.container_class = class.into();
        self
    }

    pub fn with_line_height(mut self, value: impl Into<String>) -> Self {
        self.line_height = value.into();
        self
    }

    /// Add a remap ahead of the built-in ones.
    pub fn with_font_remap(mut self, family: impl Into<String>, stack: impl Into<String>) -> Self {
        self.font_map.insert(0, FontRemap::new(family, stack));
        self
    }

    pub fn with_strip_vendor_classes(mut self, strip: bool) -> Self {
        self.strip_vendor_classes = strip;
        self
    }

    /// Inline style of the container wrapping the fragment.
    pub fn container_style(&self) -> String {
        format!(
            "margin:0 !important;padding:0;width:min(100%, {}px);background:transparent;overflow:visible;",
            self.max_width_px
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_width_px, 900);
        assert_eq!(config.line_height, "1");
        assert_eq!(config.font_map[0].family, "calibri");
        assert_eq!(config.asset_dir_suffixes[0], "_files");
        assert_eq!(
            config.container_style(),
            "margin:0 !important;padding:0;width:min(100%, 900px);background:transparent;overflow:visible;"
        );
    }

    #[test]
    fn test_custom_remap_takes_precedence() {
        let config = PipelineConfig::default()
            .with_font_remap("Arial Narrow", "'Arial Narrow', sans-serif");
        assert_eq!(
            config.font_map[0],
            FontRemap::new("arial narrow", "'Arial Narrow', sans-serif")
        );
        assert_eq!(config.font_map.len(), 5);
    }
}
