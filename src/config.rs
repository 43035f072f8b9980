//! User preference file.
//!
//! Preferences are simple `key: value` lines. Blank lines, `#` comments and
//! lines without a colon are skipped so the file can double as a Markdown
//! note. Only the keys listed on [`Preferences`] are recognized; anything else
//! is logged and ignored.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::{Canvas, Error, Result, Typography};

/// Relative location of the preference file, searched under the working
/// directory first and then under the home directory.
pub const PREFERENCES_RELATIVE_PATH: &str = ".daqi-skills/xhs-md-screenshot-images/EXTEND.md";

/// Typed overrides read from the preference file.
///
/// Every field is optional; `None` means the built-in default (or the
/// command-line value) applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    pub canvas_width: Option<u32>,
    pub canvas_height: Option<u32>,
    pub show_footer: Option<bool>,
    pub padding: Option<u32>,
    pub gap: Option<u32>,
    pub body_font_px: Option<f64>,
    pub line_height: Option<f64>,
    pub paragraph_gap_px: Option<f64>,
    pub title_scale: Option<f64>,
    pub title_gap_px: Option<f64>,
}

impl Preferences {
    /// Candidate preference files in priority order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(PREFERENCES_RELATIVE_PATH)];
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            paths.push(PathBuf::from(home).join(PREFERENCES_RELATIVE_PATH));
        }
        paths
    }

    /// Load the first preference file that exists, or defaults when none does
    pub fn load() -> Result<Self> {
        Self::load_first(&Self::search_paths())
    }

    /// Load the first existing file out of `paths`
    pub fn load_first(paths: &[PathBuf]) -> Result<Self> {
        for path in paths {
            if path.is_file() {
                debug!("Loading preferences from {}", path.display());
                return Self::from_file(path);
            }
        }
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text)
    }

    /// Parse preference text
    pub fn parse(text: &str) -> Result<Self> {
        let mut prefs = Self::default();

        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, raw)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }

            let line_no = idx + 1;
            match key {
                "canvas_width" => prefs.canvas_width = Some(parse_pixels(key, value, line_no)?),
                "canvas_height" => prefs.canvas_height = Some(parse_pixels(key, value, line_no)?),
                "show_footer" => prefs.show_footer = Some(parse_bool(key, value, line_no)?),
                "padding" => prefs.padding = Some(parse_pixels(key, value, line_no)?),
                "gap" => prefs.gap = Some(parse_pixels(key, value, line_no)?),
                "body_font_px" => prefs.body_font_px = Some(parse_value(key, value, line_no)?),
                "line_height" => prefs.line_height = Some(parse_value(key, value, line_no)?),
                "paragraph_gap_px" => prefs.paragraph_gap_px = Some(parse_value(key, value, line_no)?),
                "title_scale" => prefs.title_scale = Some(parse_value(key, value, line_no)?),
                "title_gap_px" => prefs.title_gap_px = Some(parse_value(key, value, line_no)?),
                other => warn!("Ignoring unknown preference key '{}' on line {}", other, line_no),
            }
        }

        Ok(prefs)
    }

    /// Apply the geometry overrides that have no command-line counterpart
    pub fn apply_to_canvas(&self, canvas: &mut Canvas) {
        if let Some(padding) = self.padding {
            canvas.padding = padding;
        }
        if let Some(gap) = self.gap {
            canvas.gap = gap;
        }
    }

    /// Typography with every override applied on top of the defaults
    pub fn typography(&self) -> Typography {
        let defaults = Typography::default();
        Typography {
            content_font_px: self.body_font_px.unwrap_or(defaults.content_font_px),
            line_height: self.line_height.unwrap_or(defaults.line_height),
            paragraph_gap_px: self.paragraph_gap_px.unwrap_or(defaults.paragraph_gap_px),
            title_scale: self.title_scale.unwrap_or(defaults.title_scale),
            title_gap_px: self.title_gap_px.unwrap_or(defaults.title_gap_px),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, line_no: usize) -> Result<T> {
    value.parse::<T>().map_err(|_| {
        Error::ConfigError(format!(
            "preference '{}' on line {} has invalid value '{}'",
            key, line_no, value
        ))
    })
}

// Pixel sizes also accept integral decimals such as `1080.0`.
fn parse_pixels(key: &str, value: &str, line_no: usize) -> Result<u32> {
    if let Ok(px) = value.parse::<u32>() {
        return Ok(px);
    }
    let float: f64 = parse_value(key, value, line_no)?;
    if float.fract() == 0.0 && float >= 0.0 && float <= f64::from(u32::MAX) {
        Ok(float as u32)
    } else {
        Err(Error::ConfigError(format!(
            "preference '{}' on line {} expects a whole number of pixels, got '{}'",
            key, line_no, value
        )))
    }
}

fn parse_bool(key: &str, value: &str, line_no: usize) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(Error::ConfigError(format!(
            "preference '{}' on line {} expects true or false, got '{}'",
            key, line_no, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys_and_skips_noise() {
        let text = "# Preferences\n\ncanvas_width: 1080\ncanvas_height: 1440\nshow_footer: true\n\
                    some prose without a colon\nline_height: 1.6\ntitle_scale: 2\n";
        let prefs = Preferences::parse(text).unwrap();
        assert_eq!(prefs.canvas_width, Some(1080));
        assert_eq!(prefs.canvas_height, Some(1440));
        assert_eq!(prefs.show_footer, Some(true));
        assert_eq!(prefs.line_height, Some(1.6));
        assert_eq!(prefs.title_scale, Some(2.0));
        assert_eq!(prefs.padding, None);
    }

    #[test]
    fn unknown_keys_and_empty_values_are_ignored() {
        let prefs = Preferences::parse("theme: dark\npadding:\ngap: 12\n").unwrap();
        assert_eq!(prefs.padding, None);
        assert_eq!(prefs.gap, Some(12));
    }

    #[test]
    fn malformed_value_is_an_error() {
        let err = Preferences::parse("canvas_width: wide\n").unwrap_err();
        match err {
            Error::ConfigError(msg) => assert!(msg.contains("canvas_width") && msg.contains("line 1")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(Preferences::parse("show_footer: maybe").is_err());
    }

    #[test]
    fn pixel_sizes_accept_integral_decimals() {
        let prefs = Preferences::parse("canvas_width: 1080.0\npadding: 48.0\n").unwrap();
        assert_eq!(prefs.canvas_width, Some(1080));
        assert_eq!(prefs.padding, Some(48));

        assert!(Preferences::parse("canvas_width: 1080.5").is_err());
        assert!(Preferences::parse("gap: -4").is_err());
    }

    #[test]
    fn typography_falls_back_to_defaults() {
        let prefs = Preferences {
            body_font_px: Some(42.0),
            ..Default::default()
        };
        let t = prefs.typography();
        assert_eq!(t.content_font_px, 42.0);
        assert_eq!(t.line_height, Typography::default().line_height);
    }

    #[test]
    fn first_existing_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.md");
        let first = dir.path().join("first.md");
        let second = dir.path().join("second.md");
        std::fs::write(&first, "gap: 10\n").unwrap();
        std::fs::write(&second, "gap: 20\n").unwrap();

        let prefs = Preferences::load_first(&[missing.clone(), first, second]).unwrap();
        assert_eq!(prefs.gap, Some(10));

        let none = Preferences::load_first(&[missing]).unwrap();
        assert_eq!(none, Preferences::default());
    }

    #[test]
    fn canvas_overrides_only_touch_padding_and_gap() {
        let prefs = Preferences {
            padding: Some(40),
            canvas_width: Some(999),
            ..Default::default()
        };
        let mut canvas = Canvas::default();
        prefs.apply_to_canvas(&mut canvas);
        assert_eq!(canvas.padding, 40);
        assert_eq!(canvas.width, 1440);
    }
}
