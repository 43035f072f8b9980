//! mdcarousel
//!
//! Turns a Markdown document into a sequence of fixed-size images suitable for
//! a social-media carousel post. The document is rendered to styled HTML,
//! paginated by measuring real rendered heights inside a browser, and each
//! page is captured as a screenshot.
//!
//! # Features
//!
//! - **CDP Backend** (default): measures and captures through headless Chrome
//! - **Atomic pagination**: top-level blocks are never split across pages
//! - **Pluggable engines**: the pipeline only talks to the [`Engine`] trait
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "cdp")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mdcarousel::{cdp::CdpEngine, pipeline, Document, Engine, RunOptions};
//!
//! let document = Document::from_path("post.md".as_ref(), None)?;
//! let options = RunOptions::default();
//! let mut engine = CdpEngine::launch(&options.canvas)?;
//! let summary = pipeline::run(&document, "out".as_ref(), &options, &mut engine);
//! engine.close()?;
//! println!("{} pages", summary?.images.len());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "cdp"))]
//! # fn main() {}
//! ```

use std::path::Path;

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub mod document;
pub mod markdown;
pub mod paginate;
pub mod pipeline;
pub mod template;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use config::Preferences;
pub use document::{Document, PageSpec, RenderedSection};
pub use paginate::{BlockNode, Chunk, Measure, Paginator};
pub use pipeline::{PageCounter, RunOptions, RunSummary};

/// Default canvas width in CSS pixels (3:5 portrait with the default height)
pub const DEFAULT_CANVAS_WIDTH: u32 = 1440;
/// Default canvas height in CSS pixels
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1920;
/// Default canvas padding in pixels
pub const DEFAULT_PADDING: u32 = 80;
/// Default gap between the header, content and footer rows
pub const DEFAULT_GAP: u32 = 28;

/// Physical canvas geometry.
///
/// The same dimensions are used when measuring content for pagination and
/// when capturing the final image, so a page that fits during measurement
/// fits in the screenshot.
///
/// # Examples
///
/// ```
/// let canvas = mdcarousel::Canvas::default();
/// assert_eq!((canvas.width, canvas.height), (1440, 1920));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    /// Canvas width in CSS pixels
    pub width: u32,
    /// Canvas height in CSS pixels
    pub height: u32,
    /// Padding around the grid in pixels
    pub padding: u32,
    /// Gap between grid rows in pixels
    pub gap: u32,
    /// Device pixel multiplier applied at capture time
    pub device_scale: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            padding: DEFAULT_PADDING,
            gap: DEFAULT_GAP,
            device_scale: 2.0,
        }
    }
}

/// Typography knobs for the page template
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Typography {
    /// Body font size in pixels
    pub content_font_px: f64,
    /// Unitless body line height
    pub line_height: f64,
    /// Space below paragraphs, lists and quotes in pixels
    pub paragraph_gap_px: f64,
    /// Header font size as a multiple of the body font size
    pub title_scale: f64,
    /// Space below the header in pixels
    pub title_gap_px: f64,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            content_font_px: 50.0,
            line_height: 1.9,
            paragraph_gap_px: 40.0,
            title_scale: 2.5,
            title_gap_px: 30.0,
        }
    }
}

/// Output image encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Lossless PNG
    #[default]
    Png,
    /// JPEG with a configurable quality
    Jpeg,
}

impl ImageFormat {
    /// File extension used for captured images
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// How a loaded page is rasterized
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    pub format: ImageFormat,
    /// JPEG quality (0-100); ignored for PNG
    pub quality: u32,
    /// Capture the whole scrollable page instead of the `#canvas` box
    pub full_page: bool,
    /// Device pixel multiplier
    pub device_scale: f64,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: 85,
            full_page: false,
            device_scale: 2.0,
        }
    }
}

/// A layout engine able to load local pages, measure content and capture
/// screenshots.
///
/// The pipeline owns one engine for the whole run and drives it strictly in
/// document order. The measurement half lives in [`Measure`] so the paginator
/// can be exercised without a browser.
pub trait Engine: Measure {
    /// Load a local HTML file and wait until its resources have settled
    fn load_file(&mut self, path: &Path) -> Result<()>;

    /// Height available to `#content` on the currently loaded page
    fn available_height(&mut self) -> Result<f64>;

    /// Rasterize the currently loaded page
    fn capture(&mut self, options: &CaptureOptions) -> Result<Vec<u8>>;

    /// Close the engine and release the browser process
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_canvas() {
        let canvas = Canvas::default();
        assert_eq!(canvas.width, 1440);
        assert_eq!(canvas.height, 1920);
        assert_eq!(canvas.device_scale, 2.0);
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(ImageFormat::Png.extension(), "png");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }
}
