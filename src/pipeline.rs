//! Orchestration: render sections, paginate them, write pages, capture images.
//!
//! Output layout:
//!
//! ```text
//! <out>/pages/01.html   one HTML file per page
//! <out>/01.png          one image per page
//! ```
//!
//! Pages are numbered by a [`PageCounter`] that the run owns and hands to
//! each section in turn, so numbering stays gapless however many chunks a
//! section produces.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::paginate::{split_blocks, Paginator};
use crate::template::{self, PageParams, DEFAULT_CLAMP_LINES};
use crate::{
    markdown, Canvas, CaptureOptions, Document, Engine, Error, ImageFormat, PageSpec, RenderedSection, Result,
    Typography,
};

/// Subdirectory of the output directory holding page HTML
pub const PAGES_DIR: &str = "pages";

/// Settings for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub canvas: Canvas,
    pub typography: Typography,
    pub format: ImageFormat,
    /// JPEG quality (0-100)
    pub quality: u32,
    /// Capture the full scrollable page; implies no pagination
    pub full_page: bool,
    pub show_footer: bool,
    /// Split sections by measured height (otherwise clamp to a fixed line count)
    pub paginate: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            typography: Typography::default(),
            format: ImageFormat::Png,
            quality: 85,
            full_page: false,
            show_footer: false,
            paginate: true,
        }
    }
}

impl RunOptions {
    /// Whether sections are split by measurement in this run
    pub fn paginates(&self) -> bool {
        self.paginate && !self.full_page
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            format: self.format,
            quality: self.quality,
            full_page: self.full_page,
            device_scale: self.canvas.device_scale,
        }
    }
}

/// Monotonic page numbering across every section of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCounter {
    next: usize,
}

impl Default for PageCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Hand out the next page number
    pub fn allocate(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }

    /// How many numbers have been handed out
    pub fn issued(&self) -> usize {
        self.next - 1
    }
}

/// What a run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Absolute output directory
    pub out_dir: PathBuf,
    pub pages: Vec<PageSpec>,
    /// `pages/NN.html`, in page order
    pub page_files: Vec<PathBuf>,
    /// `NN.<ext>`, in page order
    pub images: Vec<PathBuf>,
}

/// Create `out` and its `pages` subdirectory; returns the absolute path
pub fn prepare_out_dir(out: &Path) -> Result<PathBuf> {
    let pages = out.join(PAGES_DIR);
    std::fs::create_dir_all(&pages).map_err(|e| Error::io(&pages, e))?;
    std::fs::canonicalize(out).map_err(|e| Error::io(out, e))
}

/// Render each logical section of `doc` to HTML
pub fn render_sections(doc: &Document) -> Vec<RenderedSection> {
    doc.sections()
        .into_iter()
        .enumerate()
        .map(|(i, (title, markdown_src))| {
            let body = markdown::render(&markdown_src);
            let title = if title.trim().is_empty() { doc.title.clone() } else { title };
            RenderedSection {
                index: i + 1,
                title,
                body_html: template::resolve_local_image_srcs(&body, doc.base_dir()),
            }
        })
        .collect()
}

fn render_page(
    page: &PageSpec,
    doc: &Document,
    header_override: Option<&str>,
    clamp_lines: Option<u32>,
    options: &RunOptions,
) -> String {
    template::render(&PageParams {
        title: &page.title,
        doc_title: &doc.title,
        body_html: &page.body_html,
        page_no: page.index,
        clamp_lines,
        show_footer: page.show_footer,
        show_header: page.show_header,
        header_override,
        canvas: &options.canvas,
        typography: &options.typography,
    })
}

fn write_page(pages_dir: &Path, page: &PageSpec, html: &str) -> Result<PathBuf> {
    let path = pages_dir.join(format!("{}.html", page.file_stem()));
    std::fs::write(&path, html).map_err(|e| Error::io(&path, e))?;
    info!("Wrote page {}", path.display());
    Ok(path)
}

/// Turn one section into finished pages.
///
/// The section is first written as a single page and, when paginating, loaded
/// into `engine` to measure the content region and split its blocks. The
/// first chunk reuses that page's number and file; later chunks take fresh
/// numbers from `counter`. Only global page 1 carries the header.
pub fn paginate_section<E: Engine>(
    section: &RenderedSection,
    doc: &Document,
    pages_dir: &Path,
    options: &RunOptions,
    engine: &mut E,
    counter: &mut PageCounter,
) -> Result<Vec<(PageSpec, PathBuf)>> {
    let index = counter.allocate();
    let first = PageSpec {
        index,
        title: section.title.clone(),
        show_header: index == 1,
        show_footer: options.show_footer,
        body_html: section.body_html.clone(),
    };
    let header_override = Some(doc.title.as_str());

    if !options.paginates() {
        let html = render_page(&first, doc, header_override, Some(DEFAULT_CLAMP_LINES), options);
        let path = write_page(pages_dir, &first, &html)?;
        return Ok(vec![(first, path)]);
    }

    let html = render_page(&first, doc, header_override, None, options);
    let section_path = write_page(pages_dir, &first, &html)?;

    engine.load_file(&section_path)?;
    let max_height = engine.available_height()?;
    let blocks = split_blocks(&section.body_html);
    debug!(
        "Section {}: {} blocks, {:.1}px available",
        section.index,
        blocks.len(),
        max_height
    );

    let chunks = Paginator::new(max_height).paginate(blocks, engine)?;
    if chunks.is_empty() {
        warn!("Section {} produced no pages; keeping it unsplit", section.index);
        return Ok(vec![(first, section_path)]);
    }

    let mut pages = Vec::with_capacity(chunks.len());
    for (n, chunk) in chunks.iter().enumerate() {
        let page = if n == 0 {
            PageSpec {
                body_html: chunk.to_html(),
                ..first.clone()
            }
        } else {
            PageSpec {
                index: counter.allocate(),
                title: section.title.clone(),
                show_header: false,
                show_footer: options.show_footer,
                body_html: chunk.to_html(),
            }
        };
        let override_text = if n == 0 { header_override } else { None };
        let html = render_page(&page, doc, override_text, None, options);
        let path = write_page(pages_dir, &page, &html)?;
        pages.push((page, path));
    }

    info!("Section {} split into {} pages", section.index, pages.len());
    Ok(pages)
}

/// Load and capture every page in order, writing `NN.<ext>` into `out_dir`
pub fn capture_pages<E: Engine>(
    pages: &[(PageSpec, PathBuf)],
    out_dir: &Path,
    options: &RunOptions,
    engine: &mut E,
) -> Result<Vec<PathBuf>> {
    let capture = options.capture_options();
    let mut images = Vec::with_capacity(pages.len());

    for (page, html_path) in pages {
        engine.load_file(html_path)?;
        let bytes = engine.capture(&capture)?;
        let path = out_dir.join(format!("{}.{}", page.file_stem(), capture.format.extension()));
        std::fs::write(&path, &bytes).map_err(|e| Error::io(&path, e))?;
        info!("Captured {} ({} bytes)", path.display(), bytes.len());
        images.push(path);
    }

    Ok(images)
}

/// Run the whole document through `engine`.
///
/// The engine is borrowed, not consumed: the caller closes it whether or not
/// the run succeeds.
pub fn run<E: Engine>(doc: &Document, out: &Path, options: &RunOptions, engine: &mut E) -> Result<RunSummary> {
    let out_dir = prepare_out_dir(out)?;
    let pages_dir = out_dir.join(PAGES_DIR);

    let mut counter = PageCounter::new();
    let mut pages = Vec::new();
    for section in render_sections(doc) {
        pages.extend(paginate_section(&section, doc, &pages_dir, options, engine, &mut counter)?);
    }

    let images = capture_pages(&pages, &out_dir, options, engine)?;
    let (pages, page_files): (Vec<PageSpec>, Vec<PathBuf>) = pages.into_iter().unzip();

    Ok(RunSummary {
        out_dir,
        pages,
        page_files,
        images,
    })
}
