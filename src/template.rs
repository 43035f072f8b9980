//! Page shell: wraps a body fragment in a fixed-size canvas.
//!
//! The shell is a CSS grid with an optional header row, a flexible content
//! row and an optional footer row. The `#canvas` and `#content` ids are part
//! of the contract with the engine: the capturer clips to `#canvas` and the
//! measurer probes inside `#content`.

use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use url::Url;

use crate::{Canvas, Typography};

const PAGE_TEMPLATE: &str = include_str!("../assets/page.html");

/// Generic section marker used by carousel templates; never shown as a header.
pub const PLACEHOLDER_HEADER: &str = "正文内容";

/// Line clamp used when a section is rendered without pagination
pub const DEFAULT_CLAMP_LINES: u32 = 18;

/// Everything needed to render one page
#[derive(Debug, Clone)]
pub struct PageParams<'a> {
    /// Section title
    pub title: &'a str,
    /// Document title, shown in the footer and used as the last header fallback
    pub doc_title: &'a str,
    /// Body markup, inserted verbatim
    pub body_html: &'a str,
    /// Page number label for the footer
    pub page_no: usize,
    /// Clamp content to this many lines instead of letting it flow
    pub clamp_lines: Option<u32>,
    pub show_footer: bool,
    pub show_header: bool,
    /// Preferred header text; blank falls back to `title`, then `doc_title`
    pub header_override: Option<&'a str>,
    pub canvas: &'a Canvas,
    pub typography: &'a Typography,
}

impl PageParams<'_> {
    /// Header text after fallbacks and placeholder suppression (empty = no header row)
    pub fn header_text(&self) -> String {
        if !self.show_header {
            return String::new();
        }
        let preferred = self.header_override.unwrap_or("").trim();
        let preferred = if preferred.is_empty() { self.title.trim() } else { preferred };
        let text = if preferred.is_empty() { self.doc_title.trim() } else { preferred };
        if text == PLACEHOLDER_HEADER {
            return String::new();
        }
        text.to_string()
    }
}

/// Render a complete HTML document for one canvas
pub fn render(params: &PageParams<'_>) -> String {
    let header_text = params.header_text();
    let canvas = params.canvas;
    let typo = params.typography;

    let mut grid_rows = Vec::with_capacity(3);
    if !header_text.is_empty() {
        grid_rows.push("auto");
    }
    grid_rows.push("1fr");
    if params.show_footer {
        grid_rows.push("auto");
    }

    let content_display = match params.clamp_lines {
        Some(lines) => format!(
            "display: -webkit-box; -webkit-box-orient: vertical; -webkit-line-clamp: {}; text-overflow: ellipsis;",
            lines
        ),
        None => "display: block;".to_string(),
    };

    let header_html = if header_text.is_empty() {
        String::new()
    } else {
        format!("<div class=\"header\">{}</div>", escape_html(&header_text))
    };

    let footer_html = if params.show_footer {
        format!(
            "<div class=\"footer\"><span>{}</span><span>{}</span></div>",
            escape_html(params.doc_title),
            params.page_no
        )
    } else {
        String::new()
    };

    let page_title = [params.doc_title.trim(), header_text.as_str()]
        .into_iter()
        .find(|t| !t.is_empty())
        .unwrap_or("XHS");

    fill(
        PAGE_TEMPLATE,
        &[
            ("WIDTH", canvas.width.to_string()),
            ("HEIGHT", canvas.height.to_string()),
            ("PADDING", canvas.padding.to_string()),
            ("GAP", canvas.gap.to_string()),
            ("CONTENT_FONT", typo.content_font_px.to_string()),
            ("TITLE_SCALE", typo.title_scale.to_string()),
            ("TITLE_GAP", typo.title_gap_px.to_string()),
            ("LINE_HEIGHT", typo.line_height.to_string()),
            ("PARAGRAPH_GAP", typo.paragraph_gap_px.to_string()),
            ("GRID_ROWS", grid_rows.join(" ")),
            ("CONTENT_DISPLAY", content_display),
            ("DOC_TITLE", escape_html(page_title)),
            ("HEADER", header_html),
            ("FOOTER", footer_html),
            ("BODY", params.body_html.to_string()),
        ],
    )
}

// Single-pass `{{NAME}}` substitution; substituted values are never rescanned,
// so body markup containing braces is inserted untouched.
fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = &after[..end];
                match values.iter().find(|(k, _)| *k == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn src_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"src="([^"]+)""#).expect("static regex"))
}

fn passes_through(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("data:")
        || lower.starts_with("file:")
}

/// Rewrite relative `src` attributes to absolute `file://` URIs under `base_dir`.
///
/// Remote, protocol-relative, `data:` and `file:` sources are left alone.
/// `base_dir` must be absolute; otherwise the markup is returned unchanged.
pub fn resolve_local_image_srcs(html: &str, base_dir: &Path) -> String {
    let Ok(base) = Url::from_directory_path(base_dir) else {
        return html.to_string();
    };

    src_attr()
        .replace_all(html, |caps: &Captures<'_>| {
            let src = &caps[1];
            if passes_through(src) {
                return caps[0].to_string();
            }
            match base.join(&src.replace("&amp;", "&")) {
                Ok(url) => format!("src=\"{}\"", escape_html(url.as_str())),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}
