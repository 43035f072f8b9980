//! Document model: the source file, rendered sections and per-image pages

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A Markdown source document
#[derive(Debug, Clone)]
pub struct Document {
    /// Display title used in the header, footer and `<title>`
    pub title: String,
    /// Raw Markdown
    pub markdown: String,
    /// Absolute path of the source file; relative images resolve against its directory
    pub source: PathBuf,
}

impl Document {
    /// Read a document from disk.
    ///
    /// The title is `title_override` when non-blank, else the first level-1
    /// heading, else the file stem.
    pub fn from_path(path: &Path, title_override: Option<&str>) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        let source = std::fs::canonicalize(path).map_err(|e| Error::io(path, e))?;
        let markdown = std::fs::read_to_string(&source).map_err(|e| Error::io(&source, e))?;
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(markdown, source, title_override, &stem))
    }

    pub fn new(markdown: String, source: PathBuf, title_override: Option<&str>, fallback: &str) -> Self {
        let title = match title_override.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => extract_title(&markdown).unwrap_or_else(|| fallback.to_string()),
        };
        Self {
            title,
            markdown,
            source,
        }
    }

    /// Directory relative resources are resolved against
    pub fn base_dir(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Split the document into logical sections.
    ///
    /// Currently the whole document is a single section.
    pub fn sections(&self) -> Vec<(String, String)> {
        vec![(self.title.clone(), self.markdown.trim().to_string())]
    }
}

/// Text of the first ATX level-1 heading (`# Title`)
pub fn extract_title(markdown: &str) -> Option<String> {
    markdown.lines().find_map(|line| {
        let rest = line.strip_prefix('#')?;
        if !rest.starts_with(|c: char| c == ' ' || c == '\t') {
            return None;
        }
        let title = rest.trim();
        (!title.is_empty()).then(|| title.to_string())
    })
}

/// One logical section rendered to HTML
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSection {
    /// Dense, 1-based section index
    pub index: usize,
    pub title: String,
    /// Rendered body markup
    pub body_html: String,
}

/// One output image
#[derive(Debug, Clone, PartialEq)]
pub struct PageSpec {
    /// Global page number, 1-based and gapless across the output
    pub index: usize,
    pub title: String,
    pub show_header: bool,
    pub show_footer: bool,
    /// HTML fragment for this canvas
    pub body_html: String,
}

impl PageSpec {
    /// File stem used for the page HTML and image (`01`, `02`, ...)
    pub fn file_stem(&self) -> String {
        format!("{:02}", self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_comes_from_first_h1() {
        let md = "intro\n## Sub\n#NotAHeading\n#  Real Title  \n# Second\n";
        assert_eq!(extract_title(md).as_deref(), Some("Real Title"));
        assert_eq!(extract_title("## only h2\n"), None);
    }

    #[test]
    fn override_beats_heading_and_fallback() {
        let md = "# Heading\nbody".to_string();
        let doc = Document::new(md.clone(), PathBuf::from("/tmp/a.md"), Some("  Custom "), "a");
        assert_eq!(doc.title, "Custom");

        let doc = Document::new(md, PathBuf::from("/tmp/a.md"), Some("   "), "a");
        assert_eq!(doc.title, "Heading");

        let doc = Document::new("no heading".into(), PathBuf::from("/tmp/a.md"), None, "a");
        assert_eq!(doc.title, "a");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Document::from_path(Path::new("/definitely/not/here.md"), None).unwrap_err();
        assert!(matches!(err, Error::InputNotFound(_)));
    }

    #[test]
    fn from_path_uses_stem_and_absolute_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my-post.md");
        std::fs::write(&path, "plain text\n").unwrap();
        let doc = Document::from_path(&path, None).unwrap();
        assert_eq!(doc.title, "my-post");
        assert!(doc.source.is_absolute());
        assert_eq!(doc.sections().len(), 1);
    }

    #[test]
    fn page_file_stem_is_two_digits() {
        let page = PageSpec {
            index: 3,
            title: String::new(),
            show_header: false,
            show_footer: false,
            body_html: String::new(),
        };
        assert_eq!(page.file_stem(), "03");
    }
}
