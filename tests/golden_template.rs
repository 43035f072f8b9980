use std::fs;
use std::path::PathBuf;

use mdcarousel::template::{self, PageParams};
use mdcarousel::{Canvas, Typography};
use sha2::{Digest, Sha256};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("tests/goldens/expected");
    p.push(name);
    p
}

fn fixture_page() -> String {
    let canvas = Canvas::default();
    let typography = Typography::default();
    template::render(&PageParams {
        title: "Section",
        doc_title: "Golden Post",
        body_html: "<h1>Golden Post</h1><p>First <strong>bold</strong> paragraph.</p><ul><li>a</li><li>b</li></ul>",
        page_no: 1,
        clamp_lines: None,
        show_footer: true,
        show_header: true,
        header_override: Some("Golden Post"),
        canvas: &canvas,
        typography: &typography,
    })
}

#[test]
fn golden_page_template_matches_fixture() {
    let html = fixture_page();
    assert!(html.starts_with("<!doctype html>"));

    // Content-addressed golden: store the digest rather than the whole page
    let digest = hex::encode(Sha256::digest(html.as_bytes()));

    let expected_path = golden_path("page_template.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all(expected_path.parent().expect("golden dir")).ok();
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    let expected = fs::read_to_string(&expected_path)
        .unwrap_or_else(|e| panic!("missing golden {:?} ({}); run with UPDATE_GOLDENS=1", expected_path, e));
    assert_eq!(digest, expected.trim(), "page template output changed");
}

#[test]
fn rendering_is_deterministic() {
    assert_eq!(fixture_page(), fixture_page());
}
