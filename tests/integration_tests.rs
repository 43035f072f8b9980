//! Browser-backed tests. They need a local Chrome/Chromium and are ignored by default.

#![cfg(feature = "cdp")]

use mdcarousel::cdp::CdpEngine;
use mdcarousel::pipeline::{self, RunOptions};
use mdcarousel::{Canvas, Document, Engine};

fn small_options() -> RunOptions {
    RunOptions {
        canvas: Canvas {
            width: 480,
            height: 640,
            padding: 24,
            gap: 12,
            device_scale: 1.0,
        },
        ..Default::default()
    }
}

#[test]
#[ignore] // Requires Chrome to be installed
fn long_document_splits_into_fitting_pages() {
    let dir = tempfile::tempdir().unwrap();
    let mut md = String::from("# Long Post\n\n");
    for i in 0..40 {
        md.push_str(&format!("Line {} of a post that is much longer than one canvas.\n\n", i));
    }
    let path = dir.path().join("long.md");
    std::fs::write(&path, md).unwrap();

    let doc = Document::from_path(&path, None).unwrap();
    let options = small_options();
    let mut engine = CdpEngine::launch(&options.canvas).expect("Failed to launch browser");
    let summary = pipeline::run(&doc, &dir.path().join("out"), &options, &mut engine);
    engine.close().unwrap();
    let summary = summary.expect("run failed");

    assert!(summary.pages.len() > 1, "expected several pages");
    for image in &summary.images {
        let bytes = std::fs::read(image).unwrap();
        assert!(bytes.len() > 100, "PNG data seems too small");
        assert_eq!(&bytes[0..8], b"\x89PNG\r\n\x1a\n");
    }
}

#[test]
#[ignore] // Requires Chrome to be installed
fn data_uri_images_survive_pagination() {
    let dir = tempfile::tempdir().unwrap();
    // 1x1 transparent PNG; data: sources are left untouched by the src rewrite
    let md = "Intro\n\n<p>kept as text</p>\n\n![tall](data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=)\n";
    let path = dir.path().join("img.md");
    std::fs::write(&path, md).unwrap();

    let doc = Document::from_path(&path, None).unwrap();
    let options = small_options();
    let mut engine = CdpEngine::launch(&options.canvas).expect("Failed to launch browser");
    let summary = pipeline::run(&doc, &dir.path().join("out"), &options, &mut engine);
    engine.close().unwrap();
    let summary = summary.expect("run failed");

    assert!(!summary.pages.is_empty());
    assert!(summary.pages.iter().any(|p| p.body_html.contains("<img")));
}
