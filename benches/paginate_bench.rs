use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mdcarousel::paginate::split_blocks;
use mdcarousel::{markdown, BlockNode, Measure, Paginator, Result};

/// Height grows with the text length of each block, roughly like wrapped lines.
struct TextLengthMeasure;

impl Measure for TextLengthMeasure {
    fn measure(&mut self, nodes: &[BlockNode]) -> Result<f64> {
        Ok(nodes
            .iter()
            .map(|n| 95.0 * (n.html().len() as f64 / 60.0).ceil() + 40.0)
            .sum())
    }
}

fn sample_markdown(paragraphs: usize) -> String {
    let mut md = String::from("# Benchmark\n\n");
    for i in 0..paragraphs {
        md.push_str(&format!(
            "Paragraph {} has **some** emphasis, a [link](https://example.com) and enough words to wrap.\n\n",
            i
        ));
        if i % 7 == 0 {
            md.push_str("- first item\n- second item\n- third item\n\n");
        }
    }
    md
}

fn bench_split_blocks(c: &mut Criterion) {
    let body = markdown::render(&sample_markdown(200));
    c.bench_function("split_blocks_200", |b| b.iter(|| split_blocks(black_box(&body))));
}

fn bench_paginate(c: &mut Criterion) {
    let blocks = split_blocks(&markdown::render(&sample_markdown(200)));
    let paginator = Paginator::new(1600.0);
    c.bench_function("paginate_200", |b| {
        b.iter(|| {
            let chunks = paginator
                .paginate(black_box(blocks.clone()), &mut TextLengthMeasure)
                .unwrap();
            black_box(chunks.len())
        })
    });
}

criterion_group!(benches, bench_split_blocks, bench_paginate);
criterion_main!(benches);
