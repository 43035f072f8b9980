//! Height-driven pagination.
//!
//! The paginator walks the top-level blocks of a rendered body in order and
//! packs them greedily into pages. Whether a candidate page fits is decided by
//! a [`Measure`] implementation, normally a real layout engine, because
//! proportional fonts, mixed scripts, inline formatting and images make any
//! static estimate unreliable.
//!
//! Blocks are atomic. A block that is taller than a page on its own is emitted
//! as a page by itself and marked as oversized; it is never split and never
//! dropped.

use log::{debug, warn};
use scraper::{ElementRef, Html, Node};

use crate::template::escape_html;
use crate::Result;

/// Slack added to the page height to absorb sub-pixel rounding
pub const FIT_EPSILON: f64 = 1.0;

/// An atomic top-level block of rendered markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNode {
    html: String,
}

impl BlockNode {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Serialized markup of the block
    pub fn html(&self) -> &str {
        &self.html
    }

    fn is_blank(&self) -> bool {
        self.html.trim().is_empty()
    }
}

/// Split a body fragment into its top-level blocks.
///
/// Every top-level element becomes one block. Stray top-level text is wrapped
/// in a paragraph; whitespace and comments are dropped.
pub fn split_blocks(body_html: &str) -> Vec<BlockNode> {
    let fragment = Html::parse_fragment(body_html);
    let mut blocks = Vec::new();

    for child in fragment.root_element().children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    blocks.push(BlockNode::new(element.html()));
                }
            }
            Node::Text(text) => {
                let text: &str = text;
                if !text.trim().is_empty() {
                    blocks.push(BlockNode::new(format!("<p>{}</p>", escape_html(text.trim()))));
                }
            }
            _ => {}
        }
    }

    blocks
}

/// Measures the rendered height of a candidate page.
pub trait Measure {
    /// Rendered height in CSS pixels of `nodes` laid out together in the
    /// content region
    fn measure(&mut self, nodes: &[BlockNode]) -> Result<f64>;
}

/// One page worth of blocks
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub nodes: Vec<BlockNode>,
    /// Last measured height of the chunk
    pub height: f64,
    /// A single block that does not fit even on an empty page
    pub oversized: bool,
}

impl Chunk {
    /// Concatenated markup of the chunk's blocks
    pub fn to_html(&self) -> String {
        self.nodes.iter().map(BlockNode::html).collect()
    }

    fn is_blank(&self) -> bool {
        self.nodes.iter().all(BlockNode::is_blank)
    }
}

/// Greedy single-pass paginator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paginator {
    max_height: f64,
    epsilon: f64,
}

impl Paginator {
    /// Paginator for a content region `max_height` pixels tall
    pub fn new(max_height: f64) -> Self {
        Self {
            max_height,
            epsilon: FIT_EPSILON,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn max_height(&self) -> f64 {
        self.max_height
    }

    /// Whether content of `height` pixels fits on one page
    pub fn fits(&self, height: f64) -> bool {
        height <= self.max_height + self.epsilon
    }

    /// Pack `nodes` into pages.
    ///
    /// Concatenating the returned chunks yields `nodes` in their original
    /// order. Every chunk fits except those marked `oversized`, which hold
    /// exactly one block.
    pub fn paginate<M: Measure + ?Sized>(&self, nodes: Vec<BlockNode>, measurer: &mut M) -> Result<Vec<Chunk>> {
        let mut pages: Vec<Chunk> = Vec::new();
        let mut current: Vec<BlockNode> = Vec::new();
        let mut current_height = 0.0;

        for node in nodes {
            current.push(node);
            let height = measurer.measure(&current)?;
            if self.fits(height) {
                current_height = height;
                continue;
            }

            if current.len() == 1 {
                pages.push(self.oversized(std::mem::take(&mut current), height, pages.len()));
                current_height = 0.0;
                continue;
            }

            // Close the page without the overflowing block and retry it alone.
            let overflow = current.split_off(current.len() - 1);
            debug!(
                "Page {} closed with {} blocks at {:.1}px",
                pages.len() + 1,
                current.len(),
                current_height
            );
            pages.push(Chunk {
                nodes: std::mem::replace(&mut current, overflow),
                height: current_height,
                oversized: false,
            });

            let alone = measurer.measure(&current)?;
            if self.fits(alone) {
                current_height = alone;
            } else {
                pages.push(self.oversized(std::mem::take(&mut current), alone, pages.len()));
                current_height = 0.0;
            }
        }

        if !current.is_empty() {
            pages.push(Chunk {
                nodes: current,
                height: current_height,
                oversized: false,
            });
        }

        pages.retain(|chunk| !chunk.is_blank());
        Ok(pages)
    }

    fn oversized(&self, nodes: Vec<BlockNode>, height: f64, emitted: usize) -> Chunk {
        warn!(
            "Block on page {} is {:.1}px tall, exceeding the {:.1}px page; keeping it on its own page",
            emitted + 1,
            height,
            self.max_height
        );
        Chunk {
            nodes,
            height,
            oversized: true,
        }
    }
}
