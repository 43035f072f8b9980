//! mdcarousel CLI - Markdown to carousel images

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use log::{error, LevelFilter};

use mdcarousel::cdp::CdpEngine;
use mdcarousel::error::INSTALL_HINT;
use mdcarousel::{pipeline, Canvas, Document, Engine, Error, ImageFormat, Preferences, Result, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "mdcarousel")]
#[command(version)]
#[command(about = "Render Markdown to HTML pages and screenshot them as carousel images", long_about = None)]
struct Cli {
    /// Markdown source file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output directory
    #[arg(long, value_name = "DIR", default_value = "xhs-md-images")]
    out: PathBuf,

    /// Override the document title
    #[arg(long, default_value = "")]
    title: String,

    /// Canvas width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Device pixel multiplier for captured images
    #[arg(long, default_value_t = 2.0, value_parser = parse_device_scale)]
    device_scale: f64,

    /// Image format
    #[arg(long, value_enum, default_value = "png")]
    format: Format,

    /// JPEG quality
    #[arg(long, default_value_t = 85, value_parser = clap::value_parser!(u32).range(0..=100))]
    quality: u32,

    /// Capture the full page height instead of the fixed canvas (disables pagination)
    #[arg(long)]
    full_page: bool,

    /// Render the footer with document title and page number
    #[arg(long)]
    show_footer: bool,

    /// Split content across pages by measured height (default)
    #[arg(long, conflicts_with = "no_paginate")]
    paginate: bool,

    /// Clamp content to a single page instead of paginating
    #[arg(long)]
    no_paginate: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_device_scale(s: &str) -> std::result::Result<f64, String> {
    let scale: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(format!("device scale must be greater than 0, got {}", s))
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Png,
    Jpg,
}

impl From<Format> for ImageFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Png => ImageFormat::Png,
            Format::Jpg => ImageFormat::Jpeg,
        }
    }
}

impl Cli {
    /// Merge command-line flags with preferences; explicit flags win
    fn run_options(&self, prefs: &Preferences) -> RunOptions {
        let mut canvas = Canvas {
            device_scale: self.device_scale,
            ..Canvas::default()
        };
        if let Some(width) = self.width.or(prefs.canvas_width) {
            canvas.width = width;
        }
        if let Some(height) = self.height.or(prefs.canvas_height) {
            canvas.height = height;
        }
        prefs.apply_to_canvas(&mut canvas);

        RunOptions {
            canvas,
            typography: prefs.typography(),
            format: self.format.into(),
            quality: self.quality,
            full_page: self.full_page,
            show_footer: self.show_footer || prefs.show_footer.unwrap_or(false),
            paginate: self.paginate || !self.no_paginate,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: &Cli) -> Result<PathBuf> {
    let title = cli.title.trim();
    let title = (!title.is_empty()).then_some(title);
    let document = Document::from_path(&cli.input, title)?;

    let prefs = Preferences::load()?;
    let options = cli.run_options(&prefs);

    let mut engine = CdpEngine::launch(&options.canvas)?;
    let outcome = pipeline::run(&document, &cli.out, &options, &mut engine);
    if let Err(e) = engine.close() {
        error!("Failed to close browser: {}", e);
    }

    Ok(outcome?.out_dir)
}

fn report(err: &Error) {
    eprintln!("{}", err);
    if let Error::LaunchFailed { attempts } = err {
        for attempt in attempts {
            eprintln!("- {}", attempt);
        }
        eprintln!("\n{}", INSTALL_HINT);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(out_dir) => {
            println!("{}", out_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e);
            ExitCode::from(e.exit_code())
        }
    }
}
