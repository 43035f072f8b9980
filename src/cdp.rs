//! Chrome DevTools Protocol engine (uses the `headless_chrome` crate)
//!
//! One browser process and one tab serve the whole run: every measurement
//! page and every final page is loaded into the same tab in turn.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info, warn};
use serde::Deserialize;
use url::Url;

use crate::error::INSTALL_HINT;
use crate::{BlockNode, Canvas, CaptureOptions, Engine, Error, ImageFormat, Measure, Result};

/// Upper bound on waiting for a page's resources to settle
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);
const SETTLE_POLL: Duration = Duration::from_millis(50);

/// Executable names probed on `PATH` when the default lookup fails
const SYSTEM_BROWSERS: &[&str] = &["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"];

// Binds `content` and `probe`. On first use it empties #content and installs a
// plain block container whose scroll height is the candidate page height.
const PROBE_PRELUDE: &str = r#"
    const content = document.querySelector('#content');
    let probe = document.getElementById('__mdcarousel_probe');
    if (content && !probe) {
        content.innerHTML = '';
        probe = document.createElement('div');
        probe.id = '__mdcarousel_probe';
        probe.style.display = 'block';
        content.appendChild(probe);
    }
"#;

const MACOS_CHROME: &str = "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome";

/// Where to look for a browser executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStrategy {
    /// `CHROME` env var or headless_chrome's default discovery
    Managed,
    /// First known Chrome/Chromium executable found on `PATH`
    SystemChannel,
    /// A fixed install location
    Executable(PathBuf),
}

impl LaunchStrategy {
    /// Strategies in the order they are attempted on this platform
    pub fn defaults() -> Vec<Self> {
        let mut strategies = vec![LaunchStrategy::Managed, LaunchStrategy::SystemChannel];
        if cfg!(target_os = "macos") {
            strategies.push(LaunchStrategy::Executable(PathBuf::from(MACOS_CHROME)));
        }
        strategies
    }

    fn describe(&self) -> String {
        match self {
            LaunchStrategy::Managed => "managed browser".to_string(),
            LaunchStrategy::SystemChannel => "system browser channel".to_string(),
            LaunchStrategy::Executable(path) => format!("executable {}", path.display()),
        }
    }

    fn executable(&self) -> std::result::Result<PathBuf, String> {
        match self {
            LaunchStrategy::Managed => headless_chrome::browser::default_executable(),
            LaunchStrategy::SystemChannel => find_on_path(SYSTEM_BROWSERS)
                .ok_or_else(|| format!("none of {} found on PATH", SYSTEM_BROWSERS.join(", "))),
            LaunchStrategy::Executable(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(format!("{} does not exist", path.display()))
                }
            }
        }
    }
}

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

#[derive(Debug, Deserialize)]
struct BoundingBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// CDP-backed [`Engine`]
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
}

impl CdpEngine {
    /// Launch with the default strategies
    pub fn launch(canvas: &Canvas) -> Result<Self> {
        Self::launch_with(canvas, &LaunchStrategy::defaults())
    }

    /// Try each strategy in order and keep the first browser that starts.
    ///
    /// When no strategy even finds an executable the failure is reported as a
    /// missing dependency; otherwise every attempt is listed in
    /// [`Error::LaunchFailed`].
    pub fn launch_with(canvas: &Canvas, strategies: &[LaunchStrategy]) -> Result<Self> {
        let mut attempts = Vec::new();
        let mut found_any = false;

        for strategy in strategies {
            let path = match strategy.executable() {
                Ok(path) => path,
                Err(e) => {
                    attempts.push(format!("{}: {}", strategy.describe(), e));
                    continue;
                }
            };
            found_any = true;

            match Self::start(canvas, path.clone()) {
                Ok(engine) => {
                    info!("Launched {} ({})", strategy.describe(), path.display());
                    return Ok(engine);
                }
                Err(e) => attempts.push(format!("{} ({}): {}", strategy.describe(), path.display(), e)),
            }
        }

        if !found_any {
            return Err(Error::MissingDependency(format!(
                "no Chrome or Chromium executable found ({}). {}",
                attempts.join("; "),
                INSTALL_HINT
            )));
        }
        Err(Error::LaunchFailed { attempts })
    }

    fn start(canvas: &Canvas, path: PathBuf) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .path(Some(path))
            .window_size(Some((canvas.width, canvas.height)))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser, tab })
    }

    fn eval_value(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| Error::ScriptError(format!("Evaluation failed: {}", e)))?;
        result
            .value
            .ok_or_else(|| Error::ScriptError("No value returned from evaluation".into()))
    }

    fn eval_number(&self, script: &str) -> Result<f64> {
        let value = self.eval_value(script)?;
        value
            .as_f64()
            .ok_or_else(|| Error::ScriptError(format!("Expected a number, got {}", value)))
    }

    /// Poll until the document and every image have finished loading
    fn wait_for_settle(&self) -> Result<()> {
        let script = r#"document.readyState === 'complete' && Array.from(document.images).every(img => img.complete)"#;
        let started = Instant::now();
        loop {
            if self.eval_value(script)?.as_bool() == Some(true) {
                debug!("Page settled in {:?}", started.elapsed());
                return Ok(());
            }
            if started.elapsed() >= SETTLE_TIMEOUT {
                warn!("Page resources still loading after {:?}; continuing", SETTLE_TIMEOUT);
                return Ok(());
            }
            std::thread::sleep(SETTLE_POLL);
        }
    }

    fn clip(&self, options: &CaptureOptions) -> Result<Option<Page::Viewport>> {
        let script = if options.full_page {
            r#"JSON.stringify({ x: 0, y: 0,
                width: document.documentElement.scrollWidth,
                height: document.documentElement.scrollHeight })"#
        } else {
            r#"(function() {
                const canvas = document.querySelector('#canvas');
                if (!canvas) return 'null';
                const r = canvas.getBoundingClientRect();
                return JSON.stringify({ x: r.x, y: r.y, width: r.width, height: r.height });
            })()"#
        };

        let raw = self.eval_value(script)?;
        let text = raw.as_str().unwrap_or("null");
        let bbox: Option<BoundingBox> = serde_json::from_str(text)
            .map_err(|e| Error::ScriptError(format!("Bad bounding box {}: {}", text, e)))?;

        Ok(bbox.map(|b| Page::Viewport {
            x: b.x.floor(),
            y: b.y.floor(),
            width: b.width.floor(),
            height: b.height.floor(),
            scale: options.device_scale,
        }))
    }
}

impl Measure for CdpEngine {
    fn measure(&mut self, nodes: &[BlockNode]) -> Result<f64> {
        let html: String = nodes.iter().map(BlockNode::html).collect();
        let arg = serde_json::to_string(&html).map_err(|e| Error::ScriptError(e.to_string()))?;
        let script = format!(
            "(function(html) {{ {} if (!probe) return -1; probe.innerHTML = html; return probe.scrollHeight; }})({})",
            PROBE_PRELUDE, arg
        );

        let height = self.eval_number(&script)?;
        if height < 0.0 {
            return Err(Error::ScriptError("#content not found on the loaded page".into()));
        }
        Ok(height)
    }
}

impl Engine for CdpEngine {
    fn load_file(&mut self, path: &Path) -> Result<()> {
        let url = Url::from_file_path(path)
            .map_err(|_| Error::LoadError(format!("Not an absolute path: {}", path.display())))?;

        self.tab
            .navigate_to(url.as_str())
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;

        self.wait_for_settle()
    }

    fn available_height(&mut self) -> Result<f64> {
        let script = format!(
            "(function() {{ {} return content ? content.clientHeight : -1; }})()",
            PROBE_PRELUDE
        );
        let height = self.eval_number(&script)?;
        if height < 0.0 {
            return Err(Error::ScriptError("#content not found on the loaded page".into()));
        }
        Ok(height)
    }

    fn capture(&mut self, options: &CaptureOptions) -> Result<Vec<u8>> {
        let clip = self.clip(options)?;
        let (format, quality) = match options.format {
            ImageFormat::Png => (Page::CaptureScreenshotFormatOption::Png, None),
            ImageFormat::Jpeg => (Page::CaptureScreenshotFormatOption::Jpeg, Some(options.quality)),
        };

        self.tab
            .capture_screenshot(format, quality, clip, true)
            .map_err(|e| Error::RenderError(format!("Screenshot failed: {}", e)))
    }

    fn close(self) -> Result<()> {
        // Drop the tab before the browser so the child process is reaped promptly.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategies_start_with_managed() {
        let strategies = LaunchStrategy::defaults();
        assert_eq!(strategies[0], LaunchStrategy::Managed);
        assert_eq!(strategies[1], LaunchStrategy::SystemChannel);
    }

    #[test]
    fn missing_executables_are_a_missing_dependency() {
        let strategies = vec![
            LaunchStrategy::Executable(PathBuf::from("/nonexistent/chrome-a")),
            LaunchStrategy::Executable(PathBuf::from("/nonexistent/chrome-b")),
        ];
        match CdpEngine::launch_with(&Canvas::default(), &strategies) {
            Err(Error::MissingDependency(msg)) => {
                assert!(msg.contains("chrome-a"));
                assert!(msg.contains("chrome-b"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("launch should fail"),
        }
    }

    #[test]
    fn every_failed_launch_is_reported() {
        let not_a_browser = PathBuf::from("/bin/false");
        if !not_a_browser.is_file() {
            return;
        }
        let strategies = vec![
            LaunchStrategy::Executable(not_a_browser.clone()),
            LaunchStrategy::Executable(not_a_browser),
        ];
        match CdpEngine::launch_with(&Canvas::default(), &strategies) {
            Err(err @ Error::LaunchFailed { .. }) => {
                assert_eq!(err.exit_code(), 2);
                let Error::LaunchFailed { attempts } = err else { unreachable!() };
                assert_eq!(attempts.len(), 2);
                assert!(attempts.iter().all(|a| a.contains("/bin/false")));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("launch should fail"),
        }
    }

    #[test]
    fn test_cdp_engine_creation() {
        // This test requires Chrome to be installed, so we skip it in CI
        if std::env::var("CI").is_ok() {
            return;
        }
        let result = CdpEngine::launch(&Canvas::default());
        if let Err(e) = result {
            eprintln!("Skipping CDP engine creation test because Chrome is not available or failed to launch: {}", e);
            return;
        }
        assert!(result.is_ok());
    }
}
