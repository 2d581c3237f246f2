//! Launch-option construction for the headless Chromium scraper. The
//! scraping itself lives elsewhere; this module only answers "which
//! executable, which flags" for the container images we deploy to.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Flags tuned for single-process headless runs inside a container with
/// no sandbox support and a tiny /dev/shm.
pub const CHROMIUM_BASE_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--single-process",
    "--disable-gpu",
    "--disable-web-security",
    "--disable-features=VizDisplayCompositor",
    "--disable-extensions",
    "--disable-plugins",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--disable-blink-features=AutomationControlled",
];

/// Cache roots where a Playwright-managed Chromium may have been unpacked,
/// depending on which user the image runs as.
const PLAYWRIGHT_CACHE_ROOTS: &[&str] = &[
    "/root/.cache/ms-playwright",
    "/home/app/.cache/ms-playwright",
    "/app/.cache/ms-playwright",
];

const CLOUD_RUN_CHROME: &str = "/opt/chrome-linux64/chrome";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LaunchOptions {
    pub headless: bool,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<PathBuf>,
}

/// Build launch options for the scraper. A discovered managed Chromium
/// wins; otherwise `executable_path` stays unset and the driver falls back
/// to whatever it bundles.
pub fn launch_options(headless: bool, extra_args: &[&str]) -> LaunchOptions {
    let mut args: Vec<String> = CHROMIUM_BASE_ARGS.iter().map(|s| s.to_string()).collect();
    args.extend(extra_args.iter().map(|s| s.to_string()));

    let executable_path = discover_chromium();
    match &executable_path {
        Some(path) => info!(path = %path.display(), "using managed Chromium build"),
        None => warn!("no managed Chromium build found; relying on the driver default"),
    }

    LaunchOptions {
        headless,
        args,
        executable_path,
    }
}

pub fn discover_chromium() -> Option<PathBuf> {
    discover_chromium_in(PLAYWRIGHT_CACHE_ROOTS.iter().map(PathBuf::from))
}

/// Scan cache roots for `chromium-*/chrome-linux/chrome`, newest build
/// directory first within each root.
fn discover_chromium_in(roots: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    roots
        .into_iter()
        .flat_map(|root| chromium_dirs(&root))
        .map(|dir| dir.join("chrome-linux").join("chrome"))
        .find(|path| path.is_file())
}

fn chromium_dirs(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("chromium-"))
        })
        .collect();
    // Build directories sort by revision; take the newest first.
    dirs.sort();
    dirs.reverse();
    dirs
}

pub fn is_cloud_run() -> bool {
    Path::new(CLOUD_RUN_CHROME).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fake_chromium(root: &Path, build: &str) -> PathBuf {
        let chrome_dir = root.join(build).join("chrome-linux");
        fs::create_dir_all(&chrome_dir).unwrap();
        let chrome = chrome_dir.join("chrome");
        fs::write(&chrome, b"").unwrap();
        chrome
    }

    #[test]
    fn base_args_include_the_sandbox_and_shm_flags() {
        let opts = launch_options(true, &[]);
        assert!(opts.headless);
        assert!(opts.args.iter().any(|a| a == "--no-sandbox"));
        assert!(opts.args.iter().any(|a| a == "--disable-dev-shm-usage"));
    }

    #[test]
    fn extra_args_are_appended_after_the_base_set() {
        let opts = launch_options(false, &["--lang=es-PE"]);
        assert!(!opts.headless);
        assert_eq!(opts.args.last().map(String::as_str), Some("--lang=es-PE"));
        assert_eq!(opts.args.len(), CHROMIUM_BASE_ARGS.len() + 1);
    }

    #[test]
    fn discovery_finds_a_chromium_under_a_cache_root() {
        let tmp = tempfile::tempdir().unwrap();
        let chrome = fake_chromium(tmp.path(), "chromium-1181");
        let found = discover_chromium_in([tmp.path().to_path_buf()]);
        assert_eq!(found, Some(chrome));
    }

    #[test]
    fn discovery_prefers_the_newest_build_directory() {
        let tmp = tempfile::tempdir().unwrap();
        fake_chromium(tmp.path(), "chromium-1100");
        let newer = fake_chromium(tmp.path(), "chromium-1181");
        let found = discover_chromium_in([tmp.path().to_path_buf()]);
        assert_eq!(found, Some(newer));
    }

    #[test]
    fn discovery_handles_missing_roots() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("does-not-exist");
        assert_eq!(discover_chromium_in([missing]), None);
    }
}
