//! Scanning extracted content documents for remotely referenced images.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Result;

/// One remote image reference: the URL and the content document holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    /// Absolute path of the owning document inside the working tree.
    pub html_path: PathBuf,
}

static IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']*)["']"#).unwrap());

const HTML_EXTENSIONS: [&str; 3] = ["html", "htm", "xhtml"];

/// Collect every `<img>` whose `src` is an absolute HTTP(S) URL under `root`.
///
/// Purely read-only; no file is modified. Results come in file-enumeration
/// order, then in-document order. The `http` prefix check is deliberately
/// broad and case-sensitive, so it matches `https` as well. A document with
/// no matches contributes nothing.
pub fn scan_remote_images(root: &Path) -> Result<Vec<ImageRef>> {
    let mut refs = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !has_html_extension(path) {
            continue;
        }

        let bytes = fs::read(path)?;
        let Ok(content) = String::from_utf8(bytes) else {
            warn!(file = %path.display(), "skipping non-UTF-8 content document");
            continue;
        };

        let before = refs.len();
        for cap in IMG_SRC.captures_iter(&content) {
            let src = &cap[1];
            if src.starts_with("http") {
                refs.push(ImageRef {
                    url: src.to_string(),
                    html_path: path.to_path_buf(),
                });
            }
        }
        debug!(file = %path.display(), matches = refs.len() - before, "document scanned");
    }

    Ok(refs)
}

fn has_html_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| HTML_EXTENSIONS.iter().any(|x| ext.eq_ignore_ascii_case(x)))
}
