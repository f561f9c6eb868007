//! Localizing remote images: download, save, rewrite the owning document.

use std::fs;
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use tracing::info;

use crate::error::{Error, Result};
use crate::fetch::ImageFetcher;
use crate::scan::ImageRef;

/// Download every referenced image into the working tree and rewrite each
/// owning document to point at the local copy.
///
/// Images land in an `images/` directory next to the owning document when
/// one already exists, otherwise in `images/` directly under the extraction
/// root (created if absent). The first textual occurrence of the URL in the
/// owning document is replaced with the relative path of the saved file. Two
/// distinct URLs sharing a basename overwrite each other; that is accepted
/// behavior for these digests, not handled specially.
///
/// Returns the saved image paths in processing order. Nothing is rolled back
/// on failure; the caller discards the working tree on any abort.
pub fn localize_images(
    refs: &[ImageRef],
    root: &Path,
    fetcher: &dyn ImageFetcher,
) -> Result<Vec<PathBuf>> {
    let mut saved = Vec::with_capacity(refs.len());

    for image_ref in refs {
        let data = fetcher.fetch(&image_ref.url)?;

        let html_dir = image_ref.html_path.parent().unwrap_or(root);
        let mut images_dir = html_dir.join("images");
        if !images_dir.is_dir() {
            images_dir = root.join("images");
            fs::create_dir_all(&images_dir)?;
        }

        let name = url_basename(&image_ref.url)?;
        let image_path = images_dir.join(&name);
        fs::write(&image_path, &data)?;

        let relative = relative_to(&image_path, html_dir);
        let content = fs::read_to_string(&image_ref.html_path)?;
        fs::write(
            &image_ref.html_path,
            content.replacen(&image_ref.url, &relative, 1),
        )?;

        info!(url = %image_ref.url, saved = %image_path.display(), "image localized");
        saved.push(image_path);
    }

    Ok(saved)
}

/// Final path segment of a URL, query and fragment stripped, percent-decoded.
fn url_basename(url: &str) -> Result<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or("");
    let name = percent_decode_str(segment).decode_utf8_lossy();
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidUrl(url.to_string()));
    }
    Ok(name.into_owned())
}

/// Path of `target` relative to `dir`, with forward slashes, suitable for a
/// `src` attribute inside a content document.
fn relative_to(target: &Path, dir: &Path) -> String {
    let target_parts: Vec<Component> = target.components().collect();
    let dir_parts: Vec<Component> = dir.components().collect();

    let common = target_parts
        .iter()
        .zip(dir_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..dir_parts.len() {
        segments.push("..".to_string());
    }
    for part in &target_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_basename() {
        assert_eq!(url_basename("http://x.test/a.png").unwrap(), "a.png");
        assert_eq!(
            url_basename("https://x.test/img/b.jpg?w=600&q=80").unwrap(),
            "b.jpg"
        );
        assert_eq!(url_basename("http://x.test/c.png#frag").unwrap(), "c.png");
        assert_eq!(
            url_basename("http://x.test/with%20space.jpeg").unwrap(),
            "with space.jpeg"
        );
        assert!(url_basename("http://x.test/").is_err());
    }

    #[test]
    fn test_relative_to_sibling_images() {
        let rel = relative_to(
            Path::new("/work/feed_1/article_2/images/a.png"),
            Path::new("/work/feed_1/article_2"),
        );
        assert_eq!(rel, "images/a.png");
    }

    #[test]
    fn test_relative_to_root_fallback() {
        let rel = relative_to(
            Path::new("/work/images/a.png"),
            Path::new("/work/feed_1/article_2"),
        );
        assert_eq!(rel, "../../images/a.png");
    }
}
