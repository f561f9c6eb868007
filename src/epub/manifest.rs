use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, info};

use crate::error::{Error, Result};

const OPF_NAME: &str = "content.opf";

/// Register newly localized images in `<root>/content.opf`.
///
/// Manifest ids follow the `id<integer>` pattern used by the conversion
/// pipelines that produce these digests. Each image gets a fresh `<item>`
/// whose id is strictly above the highest existing numeric suffix (ids that
/// don't match the pattern contribute nothing), an href relative to the
/// package root, and a media type derived from its file extension. Existing
/// items are never altered or removed; the document is re-serialized with
/// indentation.
pub fn register_images(root: &Path, saved: &[PathBuf]) -> Result<()> {
    let opf_path = root.join(OPF_NAME);
    let content = fs::read_to_string(&opf_path)
        .map_err(|e| Error::InvalidEpub(format!("cannot read {}: {e}", opf_path.display())))?;

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut max_id: u64 = 0;
    let mut appended = 0usize;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e)
                if local_name(e.name().as_ref()) == b"item" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"id"
                        && let Some(n) = numeric_suffix(&attr.value)
                    {
                        max_id = max_id.max(n);
                    }
                }
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"manifest" => {
                for image in saved {
                    let href = package_href(root, image)?;
                    let media_type = media_type_for(&href)?;
                    max_id += 1;
                    let id = format!("id{max_id}");

                    let mut item = BytesStart::new("item");
                    item.push_attribute(("id", id.as_str()));
                    item.push_attribute(("href", href.as_str()));
                    item.push_attribute(("media-type", media_type));
                    writer.write_event(Event::Empty(item))?;

                    debug!(id = %id, href = %href, media_type, "manifest item appended");
                    appended += 1;
                }
            }
            _ => {}
        }
        writer.write_event(event)?;
    }

    if appended != saved.len() {
        return Err(Error::InvalidEpub(
            "no <manifest> element in content.opf".into(),
        ));
    }

    fs::write(&opf_path, writer.into_inner())?;
    info!(items = appended, "manifest updated");
    Ok(())
}

/// Media type for an image href, looked up from its file extension.
///
/// The table is deliberately small: these are the only formats the source
/// periodicals embed. Anything else must fail rather than produce a manifest
/// entry with a guessed type.
pub fn media_type_for(href: &str) -> Result<&'static str> {
    let ext = href
        .rsplit_once('.')
        .map(|(_, e)| e)
        .filter(|e| !e.is_empty() && !e.contains('/'));
    match ext {
        Some("png") => Ok("image/png"),
        Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
        _ => Err(Error::UnsupportedMediaType(href.to_string())),
    }
}

/// Path of a saved image relative to the package root, with forward slashes.
fn package_href(root: &Path, image: &Path) -> Result<String> {
    let rel = image.strip_prefix(root).map_err(|_| {
        Error::InvalidEpub(format!(
            "image {} is outside the package root",
            image.display()
        ))
    })?;
    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Numeric suffix of a manifest id following the `id<integer>` pattern.
fn numeric_suffix(id: &[u8]) -> Option<u64> {
    let rest = id.strip_prefix(b"id")?;
    if rest.is_empty() || !rest.iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    std::str::from_utf8(rest).ok()?.parse().ok()
}

/// Extract local name from potentially namespaced XML name
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_suffix() {
        assert_eq!(numeric_suffix(b"id3"), Some(3));
        assert_eq!(numeric_suffix(b"id042"), Some(42));
        assert_eq!(numeric_suffix(b"idX"), None);
        assert_eq!(numeric_suffix(b"id"), None);
        assert_eq!(numeric_suffix(b"cover-image"), None);
        assert_eq!(numeric_suffix(b"id7b"), None);
    }

    #[test]
    fn test_media_type_lookup() {
        assert_eq!(media_type_for("images/a.png").unwrap(), "image/png");
        assert_eq!(media_type_for("images/a.jpg").unwrap(), "image/jpeg");
        assert_eq!(media_type_for("images/a.jpeg").unwrap(), "image/jpeg");
        assert!(matches!(
            media_type_for("images/a.gif"),
            Err(Error::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            media_type_for("images/noext"),
            Err(Error::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"opf:item"), b"item");
        assert_eq!(local_name(b"item"), b"item");
    }
}
