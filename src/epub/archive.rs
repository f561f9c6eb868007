use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::Result;

/// Unpack every entry of an EPUB (ZIP container) into `dest`, preserving
/// relative paths.
///
/// Entries that would escape the destination root are rejected by the
/// archive layer, so a hostile archive cannot write outside `dest`.
///
/// # Example
///
/// ```no_run
/// use epub_replenish::extract_epub;
///
/// let work = tempfile::tempdir()?;
/// extract_epub("digest.epub", work.path())?;
/// # Ok::<(), epub_replenish::Error>(())
/// ```
pub fn extract_epub<P: AsRef<Path>>(epub_path: P, dest: &Path) -> Result<()> {
    let epub_path = epub_path.as_ref();
    debug!(file = %epub_path.display(), "extracting archive");

    let file = fs::File::open(epub_path)?;
    let mut archive = ZipArchive::new(file)?;
    let entries = archive.len();
    archive.extract(dest)?;

    debug!(dest = %dest.display(), entries, "extraction complete");
    Ok(())
}

/// Repackage an extraction root as an EPUB at `out_path`.
///
/// The archive is assembled in a temporary sibling file and renamed into
/// place, so any existing file at `out_path` is either fully replaced or
/// left untouched.
pub fn pack_epub(root: &Path, out_path: &Path) -> Result<()> {
    let parent = match out_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::Builder::new()
        .prefix(".epub-replenish.")
        .suffix(".part")
        .tempfile_in(parent)?;

    pack_epub_to_writer(root, tmp.as_file())?;
    tmp.persist(out_path).map_err(|e| e.error)?;

    debug!(file = %out_path.display(), "archive written");
    Ok(())
}

/// Write a ZIP of the extraction root to any [`Write`] + [`Seek`] destination.
///
/// The EPUB container format requires the `mimetype` entry to come first and
/// be uncompressed; when the root carries one, it is written that way and
/// every other entry is deflated.
pub fn pack_epub_to_writer<W: Write + Seek>(root: &Path, writer: W) -> Result<()> {
    let mut zip = ZipWriter::new(writer);

    let options_stored =
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let options_deflate =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mimetype = root.join("mimetype");
    if mimetype.is_file() {
        zip.start_file("mimetype", options_stored)?;
        zip.write_all(&fs::read(&mimetype)?)?;
    }

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let name = zip_entry_name(rel);
        if name == "mimetype" {
            continue;
        }
        zip.start_file(name, options_deflate)?;
        zip.write_all(&fs::read(path)?)?;
    }

    zip.finish()?;
    Ok(())
}

/// Default output path for a repaired copy of `input`: same directory and
/// stem, suffixed with a generation timestamp.
///
/// `weekly.epub` becomes e.g. `weekly.240801_093015.epub`.
pub fn timestamped_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let stamp = Local::now().format("%y%m%d_%H%M%S");
    input.with_file_name(format!("{stem}.{stamp}.epub"))
}

/// ZIP entry names always use forward slashes, whatever the host separator.
fn zip_entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
