//! # epub-replenish
//!
//! Repairs periodical EPUB digests whose article images were referenced as
//! remote HTTP(S) URLs instead of being packaged in the archive, a side
//! effect of certain e-reader conversion pipelines.
//!
//! The pipeline is strictly sequential per input file:
//!
//! 1. Extract the EPUB (a ZIP container) into a working directory.
//! 2. Scan every content document for `<img>` tags with `http`-prefixed
//!    `src` attributes.
//! 3. Download each image, save it next to its article, and rewrite the
//!    document to reference the local copy.
//! 4. Register the new assets in the OPF manifest with fresh ids.
//! 5. Repackage the working directory as an EPUB.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use epub_replenish::{
//!     HttpFetcher, extract_epub, localize_images, pack_epub, register_images,
//!     scan_remote_images,
//! };
//!
//! let work = tempfile::tempdir()?;
//! extract_epub("digest.epub", work.path())?;
//!
//! let refs = scan_remote_images(work.path())?;
//! if !refs.is_empty() {
//!     let saved = localize_images(&refs, work.path(), &HttpFetcher::new())?;
//!     register_images(work.path(), &saved)?;
//!     pack_epub(work.path(), Path::new("digest.fixed.epub"))?;
//! }
//! # Ok::<(), epub_replenish::Error>(())
//! ```

pub mod epub;
pub mod error;
pub mod fetch;
pub mod localize;
pub mod scan;
pub mod workdir;

pub use epub::{extract_epub, pack_epub, pack_epub_to_writer, register_images, timestamped_path};
pub use error::{Error, Result};
pub use fetch::{HttpFetcher, ImageFetcher};
pub use localize::localize_images;
pub use scan::{ImageRef, scan_remote_images};
pub use workdir::WorkDir;
