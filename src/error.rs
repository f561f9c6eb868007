//! Error types for EPUB repair operations.

use thiserror::Error;

/// Errors that can occur while repairing an EPUB.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("fetching {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetching {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("image URL has no usable file name: {0}")]
    InvalidUrl(String),

    #[error("no media type known for `{0}`")]
    UnsupportedMediaType(String),
}

pub type Result<T> = std::result::Result<T, Error>;
