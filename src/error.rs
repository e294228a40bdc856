//! Error types for rtfbook.

use thiserror::Error;

/// Result type for rtfbook operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting between HTML and RTF.
///
/// The public `encode`/`decode` entry points never return these: they are
/// produced by the individual stages and turned into diagnostics by the
/// converter.
#[derive(Error, Debug)]
pub enum Error {
    /// Error occurred during file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image format other than PNG or JPEG.
    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// `src` attribute that looks like a data URI but cannot be parsed.
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// Hex payload of a picture group could not be decoded.
    #[error("Invalid hex payload: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Base64 payload of a data URI could not be decoded.
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Image header could not be read to find the pixel dimensions.
    #[error("Unreadable image header: {0}")]
    ImageHeader(#[from] image::ImageError),

    /// Picture group is missing its blip type or payload.
    #[error("Malformed picture group: {0}")]
    MalformedPicture(String),

    /// Image reference did not resolve to any bytes.
    #[error("Image not found: {0}")]
    ImageNotFound(String),
}
