//! # rtfbook
//!
//! HTML to RTF (and back) converter for pages written in a browser rich-text
//! editor and archived as `.rtf` files.
//!
//! ## Example
//!
//! ```no_run
//! use rtfbook::{ConvertOptions, HtmlRtfConverter, UploadDirResolver};
//!
//! let resolver = UploadDirResolver::new("./uploads");
//! let converter = HtmlRtfConverter::new(ConvertOptions::default(), resolver);
//!
//! let rtf = converter.encode("<h2>Title</h2><p>Body text</p>");
//! let html = converter.decode(&rtf);
//! println!("{}", html);
//! ```

pub mod adapters;
pub mod converter;
pub mod core;
pub mod error;
pub mod mapping;
pub mod picture;
pub mod render;

pub use converter::{Conversion, HtmlRtfConverter};
pub use error::{Error, Result};
pub use mapping::HeadingSignature;
pub use picture::{DataUriResolver, ImageFormat, ImageResolver, ImageSource, UploadDirResolver};

/// Options for HTML ⇄ RTF conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Sizing and wrapping of embedded pictures.
    pub image: ImageOptions,
    /// Heading table shared by the encoder and the decoder, `h1` first.
    pub headings: [HeadingSignature; 6],
    /// Paragraph returned when an RTF document has no readable content.
    pub empty_document_message: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            image: ImageOptions::default(),
            headings: mapping::DEFAULT_HEADINGS,
            empty_document_message: "Empty document or unrecognized RTF format".to_string(),
        }
    }
}

/// Options controlling how images are written into `\pict` groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// Maximum display width in pixels; wider images are scaled down.
    pub max_image_width: u32,
    /// Twips per pixel used for `\picwgoal`/`\pichgoal`.
    pub pixel_to_twips: u32,
    /// Hex characters per line of picture payload.
    pub hex_chunk_size: usize,
    /// Width used when the image header cannot be read.
    pub fallback_width: u32,
    /// Height used when the image header cannot be read.
    pub fallback_height: u32,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_image_width: 400,
            pixel_to_twips: 15,
            hex_chunk_size: 128,
            fallback_width: 300,
            fallback_height: 300,
        }
    }
}

/// Converts editor HTML to an RTF document using default options.
///
/// Only inline `data:` images are resolved; use [`HtmlRtfConverter`] with an
/// [`UploadDirResolver`] to embed uploaded files.
pub fn encode(html: &str) -> String {
    HtmlRtfConverter::with_defaults().encode(html)
}

/// Converts an RTF document to HTML using default options.
pub fn decode(rtf: &str) -> String {
    HtmlRtfConverter::with_defaults().decode(rtf)
}

// Python bindings (only when 'python' feature is enabled)
#[cfg(feature = "python")]
mod python_bindings {
    use pyo3::prelude::*;

    /// Converts editor HTML to RTF.
    #[pyfunction]
    fn encode_html(html: String) -> String {
        super::encode(&html)
    }

    /// Converts RTF to HTML.
    #[pyfunction]
    fn decode_rtf(rtf: String) -> String {
        super::decode(&rtf)
    }

    /// A Python module implemented in Rust.
    #[pymodule]
    pub fn rtfbook(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(encode_html, m)?)?;
        m.add_function(wrap_pyfunction!(decode_rtf, m)?)?;
        Ok(())
    }
}
