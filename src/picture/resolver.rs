//! Image resolution - turns an `<img src>` reference into raw bytes.

use super::{parse_data_uri, preview, ImageFormat, ImageSource};
use crate::{error::Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Strategy for locating the bytes behind an image reference.
///
/// Returning an error tells the encoder to drop the image; the error text
/// ends up in the conversion diagnostics.
pub trait ImageResolver: Send + Sync {
    fn resolve(&self, src: &str) -> Result<ImageSource>;
}

/// Resolves inline `data:image/...;base64,` payloads only.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUriResolver;

impl ImageResolver for DataUriResolver {
    fn resolve(&self, src: &str) -> Result<ImageSource> {
        if src.trim_start().starts_with("data:") {
            parse_data_uri(src)
        } else {
            Err(Error::ImageNotFound(preview(src)))
        }
    }
}

/// Resolves data URIs and files previously uploaded to a directory.
///
/// A reference is looked up in the directory when it starts with the
/// upload URL prefix or is a plain relative name. Only the final path
/// component is used, so references cannot escape the directory.
#[derive(Debug, Clone)]
pub struct UploadDirResolver {
    dir: PathBuf,
    url_prefix: String,
}

impl UploadDirResolver {
    pub const DEFAULT_URL_PREFIX: &'static str = "http://localhost:3001/uploads/";

    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            url_prefix: Self::DEFAULT_URL_PREFIX.to_string(),
        }
    }

    /// Sets the public URL under which the uploads directory is served.
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn upload_name<'s>(&self, src: &'s str) -> Option<&'s str> {
        let name = match src.strip_prefix(self.url_prefix.as_str()) {
            Some(rest) => rest,
            None if src.contains("://") => return None,
            None => src,
        };
        // Drop query strings and fragments the editor may append.
        let name = name.split(['?', '#']).next().unwrap_or(name);
        Path::new(name).file_name().and_then(|n| n.to_str())
    }
}

impl ImageResolver for UploadDirResolver {
    fn resolve(&self, src: &str) -> Result<ImageSource> {
        let src = src.trim();
        if src.starts_with("data:") {
            return parse_data_uri(src);
        }

        let name = self
            .upload_name(src)
            .ok_or_else(|| Error::ImageNotFound(preview(src)))?;
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let format = ImageFormat::from_extension(ext)
            .ok_or_else(|| Error::UnsupportedImageFormat(name.to_string()))?;

        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(Error::ImageNotFound(path.display().to_string()));
        }
        let data = fs::read(&path)?;
        log::debug!("Resolved uploaded image {}", path.display());

        Ok(ImageSource { data, format })
    }
}
