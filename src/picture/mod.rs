//! Image codec - converts raster images to and from RTF picture groups.

mod resolver;

pub use self::resolver::{DataUriResolver, ImageResolver, UploadDirResolver};

use crate::{error::Error, ImageOptions, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{ImageFormat as RasterFormat, ImageReader};
use regex::Regex;
use std::io::Cursor;
use std::sync::OnceLock;

/// Raster formats that can be embedded in a `\pict` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Format from a file extension, without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    /// Format from the subtype of an `image/*` MIME type.
    pub fn from_mime_subtype(subtype: &str) -> Option<Self> {
        match subtype.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" | "pjpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    /// Format named by an RTF blip control word.
    pub fn from_blip(word: &str) -> Option<Self> {
        match word {
            "pngblip" => Some(ImageFormat::Png),
            "jpegblip" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    pub fn blip(self) -> &'static str {
        match self {
            ImageFormat::Png => "pngblip",
            ImageFormat::Jpeg => "jpegblip",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    fn raster(self) -> RasterFormat {
        match self {
            ImageFormat::Png => RasterFormat::Png,
            ImageFormat::Jpeg => RasterFormat::Jpeg,
        }
    }
}

/// Raw image bytes handed to the encoder by an [`ImageResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

/// An embedded image with its native pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlock {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageBlock {
    /// Builds a block from raw bytes, reading the dimensions from the image
    /// header. An unreadable header falls back to the configured
    /// placeholder size.
    pub fn from_source(source: ImageSource, options: &ImageOptions) -> Self {
        let (width, height) = match probe_dimensions(&source.data, source.format) {
            Ok(dims) => dims,
            Err(e) => {
                log::warn!("Using placeholder image size: {e}");
                (options.fallback_width, options.fallback_height)
            }
        };
        Self {
            data: source.data,
            format: source.format,
            width,
            height,
        }
    }

    /// Pixel size after clamping the width to `max_image_width`.
    pub fn display_size(&self, options: &ImageOptions) -> (u32, u32) {
        if self.width <= options.max_image_width || self.width == 0 {
            return (self.width, self.height);
        }
        let ratio = f64::from(options.max_image_width) / f64::from(self.width);
        let height = (f64::from(self.height) * ratio).round() as u32;
        (options.max_image_width, height)
    }

    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            BASE64.encode(&self.data)
        )
    }
}

/// Reads width and height from a PNG or JPEG header.
pub fn probe_dimensions(data: &[u8], format: ImageFormat) -> Result<(u32, u32)> {
    let reader = ImageReader::with_format(Cursor::new(data), format.raster());
    Ok(reader.into_dimensions()?)
}

/// Serializes an image as an RTF picture group.
///
/// The group carries the native pixel size (`\picw`/`\pich`) and the
/// clamped display size in twips (`\picwgoal`/`\pichgoal`); the hex payload
/// is wrapped at `hex_chunk_size` characters per line.
pub fn encode_picture(image: &ImageBlock, options: &ImageOptions) -> String {
    let (display_width, display_height) = image.display_size(options);
    let width_twips = display_width.saturating_mul(options.pixel_to_twips);
    let height_twips = display_height.saturating_mul(options.pixel_to_twips);

    let hex_data = hex::encode(&image.data);
    let chunk = options.hex_chunk_size.max(1);
    let mut payload = String::with_capacity(hex_data.len() + hex_data.len() / chunk + 1);
    for (i, line) in hex_data.as_bytes().chunks(chunk).enumerate() {
        if i > 0 {
            payload.push('\n');
        }
        // hex::encode only produces ASCII.
        payload.push_str(std::str::from_utf8(line).unwrap_or_default());
    }

    format!(
        "{{\\pict\\{}\\picw{}\\pich{}\\picwgoal{}\\pichgoal{}\n{}}}",
        image.format.blip(),
        image.width,
        image.height,
        width_twips,
        height_twips,
        payload
    )
}

/// Contents of a `{\pict ...}` group collected by the RTF reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PictureGroup {
    /// Blip control word, e.g. `pngblip`.
    pub blip: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub goal_width: Option<i32>,
    pub goal_height: Option<i32>,
    pub hex: String,
}

/// Reconstructs an image from a picture group.
pub fn decode_picture(group: &PictureGroup, options: &ImageOptions) -> Result<ImageBlock> {
    let blip = group
        .blip
        .as_deref()
        .ok_or_else(|| Error::MalformedPicture("missing blip type".to_string()))?;
    let format = ImageFormat::from_blip(blip)
        .ok_or_else(|| Error::UnsupportedImageFormat(blip.to_string()))?;

    let clean: String = group
        .hex
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if clean.is_empty() {
        return Err(Error::MalformedPicture("empty payload".to_string()));
    }
    let data = hex::decode(&clean)?;

    let declared = match (group.width, group.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some((w as u32, h as u32)),
        _ => None,
    };
    let (width, height) = match declared {
        Some(dims) => dims,
        None => probe_dimensions(&data, format)
            .unwrap_or((options.fallback_width, options.fallback_height)),
    };

    Ok(ImageBlock {
        data,
        format,
        width,
        height,
    })
}

/// Parses a `data:image/<fmt>;base64,<payload>` URI.
pub fn parse_data_uri(uri: &str) -> Result<ImageSource> {
    static DATA_URI: OnceLock<Regex> = OnceLock::new();
    let re = DATA_URI.get_or_init(|| {
        Regex::new(r"(?s)^data:image/([A-Za-z0-9.+-]+);base64,(.+)$").expect("valid regex")
    });

    let trimmed = uri.trim();
    let caps = re
        .captures(trimmed)
        .ok_or_else(|| Error::InvalidDataUri(preview(trimmed)))?;
    let subtype = &caps[1];
    let format = ImageFormat::from_mime_subtype(subtype)
        .ok_or_else(|| Error::UnsupportedImageFormat(subtype.to_string()))?;
    let payload: String = caps[2]
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let data = BASE64.decode(payload.as_bytes())?;

    Ok(ImageSource { data, format })
}

/// Shortened form of a long reference for log lines.
pub(crate) fn preview(value: &str) -> String {
    const MAX: usize = 48;
    match value.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, RasterFormat::Png)
            .expect("png encoding should work");
        out.into_inner()
    }

    #[test]
    fn test_probe_reads_png_header() {
        let data = png_bytes(7, 3);
        assert_eq!(probe_dimensions(&data, ImageFormat::Png).unwrap(), (7, 3));
    }

    #[test]
    fn test_unreadable_header_uses_fallback() {
        let source = ImageSource {
            data: vec![1, 2, 3],
            format: ImageFormat::Png,
        };
        let block = ImageBlock::from_source(source, &ImageOptions::default());
        assert_eq!((block.width, block.height), (300, 300));
    }

    #[test]
    fn test_display_size_clamps_width_and_scales_height() {
        let block = ImageBlock {
            data: Vec::new(),
            format: ImageFormat::Png,
            width: 800,
            height: 333,
        };
        assert_eq!(block.display_size(&ImageOptions::default()), (400, 167));
    }

    #[test]
    fn test_encode_picture_wraps_hex_payload() {
        let block = ImageBlock {
            data: vec![0xab; 100],
            format: ImageFormat::Jpeg,
            width: 10,
            height: 20,
        };
        let options = ImageOptions {
            hex_chunk_size: 64,
            ..Default::default()
        };
        let group = encode_picture(&block, &options);
        assert!(group.starts_with("{\\pict\\jpegblip\\picw10\\pich20\\picwgoal150\\pichgoal300\n"));
        assert!(group.ends_with('}'));
        let lines: Vec<&str> = group.trim_end_matches('}').lines().skip(1).collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().take(3).all(|line| line.len() == 64));
    }

    #[test]
    fn test_decode_picture_strips_line_breaks() {
        let group = PictureGroup {
            blip: Some("pngblip".to_string()),
            width: Some(2),
            height: Some(1),
            hex: "89504e\r\n470d0a\n1a0a".to_string(),
            ..Default::default()
        };
        let block = decode_picture(&group, &ImageOptions::default()).unwrap();
        assert_eq!(block.data, vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
        assert!(block.data_uri().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_decode_picture_rejects_bad_hex() {
        let group = PictureGroup {
            blip: Some("pngblip".to_string()),
            hex: "zz".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            decode_picture(&group, &ImageOptions::default()),
            Err(Error::InvalidHex(_))
        ));
    }

    #[test]
    fn test_parse_data_uri() {
        let source = parse_data_uri("data:image/jpg;base64,AAEC").unwrap();
        assert_eq!(source.format, ImageFormat::Jpeg);
        assert_eq!(source.data, vec![0, 1, 2]);

        assert!(matches!(
            parse_data_uri("data:image/gif;base64,AAEC"),
            Err(Error::UnsupportedImageFormat(_))
        ));
        assert!(matches!(
            parse_data_uri("data:text/plain,hello"),
            Err(Error::InvalidDataUri(_))
        ));
    }
}
