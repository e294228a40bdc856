//! Conversion facade tying the extractors and renderers together.

mod context;

use crate::adapters::{AstExtractor, HtmlExtractor, RtfExtractor};
use crate::core::ast::DocumentAst;
use crate::picture::{DataUriResolver, ImageResolver};
use crate::render::{escape_html_text, HtmlRenderer, Renderer, RtfRenderer};
use crate::ConvertOptions;

pub use self::context::ConversionContext;

/// Output of a conversion together with what had to be dropped on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub output: String,
    /// One entry per dropped image or unreadable picture.
    pub diagnostics: Vec<String>,
}

/// Main converter for HTML to RTF and RTF to HTML.
///
/// Conversion never fails: malformed input degrades to the content that
/// could be read.
pub struct HtmlRtfConverter {
    options: ConvertOptions,
    resolver: Box<dyn ImageResolver>,
}

impl HtmlRtfConverter {
    /// Creates a new converter with the given options and image resolver.
    pub fn new(options: ConvertOptions, resolver: impl ImageResolver + 'static) -> Self {
        Self {
            options,
            resolver: Box::new(resolver),
        }
    }

    /// Creates a converter with default options that only embeds data URIs.
    pub fn with_defaults() -> Self {
        Self::new(ConvertOptions::default(), DataUriResolver)
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Converts editor HTML to an RTF document.
    pub fn encode(&self, html: &str) -> String {
        self.encode_with_report(html).output
    }

    /// Converts an RTF document to editor HTML.
    pub fn decode(&self, rtf: &str) -> String {
        self.decode_with_report(rtf).output
    }

    pub fn encode_with_report(&self, html: &str) -> Conversion {
        let mut context = ConversionContext::new(&self.options, self.resolver.as_ref());
        let document = HtmlExtractor.extract(html, &mut context);
        log::debug!("Encoding {} blocks to RTF", document.blocks.len());

        let output = RtfRenderer::new(&self.options).render(&document);
        Self::finish(output, context)
    }

    pub fn decode_with_report(&self, rtf: &str) -> Conversion {
        let mut context = ConversionContext::new(&self.options, self.resolver.as_ref());
        let document = RtfExtractor.extract(rtf, &mut context);
        log::debug!("Decoded {} blocks from RTF", document.blocks.len());

        let output = if document.blocks.is_empty() {
            self.empty_document()
        } else {
            HtmlRenderer.render(&document)
        };
        Self::finish(output, context)
    }

    /// Parses HTML into the shared document tree without rendering it.
    pub fn read_html(&self, html: &str) -> DocumentAst {
        let mut context = ConversionContext::new(&self.options, self.resolver.as_ref());
        HtmlExtractor.extract(html, &mut context)
    }

    /// Parses RTF into the shared document tree without rendering it.
    pub fn read_rtf(&self, rtf: &str) -> DocumentAst {
        let mut context = ConversionContext::new(&self.options, self.resolver.as_ref());
        RtfExtractor.extract(rtf, &mut context)
    }

    fn empty_document(&self) -> String {
        format!(
            "<p>{}</p>",
            escape_html_text(&self.options.empty_document_message)
        )
    }

    fn finish(output: String, mut context: ConversionContext<'_>) -> Conversion {
        let diagnostics = context.take_diagnostics();
        if !diagnostics.is_empty() {
            log::warn!("Conversion dropped {} item(s)", diagnostics.len());
        }
        Conversion {
            output,
            diagnostics,
        }
    }
}

impl Default for HtmlRtfConverter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_rtf_yields_placeholder() {
        let converter = HtmlRtfConverter::with_defaults();
        assert_eq!(
            converter.decode(""),
            "<p>Empty document or unrecognized RTF format</p>"
        );
        assert_eq!(
            converter.decode("{\\rtf1\\ansi{\\fonttbl{\\f0 Calibri;}}}"),
            "<p>Empty document or unrecognized RTF format</p>"
        );
    }

    #[test]
    fn test_encode_wraps_document() {
        let converter = HtmlRtfConverter::with_defaults();
        let rtf = converter.encode("");
        assert!(rtf.starts_with("{\\rtf1\\ansi"));
        assert!(rtf.ends_with('}'));
    }

    #[test]
    fn test_report_lists_dropped_images() {
        let converter = HtmlRtfConverter::with_defaults();
        let report = converter.encode_with_report("<p>x<img src=\"missing.png\"></p>");
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.output.contains("x\\par"));
    }
}
