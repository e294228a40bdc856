use crate::picture::{preview, ImageBlock, ImageResolver};
use crate::ConvertOptions;

/// Context passed through one conversion for shared state.
pub struct ConversionContext<'a> {
    options: &'a ConvertOptions,
    resolver: &'a dyn ImageResolver,
    diagnostics: Vec<String>,
}

impl<'a> ConversionContext<'a> {
    pub fn new(options: &'a ConvertOptions, resolver: &'a dyn ImageResolver) -> Self {
        Self {
            options,
            resolver,
            diagnostics: Vec::new(),
        }
    }

    pub fn options(&self) -> &'a ConvertOptions {
        self.options
    }

    /// Loads an `<img>` source. A source that cannot be loaded is recorded
    /// and yields `None`.
    pub fn resolve_image(&mut self, src: &str) -> Option<ImageBlock> {
        match self.resolver.resolve(src) {
            Ok(source) => Some(ImageBlock::from_source(source, &self.options.image)),
            Err(e) => {
                log::warn!("Dropping image {}: {e}", preview(src));
                self.record(format!("image dropped ({}): {e}", preview(src)));
                None
            }
        }
    }

    pub fn record(&mut self, message: impl Into<String>) {
        self.diagnostics.push(message.into());
    }

    pub fn take_diagnostics(&mut self) -> Vec<String> {
        std::mem::take(&mut self.diagnostics)
    }
}
