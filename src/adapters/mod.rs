pub mod html;
pub mod rtf;

use crate::converter::ConversionContext;
use crate::core::ast::DocumentAst;

/// Builds the shared document tree from one source format.
///
/// Extraction never fails: content that cannot be read is dropped and
/// recorded on the context instead.
pub trait AstExtractor {
    fn extract(&self, input: &str, context: &mut ConversionContext<'_>) -> DocumentAst;
}

pub use html::HtmlExtractor;
pub use rtf::RtfExtractor;
