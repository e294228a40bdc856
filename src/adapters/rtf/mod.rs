pub mod lexer;
mod paragraph;
mod reader;

use crate::adapters::AstExtractor;
use crate::converter::ConversionContext;
use crate::core::ast::DocumentAst;
use reader::RtfReader;

/// Reads an RTF document into a document tree.
///
/// Besides the layout written by this crate, the reader accepts the common
/// variants produced by word processors: `\pn` numbering definitions,
/// literal `1.\tab` or `\bullet\tab` markers, `\'hh` escapes, `\bin`
/// payloads and `\shppict` picture wrappers.
#[derive(Debug, Default, Clone, Copy)]
pub struct RtfExtractor;

impl AstExtractor for RtfExtractor {
    fn extract(&self, input: &str, context: &mut ConversionContext<'_>) -> DocumentAst {
        let mut reader = RtfReader::new(context);
        for token in lexer::tokenize(input) {
            reader.feed(token);
        }
        paragraph::regroup(reader.finish())
    }
}
