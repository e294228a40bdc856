mod escape;
mod html;
mod rtf;

use crate::core::ast::DocumentAst;

pub use escape::{escape_html_attr, escape_html_text, escape_rtf_text};
pub use html::HtmlRenderer;
pub use rtf::RtfRenderer;

pub trait Renderer {
    fn render(&self, document: &DocumentAst) -> String;
}
