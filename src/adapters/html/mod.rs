pub mod dom;
mod extractor;

pub use extractor::HtmlExtractor;
