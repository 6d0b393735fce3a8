//! HTML Adapter

mod html_document;

pub use html_document::{HtmlDocument, PROCESSED_ATTR};
