mod tag;

pub use tag::{parse_tag_document, parse_tag_document_into, parse_tag_document_with, TagSink};
