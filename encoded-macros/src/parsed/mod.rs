mod document;
mod field;

pub(crate) use document::ParsedDocument;
