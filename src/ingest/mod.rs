//! Document ingestion: reading source documents for graph loading.

pub mod reader;

pub use reader::{is_loadable, read_document, SUPPORTED_FORMATS};
