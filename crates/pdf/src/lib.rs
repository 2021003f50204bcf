//! PDF parser backend for document text extraction.
//!
//! Text layout in a PDF is positional, so extracted text carries a line
//! break wherever the page wrapped. Callers are expected to normalize it.

pub mod parser;

pub use parser::PdfParser;
