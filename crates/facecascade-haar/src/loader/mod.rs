//! Cascade definition loader.
//!
//! Cascade files are plain text with paired open/close tags. The loader
//! tokenizes the text, builds a small element tree, and walks it into a
//! [`Cascade`](crate::Cascade). Loading is all-or-nothing: any malformed
//! structure or unparsable number fails the whole cascade.

mod error;
mod params;
mod parser;
mod tokenizer;

pub use error::{CascadeLoadError, CascadeParseError};
pub use params::LoaderParams;
pub use parser::{load_cascade_file, parse_cascade};
