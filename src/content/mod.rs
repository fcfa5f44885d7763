//! Rich-text handling for editor-authored HTML fields.

pub mod flatten;

pub use flatten::{flatten_html, Block};
