//! Reading and writing the vocabulary and merges files.
//!
//! - vocabulary file: one `<id>\t<token>` line per entry, ascending IDs
//! - merges file: one `<left> <right>` line per merge, highest priority first
//!
//! Token text is escaped as described in [`escape`].

pub mod escape;
pub mod load;
pub mod save;

pub use escape::{escape_token, unescape_token, Field};
pub use load::TokenizerLoader;
pub use save::TokenizerSaver;
