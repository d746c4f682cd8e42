//! Output of ranked shortlists.
//!
//! - [`file`] - the per-family address files consumed downstream
//! - [`terminal`] - human-readable summary with latencies

mod file;
mod terminal;

pub use file::write_addresses;
pub use terminal::{format_field, format_ranked_rows, print_ranked};
