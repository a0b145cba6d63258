//! File-system and path helpers shared across the crate
//!
//! - [`fs`] - atomic writes, BOM-prefixed solution output and change-aware copies
//! - [`path`] - descriptor path conversion, lexical normalization and
//!   case-insensitive keys

pub mod fs;
pub mod path;

pub use fs::{atomic_write, copy_if_changed, ensure_dir, read_text_file, safe_write, write_with_bom};
pub use path::{absolutize, from_msbuild, normalize, path_key};
