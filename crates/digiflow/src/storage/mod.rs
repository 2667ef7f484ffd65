//! Process content storage.

pub mod layout;
pub mod transfer;

pub use layout::{StorageLayout, TIFF_HEADER_FILE};
