pub mod archive;

pub use archive::{is_archive_path, is_valid_archive};
