mod archive;
mod error;
mod parser;
mod types;

pub use archive::{ArchiveContents, ArchiveEntry, ManifestArchive, read_archive};
pub use error::{ManifestError, ManifestMalformed};
pub use parser::{
    parse_package_index_xml, parse_root_index_xml, parse_root_manifest, parse_secondary_manifest,
};
pub use types::{
    ManifestReference, ManifestRole, MirrorRoot, ParsedManifest, SecondaryEntryPolicy,
};
