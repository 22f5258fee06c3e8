use super::archive::{ArchiveEntry, ManifestArchive};
use super::error::{ManifestError, ManifestMalformed};
use super::types::{
    ManifestReference, ManifestRole, MirrorRoot, ParsedManifest, SecondaryEntryPolicy,
};
use roxmltree::{Document, Node, ParsingOptions};
use std::path::Path;

const INDEX_FILE_TAG: &str = "IndexFile";
const INDEX_ATTRIBUTE: &str = "index";
const PACKAGE_TAG: &str = "Package";
const FILE_NAME_TAG: &str = "FileName";
const VAL_ATTRIBUTE: &str = "val";

/// Parses the root manifest archive at `archive_path`.
///
/// `entry_name` must be present in the archive; its absence is fatal. Every
/// `IndexFile` element yields one secondary manifest reference.
pub fn parse_root_manifest(
    archive_path: &Path,
    entry_name: &str,
    mirror: &MirrorRoot,
) -> Result<ParsedManifest, ManifestError> {
    let entry = ManifestArchive::open(archive_path)?
        .read_named(entry_name)?
        .ok_or_else(|| ManifestError::MissingEntry {
            path: archive_path.to_path_buf(),
            entry: entry_name.to_string(),
        })?;

    tracing::info!(
        archive = %archive_path.display(),
        entry = entry_name,
        "Parsing root manifest"
    );
    parse_root_index_xml(&entry.data, &source_name(archive_path, &entry), mirror)
}

/// Parses a secondary manifest archive into package references.
///
/// Archives are expected to hold a single entry; more than one is reported as
/// malformed and `policy` decides which entries are read.
pub fn parse_secondary_manifest(
    archive_path: &Path,
    mirror: &MirrorRoot,
    policy: SecondaryEntryPolicy,
) -> Result<ParsedManifest, ManifestError> {
    let mut archive = ManifestArchive::open(archive_path)?;
    if archive.is_empty() {
        return Err(ManifestError::EmptyArchive {
            path: archive_path.to_path_buf(),
        });
    }

    let mut parsed = ParsedManifest::default();
    if archive.len() > 1 {
        parsed.warn(ManifestMalformed::ExtraEntries {
            source_name: archive_path.display().to_string(),
            count: archive.len(),
        });
    }

    let selected: Vec<ArchiveEntry> = match policy {
        SecondaryEntryPolicy::First => archive.read_first()?.into_iter().collect(),
        SecondaryEntryPolicy::All => archive.read_all()?.entries,
    };

    for entry in &selected {
        tracing::info!(
            archive = %archive_path.display(),
            entry = %entry.name,
            "Parsing packages from secondary manifest"
        );
        parsed.extend(parse_package_index_xml(
            &entry.data,
            &source_name(archive_path, entry),
            mirror,
        )?);
    }

    Ok(parsed)
}

/// Extracts secondary manifest references from a root index document.
pub fn parse_root_index_xml(
    data: &[u8],
    source_name: &str,
    mirror: &MirrorRoot,
) -> Result<ParsedManifest, ManifestError> {
    let text = decode(data, source_name)?;
    let doc = parse_document(text, source_name)?;

    let mut parsed = ParsedManifest::default();
    for node in doc
        .descendants()
        .filter(|n| n.has_tag_name(INDEX_FILE_TAG))
    {
        let Some(index) = node.attribute(INDEX_ATTRIBUTE) else {
            parsed.warn(ManifestMalformed::MissingIndexAttribute {
                source_name: source_name.to_string(),
                line: line_of(&doc, node),
            });
            continue;
        };
        push_reference(
            &mut parsed,
            mirror,
            source_name,
            index,
            ManifestRole::SecondaryManifest,
        );
    }

    Ok(parsed)
}

/// Extracts package references from a secondary index document.
///
/// A `Package` should carry exactly one `FileName` child with a `val`
/// attribute. Other shapes are reported; the first `FileName` is still used
/// when it has a `val`.
pub fn parse_package_index_xml(
    data: &[u8],
    source_name: &str,
    mirror: &MirrorRoot,
) -> Result<ParsedManifest, ManifestError> {
    let text = decode(data, source_name)?;
    let doc = parse_document(text, source_name)?;

    let mut parsed = ParsedManifest::default();
    for package in doc.descendants().filter(|n| n.has_tag_name(PACKAGE_TAG)) {
        let file_names: Vec<Node> = package
            .children()
            .filter(|n| n.has_tag_name(FILE_NAME_TAG))
            .collect();

        if file_names.len() != 1 {
            parsed.warn(ManifestMalformed::FileNameCount {
                source_name: source_name.to_string(),
                line: line_of(&doc, package),
                count: file_names.len(),
            });
        }

        let Some(file_name) = file_names.first() else {
            continue;
        };
        let Some(val) = file_name.attribute(VAL_ATTRIBUTE) else {
            parsed.warn(ManifestMalformed::MissingValAttribute {
                source_name: source_name.to_string(),
                line: line_of(&doc, *file_name),
            });
            continue;
        };
        push_reference(&mut parsed, mirror, source_name, val, ManifestRole::Package);
    }

    Ok(parsed)
}

fn push_reference(
    parsed: &mut ParsedManifest,
    mirror: &MirrorRoot,
    source_name: &str,
    reference: &str,
    role: ManifestRole,
) {
    match mirror.resolve(reference) {
        Ok(url) => parsed.references.push(ManifestReference::new(url, role)),
        Err(e) => parsed.warn(ManifestMalformed::InvalidReference {
            source_name: source_name.to_string(),
            reference: reference.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn source_name(archive_path: &Path, entry: &ArchiveEntry) -> String {
    format!("{}!{}", archive_path.display(), entry.name)
}

fn decode<'a>(data: &'a [u8], source_name: &str) -> Result<&'a str, ManifestError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    std::str::from_utf8(data).map_err(|_| ManifestError::Encoding {
        entry: source_name.to_string(),
    })
}

fn parse_document<'a>(text: &'a str, source_name: &str) -> Result<Document<'a>, ManifestError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options).map_err(|source| ManifestError::Xml {
        entry: source_name.to_string(),
        source,
    })
}

fn line_of(doc: &Document, node: Node) -> u32 {
    doc.text_pos_at(node.range().start).row
}
