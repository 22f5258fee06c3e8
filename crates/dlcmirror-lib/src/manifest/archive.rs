use super::error::ManifestError;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Entries of a manifest archive in central-directory order.
#[derive(Clone, Debug, Default)]
pub struct ArchiveContents {
    pub entries: Vec<ArchiveEntry>,
}

impl ArchiveContents {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn find(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn first(&self) -> Option<&ArchiveEntry> {
        self.entries.first()
    }
}

/// An opened manifest archive whose file entries are listed from the central
/// directory. Entry data is only read (and CRC-checked) on request, so a
/// damaged entry that is never asked for does not affect the others.
pub struct ManifestArchive {
    path: PathBuf,
    archive: zip::ZipArchive<std::fs::File>,
    files: Vec<(usize, String)>,
}

impl ManifestArchive {
    pub fn open(path: &Path) -> Result<Self, ManifestError> {
        let file = std::fs::File::open(path).map_err(|source| ManifestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = zip::ZipArchive::new(file).map_err(|source| ManifestError::Archive {
            path: path.to_path_buf(),
            source,
        })?;

        let mut files = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|source| ManifestError::Archive {
                    path: path.to_path_buf(),
                    source,
                })?;
            if !entry.is_dir() {
                files.push((index, entry.name().to_string()));
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            files,
        })
    }

    /// Number of file entries.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(_, name)| name.as_str())
    }

    /// Reads the file entry called `name`, if there is one.
    pub fn read_named(&mut self, name: &str) -> Result<Option<ArchiveEntry>, ManifestError> {
        match self.files.iter().position(|(_, n)| n == name) {
            Some(position) => self.read_at(position).map(Some),
            None => Ok(None),
        }
    }

    /// Reads the first file entry in archive order.
    pub fn read_first(&mut self) -> Result<Option<ArchiveEntry>, ManifestError> {
        if self.files.is_empty() {
            return Ok(None);
        }
        self.read_at(0).map(Some)
    }

    /// Reads every file entry in archive order.
    pub fn read_all(&mut self) -> Result<ArchiveContents, ManifestError> {
        let entries = (0..self.files.len())
            .map(|position| self.read_at(position))
            .collect::<Result<_, _>>()?;
        Ok(ArchiveContents { entries })
    }

    fn read_at(&mut self, position: usize) -> Result<ArchiveEntry, ManifestError> {
        let (index, name) = &self.files[position];
        let archive_error = |source| ManifestError::Archive {
            path: self.path.clone(),
            source,
        };

        let mut entry = self.archive.by_index(*index).map_err(archive_error)?;
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| archive_error(zip::result::ZipError::Io(e)))?;

        Ok(ArchiveEntry {
            name: name.clone(),
            data,
        })
    }
}

/// Reads every file entry of the zip at `path` into memory. Directory entries
/// are skipped.
pub fn read_archive(path: &Path) -> Result<ArchiveContents, ManifestError> {
    ManifestArchive::open(path)?.read_all()
}
