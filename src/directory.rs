//! Directories opened out of an archive, and the entries they hand out.

use crate::{file::ArchiveLease, path::FsPath, FsResult};
use binrw::{io::Cursor, BinWrite};
use std::{fs, path::Path};

/// UTF-16 code units in the name field, terminator included.
pub const FILENAME_LENGTH: usize = 0x106;

/// One child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_directory: bool,
    pub is_hidden: bool,
    pub is_archive: bool,
    pub is_read_only: bool,
    pub file_size: u64,
}

/// The 0x228 byte record guest software reads out of a directory.
#[binrw::binrw]
#[brw(little)]
#[derive(Debug, Clone)]
pub struct RawDirectoryEntry {
    /// null terminated
    pub filename: [u16; FILENAME_LENGTH],
    /// 8.3 name padded with spaces, null terminated
    pub short_name: [u8; 9],
    pub unknown1: u8,
    /// 8.3 extension padded with spaces, null terminated
    pub extension: [u8; 4],
    pub unknown2: u8,
    pub unknown3: u8,
    pub is_directory: u8,
    pub is_hidden: u8,
    pub is_archive: u8,
    pub is_read_only: u8,
    pub file_size: u64,
}

impl DirectoryEntry {
    pub(crate) fn from_host(name: String, metadata: &fs::Metadata) -> Self {
        let is_directory = metadata.is_dir();
        Self {
            is_hidden: name.starts_with('.'),
            is_archive: !is_directory,
            is_read_only: false,
            file_size: if is_directory { 0 } else { metadata.len() },
            is_directory,
            name,
        }
    }

    pub fn to_raw(&self) -> RawDirectoryEntry {
        let mut filename = [0u16; FILENAME_LENGTH];
        for (dst, src) in filename[..FILENAME_LENGTH - 1]
            .iter_mut()
            .zip(self.name.encode_utf16())
        {
            *dst = src;
        }

        let (short_name, extension) = split_filename_83(&self.name);

        RawDirectoryEntry {
            filename,
            short_name,
            unknown1: 0,
            extension,
            unknown2: 1,
            unknown3: 0,
            is_directory: self.is_directory.into(),
            is_hidden: self.is_hidden.into(),
            is_archive: self.is_archive.into(),
            is_read_only: self.is_read_only.into(),
            file_size: self.file_size,
        }
    }

    pub fn to_bytes(&self) -> FsResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(0x228));
        self.to_raw().write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// FAT style 8.3 name: up to 8 uppercase characters (`~1` suffixed when
/// truncated) and a 3 character extension, both space padded.
pub fn split_filename_83(filename: &str) -> ([u8; 9], [u8; 4]) {
    const FORBIDDEN: &[u8] = b".\"/\\[]:;=, ";

    let mut short_name = *b"        \0";
    let mut extension = *b"   \0";

    let bytes = filename.as_bytes();
    let mut point = bytes.iter().rposition(|c| *c == b'.');
    if point == Some(bytes.len().wrapping_sub(1)) {
        // trailing dot, use the one before it
        point = bytes[..bytes.len() - 1].iter().rposition(|c| *c == b'.');
    }

    let stem = &bytes[..point.unwrap_or(bytes.len())];
    let mut j = 0;
    for letter in stem.iter().filter(|c| !FORBIDDEN.contains(c)) {
        if j == 8 {
            short_name[6] = b'~';
            short_name[7] = b'1';
            break;
        }
        short_name[j] = letter.to_ascii_uppercase();
        j += 1;
    }

    if let Some(point) = point {
        for (dst, letter) in extension.iter_mut().zip(bytes[point + 1..].iter().take(3)) {
            *dst = letter.to_ascii_uppercase();
        }
    }

    (short_name, extension)
}

/// A directory inside an open archive. The children are read when it is
/// opened and handed out in name order.
#[derive(Debug)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
    cursor: usize,
    path: FsPath,
    lease: ArchiveLease,
}

impl Directory {
    pub(crate) fn new(listing: DirectoryListing, path: FsPath, lease: ArchiveLease) -> Self {
        Self {
            entries: listing.0,
            cursor: 0,
            path,
            lease,
        }
    }

    pub fn path(&self) -> &FsPath {
        &self.path
    }

    /// Next `max` entries, fewer once the end is reached.
    pub fn read(&mut self, max: usize) -> FsResult<Vec<DirectoryEntry>> {
        self.lease.check()?;

        let end = core::cmp::min(self.cursor.saturating_add(max), self.entries.len());
        let out = self.entries[self.cursor..end].to_vec();
        for entry in &out {
            log::trace!(
                "entry {}: size={} dir={}",
                entry.name,
                entry.file_size,
                entry.is_directory
            );
        }
        self.cursor = end;
        Ok(out)
    }
}

/// Children of a directory as produced by an archive backend.
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing(pub Vec<DirectoryEntry>);

impl DirectoryListing {
    pub(crate) fn scan_host(dir: &Path) -> FsResult<Self> {
        let mut entries = Vec::new();
        for child in fs::read_dir(dir)? {
            let child = child?;
            let name = child.file_name().to_string_lossy().into_owned();
            entries.push(DirectoryEntry::from_host(name, &child.metadata()?));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::ArchiveHandle, error::ERR_INVALID_ARCHIVE_HANDLE};
    use std::sync::Arc;

    #[test]
    fn short_names() {
        assert_eq!(split_filename_83("save.bin"), (*b"SAVE    \0", *b"BIN\0"));
        assert_eq!(
            split_filename_83("longfilename.text"),
            (*b"LONGFI~1\0", *b"TEX\0")
        );
        assert_eq!(split_filename_83("noext"), (*b"NOEXT   \0", *b"   \0"));
        assert_eq!(split_filename_83("a b;c"), (*b"ABC     \0", *b"   \0"));
    }

    #[test]
    fn raw_entry_is_0x228_bytes() {
        let entry = DirectoryEntry {
            name: "abc".into(),
            is_directory: false,
            is_hidden: false,
            is_archive: true,
            is_read_only: false,
            file_size: 0x1122,
        };

        let bytes = entry.to_bytes().unwrap();
        assert_eq!(bytes.len(), 0x228);
        assert_eq!(&bytes[..8], &[b'a', 0, b'b', 0, b'c', 0, 0, 0]);
        // is_archive
        assert_eq!(bytes[0x21E], 1);
        assert_eq!(&bytes[0x220..], &0x1122u64.to_le_bytes());
    }

    #[test]
    fn host_scan_sorts_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), b"12345").unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();

        let listing = DirectoryListing::scan_host(dir.path()).unwrap();
        let names: Vec<_> = listing.0.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, [".hidden", "b.txt"]);
        assert!(listing.0[0].is_directory && listing.0[0].is_hidden);
        assert!(listing.0[1].is_archive);
        assert_eq!(listing.0[1].file_size, 5);
    }

    #[test]
    fn reading_in_chunks_and_after_close() {
        let token = Arc::new(());
        let listing = DirectoryListing(
            ["a", "b", "c"]
                .iter()
                .map(|n| DirectoryEntry {
                    name: n.to_string(),
                    is_directory: true,
                    is_hidden: false,
                    is_archive: false,
                    is_read_only: false,
                    file_size: 0,
                })
                .collect(),
        );
        let mut dir = Directory::new(
            listing,
            FsPath::text("/"),
            ArchiveLease::new(ArchiveHandle(1), &token),
        );

        assert_eq!(dir.read(2).unwrap().len(), 2);
        assert_eq!(dir.read(2).unwrap()[0].name, "c");
        assert!(dir.read(2).unwrap().is_empty());

        drop(token);
        assert_eq!(dir.read(1).unwrap_err().code(), ERR_INVALID_ARCHIVE_HANDLE);
    }
}
