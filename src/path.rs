//! Low level paths as passed in by guest software, and their validation
//! against a host directory.

use crate::{error::ERROR_INVALID_PATH, utils, FsError, FsResult};
use bstr::{BString, ByteSlice};
use std::{
    borrow::Cow,
    fmt,
    path::{Path, PathBuf},
};

/// A path whose meaning depends on the archive it is handed to. Save data like
/// archives expect binary identifiers, host directory archives expect text.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum FsPath {
    Invalid,
    #[default]
    Empty,
    Binary(Vec<u8>),
    /// ASCII path
    Char(BString),
    /// UTF-16 path
    Wchar(Vec<u16>),
}

impl FsPath {
    /// Builds a path from the raw `(type, data)` pair of an IPC request. Text
    /// payloads are null terminated on the wire.
    pub fn from_raw(ty: u32, data: &[u8]) -> Self {
        match ty {
            1 => FsPath::Empty,
            2 => FsPath::Binary(data.to_vec()),
            3 => {
                let end = data.find_byte(0).unwrap_or(data.len());
                FsPath::Char(data[..end].into())
            }
            4 => {
                let units = data
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .take_while(|c| *c != 0)
                    .collect();
                FsPath::Wchar(units)
            }
            _ => FsPath::Invalid,
        }
    }

    pub fn text(s: &str) -> Self {
        FsPath::Char(s.into())
    }

    pub fn wide(s: &str) -> Self {
        FsPath::Wchar(s.encode_utf16().collect())
    }

    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        FsPath::Binary(data.into())
    }

    /// The wire type code.
    pub fn ty(&self) -> u32 {
        match self {
            FsPath::Invalid => 0,
            FsPath::Empty => 1,
            FsPath::Binary(_) => 2,
            FsPath::Char(_) => 3,
            FsPath::Wchar(_) => 4,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FsPath::Empty)
    }

    /// Text form of the path. `None` for binary and invalid paths.
    pub fn as_string(&self) -> Option<Cow<'_, str>> {
        match self {
            FsPath::Empty => Some(Cow::Borrowed("")),
            FsPath::Char(s) => Some(s.to_str_lossy()),
            FsPath::Wchar(s) => Some(Cow::Owned(String::from_utf16_lossy(s))),
            FsPath::Invalid | FsPath::Binary(_) => {
                log::error!("path {self} cannot be converted to a string");
                None
            }
        }
    }

    /// Raw bytes of the path. `None` for invalid paths.
    pub fn as_binary(&self) -> Option<Cow<'_, [u8]>> {
        match self {
            FsPath::Empty => Some(Cow::Borrowed(&[])),
            FsPath::Binary(b) => Some(Cow::Borrowed(b)),
            FsPath::Char(s) => Some(Cow::Borrowed(s.as_bytes())),
            FsPath::Wchar(s) => Some(Cow::Owned(
                s.iter().flat_map(|c| c.to_le_bytes()).collect(),
            )),
            FsPath::Invalid => {
                log::error!("path {self} cannot be converted to binary");
                None
            }
        }
    }

    /// Binary payload of exactly `N` bytes, or [`ERROR_INVALID_PATH`].
    pub(crate) fn binary_exact<const N: usize>(&self) -> FsResult<[u8; N]> {
        match self {
            FsPath::Binary(b) => <[u8; N]>::try_from(b.as_slice()).map_err(|_| {
                log::error!("binary path {self} needs to be {N} bytes long");
                FsError::from(ERROR_INVALID_PATH)
            }),
            _ => {
                log::error!("path {self} needs to be binary");
                Err(ERROR_INVALID_PATH.into())
            }
        }
    }

    pub(crate) fn require_empty(&self) -> FsResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            log::error!("path {self} needs to be empty");
            Err(ERROR_INVALID_PATH.into())
        }
    }
}

impl fmt::Display for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsPath::Invalid => write!(f, "[Invalid]"),
            FsPath::Empty => write!(f, "[Empty]"),
            FsPath::Binary(b) => write!(f, "[Binary: {}]", utils::hex_bytes(b)),
            FsPath::Char(s) => write!(f, "[Char: {s}]"),
            FsPath::Wchar(s) => write!(f, "[Wchar: {}]", String::from_utf16_lossy(s)),
        }
    }
}

impl fmt::Debug for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<&str> for FsPath {
    fn from(value: &str) -> Self {
        FsPath::text(value)
    }
}

/// What a parsed path resolves to below a host mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    /// The mount point itself is missing.
    InvalidMountPoint,
    /// A parent directory is missing.
    PathNotFound,
    /// A parent "directory" is a file.
    FileInPath,
    /// Parents exist, the final component doesn't.
    NotFound,
    FileFound,
    DirectoryFound,
}

/// A text path split into components and checked for anything that could
/// escape the archive or that the host can't represent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParser {
    components: Vec<String>,
}

impl PathParser {
    const INVALID_CHARS: &'static [char] = &['<', '>', '\\', '|', ':', '"', '*', '?'];

    pub fn parse(path: &FsPath) -> FsResult<Self> {
        let s = match path {
            FsPath::Char(_) | FsPath::Wchar(_) => path.as_string().unwrap_or_default(),
            _ => return Err(ERROR_INVALID_PATH.into()),
        };

        if !s.starts_with('/') || s.contains(Self::INVALID_CHARS) {
            return Err(ERROR_INVALID_PATH.into());
        }

        let mut components: Vec<String> = Vec::new();
        for part in s.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    // climbing above the archive root
                    if components.pop().is_none() {
                        return Err(ERROR_INVALID_PATH.into());
                    }
                }
                other => components.push(other.into()),
            }
        }

        Ok(Self { components })
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn host_status(&self, mount_point: &Path) -> HostStatus {
        if !mount_point.is_dir() {
            return HostStatus::InvalidMountPoint;
        }

        let Some((last, parents)) = self.components.split_last() else {
            return HostStatus::DirectoryFound;
        };

        let mut path = mount_point.to_path_buf();
        for component in parents {
            path.push(component);
            if !path.exists() {
                return HostStatus::PathNotFound;
            }
            if !path.is_dir() {
                return HostStatus::FileInPath;
            }
        }

        path.push(last);
        if !path.exists() {
            HostStatus::NotFound
        } else if path.is_dir() {
            HostStatus::DirectoryFound
        } else {
            HostStatus::FileFound
        }
    }

    pub fn build_host_path(&self, mount_point: &Path) -> PathBuf {
        let mut path = mount_point.to_path_buf();
        path.extend(&self.components);
        path
    }
}
