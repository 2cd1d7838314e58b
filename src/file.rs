//! Files opened out of an archive.

use crate::{
    common::ArchiveHandle,
    error::{ERROR_INVALID_OPEN_FLAGS, ERROR_UNSUPPORTED_OPEN_FLAGS},
    path::FsPath,
    storage::{IStorage, Storage},
    FsError, FsResult,
};
use core::fmt;
use std::sync::{Arc, Weak};

/// Open flags as sent by guest software.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Mode(pub u32);

impl Mode {
    pub const READ: Mode = Mode(1 << 0);
    pub const WRITE: Mode = Mode(1 << 1);
    pub const CREATE: Mode = Mode(1 << 2);
    pub const READ_WRITE: Mode = Mode(Self::READ.0 | Self::WRITE.0);

    pub const fn read(self) -> bool {
        self.0 & Self::READ.0 != 0
    }

    pub const fn write(self) -> bool {
        self.0 & Self::WRITE.0 != 0
    }

    pub const fn create(self) -> bool {
        self.0 & Self::CREATE.0 != 0
    }

    /// Rejects the two combinations no archive accepts: nothing at all, and
    /// create without write.
    pub(crate) fn validate(self) -> FsResult<()> {
        if self.0 == 0 || (self.create() && !self.write()) {
            log::error!("unsupported open flags {self:?}");
            return Err(ERROR_INVALID_OPEN_FLAGS.into());
        }
        Ok(())
    }
}

impl core::ops::BitOr for Mode {
    type Output = Mode;

    fn bitor(self, rhs: Self) -> Self::Output {
        Mode(self.0 | rhs.0)
    }
}

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mode(")?;
        for (set, flag) in [(self.read(), 'r'), (self.write(), 'w'), (self.create(), 'c')] {
            write!(f, "{}", if set { flag } else { '-' })?;
        }
        write!(f, ")")
    }
}

/// Ties a file or directory to the open/close cycle of the archive it came
/// from. The archive manager drops the other end when the archive is closed.
#[derive(Debug, Clone)]
pub struct ArchiveLease {
    archive: ArchiveHandle,
    alive: Weak<()>,
}

impl ArchiveLease {
    pub(crate) fn new(archive: ArchiveHandle, token: &Arc<()>) -> Self {
        Self {
            archive,
            alive: Arc::downgrade(token),
        }
    }

    pub fn archive(&self) -> ArchiveHandle {
        self.archive
    }

    pub fn is_valid(&self) -> bool {
        self.alive.strong_count() > 0
    }

    pub(crate) fn check(&self) -> FsResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            log::error!("archive {} was closed under an open file or directory", self.archive);
            Err(FsError::InvalidArchiveHandle(self.archive))
        }
    }
}

/// A file inside an open archive.
#[derive(Debug)]
pub struct File {
    storage: Storage,
    mode: Mode,
    path: FsPath,
    lease: ArchiveLease,
}

impl File {
    pub(crate) fn new(storage: Storage, mode: Mode, path: FsPath, lease: ArchiveLease) -> Self {
        Self {
            storage,
            mode,
            path,
            lease,
        }
    }

    pub fn path(&self) -> &FsPath {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn archive(&self) -> ArchiveHandle {
        self.lease.archive()
    }

    pub fn read(&self, offset: u64, buf: &mut [u8]) -> FsResult<usize> {
        self.lease.check()?;
        if !self.mode.read() {
            return Err(ERROR_INVALID_OPEN_FLAGS.into());
        }
        Ok(self.storage.read_at(offset, buf)? as usize)
    }

    pub fn write(&self, offset: u64, data: &[u8], flush: bool) -> FsResult<usize> {
        self.lease.check()?;
        if !self.mode.write() {
            return Err(ERROR_INVALID_OPEN_FLAGS.into());
        }
        let written = self.storage.write_at(offset, data)?;
        if flush {
            self.storage.flush()?;
        }
        Ok(written as usize)
    }

    pub fn size(&self) -> FsResult<u64> {
        self.lease.check()?;
        self.storage.length()
    }

    pub fn set_size(&self, size: u64) -> FsResult<()> {
        self.lease.check()?;
        if !self.mode.write() {
            return Err(ERROR_INVALID_OPEN_FLAGS.into());
        }
        match self.storage.set_length(size) {
            Err(FsError::StorageIsReadOnly) => Err(ERROR_UNSUPPORTED_OPEN_FLAGS.into()),
            other => other,
        }
    }

    pub fn flush(&self) -> FsResult<()> {
        self.lease.check()?;
        self.storage.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ERR_INVALID_ARCHIVE_HANDLE, storage::VecStorage};

    #[test]
    fn mode_validation() {
        assert!(Mode(0).validate().is_err());
        assert!(Mode::CREATE.validate().is_err());
        assert!((Mode::READ | Mode::CREATE).validate().is_err());
        assert!((Mode::WRITE | Mode::CREATE).validate().is_ok());
        assert!(Mode::READ.validate().is_ok());
        assert_eq!(format!("{:?}", Mode::READ_WRITE), "Mode(rw-)");
    }

    #[test]
    fn file_respects_mode_and_lease() {
        let token = Arc::new(());
        let lease = ArchiveLease::new(ArchiveHandle(3), &token);
        let file = File::new(
            VecStorage::new(b"hello".to_vec()),
            Mode::READ,
            FsPath::text("/hello"),
            lease,
        );

        let mut buf = [0; 5];
        assert_eq!(file.read(0, &mut buf).unwrap(), 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(
            file.write(0, b"x", false).unwrap_err().code(),
            ERROR_INVALID_OPEN_FLAGS
        );

        drop(token);
        assert_eq!(file.size().unwrap_err().code(), ERR_INVALID_ARCHIVE_HANDLE);
        assert_eq!(file.archive(), ArchiveHandle(3));
    }

    #[test]
    fn readonly_storage_with_write_mode() {
        let token = Arc::new(());
        let file = File::new(
            VecStorage::new(vec![0; 4]),
            Mode::READ_WRITE,
            FsPath::Empty,
            ArchiveLease::new(ArchiveHandle(1), &token),
        );

        assert_eq!(
            file.write(0, b"x", true).unwrap_err().code(),
            ERROR_UNSUPPORTED_OPEN_FLAGS
        );
        assert_eq!(
            file.set_size(1).unwrap_err().code(),
            ERROR_UNSUPPORTED_OPEN_FLAGS
        );
    }
}
