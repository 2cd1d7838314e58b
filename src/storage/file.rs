use super::{IStorage, Storage};
use crate::FsResult;

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A host file. The handle is shared behind a mutex because every access is a
/// seek followed by a read or write.
#[derive(Debug)]
pub struct FileStorage {
    fp: Mutex<File>,
    writable: bool,
}

impl FileStorage {
    pub fn new(fp: File, writable: bool) -> Storage {
        Storage::new(Self {
            fp: Mutex::new(fp),
            writable,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> io::Result<Storage> {
        File::open(path).map(|fp| Self::new(fp, false))
    }

    pub fn open_rw(path: impl AsRef<Path>) -> io::Result<Storage> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map(|fp| Self::new(fp, true))
    }
}

impl IStorage for FileStorage {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> FsResult<u64> {
        let mut fp = self.fp.lock();

        fp.seek(SeekFrom::Start(offset))?;

        // short reads are fine for a single call but not for a guest request
        let mut cnt = 0;
        while cnt < buf.len() {
            match fp.read(&mut buf[cnt..])? {
                0 => break,
                n => cnt += n,
            }
        }

        Ok(cnt as _)
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> FsResult<u64> {
        if !self.writable {
            return Err(crate::FsError::StorageIsReadOnly);
        }

        let mut fp = self.fp.lock();
        fp.seek(SeekFrom::Start(offset))?;
        fp.write_all(data)?;
        Ok(data.len() as _)
    }

    fn length(&self) -> FsResult<u64> {
        Ok(self.fp.lock().metadata()?.len())
    }

    fn set_length(&self, len: u64) -> FsResult<()> {
        if !self.writable {
            return Err(crate::FsError::StorageIsReadOnly);
        }
        Ok(self.fp.lock().set_len(len)?)
    }

    fn flush(&self) -> FsResult<()> {
        Ok(self.fp.lock().flush()?)
    }

    fn is_readonly(&self) -> bool {
        !self.writable
    }
}
