//! A Storage wrapping a byte array in memory.

use super::{IStorage, Storage};
use crate::FsResult;

/// A read only Storage wrapping a byte array in memory, used for ExeFS
/// sections and anything else a loader hands over fully decoded.
#[derive(Debug, Clone)]
pub struct VecStorage(Vec<u8>);

impl VecStorage {
    pub fn new(buf: Vec<u8>) -> Storage {
        Storage::new(Self(buf))
    }
}

impl IStorage for VecStorage {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> FsResult<u64> {
        if let Some(available_buf) = usize::try_from(offset).ok().and_then(|o| self.0.get(o..)) {
            let read_len = core::cmp::min(available_buf.len(), buf.len());
            buf[..read_len].copy_from_slice(&available_buf[..read_len]);
            return Ok(read_len as _);
        }
        Ok(0)
    }

    fn length(&self) -> FsResult<u64> {
        Ok(self.0.len() as _)
    }
}
