//! Random access byte storage backing every [`crate::file::File`].

use crate::{FsError, FsResult};
use std::{fmt, sync::Arc};

mod file;
mod memory;

pub use self::{file::FileStorage, memory::VecStorage};

pub trait IStorage: fmt::Debug + Send + Sync {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> FsResult<u64>;

    fn write_at(&self, _offset: u64, _data: &[u8]) -> FsResult<u64> {
        Err(FsError::StorageIsReadOnly)
    }

    fn length(&self) -> FsResult<u64>;

    fn set_length(&self, _len: u64) -> FsResult<()> {
        Err(FsError::StorageIsReadOnly)
    }

    fn flush(&self) -> FsResult<()> {
        Ok(())
    }

    fn is_readonly(&self) -> bool {
        true
    }

    fn into_storage(self) -> Storage
    where
        Self: Sized + 'static,
    {
        Storage::new(self)
    }
}

/// Cheaply clonable, type erased handle to an [`IStorage`].
#[derive(Clone)]
pub struct Storage(Arc<dyn IStorage>);

impl Storage {
    pub fn new(s: impl IStorage + 'static) -> Self {
        Self(Arc::new(s))
    }
}

impl IStorage for Storage {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> FsResult<u64> {
        self.0.read_at(offset, buf)
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> FsResult<u64> {
        self.0.write_at(offset, data)
    }

    fn length(&self) -> FsResult<u64> {
        self.0.length()
    }

    fn set_length(&self, len: u64) -> FsResult<()> {
        self.0.set_length(len)
    }

    fn flush(&self) -> FsResult<()> {
        self.0.flush()
    }

    fn is_readonly(&self) -> bool {
        self.0.is_readonly()
    }

    fn into_storage(self) -> Storage {
        self
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Storage").field(&self.0).finish()
    }
}
