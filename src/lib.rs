#![deny(clippy::unwrap_used)]

pub mod archive;
pub mod common;
pub mod config;
pub mod directory;
pub mod error;
pub mod file;
pub mod loader;
pub mod manager;
pub mod path;
pub mod result;
pub mod storage;
pub(crate) mod utils;

pub use error::{FsError, FsResult};
pub use manager::ArchiveManager;

pub mod prelude {
    pub use super::{
        archive::{ArchiveFormatInfo, IArchiveBackend, IArchiveFactory},
        common::{ArchiveHandle, ArchiveIdCode, MediaType, ProgramId},
        config::FsConfig,
        directory::{Directory, DirectoryEntry},
        file::{File, Mode},
        loader::AppLoader,
        path::FsPath,
        result::ResultCode,
        storage::{IStorage, Storage, VecStorage},
        ArchiveManager, FsError, FsResult,
    };
}
