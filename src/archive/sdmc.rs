//! The SD card, as seen by titles allowed to touch it directly.

use super::{
    host::{HostDirectory, HOST_FREE_BYTES, SDMC_ERRORS},
    ArchiveBackend, ArchiveFormatInfo, IArchiveBackend, IArchiveFactory,
};
use crate::{
    common::ProgramId,
    config::FsConfig,
    directory::DirectoryListing,
    error::{ERROR_COMMAND_NOT_ALLOWED, ERROR_INVALID_READ_FLAG, ERROR_UNSUPPORTED_OPEN_FLAGS},
    file::Mode,
    path::FsPath,
    storage::Storage,
    FsResult,
};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone)]
pub struct SdmcArchive {
    host: HostDirectory,
}

impl SdmcArchive {
    pub fn new(mount_point: PathBuf) -> Self {
        Self {
            host: HostDirectory::new(mount_point, &SDMC_ERRORS),
        }
    }
}

impl IArchiveBackend for SdmcArchive {
    fn name(&self) -> String {
        format!("SdmcArchive: {}", self.host.mount_point().display())
    }

    fn open_file(&self, path: &FsPath, mode: Mode) -> FsResult<Storage> {
        self.host.open_file(path, mode)
    }

    fn delete_file(&self, path: &FsPath) -> FsResult<()> {
        self.host.delete_file(path)
    }

    fn rename_file(&self, src: &FsPath, dest: &FsPath) -> FsResult<()> {
        self.host.rename(src, dest, false)
    }

    fn delete_directory(&self, path: &FsPath) -> FsResult<()> {
        self.host.delete_directory(path, false)
    }

    fn delete_directory_recursively(&self, path: &FsPath) -> FsResult<()> {
        self.host.delete_directory(path, true)
    }

    fn create_file(&self, path: &FsPath, size: u64) -> FsResult<()> {
        self.host.create_file(path, size)
    }

    fn create_directory(&self, path: &FsPath) -> FsResult<()> {
        self.host.create_directory(path)
    }

    fn rename_directory(&self, src: &FsPath, dest: &FsPath) -> FsResult<()> {
        self.host.rename(src, dest, true)
    }

    fn open_directory(&self, path: &FsPath) -> FsResult<DirectoryListing> {
        self.host.open_directory(path)
    }

    fn free_bytes(&self) -> u64 {
        HOST_FREE_BYTES
    }
}

/// The SD card for titles that may only drop files onto it, photos and the
/// like. Nothing can be read back.
#[derive(Debug, Clone)]
pub struct SdmcWriteOnlyArchive {
    inner: SdmcArchive,
}

impl SdmcWriteOnlyArchive {
    pub fn new(mount_point: PathBuf) -> Self {
        Self {
            inner: SdmcArchive::new(mount_point),
        }
    }
}

impl IArchiveBackend for SdmcWriteOnlyArchive {
    fn name(&self) -> String {
        format!(
            "SdmcWriteOnlyArchive: {}",
            self.inner.host.mount_point().display()
        )
    }

    fn open_file(&self, path: &FsPath, mode: Mode) -> FsResult<Storage> {
        if mode.read() {
            log::error!("read flag is not supported, path {path}");
            return Err(ERROR_INVALID_READ_FLAG.into());
        }
        self.inner.open_file(path, mode)
    }

    fn delete_file(&self, path: &FsPath) -> FsResult<()> {
        self.inner.delete_file(path)
    }

    fn rename_file(&self, src: &FsPath, dest: &FsPath) -> FsResult<()> {
        self.inner.rename_file(src, dest)
    }

    fn delete_directory(&self, path: &FsPath) -> FsResult<()> {
        self.inner.delete_directory(path)
    }

    fn delete_directory_recursively(&self, path: &FsPath) -> FsResult<()> {
        self.inner.delete_directory_recursively(path)
    }

    fn create_file(&self, path: &FsPath, size: u64) -> FsResult<()> {
        self.inner.create_file(path, size)
    }

    fn create_directory(&self, path: &FsPath) -> FsResult<()> {
        self.inner.create_directory(path)
    }

    fn rename_directory(&self, src: &FsPath, dest: &FsPath) -> FsResult<()> {
        self.inner.rename_directory(src, dest)
    }

    fn open_directory(&self, path: &FsPath) -> FsResult<DirectoryListing> {
        log::error!("listing {path} is not supported on a write only archive");
        Err(ERROR_UNSUPPORTED_OPEN_FLAGS.into())
    }

    fn free_bytes(&self) -> u64 {
        self.inner.free_bytes()
    }
}

fn create_sdmc_directory(dir: &Path) -> FsResult<()> {
    fs::create_dir_all(dir).map_err(|e| {
        log::error!("unable to create SDMC path {}: {e}", dir.display());
        e
    })?;
    Ok(())
}

fn refuse_format(name: &str) -> FsResult<()> {
    log::error!("attempted to format a {name} archive");
    Err(ERROR_COMMAND_NOT_ALLOWED.into())
}

#[derive(Debug, Clone)]
pub struct SdmcFactory {
    directory: PathBuf,
}

impl SdmcFactory {
    pub fn new(config: &FsConfig) -> Self {
        Self {
            directory: config.sdmc_directory.clone(),
        }
    }
}

impl IArchiveFactory for SdmcFactory {
    fn name(&self) -> String {
        "SDMC".into()
    }

    fn initialize(&mut self) -> FsResult<()> {
        create_sdmc_directory(&self.directory)
    }

    fn open(&mut self, path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveBackend> {
        path.require_empty()?;
        Ok(SdmcArchive::new(self.directory.clone()).into())
    }

    fn format(
        &mut self,
        _path: &FsPath,
        _info: &ArchiveFormatInfo,
        _program_id: ProgramId,
    ) -> FsResult<()> {
        refuse_format("SDMC")
    }

    fn format_info(&self, _path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveFormatInfo> {
        log::error!("SDMC archives carry no format info");
        Err(ERROR_COMMAND_NOT_ALLOWED.into())
    }
}

#[derive(Debug, Clone)]
pub struct SdmcWriteOnlyFactory {
    directory: PathBuf,
}

impl SdmcWriteOnlyFactory {
    pub fn new(config: &FsConfig) -> Self {
        Self {
            directory: config.sdmc_directory.clone(),
        }
    }
}

impl IArchiveFactory for SdmcWriteOnlyFactory {
    fn name(&self) -> String {
        "SDMCWriteOnly".into()
    }

    fn initialize(&mut self) -> FsResult<()> {
        create_sdmc_directory(&self.directory)
    }

    fn open(&mut self, path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveBackend> {
        path.require_empty()?;
        Ok(SdmcWriteOnlyArchive::new(self.directory.clone()).into())
    }

    fn format(
        &mut self,
        _path: &FsPath,
        _info: &ArchiveFormatInfo,
        _program_id: ProgramId,
    ) -> FsResult<()> {
        refuse_format("SDMCWriteOnly")
    }

    fn format_info(&self, _path: &FsPath, _program_id: ProgramId) -> FsResult<ArchiveFormatInfo> {
        log::error!("SDMCWriteOnly archives carry no format info");
        Err(ERROR_COMMAND_NOT_ALLOWED.into())
    }
}
